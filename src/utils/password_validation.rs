use crate::utils::error::CustomError;

pub fn validate_password(password: &str) -> Result<(), CustomError> {
    let length = password.chars().count();
    if !(8..=20).contains(&length) {
        return Err(CustomError::ValidationError(
            "Password must be between 8 and 20 characters long.".into(),
        ));
    }

    let has_lowercase = password.chars().any(|c| c.is_lowercase());
    let has_uppercase = password.chars().any(|c| c.is_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if !has_lowercase || !has_uppercase || !has_digit {
        return Err(CustomError::ValidationError(
            "Password must include at least one uppercase letter, one lowercase letter, and one number.".into(),
        ));
    }

    Ok(())
}
