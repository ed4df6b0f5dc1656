use bcrypt::{BcryptError, DEFAULT_COST, hash, verify};

pub fn hash_password(password: &str) -> Result<String, BcryptError> {
    hash(password, DEFAULT_COST)
}

pub fn verify_password(password: &str, hashed: &str) -> Result<bool, BcryptError> {
    verify(password, hashed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verifies_only_the_original_password() {
        let hashed = hash_password("Secret123").unwrap();
        assert_ne!(hashed, "Secret123");
        assert!(verify_password("Secret123", &hashed).unwrap());
        assert!(!verify_password("secret123", &hashed).unwrap());
    }
}
