use mongodb::bson::{self, Bson, oid::ObjectId};
use regex::Regex;
use std::sync::LazyLock;

use crate::utils::error::CustomError;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles")
});

/// Name reported in the `service` field of every response envelope
pub fn service_name() -> String {
    std::env::var("SERVICE_NAME").unwrap_or_else(|_| "Unknown".to_string())
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Parse a token lifetime such as `3600`, `15m`, `12h` or `10d` into seconds.
pub fn parse_expiry(value: &str) -> Option<i64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    let (digits, multiplier) = match value.chars().last()? {
        's' => (&value[..value.len() - 1], 1),
        'm' => (&value[..value.len() - 1], 60),
        'h' => (&value[..value.len() - 1], 60 * 60),
        'd' => (&value[..value.len() - 1], 24 * 60 * 60),
        c if c.is_ascii_digit() => (value, 1),
        _ => return None,
    };

    let amount: i64 = digits.parse().ok()?;
    if amount <= 0 {
        return None;
    }
    amount.checked_mul(multiplier)
}

/// Returns `None` for missing or blank form values.
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Current time as a BSON date, the representation stored timestamps use.
pub fn now_bson() -> Bson {
    Bson::DateTime(bson::DateTime::now())
}

/// Parse a path id into an ObjectId, rejecting malformed ids with 400.
pub fn parse_object_id(id: &str, what: &str) -> Result<ObjectId, CustomError> {
    ObjectId::parse_str(id.trim())
        .map_err(|_| CustomError::BadRequestError(format!("{} id is not valid", what)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_expiry_units() {
        assert_eq!(parse_expiry("3600"), Some(3600));
        assert_eq!(parse_expiry("30s"), Some(30));
        assert_eq!(parse_expiry("15m"), Some(900));
        assert_eq!(parse_expiry("12h"), Some(43_200));
        assert_eq!(parse_expiry("10d"), Some(864_000));
    }

    #[test]
    fn rejects_malformed_expiry() {
        assert_eq!(parse_expiry(""), None);
        assert_eq!(parse_expiry("d"), None);
        assert_eq!(parse_expiry("10w"), None);
        assert_eq!(parse_expiry("-5m"), None);
        assert_eq!(parse_expiry("0"), None);
    }

    #[test]
    fn validates_email_shape() {
        assert!(is_valid_email("jane@example.com"));
        assert!(!is_valid_email("jane@example"));
        assert!(!is_valid_email("jane example@mail.com"));
        assert!(!is_valid_email("@example.com"));
    }

    #[test]
    fn parses_object_ids() {
        let id = ObjectId::new();
        assert_eq!(parse_object_id(&id.to_hex(), "Post").unwrap(), id);

        let err = parse_object_id("abc", "Post").unwrap_err();
        assert_eq!(err.to_string(), "Bad Request: Post id is not valid");
    }

    #[test]
    fn current_time_is_a_bson_date() {
        assert!(matches!(now_bson(), Bson::DateTime(_)));
    }

    #[test]
    fn blank_values_are_dropped() {
        assert_eq!(non_blank(Some("  hello ")), Some("hello".to_string()));
        assert_eq!(non_blank(Some("   ")), None);
        assert_eq!(non_blank(None), None);
    }
}
