// Validation utilities module
// Custom validation functions for request DTOs

use rust_decimal::Decimal;
use validator::ValidationError;

/// Validates that a daily rate is zero or positive
pub fn validate_daily_rate(rate: &Decimal) -> Result<(), ValidationError> {
    if rate.is_sign_negative() && !rate.is_zero() {
        Err(ValidationError::new("daily_rate_must_not_be_negative"))
    } else {
        Ok(())
    }
}

/// Rejects values that would break a flat-file record: commas and line breaks
pub fn validate_no_delimiter(value: &str) -> Result<(), ValidationError> {
    if value.contains([',', '\n', '\r']) {
        Err(ValidationError::new("must_not_contain_comma_or_line_break"))
    } else {
        Ok(())
    }
}

/// Validates a phone number: optional leading '+', then 7-15 digits.
/// Spaces and hyphens between digits are ignored.
pub fn validate_contact_number(contact: &str) -> Result<(), ValidationError> {
    let trimmed = contact.trim();
    let digits = trimmed.strip_prefix('+').unwrap_or(trimmed);

    let mut count = 0;
    for c in digits.chars() {
        match c {
            '0'..='9' => count += 1,
            ' ' | '-' => {}
            _ => return Err(ValidationError::new("invalid_contact_number")),
        }
    }

    if (7..=15).contains(&count) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_contact_number"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_daily_rate() {
        assert!(validate_daily_rate(&dec!(7500)).is_ok());
        assert!(validate_daily_rate(&dec!(0)).is_ok());
        assert!(validate_daily_rate(&dec!(-1)).is_err());
    }

    #[test]
    fn test_no_delimiter() {
        assert!(validate_no_delimiter("Nimal Perera").is_ok());
        assert!(validate_no_delimiter("Toyota \"Aqua\"").is_ok());
        assert!(validate_no_delimiter("Perera, Nimal").is_err());
        assert!(validate_no_delimiter("V001\nV002").is_err());
        assert!(validate_no_delimiter("V001\r").is_err());
    }

    #[test]
    fn test_contact_number() {
        assert!(validate_contact_number("0771234567").is_ok());
        assert!(validate_contact_number("+94 77 123 4567").is_ok());
        assert!(validate_contact_number("077-123-4567").is_ok());
        assert!(validate_contact_number("12345").is_err());
        assert!(validate_contact_number("07712abc67").is_err());
        assert!(validate_contact_number("").is_err());
    }
}
