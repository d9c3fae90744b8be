//! Field-level input validators
//!
//! Each validator returns the first failing rule's message, mirroring how a
//! form shows one problem per field at a time.

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::OnceLock;

pub const REQUIRED: &str = "This field is required.";

/// Largest amount that fits a `NUMERIC(12, 2)` column
const MAX_AMOUNT: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

/// Validate a required field
pub fn validate_required(value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(REQUIRED.to_string());
    }
    Ok(())
}

/// Validate a length range in characters
pub fn validate_length(value: &str, min: usize, max: usize) -> Result<(), String> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(format!(
            "Field must be between {} and {} characters long.",
            min, max
        ));
    }
    Ok(())
}

/// Validate a maximum length in characters
pub fn validate_max_length(value: &str, max: usize) -> Result<(), String> {
    if value.chars().count() > max {
        return Err(format!("Field cannot be longer than {} characters.", max));
    }
    Ok(())
}

/// Validate email
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.len() > 120 {
        return Err("Email must be at most 120 characters long.".to_string());
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("Invalid email address.".to_string());
    }

    Ok(())
}

/// Parse a positive money amount with at most two decimal places
pub fn parse_amount(value: &str) -> Result<Decimal, String> {
    let amount = Decimal::from_str(value.trim())
        .map_err(|_| "Not a valid decimal value.".to_string())?;

    if amount <= Decimal::ZERO {
        return Err("Amount must be greater than zero.".to_string());
    }

    if amount.normalize().scale() > 2 {
        return Err("Amount cannot have more than two decimal places.".to_string());
    }

    if amount > MAX_AMOUNT {
        return Err("Amount is too large.".to_string());
    }

    Ok(amount)
}

/// Parse an ISO `YYYY-MM-DD` date
pub fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| "Not a valid date value.".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required() {
        assert!(validate_required("x").is_ok());
        assert_eq!(validate_required("   ").unwrap_err(), REQUIRED);
    }

    #[test]
    fn test_length_counts_characters() {
        assert!(validate_length("ab", 2, 20).is_ok());
        assert!(validate_length("é", 2, 20).is_err());
        assert!(validate_length("éé", 2, 20).is_ok());
        assert!(validate_length(&"a".repeat(21), 2, 20).is_err());
        assert!(validate_max_length(&"ü".repeat(200), 200).is_ok());
        assert!(validate_max_length(&"ü".repeat(201), 200).is_err());
    }

    #[test]
    fn test_email() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("first.last+tag@mail.example.org").is_ok());
        assert!(validate_email("user@").is_err());
        assert!(validate_email("user example.com").is_err());
        assert!(validate_email("user@example").is_err());
    }

    #[test]
    fn test_amount() {
        assert_eq!(parse_amount("12.50").unwrap(), Decimal::new(1250, 2));
        assert_eq!(parse_amount(" 30 ").unwrap(), Decimal::new(30, 0));
        assert_eq!(parse_amount("1.500").unwrap(), Decimal::new(15, 1));
        assert!(parse_amount("0").is_err());
        assert!(parse_amount("-4").is_err());
        assert!(parse_amount("1.005").is_err());
        assert!(parse_amount("abc").is_err());
        assert!(parse_amount("").is_err());
        assert!(parse_amount("9999999999.99").is_ok());
        assert!(parse_amount("10000000000").is_err());
    }

    #[test]
    fn test_date() {
        assert_eq!(
            parse_date("2024-01-01").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
        assert!(parse_date("2024-02-30").is_err());
        assert!(parse_date("01/01/2024").is_err());
    }
}
