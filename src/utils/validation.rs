//! Validation helpers
//!
//! Field checks shared by the submission flow and the tariff parser. All
//! helpers return `validator::ValidationError` with a human readable
//! message, so the caller can surface the exact reason to the user.

use std::borrow::Cow;

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use validator::ValidationError;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    static ref PHONE_CHARS_RE: Regex = Regex::new(r"^\+?[\d\s\-().]+$").unwrap();
}

/// Digits a mobile number must have outside the home country
pub const MIN_FOREIGN_DIGITS: usize = 7;
pub const MAX_FOREIGN_DIGITS: usize = 15;
/// Digits of a national mobile number in the home country
pub const LOCAL_MOBILE_DIGITS: usize = 10;

fn error(code: &'static str, message: String) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Owned(message));
    error
}

/// Message of a validation error, falling back to its code
pub fn describe(error: &ValidationError) -> String {
    error
        .message
        .as_ref()
        .map(|m| m.to_string())
        .unwrap_or_else(|| format!("invalid value ({})", error.code))
}

/// Validate that a string is not blank
pub fn validate_not_empty(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = error("not_empty", format!("{} is required", field));
        error.add_param("field".into(), &field);
        return Err(error);
    }
    Ok(())
}

/// Validate a mobile number against the dialling rules of `country_code`.
///
/// For `home_country_code` the national number must have exactly
/// [`LOCAL_MOBILE_DIGITS`] digits; an optional leading country code or trunk
/// `0` is tolerated. Other countries only need a plausible digit count.
pub fn validate_mobile(
    value: &str,
    country_code: &str,
    home_country_code: &str,
) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(error("mobile_required", "Mobile number is required".to_string()));
    }
    if !PHONE_CHARS_RE.is_match(trimmed) {
        let mut error = error(
            "mobile_format",
            "Mobile number may only contain digits, spaces and dashes".to_string(),
        );
        error.add_param("value".into(), &trimmed);
        return Err(error);
    }

    let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();
    let country = country_code.trim().trim_start_matches('+');
    let home = home_country_code.trim().trim_start_matches('+');

    if country == home {
        let national = if digits.len() == LOCAL_MOBILE_DIGITS + home.len() && digits.starts_with(home) {
            &digits[home.len()..]
        } else if digits.len() == LOCAL_MOBILE_DIGITS + 1 && digits.starts_with('0') {
            &digits[1..]
        } else {
            digits.as_str()
        };

        if national.len() != LOCAL_MOBILE_DIGITS {
            let mut error = error(
                "mobile_length",
                format!(
                    "Mobile number must have exactly {} digits",
                    LOCAL_MOBILE_DIGITS
                ),
            );
            error.add_param("actual".into(), &national.len());
            return Err(error);
        }
        return Ok(());
    }

    if digits.len() < MIN_FOREIGN_DIGITS || digits.len() > MAX_FOREIGN_DIGITS {
        let mut error = error(
            "mobile_length",
            format!(
                "Mobile number must have between {} and {} digits",
                MIN_FOREIGN_DIGITS, MAX_FOREIGN_DIGITS
            ),
        );
        error.add_param("actual".into(), &digits.len());
        return Err(error);
    }
    Ok(())
}

/// Validate e-mail format
pub fn validate_email(value: &str) -> Result<(), ValidationError> {
    if !EMAIL_RE.is_match(value.trim()) {
        let mut error = error("email", "Email address is not valid".to_string());
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Validate and parse an ISO date (YYYY-MM-DD)
pub fn validate_date(value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        let mut error = error("date", "Travel date must use the YYYY-MM-DD format".to_string());
        error.add_param("value".into(), &value.to_string());
        error.add_param("format".into(), &"YYYY-MM-DD".to_string());
        error
    })
}

/// Validate that a value is strictly positive
pub fn validate_positive<T: PartialOrd + std::fmt::Display + num_traits::Zero + Serialize>(
    field: &'static str,
    value: T,
) -> Result<(), ValidationError> {
    if value <= T::zero() {
        let mut error = error("positive", format!("{} must be greater than zero", field));
        error.add_param("value".into(), &value);
        return Err(error);
    }
    Ok(())
}

/// Validate that a value is not negative
pub fn validate_non_negative<T: PartialOrd + std::fmt::Display + num_traits::Zero + Serialize>(
    field: &'static str,
    value: T,
) -> Result<(), ValidationError> {
    if value < T::zero() {
        let mut error = error("non_negative", format!("{} cannot be negative", field));
        error.add_param("value".into(), &value);
        return Err(error);
    }
    Ok(())
}
