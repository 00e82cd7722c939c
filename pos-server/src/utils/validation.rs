//! Input validation helpers
//!
//! Centralized text length constants and validation functions.
//! - 80mm receipt line width: 48 chars
//! - SQLite TEXT has no built-in length enforcement

use crate::utils::AppError;
use shared::ErrorCode;

// ── Text length limits ──────────────────────────────────────────────

/// Entity names: meal, raw material, category, section, customer, employee
pub const MAX_NAME_LEN: usize = 200;

/// Notes, descriptions, void reasons
pub const MAX_NOTE_LEN: usize = 500;

/// Short identifiers: phone, national id, tax number, codes
pub const MAX_SHORT_TEXT_LEN: usize = 100;

/// Email addresses (RFC 5321)
pub const MAX_EMAIL_LEN: usize = 254;

/// Passwords (before hashing)
pub const MAX_PASSWORD_LEN: usize = 128;

/// URLs / logo paths
pub const MAX_URL_LEN: usize = 2048;

/// Addresses
pub const MAX_ADDRESS_LEN: usize = 500;

// ── Validation helpers ──────────────────────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::with_message(
            ErrorCode::RequiredField,
            format!("{field} must not be empty"),
        )
        .with_detail("field", field));
    }
    if value.len() > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        ))
        .with_detail("field", field));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), AppError> {
    if let Some(v) = value
        && v.len() > max_len
    {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.len()
        ))
        .with_detail("field", field));
    }
    Ok(())
}

/// Validate a percentage in `0..=100`
pub fn validate_percent(value: f64, field: &str) -> Result<(), AppError> {
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            format!("{field} must be between 0 and 100, got {value}"),
        )
        .with_detail("field", field));
    }
    Ok(())
}

/// Validate a non-negative, finite amount
pub fn validate_amount(value: f64, field: &str) -> Result<(), AppError> {
    if !value.is_finite() || value < 0.0 {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            format!("{field} must be a non-negative number, got {value}"),
        )
        .with_detail("field", field));
    }
    Ok(())
}

/// Trim and drop empty optional text
pub fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_name_is_required_field() {
        let err = validate_required_text("   ", "name", MAX_NAME_LEN).unwrap_err();
        assert_eq!(err.code, ErrorCode::RequiredField);
    }

    #[test]
    fn long_text_rejected() {
        let long = "x".repeat(MAX_SHORT_TEXT_LEN + 1);
        assert!(validate_required_text(&long, "phone", MAX_SHORT_TEXT_LEN).is_err());
        assert!(validate_optional_text(&Some(long), "phone", MAX_SHORT_TEXT_LEN).is_err());
        assert!(validate_optional_text(&None, "phone", MAX_SHORT_TEXT_LEN).is_ok());
    }

    #[test]
    fn percent_bounds() {
        assert!(validate_percent(0.0, "tax_pct").is_ok());
        assert!(validate_percent(100.0, "tax_pct").is_ok());
        assert!(validate_percent(100.5, "tax_pct").is_err());
        assert!(validate_percent(-1.0, "discount_pct").is_err());
        assert!(validate_percent(f64::NAN, "discount_pct").is_err());
    }

    #[test]
    fn normalize_drops_blank() {
        assert_eq!(normalize_optional(Some("  ".into())), None);
        assert_eq!(normalize_optional(Some(" 0555 ".into())), Some("0555".into()));
    }
}
