//! Input validation helpers
//!
//! Centralized text length constants and validation functions.
//! SQLite TEXT has no built-in length enforcement.

use crate::AppError;

// ── Text length limits ──────────────────────────────────────────────

/// Entity names: product, category, voucher, page title, role, user name
pub const MAX_NAME_LEN: usize = 200;

/// Notes, excerpts, voucher descriptions
pub const MAX_NOTE_LEN: usize = 500;

/// Short identifiers: phone, SKU, voucher code, slug
pub const MAX_SHORT_TEXT_LEN: usize = 100;

/// Email addresses (RFC 5321)
pub const MAX_EMAIL_LEN: usize = 254;

/// Passwords (before hashing)
pub const MAX_PASSWORD_LEN: usize = 128;

/// URLs / image paths
pub const MAX_URL_LEN: usize = 2048;

/// Shipping addresses
pub const MAX_ADDRESS_LEN: usize = 500;

/// Long-form content: product descriptions, page bodies
pub const MAX_CONTENT_LEN: usize = 100_000;

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")));
    }
    if value.chars().count() > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.chars().count()
        )));
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
        && v.chars().count() > max_len
    {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.chars().count()
        )));
    }
    Ok(())
}

/// Validate a money amount: finite and non-negative.
pub fn validate_amount(value: f64, field: &str) -> Result<(), AppError> {
    if !value.is_finite() {
        return Err(AppError::validation(format!(
            "{field} must be a finite number"
        )));
    }
    if value < 0.0 {
        return Err(AppError::validation(format!(
            "{field} must be non-negative, got {value}"
        )));
    }
    Ok(())
}

/// Validate every entry of a URL list (product images).
pub fn validate_urls(values: &[String], field: &str) -> Result<(), AppError> {
    for v in values {
        validate_required_text(v, field, MAX_URL_LEN)?;
    }
    Ok(())
}

/// Collect `validator` derive failures into a single validation error.
pub fn validate_dto<T: validator::Validate>(dto: &T) -> Result<(), AppError> {
    dto.validate().map_err(|errors| {
        let fields: Vec<String> = errors
            .field_errors()
            .keys()
            .map(|k| k.to_string())
            .collect();
        AppError::validation(format!("Invalid fields: {}", fields.join(", ")))
            .with_detail("fields", fields)
    })
}
