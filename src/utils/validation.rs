//! Argument checks that fail with validation errors.

use crate::error::{Error, Result};

/// Trimmed `value`, or an invalid-argument error naming `field`.
pub fn require_non_empty<'a>(value: &'a str, field: &str, message: &str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(Error::validation_invalid_argument(field, message, None, None))
    } else {
        Ok(trimmed)
    }
}

/// At least one item, or a missing-argument error naming `field`.
pub fn require_non_empty_vec<'a, T>(items: &'a [T], field: &str) -> Result<&'a [T]> {
    if items.is_empty() {
        Err(Error::validation_missing_argument(vec![field.to_string()]))
    } else {
        Ok(items)
    }
}
