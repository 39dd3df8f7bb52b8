//! Shared validation utilities
//!
//! Provides common validation functions for query parameters.
//!
//! # Examples
//!
//! ```rust,ignore
//! use tsm_server::features::shared::validation::{validate_limit, validate_name};
//!
//! validate_name(&query.file_name, 255)?;
//! validate_limit(query.limit, 1, 1000)?;
//! ```

use thiserror::Error;

/// Errors that can occur during name validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NameValidationError {
    #[error("Name is required and cannot be empty")]
    Required,

    #[error("Name must be between 1 and {max_length} characters")]
    TooLong { max_length: usize },
}

/// Errors that can occur during limit validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LimitValidationError {
    #[error("Limit must be between {min} and {max}")]
    OutOfRange { min: i64, max: i64 },
}

/// Validate a name field
///
/// # Rules
/// - Must not be empty (after trimming whitespace)
/// - Must not exceed max_length characters
pub fn validate_name(name: &str, max_length: usize) -> Result<(), NameValidationError> {
    if name.trim().is_empty() {
        return Err(NameValidationError::Required);
    }

    if name.chars().count() > max_length {
        return Err(NameValidationError::TooLong { max_length });
    }

    Ok(())
}

/// Validate a result-count limit, inclusive on both ends
pub fn validate_limit(limit: i64, min: i64, max: i64) -> Result<(), LimitValidationError> {
    if limit < min || limit > max {
        return Err(LimitValidationError::OutOfRange { min, max });
    }
    Ok(())
}
