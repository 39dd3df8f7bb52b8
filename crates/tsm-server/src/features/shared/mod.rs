//! Shared utilities for feature modules
//!
//! - **validation**: query parameter validation

pub mod validation;

pub use validation::{validate_limit, validate_name, LimitValidationError, NameValidationError};
