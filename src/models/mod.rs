// src/models/mod.rs

pub mod genre;
pub mod grade;
pub mod item;
pub mod quiz;
pub mod user;

use validator::ValidationError;

/// Builds a schema-level validation error carrying a readable message.
pub(crate) fn validation_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    error
}
