//! Shared helpers for DTO validation and enum parsing

use pilot_core::ValidationErrors;
use thiserror::Error;

/// Raised when a stored or submitted string does not name a known variant
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown {kind} '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Convert `validator` derive output into the field -> messages map used by contracts
pub fn validation_errors_from(errors: validator::ValidationErrors) -> ValidationErrors {
    let mut out = ValidationErrors::new();
    for (field, field_errors) in errors.field_errors() {
        for error in field_errors {
            let message = error
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("is invalid ({})", error.code));
            out.add(field.to_string(), message);
        }
    }
    out
}
