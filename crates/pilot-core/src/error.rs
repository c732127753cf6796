//! Core error types
//!
//! Every layer converts its own failures into [`PilotError`] before they reach
//! the API boundary; contract failures travel as [`ValidationErrors`].

use std::collections::BTreeMap;
use thiserror::Error;

/// Core error type for all pilot program operations
#[derive(Error, Debug)]
pub enum PilotError {
    #[error("Not found: {entity} with {field}={value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Conflict: {message}")]
    Conflict { message: String },
}

impl PilotError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        PilotError::NotFound {
            entity,
            field: "id",
            value: id.to_string(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        PilotError::Forbidden {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        PilotError::Conflict {
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            PilotError::NotFound { .. } => 404,
            PilotError::Unauthorized { .. } => 401,
            PilotError::Forbidden { .. } => 403,
            PilotError::Validation(_) => 422,
            PilotError::Conflict { .. } => 409,
            PilotError::Database(_) | PilotError::Internal(_) | PilotError::Config(_) => 500,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            PilotError::NotFound { .. } => "not_found",
            PilotError::Unauthorized { .. } => "unauthorized",
            PilotError::Forbidden { .. } => "forbidden",
            PilotError::Validation(_) => "validation_failed",
            PilotError::Database(_) => "database_error",
            PilotError::Internal(_) => "internal_error",
            PilotError::Config(_) => "configuration_error",
            PilotError::Conflict { .. } => "conflict",
        }
    }
}

/// Validation errors collection
///
/// Field errors are kept in a sorted map so that `full_messages` is stable
/// between runs.
#[derive(Error, Debug, Default, Clone, PartialEq, Eq)]
#[error("{}", self.full_messages().join(", "))]
pub struct ValidationErrors {
    /// Field-specific errors: field_name -> Vec<error_messages>
    pub errors: BTreeMap<String, Vec<String>>,
    /// Base errors not tied to a specific field
    pub base_errors: Vec<String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn add_base(&mut self, message: impl Into<String>) {
        self.base_errors.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.base_errors.is_empty()
    }

    /// Check if there are errors for a specific field
    pub fn has_error(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    pub fn has_base_error(&self) -> bool {
        !self.base_errors.is_empty()
    }

    /// Get errors for a specific field
    pub fn get(&self, field: &str) -> Option<&Vec<String>> {
        self.errors.get(field)
    }

    pub fn merge(&mut self, other: ValidationErrors) {
        for (field, messages) in other.errors {
            self.errors.entry(field).or_default().extend(messages);
        }
        self.base_errors.extend(other.base_errors);
    }

    pub fn full_messages(&self) -> Vec<String> {
        let mut messages = self.base_errors.clone();
        for (field, field_messages) in &self.errors {
            for msg in field_messages {
                messages.push(format!("{} {}", field, msg));
            }
        }
        messages
    }

    /// `Ok(())` when empty, otherwise `Err(self)`
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}
