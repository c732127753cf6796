//! Result type aliases

use crate::error::PilotError;

/// Standard Result type for pilot program operations
pub type PilotResult<T> = Result<T, PilotError>;
