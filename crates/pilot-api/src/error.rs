//! API error handling
//!
//! Every failure leaves the API as a HAL error object:
//! `{ "_type": "Error", "errorIdentifier": "...", "message": "..." }`.

use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pilot_auth::JwtError;
use pilot_core::error::{PilotError, ValidationErrors};
use pilot_db::RepositoryError;
use serde::Serialize;

const URN_PREFIX: &str = "urn:pilot:api:v1:errors:";

#[derive(Debug)]
pub enum ApiError {
    NotFound { resource: &'static str, id: String },
    Validation(ValidationErrors),
    Unauthorized(String),
    Forbidden(String),
    BadRequest(String),
    Conflict(String),
    Internal(String),
    /// No database configured, or the pool is unusable
    ServiceUnavailable(String),
}

impl ApiError {
    pub fn not_found(resource: &'static str, id: impl std::fmt::Display) -> Self {
        ApiError::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        ApiError::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        ApiError::Forbidden(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        ApiError::BadRequest(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        ApiError::Conflict(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError::Internal(msg.into())
    }

    pub fn service_unavailable(msg: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn identifier(&self) -> &'static str {
        match self {
            ApiError::NotFound { .. } => "NotFound",
            ApiError::Validation(_) => "PropertyConstraintViolation",
            ApiError::Unauthorized(_) => "Unauthenticated",
            ApiError::Forbidden(_) => "MissingPermission",
            ApiError::BadRequest(_) => "InvalidRequestBody",
            ApiError::Conflict(_) => "UpdateConflict",
            ApiError::Internal(_) => "InternalError",
            ApiError::ServiceUnavailable(_) => "ServiceUnavailable",
        }
    }
}

#[derive(Serialize)]
struct HalError {
    #[serde(rename = "_type")]
    type_name: &'static str,
    #[serde(rename = "errorIdentifier")]
    error_identifier: String,
    message: String,
    /// Per attribute messages for constraint violations
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<BTreeMap<String, Vec<String>>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_identifier = format!("{}{}", URN_PREFIX, self.identifier());

        let (message, details) = match self {
            ApiError::NotFound { resource, id } => {
                (format!("{} with id {} not found", resource, id), None)
            }
            ApiError::Validation(errors) => {
                let message = errors.full_messages().join(", ");
                let details = (!errors.errors.is_empty()).then_some(errors.errors);
                (message, details)
            }
            ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Conflict(msg)
            | ApiError::Internal(msg)
            | ApiError::ServiceUnavailable(msg) => (msg, None),
        };

        let body = HalError {
            type_name: "Error",
            error_identifier,
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Validation(errors)
    }
}

impl From<PilotError> for ApiError {
    fn from(err: PilotError) -> Self {
        match err {
            PilotError::NotFound { entity, value, .. } => ApiError::NotFound {
                resource: entity,
                id: value,
            },
            PilotError::Unauthorized { message } => ApiError::Unauthorized(message),
            PilotError::Forbidden { message } => ApiError::Forbidden(message),
            PilotError::Validation(errors) => ApiError::Validation(errors),
            PilotError::Conflict { message } => ApiError::Conflict(message),
            PilotError::Database(message) => {
                tracing::error!(error = %message, "database error");
                ApiError::internal("Database error")
            }
            PilotError::Internal(message) | PilotError::Config(message) => {
                tracing::error!(error = %message, "internal error");
                ApiError::internal("Internal server error")
            }
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        PilotError::from(err).into()
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        ApiError::Unauthorized(err.to_string())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
