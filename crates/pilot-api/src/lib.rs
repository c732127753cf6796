//! # pilot-api
//!
//! JSON API for the pilot program monitor, mounted under `/api/v1`.
//!
//! Handlers load what a service needs from the repositories, run the
//! service, then persist its result. Collections and errors use the HAL
//! style envelopes from `pilot-core`.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod routes;

pub use error::{ApiError, ApiResult};
pub use extractors::AppState;
pub use routes::router;
