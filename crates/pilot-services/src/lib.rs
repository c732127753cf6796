//! # pilot-services
//!
//! Business logic services for the pilot program monitor.
//!
//! Services follow one shape: apply the caller's parameters to a model,
//! run the matching contract, and report a [`ServiceResult`]. They never
//! touch the database; the API layer loads inputs and persists outputs.

pub mod petri_samples;
pub mod programs;
pub mod result;
pub mod sessions;
pub mod sites;

pub use result::ServiceResult;

use pilot_core::error::ValidationErrors;
use validator::Validate;

/// Run the DTO's field validations and convert the outcome
pub(crate) fn validate_params<T: Validate>(params: &T) -> Result<(), ValidationErrors> {
    params
        .validate()
        .map_err(pilot_models::validation_errors_from)
}
