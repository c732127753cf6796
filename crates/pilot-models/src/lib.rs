//! # pilot-models
//!
//! Domain models for the pilot program monitor.
//!
//! Programs contain sites; a session opened at a site owns one submission,
//! and a submission records petri samples. Each model implements the core
//! traits from `pilot-core` (Entity, Identifiable, Timestamped).

pub use pilot_core::traits::{Entity, Id, Identifiable, ProgramScoped, Timestamped};

pub mod petri_sample;
pub mod program;
pub mod progress;
pub mod session;
pub mod site;
pub mod submission;
mod validation;

pub use petri_sample::{CreatePetriSampleDto, PetriSample, UpdatePetriSampleDto, WaterSchedule};
pub use program::{CreateProgramDto, Program, ProgramStatus, ProgramWithProgress, UpdateProgramDto};
pub use progress::{round_percentage, session_percentage, ProgramProgress};
pub use session::{SessionDetails, SessionStatus, SubmissionSession};
pub use site::{CreateSiteDto, Site, SiteType, UpdateSiteDto};
pub use submission::{Airflow, CreateSubmissionDto, OdorDistance, Submission, Weather};
pub use validation::{validation_errors_from, ParseEnumError};
