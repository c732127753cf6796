//! # pilot-db
//!
//! Database layer for the pilot program monitor.
//!
//! PostgreSQL access through SQLx:
//!
//! - Connection pool management and embedded migrations
//! - Repositories for programs, sites, submissions, petri samples and
//!   submission sessions
//! - The "active sessions with details" join
//!
//! ## Example
//!
//! ```ignore
//! use pilot_db::{Database, DatabaseConfig, ProgramRepository, Repository};
//!
//! let db = Database::connect(&DatabaseConfig::from(&app_config.database)).await?;
//! db.migrate().await?;
//!
//! let programs = ProgramRepository::new(db.pool().clone());
//! let program = programs.find_by_id(1).await?;
//! ```

pub mod petri_samples;
pub mod pool;
pub mod programs;
pub mod repository;
pub mod sessions;
pub mod sites;
pub mod submissions;

pub use petri_samples::{PetriCounts, PetriSampleRepository, PetriSampleRow};
pub use pool::{Database, DatabaseConfig, PoolStats};
pub use programs::{ProgramRepository, ProgramRow};
pub use repository::{
    Pagination, PaginatedResult, Repository, RepositoryError, RepositoryResult,
};
pub use sessions::{SessionDetailsRow, SessionRepository, SessionRow};
pub use sites::{SiteRepository, SiteRow};
pub use submissions::{SubmissionRepository, SubmissionRow};
