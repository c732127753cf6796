//! # pilot-core
//!
//! Core types, traits, and utilities for the pilot program monitor.
//!
//! This crate provides the foundational building blocks used across all other crates:
//! - Common error types
//! - Result type aliases
//! - Core traits (Entity, Identifiable, Timestamped)
//! - Pagination types
//! - The clock capability used for date-dependent projections
//! - Configuration types

pub mod clock;
pub mod config;
pub mod error;
pub mod pagination;
pub mod result;
pub mod traits;
pub mod types;

pub use clock::*;
pub use error::*;
pub use pagination::*;
pub use result::*;
pub use traits::*;
pub use types::*;
