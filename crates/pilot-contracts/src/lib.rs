//! # pilot-contracts
//!
//! Contract validation for the pilot program monitor.
//!
//! Contracts validate entities before create/update operations and check
//! the acting user's permissions. Failures accumulate into
//! `ValidationErrors` rather than stopping at the first problem.

pub mod base;
pub mod permissions;
pub mod petri_samples;
pub mod programs;
pub mod sessions;
pub mod sites;

#[cfg(test)]
pub(crate) mod test_support;

pub use base::*;
