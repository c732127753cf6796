//! # pilot-auth
//!
//! Authentication and authorization for the pilot program monitor.
//!
//! Requests carry an HS256 bearer token; its claims become a [`CurrentUser`]
//! that the contracts consult for permission checks.

pub mod jwt;
pub mod user;

pub use jwt::{extract_bearer_token, Claims, JwtError, JwtService, Role};
pub use user::CurrentUser;
