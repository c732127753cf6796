//! Session contracts
//!
//! Opening a session is validated against the submission it creates;
//! every later lifecycle step goes through [`SessionTransitionContract`].

mod open;
mod transition;

pub use open::{OpenSessionContract, MAX_TEMPERATURE_F, MIN_TEMPERATURE_F};
pub use transition::{SessionSnapshot, SessionTransition, SessionTransitionContract};
