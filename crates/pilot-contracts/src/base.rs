//! Base contract system

use pilot_core::error::ValidationErrors;
use pilot_core::traits::Id;

/// Result of contract validation
pub type ValidationResult = Result<(), ValidationErrors>;

/// The acting user, as contracts see it
pub trait UserContext: Send + Sync {
    fn id(&self) -> Id;
    fn is_admin(&self) -> bool;
    fn is_anonymous(&self) -> bool;
    fn allowed_globally(&self, permission: &str) -> bool;

    /// Program-scoped check; grants are global unless overridden
    fn allowed_in_program(&self, permission: &str, program_id: Id) -> bool {
        let _ = program_id;
        self.is_admin() || self.allowed_globally(permission)
    }
}

/// Base contract trait
pub trait Contract<T>: Send + Sync {
    /// Validate the entity
    fn validate(&self, entity: &T) -> ValidationResult;

    /// Check if an attribute is writable
    fn is_writable(&self, _attribute: &str) -> bool {
        true
    }
}

/// Shared name check used by program and site contracts
pub(crate) fn validate_name(name: &str, errors: &mut ValidationErrors) {
    if name.trim().is_empty() {
        errors.add("name", "can't be blank");
    } else if name.chars().count() > 255 {
        errors.add("name", "is too long (maximum is 255 characters)");
    }
}

/// Anonymous users can read but never write
pub(crate) fn validate_logged_in<U: UserContext>(user: &U, errors: &mut ValidationErrors) {
    if user.is_anonymous() {
        errors.add_base("You need to be logged in");
    }
}
