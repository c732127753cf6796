//! Permission names checked by contracts

use pilot_core::traits::Id;

use crate::base::UserContext;

/// Create, update and delete programs and their sites
pub const MANAGE_PROGRAMS: &str = "manage_programs";

/// Read programs, sites and sessions
pub const VIEW_PROGRAMS: &str = "view_programs";

/// Open sessions and record petri samples
pub const SUBMIT_DATA: &str = "submit_data";

pub fn all() -> &'static [&'static str] {
    &[MANAGE_PROGRAMS, VIEW_PROGRAMS, SUBMIT_DATA]
}

pub fn is_known(permission: &str) -> bool {
    all().contains(&permission)
}

/// Read access to a program and everything under it.
///
/// Anonymous users only get this far when authentication is optional, so
/// they may read; signed-in users need any of the program grants.
pub fn can_view_program<U: UserContext>(user: &U, program_id: Id) -> bool {
    user.is_anonymous()
        || all()
            .iter()
            .any(|permission| user.allowed_in_program(permission, program_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockUser;

    #[test]
    fn test_any_grant_allows_viewing() {
        assert!(can_view_program(&MockUser::with_permissions(2, &[SUBMIT_DATA]), 1));
        assert!(can_view_program(&MockUser::with_permissions(2, &[VIEW_PROGRAMS]), 1));
        assert!(can_view_program(&MockUser::anonymous(), 1));
        assert!(!can_view_program(&MockUser::with_permissions(2, &[]), 1));
    }

    #[test]
    fn test_is_known() {
        assert!(is_known("manage_programs"));
        assert!(!is_known("delete_everything"));
    }
}
