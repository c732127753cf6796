//! API request handlers
//!
//! Reads check `can_view_program`; writes check the permission the action
//! needs before the service runs, so a missing grant is a 403 and not a
//! constraint violation.

pub mod petri_samples;
pub mod programs;
pub mod sessions;
pub mod sites;
pub mod submissions;

use pilot_auth::CurrentUser;
use pilot_contracts::permissions::can_view_program;
use pilot_contracts::UserContext;
use pilot_core::traits::Id;
use serde::Serialize;

use crate::error::{ApiError, ApiResult};
use crate::extractors::HalResponse;

/// A single resource: the model's own fields plus `_type`
#[derive(Debug, Serialize)]
pub struct Resource<T: Serialize> {
    #[serde(rename = "_type")]
    pub type_name: &'static str,
    #[serde(flatten)]
    pub body: T,
}

impl<T: Serialize> Resource<T> {
    pub fn new(type_name: &'static str, body: T) -> Self {
        Self { type_name, body }
    }
}

pub(crate) fn resource<T: Serialize>(type_name: &'static str, body: T) -> HalResponse<Resource<T>> {
    HalResponse(Resource::new(type_name, body))
}

pub(crate) fn require_logged_in(user: &CurrentUser) -> ApiResult<()> {
    if user.is_anonymous() {
        return Err(ApiError::unauthorized("You need to be logged in"));
    }
    Ok(())
}

/// Logged in and holding `permission` in `program_id`
pub(crate) fn require_permission(
    user: &CurrentUser,
    permission: &str,
    program_id: Id,
) -> ApiResult<()> {
    require_logged_in(user)?;
    if !user.allowed_in_program(permission, program_id) {
        tracing::debug!(user_id = user.id, permission, program_id, "permission denied");
        return Err(ApiError::forbidden(format!(
            "You are missing the {} permission",
            permission
        )));
    }
    Ok(())
}

pub(crate) fn require_view(user: &CurrentUser, program_id: Id) -> ApiResult<()> {
    if !can_view_program(user, program_id) {
        return Err(ApiError::forbidden("You are not allowed to see this program"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pilot_contracts::permissions::{MANAGE_PROGRAMS, SUBMIT_DATA};

    #[test]
    fn test_anonymous_writes_are_unauthenticated() {
        let result = require_permission(&CurrentUser::anonymous(), SUBMIT_DATA, 1);
        assert!(matches!(result, Err(ApiError::Unauthorized(_))));
        assert!(require_view(&CurrentUser::anonymous(), 1).is_ok());
    }

    #[test]
    fn test_program_grant_is_scoped() {
        let mut user = CurrentUser::new(5);
        user.add_program_permission(1, MANAGE_PROGRAMS);

        assert!(require_permission(&user, MANAGE_PROGRAMS, 1).is_ok());
        assert!(matches!(
            require_permission(&user, MANAGE_PROGRAMS, 2),
            Err(ApiError::Forbidden(_))
        ));
        assert!(require_view(&user, 1).is_ok());
        assert!(require_view(&user, 2).is_err());
    }

    #[test]
    fn test_resource_flattens_body() {
        #[derive(Serialize)]
        struct Body {
            name: &'static str,
        }
        let json = serde_json::to_value(Resource::new("Site", Body { name: "Dock" })).unwrap();
        assert_eq!(json["_type"], "Site");
        assert_eq!(json["name"], "Dock");
    }
}
