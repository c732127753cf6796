//! The authenticated user
//!
//! Built from token claims once per request and handed to contracts as a
//! [`UserContext`].

use std::collections::{HashMap, HashSet};

use pilot_contracts::UserContext;
use pilot_core::traits::Id;

use crate::jwt::{Claims, JwtError, Role};

#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Id,
    pub email: Option<String>,
    pub is_admin: bool,
    pub is_anonymous: bool,
    global_permissions: HashSet<String>,
    program_permissions: HashMap<Id, HashSet<String>>,
}

impl CurrentUser {
    pub fn new(id: Id) -> Self {
        Self {
            id,
            email: None,
            is_admin: false,
            is_anonymous: false,
            global_permissions: HashSet::new(),
            program_permissions: HashMap::new(),
        }
    }

    /// Read-only identity used when authentication is optional
    pub fn anonymous() -> Self {
        Self {
            is_anonymous: true,
            ..Self::new(0)
        }
    }

    pub fn admin(id: Id) -> Self {
        Self {
            is_admin: true,
            ..Self::new(id)
        }
    }

    pub fn from_claims(claims: &Claims) -> Result<Self, JwtError> {
        let mut user = Self::new(claims.user_id()?);
        user.email = claims.email.clone();
        user.is_admin = claims.role == Role::Admin;
        user.global_permissions = claims.permissions.iter().cloned().collect();
        user.program_permissions = claims
            .program_permissions
            .iter()
            .map(|(program_id, perms)| (*program_id, perms.iter().cloned().collect()))
            .collect();
        Ok(user)
    }

    pub fn add_global_permission(&mut self, permission: impl Into<String>) {
        self.global_permissions.insert(permission.into());
    }

    pub fn add_program_permission(&mut self, program_id: Id, permission: impl Into<String>) {
        self.program_permissions
            .entry(program_id)
            .or_default()
            .insert(permission.into());
    }
}

impl UserContext for CurrentUser {
    fn id(&self) -> Id {
        self.id
    }

    fn is_admin(&self) -> bool {
        self.is_admin
    }

    fn is_anonymous(&self) -> bool {
        self.is_anonymous
    }

    fn allowed_globally(&self, permission: &str) -> bool {
        self.is_admin || self.global_permissions.contains(permission)
    }

    fn allowed_in_program(&self, permission: &str, program_id: Id) -> bool {
        if self.allowed_globally(permission) {
            return true;
        }
        self.program_permissions
            .get(&program_id)
            .is_some_and(|perms| perms.contains(permission))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pilot_contracts::permissions;

    #[test]
    fn test_from_claims() {
        let mut claims =
            Claims::new(7, Role::User, 3600).with_permissions([permissions::VIEW_PROGRAMS]);
        claims
            .program_permissions
            .insert(3, vec![permissions::SUBMIT_DATA.to_string()]);

        let user = CurrentUser::from_claims(&claims).unwrap();
        assert_eq!(user.id(), 7);
        assert!(!user.is_admin());
        assert!(user.allowed_globally(permissions::VIEW_PROGRAMS));
        assert!(user.allowed_in_program(permissions::SUBMIT_DATA, 3));
        assert!(!user.allowed_in_program(permissions::SUBMIT_DATA, 4));
    }

    #[test]
    fn test_admin_claims() {
        let claims = Claims::new(1, Role::Admin, 3600);
        let user = CurrentUser::from_claims(&claims).unwrap();
        assert!(user.allowed_globally(permissions::MANAGE_PROGRAMS));
        assert!(user.allowed_in_program(permissions::SUBMIT_DATA, 99));
    }

    #[test]
    fn test_invalid_subject() {
        let mut claims = Claims::new(1, Role::User, 3600);
        claims.sub = "not-a-number".into();
        assert!(CurrentUser::from_claims(&claims).is_err());
    }

    #[test]
    fn test_anonymous_has_no_permissions() {
        let user = CurrentUser::anonymous();
        assert!(user.is_anonymous());
        assert!(!user.allowed_globally(permissions::VIEW_PROGRAMS));
    }
}
