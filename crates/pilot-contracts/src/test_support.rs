use std::collections::HashSet;

use pilot_core::traits::Id;

use crate::base::UserContext;

pub struct MockUser {
    pub id: Id,
    pub admin: bool,
    pub anonymous: bool,
    pub global_permissions: HashSet<String>,
}

impl MockUser {
    pub fn admin(id: Id) -> Self {
        Self {
            id,
            admin: true,
            anonymous: false,
            global_permissions: HashSet::new(),
        }
    }

    pub fn with_permissions(id: Id, permissions: &[&str]) -> Self {
        Self {
            id,
            admin: false,
            anonymous: false,
            global_permissions: permissions.iter().map(|p| p.to_string()).collect(),
        }
    }

    pub fn anonymous() -> Self {
        Self {
            id: 0,
            admin: false,
            anonymous: true,
            global_permissions: HashSet::new(),
        }
    }
}

impl UserContext for MockUser {
    fn id(&self) -> Id {
        self.id
    }

    fn is_admin(&self) -> bool {
        self.admin
    }

    fn is_anonymous(&self) -> bool {
        self.anonymous
    }

    fn allowed_globally(&self, permission: &str) -> bool {
        self.admin || self.global_permissions.contains(permission)
    }
}
