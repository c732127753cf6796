//! Site contracts
//!
//! Sites are managed by program managers; a site can only be added while its
//! program is active.

use pilot_core::error::ValidationErrors;
use pilot_models::{Program, Site};

use crate::base::{validate_logged_in, validate_name, Contract, UserContext, ValidationResult};
use crate::permissions;

fn validate_site_attributes(site: &Site, program: &Program, errors: &mut ValidationErrors) {
    validate_name(&site.name, errors);

    if site.total_petris < 0 {
        errors.add("total_petris", "must be greater than or equal to 0");
    }

    if Some(site.program_id) != program.id {
        errors.add("program_id", "does not match the enclosing program");
    }
}

fn validate_manager<U: UserContext>(user: &U, program: &Program, errors: &mut ValidationErrors) {
    validate_logged_in(user, errors);
    if user.is_anonymous() {
        return;
    }

    let allowed = program
        .id
        .map(|id| user.allowed_in_program(permissions::MANAGE_PROGRAMS, id))
        .unwrap_or(false);
    if !allowed {
        errors.add_base("You are not authorized to manage sites of this program");
    }
}

pub struct CreateSiteContract<'a, U: UserContext> {
    user: &'a U,
    program: &'a Program,
}

impl<'a, U: UserContext> CreateSiteContract<'a, U> {
    pub fn new(user: &'a U, program: &'a Program) -> Self {
        Self { user, program }
    }
}

impl<'a, U: UserContext> Contract<Site> for CreateSiteContract<'a, U> {
    fn validate(&self, site: &Site) -> ValidationResult {
        let mut errors = ValidationErrors::new();

        validate_manager(self.user, self.program, &mut errors);

        if !self.program.is_active() {
            errors.add_base("Sites can only be added to an active program");
        }

        validate_site_attributes(site, self.program, &mut errors);

        errors.into_result()
    }

    fn is_writable(&self, attribute: &str) -> bool {
        matches!(
            attribute,
            "name" | "site_type" | "description" | "total_petris"
        )
    }
}

pub struct UpdateSiteContract<'a, U: UserContext> {
    user: &'a U,
    program: &'a Program,
}

impl<'a, U: UserContext> UpdateSiteContract<'a, U> {
    pub fn new(user: &'a U, program: &'a Program) -> Self {
        Self { user, program }
    }
}

impl<'a, U: UserContext> Contract<Site> for UpdateSiteContract<'a, U> {
    fn validate(&self, site: &Site) -> ValidationResult {
        let mut errors = ValidationErrors::new();

        if site.id.is_none() {
            errors.add_base("Site must be persisted before it can be updated");
        }

        validate_manager(self.user, self.program, &mut errors);
        validate_site_attributes(site, self.program, &mut errors);

        errors.into_result()
    }

    fn is_writable(&self, attribute: &str) -> bool {
        matches!(
            attribute,
            "name" | "site_type" | "description" | "total_petris"
        )
    }
}
