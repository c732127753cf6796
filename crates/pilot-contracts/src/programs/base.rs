//! Base contract for programs

use pilot_core::error::ValidationErrors;
use pilot_models::Program;

use crate::base::{validate_logged_in, validate_name, Contract, UserContext, ValidationResult};
use crate::permissions;

/// Validations shared by create and update
pub struct ProgramBaseContract<'a, U: UserContext> {
    user: &'a U,
}

impl<'a, U: UserContext> ProgramBaseContract<'a, U> {
    pub fn new(user: &'a U) -> Self {
        Self { user }
    }

    /// Reversed ranges are refused on write; the progress projection still
    /// tolerates them for rows written before this check existed.
    pub fn validate_dates(&self, program: &Program, errors: &mut ValidationErrors) {
        if program.date_range().is_reversed() {
            errors.add("end_date", "must be on or after the start date");
        }
    }

    pub fn validate_user_allowed_to_manage(&self, errors: &mut ValidationErrors) {
        validate_logged_in(self.user, errors);
        if !self.user.is_anonymous()
            && !self.user.allowed_globally(permissions::MANAGE_PROGRAMS)
        {
            errors.add_base("You are not authorized to manage programs");
        }
    }

    pub fn user(&self) -> &'a U {
        self.user
    }
}

impl<'a, U: UserContext> Contract<Program> for ProgramBaseContract<'a, U> {
    fn validate(&self, program: &Program) -> ValidationResult {
        let mut errors = ValidationErrors::new();

        validate_name(&program.name, &mut errors);
        self.validate_dates(program, &mut errors);
        if let Some(ref description) = program.description {
            if description.chars().count() > 10_000 {
                errors.add("description", "is too long (maximum is 10000 characters)");
            }
        }

        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockUser;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_valid_program() {
        let user = MockUser::admin(1);
        let contract = ProgramBaseContract::new(&user);
        let program = Program::new("Cold chain", date(2025, 1, 1), date(2025, 1, 10));
        assert!(contract.validate(&program).is_ok());
    }

    #[test]
    fn test_single_day_program_is_valid() {
        let user = MockUser::admin(1);
        let contract = ProgramBaseContract::new(&user);
        let program = Program::new("Spot check", date(2025, 1, 1), date(2025, 1, 1));
        assert!(contract.validate(&program).is_ok());
    }

    #[test]
    fn test_reversed_dates() {
        let user = MockUser::admin(1);
        let contract = ProgramBaseContract::new(&user);
        let program = Program::new("Backwards", date(2025, 1, 10), date(2025, 1, 1));

        let errors = contract.validate(&program).unwrap_err();
        assert!(errors.has_error("end_date"));
    }

    #[test]
    fn test_blank_name() {
        let user = MockUser::admin(1);
        let contract = ProgramBaseContract::new(&user);
        let program = Program::new("", date(2025, 1, 1), date(2025, 1, 10));
        assert!(contract.validate(&program).unwrap_err().has_error("name"));
    }
}
