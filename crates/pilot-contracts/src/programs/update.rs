//! Update contract for programs

use pilot_core::error::ValidationErrors;
use pilot_models::Program;

use super::base::ProgramBaseContract;
use crate::base::{Contract, UserContext, ValidationResult};

pub struct UpdateProgramContract<'a, U: UserContext> {
    base: ProgramBaseContract<'a, U>,
}

impl<'a, U: UserContext> UpdateProgramContract<'a, U> {
    pub fn new(user: &'a U) -> Self {
        Self {
            base: ProgramBaseContract::new(user),
        }
    }
}

impl<'a, U: UserContext> Contract<Program> for UpdateProgramContract<'a, U> {
    fn validate(&self, program: &Program) -> ValidationResult {
        let mut errors = ValidationErrors::new();

        if program.id.is_none() {
            errors.add_base("Program must be persisted before it can be updated");
        }

        self.base.validate_user_allowed_to_manage(&mut errors);

        if let Err(base_errors) = self.base.validate(program) {
            errors.merge(base_errors);
        }

        errors.into_result()
    }

    fn is_writable(&self, attribute: &str) -> bool {
        matches!(
            attribute,
            "name" | "description" | "status" | "start_date" | "end_date"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockUser;
    use chrono::NaiveDate;

    fn persisted() -> Program {
        let mut program = Program::new(
            "Cold chain",
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
        );
        program.id = Some(3);
        program
    }

    #[test]
    fn test_update_persisted() {
        let user = MockUser::admin(1);
        assert!(UpdateProgramContract::new(&user).validate(&persisted()).is_ok());
    }

    #[test]
    fn test_update_new_record_fails() {
        let user = MockUser::admin(1);
        let mut program = persisted();
        program.id = None;
        assert!(UpdateProgramContract::new(&user).validate(&program).is_err());
    }

    #[test]
    fn test_update_reversing_dates_fails() {
        let user = MockUser::admin(1);
        let mut program = persisted();
        program.end_date = NaiveDate::from_ymd_opt(2024, 12, 1).unwrap();
        let errors = UpdateProgramContract::new(&user).validate(&program).unwrap_err();
        assert!(errors.has_error("end_date"));
    }
}
