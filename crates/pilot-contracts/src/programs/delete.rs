//! Delete contract for programs

use pilot_core::error::ValidationErrors;
use pilot_models::Program;

use super::base::ProgramBaseContract;
use crate::base::{Contract, UserContext, ValidationResult};

pub struct DeleteProgramContract<'a, U: UserContext> {
    base: ProgramBaseContract<'a, U>,
}

impl<'a, U: UserContext> DeleteProgramContract<'a, U> {
    pub fn new(user: &'a U) -> Self {
        Self {
            base: ProgramBaseContract::new(user),
        }
    }
}

impl<'a, U: UserContext> Contract<Program> for DeleteProgramContract<'a, U> {
    fn validate(&self, program: &Program) -> ValidationResult {
        let mut errors = ValidationErrors::new();

        self.base.validate_user_allowed_to_manage(&mut errors);

        if program.total_sites > 0 {
            errors.add_base(format!(
                "Program still has {} site(s); remove them first",
                program.total_sites
            ));
        }

        errors.into_result()
    }

    fn is_writable(&self, _attribute: &str) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockUser;
    use chrono::NaiveDate;

    fn program(total_sites: i64) -> Program {
        let mut program = Program::new(
            "Cold chain",
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
        );
        program.id = Some(1);
        program.total_sites = total_sites;
        program
    }

    #[test]
    fn test_delete_empty_program() {
        let user = MockUser::admin(1);
        assert!(DeleteProgramContract::new(&user).validate(&program(0)).is_ok());
    }

    #[test]
    fn test_delete_with_sites_refused() {
        let user = MockUser::admin(1);
        let errors = DeleteProgramContract::new(&user)
            .validate(&program(2))
            .unwrap_err();
        assert!(errors.has_base_error());
    }
}
