//! Create contract for programs

use pilot_core::error::ValidationErrors;
use pilot_models::Program;

use super::base::ProgramBaseContract;
use crate::base::{Contract, UserContext, ValidationResult};

pub struct CreateProgramContract<'a, U: UserContext> {
    base: ProgramBaseContract<'a, U>,
}

impl<'a, U: UserContext> CreateProgramContract<'a, U> {
    pub fn new(user: &'a U) -> Self {
        Self {
            base: ProgramBaseContract::new(user),
        }
    }
}

impl<'a, U: UserContext> Contract<Program> for CreateProgramContract<'a, U> {
    fn validate(&self, program: &Program) -> ValidationResult {
        let mut errors = ValidationErrors::new();

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
