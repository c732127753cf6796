//! Program services

use pilot_contracts::programs::{CreateProgramContract, DeleteProgramContract, UpdateProgramContract};
use pilot_contracts::{Contract, UserContext};
use pilot_models::{CreateProgramDto, Program, UpdateProgramDto};
use tracing::debug;

use crate::result::ServiceResult;
use crate::validate_params;

pub struct CreateProgramService<'a, U: UserContext> {
    user: &'a U,
}

impl<'a, U: UserContext> CreateProgramService<'a, U> {
    pub fn new(user: &'a U) -> Self {
        Self { user }
    }

    pub fn call(self, params: CreateProgramDto) -> ServiceResult<Program> {
        if let Err(errors) = validate_params(&params) {
            return ServiceResult::failure(errors);
        }

        let program = Program::from(params);
        if let Err(errors) = CreateProgramContract::new(self.user).validate(&program) {
            debug!(user_id = self.user.id(), errors = %errors, "program create rejected");
            return ServiceResult::failure(errors);
        }

        ServiceResult::success(program)
    }
}

pub struct UpdateProgramService<'a, U: UserContext> {
    user: &'a U,
    model: Program,
}

impl<'a, U: UserContext> UpdateProgramService<'a, U> {
    pub fn new(user: &'a U, model: Program) -> Self {
        Self { user, model }
    }

    pub fn call(mut self, params: &UpdateProgramDto) -> ServiceResult<Program> {
        if let Err(errors) = validate_params(params) {
            return ServiceResult::failure(errors);
        }
        if params.is_empty() {
            return ServiceResult::failure_with_base_error("Nothing to update");
        }

        params.apply_to(&mut self.model);

        UpdateProgramContract::new(self.user)
            .validate(&self.model)
            .map(|()| self.model)
            .into()
    }
}

/// Checks a program may be removed; the caller deletes the row
pub struct DeleteProgramService<'a, U: UserContext> {
    user: &'a U,
}

impl<'a, U: UserContext> DeleteProgramService<'a, U> {
    pub fn new(user: &'a U) -> Self {
        Self { user }
    }

    pub fn call(self, program: &Program) -> ServiceResult<()> {
        DeleteProgramContract::new(self.user).validate(program).into()
    }
}
