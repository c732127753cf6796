//! Site services

use pilot_contracts::sites::{CreateSiteContract, UpdateSiteContract};
use pilot_contracts::{Contract, UserContext};
use pilot_models::{CreateSiteDto, Program, Site, UpdateSiteDto};

use crate::result::ServiceResult;
use crate::validate_params;

pub struct CreateSiteService<'a, U: UserContext> {
    user: &'a U,
    program: &'a Program,
}

impl<'a, U: UserContext> CreateSiteService<'a, U> {
    pub fn new(user: &'a U, program: &'a Program) -> Self {
        Self { user, program }
    }

    pub fn call(self, params: CreateSiteDto) -> ServiceResult<Site> {
        if let Err(errors) = validate_params(&params) {
            return ServiceResult::failure(errors);
        }
        let Some(program_id) = self.program.id else {
            return ServiceResult::failure_with_base_error("Program must be persisted");
        };

        let site = params.into_site(program_id);
        CreateSiteContract::new(self.user, self.program)
            .validate(&site)
            .map(|()| site)
            .into()
    }
}

pub struct UpdateSiteService<'a, U: UserContext> {
    user: &'a U,
    program: &'a Program,
    model: Site,
}

impl<'a, U: UserContext> UpdateSiteService<'a, U> {
    pub fn new(user: &'a U, program: &'a Program, model: Site) -> Self {
        Self {
            user,
            program,
            model,
        }
    }

    pub fn call(mut self, params: &UpdateSiteDto) -> ServiceResult<Site> {
        if let Err(errors) = validate_params(params) {
            return ServiceResult::failure(errors);
        }

        params.apply_to(&mut self.model);

        UpdateSiteContract::new(self.user, self.program)
            .validate(&self.model)
            .map(|()| self.model)
            .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pilot_auth::CurrentUser;
    use pilot_models::SiteType;

    fn program() -> Program {
        let mut program = Program::new(
            "Cold chain",
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
        );
        program.id = Some(1);
        program
    }

    #[test]
    fn test_create_site() {
        let user = CurrentUser::admin(1);
        let program = program();
        let params: CreateSiteDto = serde_json::from_value(serde_json::json!({
            "name": "Dock 4",
            "siteType": "transport",
            "totalPetris": 6
        }))
        .unwrap();

        let result = CreateSiteService::new(&user, &program).call(params);
        let site = result.result().unwrap();
        assert_eq!(site.program_id, 1);
        assert_eq!(site.site_type, SiteType::Transport);
        assert_eq!(site.total_petris, 6);
    }

    #[test]
    fn test_create_site_unsaved_program() {
        let user = CurrentUser::admin(1);
        let mut program = program();
        program.id = None;
        let params: CreateSiteDto =
            serde_json::from_value(serde_json::json!({ "name": "Dock 4" })).unwrap();
        assert!(CreateSiteService::new(&user, &program).call(params).is_failure());
    }

    #[test]
    fn test_update_site_petri_count() {
        let user = CurrentUser::admin(1);
        let program = program();
        let mut site = Site::new(1, "Dock 4");
        site.id = Some(8);

        let params = UpdateSiteDto {
            total_petris: Some(12),
            ..Default::default()
        };
        let result = UpdateSiteService::new(&user, &program, site).call(&params);
        assert_eq!(result.result().map(|s| s.total_petris), Some(12));
    }

    #[test]
    fn test_update_site_out_of_range() {
        let user = CurrentUser::admin(1);
        let program = program();
        let mut site = Site::new(1, "Dock 4");
        site.id = Some(8);

        let params = UpdateSiteDto {
            total_petris: Some(5000),
            ..Default::default()
        };
        let result = UpdateSiteService::new(&user, &program, site).call(&params);
        assert!(result.errors().has_error("total_petris"));
    }
}
