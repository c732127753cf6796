//! Petri sample services

use pilot_contracts::petri_samples::{CreatePetriSampleContract, UpdatePetriSampleContract};
use pilot_contracts::sessions::SessionSnapshot;
use pilot_contracts::{Contract, UserContext};
use pilot_models::{CreatePetriSampleDto, PetriSample, UpdatePetriSampleDto};

use crate::result::ServiceResult;
use crate::validate_params;

pub struct AddPetriSampleService<'a, U: UserContext> {
    user: &'a U,
    snapshot: &'a SessionSnapshot,
    existing_samples: i64,
}

impl<'a, U: UserContext> AddPetriSampleService<'a, U> {
    pub fn new(user: &'a U, snapshot: &'a SessionSnapshot, existing_samples: i64) -> Self {
        Self {
            user,
            snapshot,
            existing_samples,
        }
    }

    pub fn call(self, params: CreatePetriSampleDto) -> ServiceResult<PetriSample> {
        if let Err(errors) = validate_params(&params) {
            return ServiceResult::failure(errors);
        }

        let session = &self.snapshot.session;
        let sample = params.into_sample(session.submission_id, session.site_id);

        CreatePetriSampleContract::new(self.user, self.snapshot, self.existing_samples)
            .validate(&sample)
            .map(|()| sample)
            .into()
    }
}

pub struct UpdatePetriSampleService<'a, U: UserContext> {
    user: &'a U,
    snapshot: &'a SessionSnapshot,
    model: PetriSample,
}

impl<'a, U: UserContext> UpdatePetriSampleService<'a, U> {
    pub fn new(user: &'a U, snapshot: &'a SessionSnapshot, model: PetriSample) -> Self {
        Self {
            user,
            snapshot,
            model,
        }
    }

    pub fn call(mut self, params: &UpdatePetriSampleDto) -> ServiceResult<PetriSample> {
        if let Err(errors) = validate_params(params) {
            return ServiceResult::failure(errors);
        }

        params.apply_to(&mut self.model);

        UpdatePetriSampleContract::new(self.user, self.snapshot)
            .validate(&self.model)
            .map(|()| self.model)
            .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use pilot_auth::CurrentUser;
    use pilot_contracts::permissions;
    use pilot_models::{SessionStatus, SubmissionSession};

    fn worker() -> CurrentUser {
        let mut user = CurrentUser::new(42);
        user.add_global_permission(permissions::SUBMIT_DATA);
        user
    }

    fn snapshot() -> SessionSnapshot {
        let started = Utc.with_ymd_and_hms(2025, 1, 5, 9, 0, 0).unwrap();
        let mut session = SubmissionSession::open(100, 10, 1, 42, started);
        session.session_status = SessionStatus::Working;
        SessionSnapshot {
            session,
            today: NaiveDate::from_ymd_opt(2025, 1, 5).unwrap(),
            expiry_enabled: true,
            expected_petris: 2,
            complete_petris: 0,
        }
    }

    #[test]
    fn test_add_sample() {
        let user = worker();
        let snapshot = snapshot();
        let params: CreatePetriSampleDto = serde_json::from_value(serde_json::json!({
            "petriCode": "P-01",
            "fungicideUsed": true,
            "surroundingWaterSchedule": "twice_daily"
        }))
        .unwrap();

        let sample = AddPetriSampleService::new(&user, &snapshot, 0)
            .call(params)
            .into_result()
            .unwrap();
        assert_eq!(sample.submission_id, 100);
        assert_eq!(sample.site_id, 10);
        assert!(sample.fungicide_used);
    }

    #[test]
    fn test_add_sample_over_expected() {
        let user = worker();
        let snapshot = snapshot();
        let params: CreatePetriSampleDto =
            serde_json::from_value(serde_json::json!({ "petriCode": "P-03" })).unwrap();
        assert!(AddPetriSampleService::new(&user, &snapshot, 2).call(params).is_failure());
    }

    #[test]
    fn test_attach_image() {
        let user = worker();
        let snapshot = snapshot();
        let mut sample = serde_json::from_value::<CreatePetriSampleDto>(
            serde_json::json!({ "petriCode": "P-01" }),
        )
        .unwrap()
        .into_sample(100, 10);
        sample.id = Some(5);
        sample.notes = Some("edge of bench".into());

        let params = UpdatePetriSampleDto {
            image_url: Some("https://img.example.com/p-01.jpg".into()),
            ..Default::default()
        };
        let updated = UpdatePetriSampleService::new(&user, &snapshot, sample)
            .call(&params)
            .into_result()
            .unwrap();
        assert!(updated.is_complete());
        assert_eq!(updated.notes.as_deref(), Some("edge of bench"));
    }

    #[test]
    fn test_invalid_image_url() {
        let user = worker();
        let snapshot = snapshot();
        let mut sample = serde_json::from_value::<CreatePetriSampleDto>(
            serde_json::json!({ "petriCode": "P-01" }),
        )
        .unwrap()
        .into_sample(100, 10);
        sample.id = Some(5);

        let params = UpdatePetriSampleDto {
            image_url: Some("photo".into()),
            ..Default::default()
        };
        let result = UpdatePetriSampleService::new(&user, &snapshot, sample).call(&params);
        assert!(result.errors().has_error("image_url"));
    }
}
