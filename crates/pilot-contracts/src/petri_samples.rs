//! Petri sample contracts
//!
//! Samples may only be recorded or edited while their session is live.

use std::sync::LazyLock;

use pilot_core::error::ValidationErrors;
use pilot_models::PetriSample;
use regex::Regex;

use crate::base::{validate_logged_in, Contract, UserContext, ValidationResult};
use crate::permissions;
use crate::sessions::SessionSnapshot;

/// Petri codes are printed on the dish label, e.g. `P-01` or `GH2_A`
static PETRI_CODE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]*$").unwrap());

fn validate_sample<U: UserContext>(
    user: &U,
    sample: &PetriSample,
    snapshot: &SessionSnapshot,
    errors: &mut ValidationErrors,
) {
    validate_logged_in(user, errors);
    if !user.is_anonymous()
        && !user.allowed_in_program(permissions::SUBMIT_DATA, snapshot.session.program_id)
    {
        errors.add_base("You are not authorized to submit data in this program");
    }

    let status = snapshot.effective_status();
    if !status.is_active() {
        errors.add_base(format!("Session is {status}"));
    }

    if sample.submission_id != snapshot.session.submission_id {
        errors.add("submission_id", "does not belong to the session");
    }

    let code = sample.petri_code.as_str();
    if code.is_empty() {
        errors.add("petri_code", "can't be blank");
    } else if code.chars().count() > 50 {
        errors.add("petri_code", "is too long (maximum is 50 characters)");
    } else if !PETRI_CODE_PATTERN.is_match(code) {
        errors.add(
            "petri_code",
            "may only contain letters, digits, dashes and underscores",
        );
    }

    if sample.plant_type.trim().is_empty() {
        errors.add("plant_type", "can't be blank");
    }
}

pub struct CreatePetriSampleContract<'a, U: UserContext> {
    user: &'a U,
    snapshot: &'a SessionSnapshot,
    existing_samples: i64,
}

impl<'a, U: UserContext> CreatePetriSampleContract<'a, U> {
    pub fn new(user: &'a U, snapshot: &'a SessionSnapshot, existing_samples: i64) -> Self {
        Self {
            user,
            snapshot,
            existing_samples,
        }
    }
}

impl<'a, U: UserContext> Contract<PetriSample> for CreatePetriSampleContract<'a, U> {
    fn validate(&self, sample: &PetriSample) -> ValidationResult {
        let mut errors = ValidationErrors::new();

        validate_sample(self.user, sample, self.snapshot, &mut errors);

        let expected = self.snapshot.expected_petris;
        if expected > 0 && self.existing_samples >= expected {
            errors.add_base(format!(
                "Submission already has all {expected} expected samples"
            ));
        }

        errors.into_result()
    }
}

pub struct UpdatePetriSampleContract<'a, U: UserContext> {
    user: &'a U,
    snapshot: &'a SessionSnapshot,
}

impl<'a, U: UserContext> UpdatePetriSampleContract<'a, U> {
    pub fn new(user: &'a U, snapshot: &'a SessionSnapshot) -> Self {
        Self { user, snapshot }
    }
}

impl<'a, U: UserContext> Contract<PetriSample> for UpdatePetriSampleContract<'a, U> {
    fn validate(&self, sample: &PetriSample) -> ValidationResult {
        let mut errors = ValidationErrors::new();

        if sample.id.is_none() {
            errors.add_base("Sample must be persisted before it can be updated");
        }
        validate_sample(self.user, sample, self.snapshot, &mut errors);

        errors.into_result()
    }

    fn is_writable(&self, attribute: &str) -> bool {
        !matches!(attribute, "id" | "submission_id" | "site_id")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockUser;
    use chrono::{NaiveDate, TimeZone, Utc};
    use pilot_models::{CreatePetriSampleDto, SessionStatus, SubmissionSession};

    fn snapshot(status: SessionStatus) -> SessionSnapshot {
        let started = Utc.with_ymd_and_hms(2025, 1, 5, 8, 0, 0).unwrap();
        let mut session = SubmissionSession::open(100, 10, 1, 42, started);
        session.session_status = status;
        SessionSnapshot {
            session,
            today: NaiveDate::from_ymd_opt(2025, 1, 5).unwrap(),
            expiry_enabled: true,
            expected_petris: 3,
            complete_petris: 0,
        }
    }

    fn sample(code: &str) -> PetriSample {
        let dto: CreatePetriSampleDto =
            serde_json::from_value(serde_json::json!({ "petriCode": code })).unwrap();
        dto.into_sample(100, 10)
    }

    fn worker() -> MockUser {
        MockUser::with_permissions(42, &[permissions::SUBMIT_DATA])
    }

    #[test]
    fn test_add_sample_to_working_session() {
        let user = worker();
        let snapshot = snapshot(SessionStatus::Working);
        let contract = CreatePetriSampleContract::new(&user, &snapshot, 1);
        assert!(contract.validate(&sample("P-01")).is_ok());
    }

    #[test]
    fn test_petri_code_format() {
        let user = worker();
        let snapshot = snapshot(SessionStatus::Opened);
        let contract = CreatePetriSampleContract::new(&user, &snapshot, 0);

        assert!(contract.validate(&sample("GH2_A")).is_ok());
        assert!(contract.validate(&sample("-P01")).unwrap_err().has_error("petri_code"));
        assert!(contract.validate(&sample("P 01")).unwrap_err().has_error("petri_code"));
    }

    #[test]
    fn test_cannot_exceed_expected_count() {
        let user = worker();
        let snapshot = snapshot(SessionStatus::Working);
        let contract = CreatePetriSampleContract::new(&user, &snapshot, 3);
        assert!(contract.validate(&sample("P-04")).unwrap_err().has_base_error());
    }

    #[test]
    fn test_unbounded_when_site_expects_none() {
        let user = worker();
        let mut snapshot = snapshot(SessionStatus::Working);
        snapshot.expected_petris = 0;
        let contract = CreatePetriSampleContract::new(&user, &snapshot, 12);
        assert!(contract.validate(&sample("P-13")).is_ok());
    }

    #[test]
    fn test_completed_session_is_read_only() {
        let user = worker();
        let snapshot = snapshot(SessionStatus::Completed);
        let mut existing = sample("P-01");
        existing.id = Some(1);

        let errors = UpdatePetriSampleContract::new(&user, &snapshot)
            .validate(&existing)
            .unwrap_err();
        assert_eq!(errors.base_errors, vec!["Session is completed".to_string()]);
    }

    #[test]
    fn test_sample_from_other_submission() {
        let user = worker();
        let snapshot = snapshot(SessionStatus::Working);
        let mut foreign = sample("P-01");
        foreign.submission_id = 555;
        let errors = CreatePetriSampleContract::new(&user, &snapshot, 0)
            .validate(&foreign)
            .unwrap_err();
        assert!(errors.has_error("submission_id"));
    }
}
