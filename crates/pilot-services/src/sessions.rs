//! Session services
//!
//! Opening a session produces a submission plus its session. Later steps
//! (claim, unclaim, escalate, share, complete, cancel) are validated against
//! a [`SessionSnapshot`] and applied in memory; the repository then writes
//! the change conditioned on the status it was read with.

use pilot_contracts::sessions::{
    OpenSessionContract, SessionSnapshot, SessionTransition, SessionTransitionContract,
};
use chrono::{DateTime, Utc};
use pilot_contracts::{Contract, UserContext};
use pilot_core::Clock;
use pilot_models::{
    CreateSubmissionDto, Program, SessionStatus, Site, Submission, SubmissionSession,
};
use tracing::debug;

use crate::result::ServiceResult;
use crate::validate_params;

/// A submission and the session that owns it, both not yet persisted.
///
/// `session.submission_id` is filled in once the submission row exists.
#[derive(Debug, Clone)]
pub struct OpenedSession {
    pub submission: Submission,
    pub session: SubmissionSession,
}

pub struct OpenSessionService<'a, U: UserContext> {
    user: &'a U,
    program: &'a Program,
    site: &'a Site,
    clock: &'a dyn Clock,
}

impl<'a, U: UserContext> OpenSessionService<'a, U> {
    pub fn new(user: &'a U, program: &'a Program, site: &'a Site, clock: &'a dyn Clock) -> Self {
        Self {
            user,
            program,
            site,
            clock,
        }
    }

    pub fn call(self, params: CreateSubmissionDto) -> ServiceResult<OpenedSession> {
        if let Err(errors) = validate_params(&params) {
            return ServiceResult::failure(errors);
        }
        let Some(site_id) = self.site.id else {
            return ServiceResult::failure_with_base_error("Site must be persisted");
        };

        let submission = params.into_submission(self.site.program_id, site_id, self.user.id());

        let contract =
            OpenSessionContract::new(self.user, self.program, self.site, self.clock.today());
        if let Err(errors) = contract.validate(&submission) {
            debug!(site_id, user_id = self.user.id(), errors = %errors, "open session rejected");
            return ServiceResult::failure(errors);
        }

        let session = SubmissionSession::open(
            0,
            site_id,
            self.site.program_id,
            self.user.id(),
            self.clock.now(),
        );

        ServiceResult::success(OpenedSession {
            submission,
            session,
        })
    }
}

/// Result of applying a transition in memory
#[derive(Debug, Clone)]
pub struct SessionChange {
    pub session: SubmissionSession,
    /// Stored status the change was computed from
    pub previous_status: SessionStatus,
    /// Stored activity time the change was computed from
    pub previous_activity_time: DateTime<Utc>,
}

pub struct TransitionSessionService<'a, U: UserContext> {
    user: &'a U,
    clock: &'a dyn Clock,
    sharing_enabled: bool,
}

impl<'a, U: UserContext> TransitionSessionService<'a, U> {
    pub fn new(user: &'a U, clock: &'a dyn Clock) -> Self {
        Self {
            user,
            clock,
            sharing_enabled: true,
        }
    }

    pub fn with_sharing(mut self, enabled: bool) -> Self {
        self.sharing_enabled = enabled;
        self
    }

    pub fn call(
        self,
        snapshot: SessionSnapshot,
        transition: &SessionTransition,
    ) -> ServiceResult<SessionChange> {
        let contract = SessionTransitionContract::new(self.user, transition)
            .with_sharing(self.sharing_enabled);
        if let Err(errors) = contract.validate(&snapshot) {
            debug!(
                session_id = ?snapshot.session.id,
                transition = transition.name(),
                errors = %errors,
                "session transition rejected"
            );
            return ServiceResult::failure(errors);
        }

        let mut session = snapshot.session;
        let previous_status = session.session_status;
        let previous_activity_time = session.last_activity_time;
        let actor = self.user.id();

        match transition {
            SessionTransition::Claim => {
                session.claimed_by_id = Some(actor);
                session.escalated_to_id = None;
            }
            SessionTransition::Unclaim => {
                session.claimed_by_id = None;
            }
            SessionTransition::Escalate { to } => {
                session.escalated_to_id = Some(*to);
                session.claimed_by_id = None;
            }
            SessionTransition::Share { with } => {
                session.share_with(with);
            }
            SessionTransition::Complete | SessionTransition::Cancel => {}
        }
        if let Some(status) = transition.target_status() {
            session.session_status = status;
        }
        session.last_activity_time = self.clock.now();

        ServiceResult::success(SessionChange {
            session,
            previous_status,
            previous_activity_time,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use pilot_auth::CurrentUser;
    use pilot_contracts::permissions;
    use pilot_core::FixedClock;

    fn clock() -> FixedClock {
        FixedClock::new(Utc.with_ymd_and_hms(2025, 1, 5, 14, 0, 0).unwrap())
    }

    fn worker(id: i64) -> CurrentUser {
        let mut user = CurrentUser::new(id);
        user.add_global_permission(permissions::SUBMIT_DATA);
        user
    }

    fn snapshot(status: SessionStatus) -> SessionSnapshot {
        let started = Utc.with_ymd_and_hms(2025, 1, 5, 9, 0, 0).unwrap();
        let mut session = SubmissionSession::open(100, 10, 1, 42, started);
        session.id = Some(7);
        session.session_status = status;
        SessionSnapshot {
            session,
            today: NaiveDate::from_ymd_opt(2025, 1, 5).unwrap(),
            expiry_enabled: true,
            expected_petris: 0,
            complete_petris: 0,
        }
    }

    #[test]
    fn test_open_session() {
        let mut program = Program::new(
            "Cold chain",
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
        );
        program.id = Some(1);
        let mut site = Site::new(1, "North greenhouse");
        site.id = Some(10);
        let user = worker(42);
        let clock = clock();

        let params: CreateSubmissionDto = serde_json::from_value(serde_json::json!({
            "temperature": 71.5,
            "humidity": 48.0,
            "weather": "cloudy"
        }))
        .unwrap();
        let result = OpenSessionService::new(&user, &program, &site, &clock).call(params);

        let opened = result.result().unwrap();
        assert_eq!(opened.submission.created_by_id, 42);
        assert_eq!(opened.session.session_status, SessionStatus::Opened);
        assert_eq!(opened.session.opened_by_id, 42);
        assert_eq!(opened.session.session_start_time, clock.now());
    }

    #[test]
    fn test_claim_sets_claimer_and_clears_escalation() {
        let user = worker(5);
        let clock = clock();
        let mut snapshot = snapshot(SessionStatus::Escalated);
        snapshot.session.escalated_to_id = Some(5);

        let result =
            TransitionSessionService::new(&user, &clock).call(snapshot, &SessionTransition::Claim);
        let change = result.result().unwrap();

        assert_eq!(change.previous_status, SessionStatus::Escalated);
        assert_eq!(
            change.previous_activity_time,
            Utc.with_ymd_and_hms(2025, 1, 5, 9, 0, 0).unwrap()
        );
        assert_eq!(change.session.session_status, SessionStatus::Working);
        assert_eq!(change.session.claimed_by_id, Some(5));
        assert!(change.session.escalated_to_id.is_none());
        assert_eq!(change.session.last_activity_time, clock.now());
    }

    #[test]
    fn test_escalate_releases_claim() {
        let user = worker(42);
        let clock = clock();
        let mut snapshot = snapshot(SessionStatus::Working);
        snapshot.session.claimed_by_id = Some(42);

        let change = TransitionSessionService::new(&user, &clock)
            .call(snapshot, &SessionTransition::Escalate { to: 9 })
            .into_result()
            .unwrap();
        assert_eq!(change.session.session_status, SessionStatus::Escalated);
        assert_eq!(change.session.escalated_to_id, Some(9));
        assert!(change.session.claimed_by_id.is_none());
    }

    #[test]
    fn test_share_keeps_status() {
        let user = worker(42);
        let clock = clock();
        let change = TransitionSessionService::new(&user, &clock)
            .call(
                snapshot(SessionStatus::Opened),
                &SessionTransition::Share { with: vec![42, 3, 3] },
            )
            .into_result()
            .unwrap();
        assert_eq!(change.session.session_status, SessionStatus::Opened);
        assert_eq!(change.session.shared_with, vec![3]);
    }

    #[test]
    fn test_sharing_disabled() {
        let user = worker(42);
        let clock = clock();
        let result = TransitionSessionService::new(&user, &clock)
            .with_sharing(false)
            .call(
                snapshot(SessionStatus::Opened),
                &SessionTransition::Share { with: vec![3] },
            );
        assert!(result.is_failure());
    }

    #[test]
    fn test_rejected_transition_leaves_no_change() {
        let user = worker(5);
        let clock = clock();
        let result = TransitionSessionService::new(&user, &clock)
            .call(snapshot(SessionStatus::Opened), &SessionTransition::Complete);
        assert!(result.errors().has_error("session_status"));
    }
}
