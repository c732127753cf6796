use chrono::NaiveDate;
use pilot_core::error::ValidationErrors;
use pilot_core::traits::Id;
use pilot_models::{SessionStatus, SubmissionSession};

use crate::base::{validate_logged_in, Contract, UserContext, ValidationResult};
use crate::permissions;

/// A lifecycle step requested on an existing session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionTransition {
    Claim,
    Unclaim,
    Escalate { to: Id },
    Share { with: Vec<Id> },
    Complete,
    Cancel,
}

impl SessionTransition {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Claim => "claim",
            Self::Unclaim => "unclaim",
            Self::Escalate { .. } => "escalate",
            Self::Share { .. } => "share",
            Self::Complete => "complete",
            Self::Cancel => "cancel",
        }
    }

    /// Stored statuses the step may start from
    pub fn allowed_from(&self) -> &'static [SessionStatus] {
        match self {
            Self::Claim => &[SessionStatus::Opened, SessionStatus::Escalated],
            Self::Unclaim | Self::Complete => &[SessionStatus::Working],
            Self::Escalate { .. } => &[SessionStatus::Opened, SessionStatus::Working],
            Self::Share { .. } | Self::Cancel => &SessionStatus::ACTIVE,
        }
    }

    /// Status after the step; `None` when the status is left alone
    pub fn target_status(&self) -> Option<SessionStatus> {
        match self {
            Self::Claim => Some(SessionStatus::Working),
            Self::Unclaim => Some(SessionStatus::Opened),
            Self::Escalate { .. } => Some(SessionStatus::Escalated),
            Self::Share { .. } => None,
            Self::Complete => Some(SessionStatus::Completed),
            Self::Cancel => Some(SessionStatus::Cancelled),
        }
    }
}

/// Everything a transition check needs to know about a session
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub session: SubmissionSession,
    pub today: NaiveDate,
    pub expiry_enabled: bool,
    pub expected_petris: i64,
    pub complete_petris: i64,
}

impl SessionSnapshot {
    pub fn effective_status(&self) -> SessionStatus {
        self.session.effective_status(self.today, self.expiry_enabled)
    }
}

pub struct SessionTransitionContract<'a, U: UserContext> {
    user: &'a U,
    transition: &'a SessionTransition,
    sharing_enabled: bool,
}

impl<'a, U: UserContext> SessionTransitionContract<'a, U> {
    pub fn new(user: &'a U, transition: &'a SessionTransition) -> Self {
        Self {
            user,
            transition,
            sharing_enabled: true,
        }
    }

    pub fn with_sharing(mut self, enabled: bool) -> Self {
        self.sharing_enabled = enabled;
        self
    }

    fn validate_status(&self, snapshot: &SessionSnapshot, errors: &mut ValidationErrors) -> bool {
        let status = snapshot.effective_status();
        if status == SessionStatus::Expired {
            errors.add_base("Session has expired");
            return false;
        }
        if !self.transition.allowed_from().contains(&status) {
            errors.add(
                "session_status",
                format!("cannot {} a session that is {}", self.transition.name(), status),
            );
            return false;
        }
        true
    }

    fn validate_actor(&self, snapshot: &SessionSnapshot, errors: &mut ValidationErrors) {
        let session = &snapshot.session;
        let actor = self.user.id();
        let participant = self.user.is_admin() || session.is_participant(actor);

        match self.transition {
            SessionTransition::Claim => {
                let may_submit = self
                    .user
                    .allowed_in_program(permissions::SUBMIT_DATA, session.program_id);
                if !participant && !may_submit {
                    errors.add_base("You are not authorized to claim this session");
                }
                if session.is_claimed_by_other(actor) {
                    errors.add_base("Session is already claimed by another user");
                }
            }
            SessionTransition::Unclaim => {
                if !session.is_claimed_by(actor) && !self.user.is_admin() {
                    errors.add_base("Only the claimer can release this session");
                }
            }
            SessionTransition::Escalate { to } => {
                if !participant {
                    errors.add_base("You are not a participant of this session");
                }
                if *to == actor {
                    errors.add("escalated_to_id", "must be a different user");
                } else if *to <= 0 {
                    errors.add("escalated_to_id", "is invalid");
                }
            }
            SessionTransition::Share { with } => {
                if !self.sharing_enabled {
                    errors.add_base("Session sharing is disabled");
                }
                if !participant {
                    errors.add_base("You are not a participant of this session");
                }
                if with.is_empty() {
                    errors.add("shared_with", "can't be empty");
                } else if with.iter().any(|id| *id <= 0) {
                    errors.add("shared_with", "contains an invalid user id");
                }
            }
            SessionTransition::Complete => {
                if !session.is_claimed_by(actor) && session.opened_by_id != actor {
                    errors.add_base("Only the claimer or the opener can complete this session");
                }
                if snapshot.complete_petris < snapshot.expected_petris {
                    errors.add(
                        "petri_samples",
                        format!(
                            "{} of {} samples are complete",
                            snapshot.complete_petris, snapshot.expected_petris
                        ),
                    );
                }
            }
            SessionTransition::Cancel => {
                if session.opened_by_id != actor && !self.user.is_admin() {
                    errors.add_base("Only the opener can cancel this session");
                }
            }
        }
    }
}

impl<'a, U: UserContext> Contract<SessionSnapshot> for SessionTransitionContract<'a, U> {
    fn validate(&self, snapshot: &SessionSnapshot) -> ValidationResult {
        let mut errors = ValidationErrors::new();

        validate_logged_in(self.user, &mut errors);
        if !errors.is_empty() {
            return errors.into_result();
        }

        if self.validate_status(snapshot, &mut errors) {
            self.validate_actor(snapshot, &mut errors);
        }

        errors.into_result()
    }

    fn is_writable(&self, attribute: &str) -> bool {
        matches!(
            attribute,
            "session_status" | "claimed_by_id" | "escalated_to_id" | "shared_with"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockUser;
    use chrono::{TimeZone, Utc};

    const OPENER: Id = 42;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 5).unwrap()
    }

    fn snapshot(status: SessionStatus) -> SessionSnapshot {
        let started = Utc.with_ymd_and_hms(2025, 1, 5, 8, 0, 0).unwrap();
        let mut session = SubmissionSession::open(100, 10, 1, OPENER, started);
        session.id = Some(7);
        session.session_status = status;
        SessionSnapshot {
            session,
            today: today(),
            expiry_enabled: true,
            expected_petris: 2,
            complete_petris: 2,
        }
    }

    fn check<U: UserContext>(
        user: &U,
        transition: SessionTransition,
        snapshot: &SessionSnapshot,
    ) -> ValidationResult {
        SessionTransitionContract::new(user, &transition).validate(snapshot)
    }

    fn worker(id: Id) -> MockUser {
        MockUser::with_permissions(id, &[permissions::SUBMIT_DATA])
    }

    #[test]
    fn test_claim_from_opened_and_escalated() {
        let user = worker(5);
        assert!(check(&user, SessionTransition::Claim, &snapshot(SessionStatus::Opened)).is_ok());
        assert!(check(&user, SessionTransition::Claim, &snapshot(SessionStatus::Escalated)).is_ok());

        let errors = check(&user, SessionTransition::Claim, &snapshot(SessionStatus::Completed))
            .unwrap_err();
        assert!(errors.has_error("session_status"));
    }

    #[test]
    fn test_claim_requires_participation_or_permission() {
        let outsider = MockUser::with_permissions(9, &[permissions::VIEW_PROGRAMS]);
        assert!(check(&outsider, SessionTransition::Claim, &snapshot(SessionStatus::Opened)).is_err());

        let mut shared = snapshot(SessionStatus::Opened);
        shared.session.shared_with = vec![9];
        assert!(check(&outsider, SessionTransition::Claim, &shared).is_ok());
    }

    #[test]
    fn test_claim_refused_when_claimed_by_other() {
        let mut snapshot = snapshot(SessionStatus::Escalated);
        snapshot.session.claimed_by_id = Some(77);
        let errors = check(&worker(5), SessionTransition::Claim, &snapshot).unwrap_err();
        assert!(errors.has_base_error());
    }

    #[test]
    fn test_unclaim_only_by_claimer_or_admin() {
        let mut snapshot = snapshot(SessionStatus::Working);
        snapshot.session.claimed_by_id = Some(5);

        assert!(check(&worker(5), SessionTransition::Unclaim, &snapshot).is_ok());
        assert!(check(&worker(6), SessionTransition::Unclaim, &snapshot).is_err());
        assert!(check(&MockUser::admin(1), SessionTransition::Unclaim, &snapshot).is_ok());
    }

    #[test]
    fn test_escalate_to_self_refused() {
        let snapshot = snapshot(SessionStatus::Opened);
        let user = worker(OPENER);

        let errors = check(&user, SessionTransition::Escalate { to: OPENER }, &snapshot).unwrap_err();
        assert!(errors.has_error("escalated_to_id"));
        assert!(check(&user, SessionTransition::Escalate { to: 8 }, &snapshot).is_ok());
    }

    #[test]
    fn test_escalate_not_from_escalated() {
        let snapshot = snapshot(SessionStatus::Escalated);
        assert!(check(&worker(OPENER), SessionTransition::Escalate { to: 8 }, &snapshot).is_err());
    }

    #[test]
    fn test_share_rules() {
        let snapshot = snapshot(SessionStatus::Working);
        let opener = worker(OPENER);

        assert!(check(&opener, SessionTransition::Share { with: vec![3, 4] }, &snapshot).is_ok());
        assert!(check(&opener, SessionTransition::Share { with: vec![] }, &snapshot)
            .unwrap_err()
            .has_error("shared_with"));
        assert!(check(&worker(99), SessionTransition::Share { with: vec![3] }, &snapshot).is_err());

        let transition = SessionTransition::Share { with: vec![3] };
        let disabled = SessionTransitionContract::new(&opener, &transition)
            .with_sharing(false)
            .validate(&snapshot);
        assert!(disabled.is_err());
    }

    #[test]
    fn test_complete_requires_all_petris() {
        let mut snapshot = snapshot(SessionStatus::Working);
        snapshot.session.claimed_by_id = Some(5);
        assert!(check(&worker(5), SessionTransition::Complete, &snapshot).is_ok());
        assert!(check(&worker(OPENER), SessionTransition::Complete, &snapshot).is_ok());

        snapshot.complete_petris = 1;
        let errors = check(&worker(5), SessionTransition::Complete, &snapshot).unwrap_err();
        assert_eq!(
            errors.get("petri_samples"),
            Some(&vec!["1 of 2 samples are complete".to_string()])
        );
    }

    #[test]
    fn test_complete_by_stranger_refused() {
        let mut snapshot = snapshot(SessionStatus::Working);
        snapshot.session.claimed_by_id = Some(5);
        assert!(check(&worker(6), SessionTransition::Complete, &snapshot).is_err());
    }

    #[test]
    fn test_cancel_only_by_opener_or_admin() {
        let snapshot = snapshot(SessionStatus::Escalated);
        assert!(check(&worker(OPENER), SessionTransition::Cancel, &snapshot).is_ok());
        assert!(check(&MockUser::admin(1), SessionTransition::Cancel, &snapshot).is_ok());
        assert!(check(&worker(5), SessionTransition::Cancel, &snapshot).is_err());
    }

    #[test]
    fn test_expired_session_rejects_everything() {
        let mut snapshot = snapshot(SessionStatus::Working);
        snapshot.session.claimed_by_id = Some(OPENER);
        snapshot.today = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();

        for transition in [
            SessionTransition::Claim,
            SessionTransition::Unclaim,
            SessionTransition::Escalate { to: 8 },
            SessionTransition::Share { with: vec![8] },
            SessionTransition::Complete,
            SessionTransition::Cancel,
        ] {
            let errors = check(&MockUser::admin(OPENER), transition, &snapshot).unwrap_err();
            assert_eq!(errors.base_errors, vec!["Session has expired".to_string()]);
        }
    }

    #[test]
    fn test_expiry_can_be_disabled() {
        let mut snapshot = snapshot(SessionStatus::Opened);
        snapshot.today = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        snapshot.expiry_enabled = false;
        assert!(check(&worker(5), SessionTransition::Claim, &snapshot).is_ok());
    }

    #[test]
    fn test_anonymous_rejected() {
        let user = MockUser::anonymous();
        let errors = check(&user, SessionTransition::Claim, &snapshot(SessionStatus::Opened)).unwrap_err();
        assert_eq!(errors.base_errors, vec!["You need to be logged in".to_string()]);
    }
}
