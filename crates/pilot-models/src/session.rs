//! Submission session model
//!
//! Table: pilot_submission_sessions
//!
//! A session tracks who is working on a submission. Its lifecycle
//! (opened → working → completed, with escalation, sharing and
//! cancellation on the side) is enforced by the session contracts; this
//! module only holds the data and the read-time projections.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use pilot_core::{Entity, Id, Identifiable, ProgramScoped, Timestamped};
use serde::{Deserialize, Serialize};

use crate::progress::session_percentage;
use crate::validation::ParseEnumError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Opened,
    Working,
    Escalated,
    Completed,
    Cancelled,
    Expired,
}

impl SessionStatus {
    pub const ACTIVE: [SessionStatus; 3] = [Self::Opened, Self::Working, Self::Escalated];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Opened => "opened",
            Self::Working => "working",
            Self::Escalated => "escalated",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Expired)
    }

    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "opened" => Ok(Self::Opened),
            "working" => Ok(Self::Working),
            "escalated" => Ok(Self::Escalated),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            "expired" => Ok(Self::Expired),
            other => Err(ParseEnumError::new("session status", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionSession {
    pub id: Option<Id>,
    pub submission_id: Id,
    pub site_id: Id,
    pub program_id: Id,
    pub opened_by_id: Id,
    pub session_status: SessionStatus,
    pub claimed_by_id: Option<Id>,
    pub escalated_to_id: Option<Id>,
    #[serde(default)]
    pub shared_with: Vec<Id>,
    pub session_start_time: DateTime<Utc>,
    pub last_activity_time: DateTime<Utc>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Identifiable for SubmissionSession {
    fn id(&self) -> Option<Id> {
        self.id
    }
}

impl Timestamped for SubmissionSession {
    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

impl Entity for SubmissionSession {
    const TABLE_NAME: &'static str = "pilot_submission_sessions";
    const TYPE_NAME: &'static str = "Session";
}

impl ProgramScoped for SubmissionSession {
    fn program_id(&self) -> Id {
        self.program_id
    }
}

impl SubmissionSession {
    /// Fresh session for a submission, owned by the user who opened it
    pub fn open(
        submission_id: Id,
        site_id: Id,
        program_id: Id,
        opened_by_id: Id,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: None,
            submission_id,
            site_id,
            program_id,
            opened_by_id,
            session_status: SessionStatus::Opened,
            claimed_by_id: None,
            escalated_to_id: None,
            shared_with: Vec::new(),
            session_start_time: now,
            last_activity_time: now,
            created_at: None,
            updated_at: None,
        }
    }

    /// Status as readers see it on `today`.
    ///
    /// A non-terminal session started on an earlier calendar day is reported
    /// as expired when `expiry_enabled` is set.
    pub fn effective_status(&self, today: NaiveDate, expiry_enabled: bool) -> SessionStatus {
        if expiry_enabled
            && self.session_status.is_active()
            && self.session_start_time.date_naive() < today
        {
            SessionStatus::Expired
        } else {
            self.session_status
        }
    }

    pub fn is_participant(&self, user_id: Id) -> bool {
        self.opened_by_id == user_id
            || self.claimed_by_id == Some(user_id)
            || self.escalated_to_id == Some(user_id)
            || self.shared_with.contains(&user_id)
    }

    pub fn is_claimed_by(&self, user_id: Id) -> bool {
        self.claimed_by_id == Some(user_id)
    }

    pub fn is_claimed_by_other(&self, user_id: Id) -> bool {
        matches!(self.claimed_by_id, Some(claimer) if claimer != user_id)
    }

    /// Add users to `shared_with`, skipping the opener and duplicates.
    /// Returns how many were actually added.
    pub fn share_with(&mut self, user_ids: &[Id]) -> usize {
        let before = self.shared_with.len();
        for &user_id in user_ids {
            if user_id != self.opened_by_id && !self.shared_with.contains(&user_id) {
                self.shared_with.push(user_id);
            }
        }
        self.shared_with.len() - before
    }
}

/// A session joined with the names and counts the session drawer shows
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDetails {
    #[serde(flatten)]
    pub session: SubmissionSession,
    pub effective_status: SessionStatus,
    pub program_name: String,
    pub site_name: String,
    pub global_submission_id: Option<i64>,
    pub expected_petris: i64,
    pub complete_petris: i64,
    pub percentage_complete: f64,
}

impl SessionDetails {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        session: SubmissionSession,
        program_name: String,
        site_name: String,
        global_submission_id: Option<i64>,
        expected_petris: i64,
        complete_petris: i64,
        today: NaiveDate,
        expiry_enabled: bool,
    ) -> Self {
        let effective_status = session.effective_status(today, expiry_enabled);
        Self {
            session,
            effective_status,
            program_name,
            site_name,
            global_submission_id,
            expected_petris,
            complete_petris,
            percentage_complete: session_percentage(complete_petris, expected_petris),
        }
    }

    pub fn all_petris_complete(&self) -> bool {
        self.complete_petris >= self.expected_petris
    }
}
