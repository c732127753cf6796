//! Submission session repository
//!
//! Transitions are written with a conditional `UPDATE`: the row must still
//! carry the status and activity time the change was computed from. If a
//! concurrent request got there first nothing is written and the caller
//! gets a conflict.

use chrono::{DateTime, NaiveDate, Utc};
use pilot_core::traits::Id;
use pilot_models::{SessionDetails, SessionStatus, Submission, SubmissionSession};
use sqlx::{FromRow, PgPool};

use crate::repository::{decode, RepositoryError, RepositoryResult};
use crate::submissions::SubmissionRepository;

const SESSION_COLUMNS: &str = r#"
    ss.id, ss.submission_id, ss.site_id, ss.program_id, ss.opened_by_id,
    ss.session_status, ss.claimed_by_id, ss.escalated_to_id, ss.shared_with,
    ss.session_start_time, ss.last_activity_time, ss.created_at, ss.updated_at
"#;

const DETAILS_FROM: &str = r#"
    p.name AS program_name,
    s.name AS site_name,
    sub.global_submission_id,
    s.total_petris::BIGINT AS expected_petris,
    (SELECT COUNT(*) FROM pilot_petri_samples ps
      WHERE ps.submission_id = ss.submission_id
        AND btrim(COALESCE(ps.image_url, '')) <> '') AS complete_petris
    FROM pilot_submission_sessions ss
    JOIN pilot_programs p ON p.id = ss.program_id
    JOIN pilot_sites s ON s.id = ss.site_id
    JOIN pilot_submissions sub ON sub.id = ss.submission_id
"#;

#[derive(Debug, Clone, FromRow)]
pub struct SessionRow {
    pub id: i64,
    pub submission_id: i64,
    pub site_id: i64,
    pub program_id: i64,
    pub opened_by_id: i64,
    pub session_status: String,
    pub claimed_by_id: Option<i64>,
    pub escalated_to_id: Option<i64>,
    pub shared_with: Vec<i64>,
    pub session_start_time: DateTime<Utc>,
    pub last_activity_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<SessionRow> for SubmissionSession {
    type Error = RepositoryError;

    fn try_from(row: SessionRow) -> RepositoryResult<Self> {
        Ok(SubmissionSession {
            id: Some(row.id),
            submission_id: row.submission_id,
            site_id: row.site_id,
            program_id: row.program_id,
            opened_by_id: row.opened_by_id,
            session_status: decode(&row.session_status)?,
            claimed_by_id: row.claimed_by_id,
            escalated_to_id: row.escalated_to_id,
            shared_with: row.shared_with,
            session_start_time: row.session_start_time,
            last_activity_time: row.last_activity_time,
            created_at: Some(row.created_at),
            updated_at: Some(row.updated_at),
        })
    }
}

/// A session row joined with its program, site, submission and petri counts
#[derive(Debug, Clone, FromRow)]
pub struct SessionDetailsRow {
    #[sqlx(flatten)]
    pub session: SessionRow,
    pub program_name: String,
    pub site_name: String,
    pub global_submission_id: i64,
    pub expected_petris: i64,
    pub complete_petris: i64,
}

impl SessionDetailsRow {
    /// Project onto the read model for the given day
    pub fn into_details(
        self,
        today: NaiveDate,
        expiry_enabled: bool,
    ) -> RepositoryResult<SessionDetails> {
        Ok(SessionDetails::new(
            SubmissionSession::try_from(self.session)?,
            self.program_name,
            self.site_name,
            Some(self.global_submission_id),
            self.expected_petris,
            self.complete_petris,
            today,
            expiry_enabled,
        ))
    }
}

pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Id) -> RepositoryResult<Option<SubmissionSession>> {
        let sql =
            format!("SELECT {SESSION_COLUMNS} FROM pilot_submission_sessions ss WHERE ss.id = $1");
        let row = sqlx::query_as::<_, SessionRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(SubmissionSession::try_from).transpose()
    }

    pub async fn find_by_submission(
        &self,
        submission_id: Id,
    ) -> RepositoryResult<Option<SubmissionSession>> {
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM pilot_submission_sessions ss WHERE ss.submission_id = $1"
        );
        let row = sqlx::query_as::<_, SessionRow>(&sql)
            .bind(submission_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(SubmissionSession::try_from).transpose()
    }

    pub async fn find_details(&self, id: Id) -> RepositoryResult<Option<SessionDetailsRow>> {
        let sql = format!("SELECT {SESSION_COLUMNS}, {DETAILS_FROM} WHERE ss.id = $1");
        let row = sqlx::query_as::<_, SessionDetailsRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    /// Sessions with a non-terminal stored status that `user_id` takes part
    /// in (every such session when `include_all`), most recently active first.
    ///
    /// Expiry is date dependent and left to the caller.
    pub async fn find_active_with_details(
        &self,
        user_id: Id,
        include_all: bool,
    ) -> RepositoryResult<Vec<SessionDetailsRow>> {
        let sql = format!(
            r#"
            SELECT {SESSION_COLUMNS}, {DETAILS_FROM}
            WHERE ss.session_status = ANY($1)
              AND ($2
                   OR ss.opened_by_id = $3
                   OR ss.claimed_by_id = $3
                   OR ss.escalated_to_id = $3
                   OR $3 = ANY(ss.shared_with))
            ORDER BY ss.last_activity_time DESC, ss.id DESC
            "#
        );
        let active: Vec<&str> = SessionStatus::ACTIVE.iter().map(|s| s.as_str()).collect();

        let rows = sqlx::query_as::<_, SessionDetailsRow>(&sql)
            .bind(active)
            .bind(include_all)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    /// Insert the submission and its session in one transaction
    pub async fn open(
        &self,
        submission: &Submission,
        session: &SubmissionSession,
    ) -> RepositoryResult<(Submission, SubmissionSession)> {
        let mut tx = self.pool.begin().await?;

        let submission = SubmissionRepository::insert(&mut *tx, submission).await?;
        let submission_id = submission
            .id
            .ok_or_else(|| RepositoryError::Decode("submission insert returned no id".into()))?;

        let sql = format!(
            r#"
            INSERT INTO pilot_submission_sessions AS ss (
                submission_id, site_id, program_id, opened_by_id, session_status,
                claimed_by_id, escalated_to_id, shared_with,
                session_start_time, last_activity_time, created_at, updated_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, NOW(), NOW()
            )
            RETURNING {SESSION_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, SessionRow>(&sql)
            .bind(submission_id)
            .bind(session.site_id)
            .bind(session.program_id)
            .bind(session.opened_by_id)
            .bind(session.session_status.as_str())
            .bind(session.claimed_by_id)
            .bind(session.escalated_to_id)
            .bind(&session.shared_with)
            .bind(session.session_start_time)
            .bind(session.last_activity_time)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| RepositoryError::from_write(e, "Session"))?;

        tx.commit().await?;

        tracing::debug!(
            submission_id,
            session_id = row.id,
            global_submission_id = ?submission.global_submission_id,
            "session opened"
        );

        Ok((submission, SubmissionSession::try_from(row)?))
    }

    /// Write a transition computed from a row read with `expected_status`
    /// and `expected_activity`.
    pub async fn transition(
        &self,
        session: &SubmissionSession,
        expected_status: SessionStatus,
        expected_activity: DateTime<Utc>,
    ) -> RepositoryResult<SubmissionSession> {
        let id = session
            .id
            .ok_or_else(|| RepositoryError::Conflict("Session is not persisted".to_string()))?;

        let sql = format!(
            r#"
            UPDATE pilot_submission_sessions AS ss SET
                session_status = $1,
                claimed_by_id = $2,
                escalated_to_id = $3,
                shared_with = $4,
                last_activity_time = $5,
                updated_at = NOW()
            WHERE ss.id = $6
              AND ss.session_status = $7
              AND ss.last_activity_time = $8
            RETURNING {SESSION_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, SessionRow>(&sql)
            .bind(session.session_status.as_str())
            .bind(session.claimed_by_id)
            .bind(session.escalated_to_id)
            .bind(&session.shared_with)
            .bind(session.last_activity_time)
            .bind(id)
            .bind(expected_status.as_str())
            .bind(expected_activity)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => SubmissionSession::try_from(row),
            None if self.exists(id).await? => {
                tracing::warn!(session_id = id, "session changed concurrently");
                Err(RepositoryError::Conflict(
                    "Session was changed by another request; reload and try again".to_string(),
                ))
            }
            None => Err(RepositoryError::not_found("Session", id)),
        }
    }

    pub async fn exists(&self, id: Id) -> RepositoryResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM pilot_submission_sessions WHERE id = $1)",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row(status: &str) -> SessionRow {
        let started = Utc.with_ymd_and_hms(2025, 1, 5, 9, 0, 0).unwrap();
        SessionRow {
            id: 7,
            submission_id: 100,
            site_id: 10,
            program_id: 1,
            opened_by_id: 42,
            session_status: status.into(),
            claimed_by_id: Some(5),
            escalated_to_id: None,
            shared_with: vec![3, 4],
            session_start_time: started,
            last_activity_time: started,
            created_at: started,
            updated_at: started,
        }
    }

    #[test]
    fn test_row_into_session() {
        let session = SubmissionSession::try_from(row("working")).unwrap();
        assert_eq!(session.session_status, SessionStatus::Working);
        assert_eq!(session.shared_with, vec![3, 4]);
        assert!(session.is_participant(4));
    }

    #[test]
    fn test_details_row_projection() {
        let details_row = SessionDetailsRow {
            session: row("opened"),
            program_name: "Cold chain".into(),
            site_name: "North greenhouse".into(),
            global_submission_id: 1042,
            expected_petris: 3,
            complete_petris: 1,
        };

        let same_day = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap();
        let details = details_row.clone().into_details(same_day, true).unwrap();
        assert_eq!(details.effective_status, SessionStatus::Opened);
        assert_eq!(details.percentage_complete, 33.33);
        assert_eq!(details.global_submission_id, Some(1042));

        let next_day = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let details = details_row.into_details(next_day, true).unwrap();
        assert_eq!(details.effective_status, SessionStatus::Expired);
    }
}
