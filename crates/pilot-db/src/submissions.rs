//! Submission repository
//!
//! Submissions are only ever created together with their session; see
//! [`crate::sessions::SessionRepository::open`].

use chrono::{DateTime, Utc};
use pilot_core::traits::Id;
use pilot_models::Submission;
use sqlx::{FromRow, PgConnection, PgPool};

use crate::repository::{decode, Pagination, PaginatedResult, RepositoryError, RepositoryResult};

#[derive(Debug, Clone, FromRow)]
pub struct SubmissionRow {
    pub id: i64,
    pub site_id: i64,
    pub program_id: i64,
    pub global_submission_id: i64,
    pub temperature: f64,
    pub humidity: f64,
    pub airflow: String,
    pub odor_distance: String,
    pub weather: String,
    pub notes: Option<String>,
    pub created_by_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<SubmissionRow> for Submission {
    type Error = RepositoryError;

    fn try_from(row: SubmissionRow) -> RepositoryResult<Self> {
        Ok(Submission {
            id: Some(row.id),
            site_id: row.site_id,
            program_id: row.program_id,
            global_submission_id: Some(row.global_submission_id),
            temperature: row.temperature,
            humidity: row.humidity,
            airflow: decode(&row.airflow)?,
            odor_distance: decode(&row.odor_distance)?,
            weather: decode(&row.weather)?,
            notes: row.notes,
            created_by_id: row.created_by_id,
            created_at: Some(row.created_at),
            updated_at: Some(row.updated_at),
        })
    }
}

pub struct SubmissionRepository {
    pool: PgPool,
}

impl SubmissionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Id) -> RepositoryResult<Option<Submission>> {
        let row = sqlx::query_as::<_, SubmissionRow>(
            r#"
            SELECT id, site_id, program_id, global_submission_id, temperature, humidity,
                   airflow, odor_distance, weather, notes, created_by_id, created_at, updated_at
            FROM pilot_submissions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Submission::try_from).transpose()
    }

    /// Newest first
    pub async fn find_by_site(
        &self,
        site_id: Id,
        pagination: Pagination,
    ) -> RepositoryResult<PaginatedResult<Submission>> {
        let rows = sqlx::query_as::<_, SubmissionRow>(
            r#"
            SELECT id, site_id, program_id, global_submission_id, temperature, humidity,
                   airflow, odor_distance, weather, notes, created_by_id, created_at, updated_at
            FROM pilot_submissions
            WHERE site_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(site_id)
        .bind(pagination.limit)
        .bind(pagination.offset)
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM pilot_submissions WHERE site_id = $1",
        )
        .bind(site_id)
        .fetch_one(&self.pool)
        .await?;

        PaginatedResult::new(rows, total, pagination).try_map(Submission::try_from)
    }

    /// Insert on an open connection or transaction; the global id comes
    /// from `pilot_global_submission_id_seq`.
    pub(crate) async fn insert(
        conn: &mut PgConnection,
        submission: &Submission,
    ) -> RepositoryResult<Submission> {
        let row = sqlx::query_as::<_, SubmissionRow>(
            r#"
            INSERT INTO pilot_submissions (
                site_id, program_id, temperature, humidity, airflow, odor_distance,
                weather, notes, created_by_id, created_at, updated_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, NOW(), NOW()
            )
            RETURNING id, site_id, program_id, global_submission_id, temperature, humidity,
                      airflow, odor_distance, weather, notes, created_by_id, created_at, updated_at
            "#,
        )
        .bind(submission.site_id)
        .bind(submission.program_id)
        .bind(submission.temperature)
        .bind(submission.humidity)
        .bind(submission.airflow.as_str())
        .bind(submission.odor_distance.as_str())
        .bind(submission.weather.as_str())
        .bind(&submission.notes)
        .bind(submission.created_by_id)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| RepositoryError::from_write(e, "Submission"))?;

        Submission::try_from(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pilot_models::{Airflow, OdorDistance, Weather};

    #[test]
    fn test_row_into_submission() {
        let row = SubmissionRow {
            id: 100,
            site_id: 10,
            program_id: 1,
            global_submission_id: 1042,
            temperature: 71.5,
            humidity: 48.0,
            airflow: "closed".into(),
            odor_distance: ">100ft".into(),
            weather: "rain".into(),
            notes: None,
            created_by_id: 42,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let submission = Submission::try_from(row).unwrap();
        assert_eq!(submission.global_submission_id, Some(1042));
        assert_eq!(submission.airflow, Airflow::Closed);
        assert_eq!(submission.odor_distance, OdorDistance::OverHundred);
        assert_eq!(submission.weather, Weather::Rain);
    }
}
