//! Program repository
//!
//! `total_sites` and `total_submissions` are counted on every read; the
//! progress fields are not stored at all and get computed by the caller.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use pilot_core::traits::Id;
use pilot_models::Program;
use sqlx::{FromRow, PgPool};

use crate::repository::{
    decode, Pagination, PaginatedResult, Repository, RepositoryError, RepositoryResult,
};

const SELECT_PROGRAM: &str = r#"
    SELECT p.id, p.name, p.description, p.status, p.start_date, p.end_date,
           (SELECT COUNT(*) FROM pilot_sites s WHERE s.program_id = p.id) AS total_sites,
           (SELECT COUNT(*) FROM pilot_submissions sub WHERE sub.program_id = p.id) AS total_submissions,
           p.created_at, p.updated_at
    FROM pilot_programs p
"#;

#[derive(Debug, Clone, FromRow)]
pub struct ProgramRow {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub status: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_sites: i64,
    pub total_submissions: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ProgramRow> for Program {
    type Error = RepositoryError;

    fn try_from(row: ProgramRow) -> RepositoryResult<Self> {
        Ok(Program {
            id: Some(row.id),
            name: row.name,
            description: row.description,
            status: decode(&row.status)?,
            start_date: row.start_date,
            end_date: row.end_date,
            total_sites: row.total_sites,
            total_submissions: row.total_submissions,
            created_at: Some(row.created_at),
            updated_at: Some(row.updated_at),
        })
    }
}

pub struct ProgramRepository {
    pool: PgPool,
}

impl ProgramRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Programs whose status is `active`, soonest end date first
    pub async fn find_active(
        &self,
        pagination: Pagination,
    ) -> RepositoryResult<PaginatedResult<Program>> {
        let sql = format!(
            "{SELECT_PROGRAM} WHERE p.status = 'active' \
             ORDER BY p.end_date ASC, p.id ASC LIMIT $1 OFFSET $2"
        );
        let rows = sqlx::query_as::<_, ProgramRow>(&sql)
            .bind(pagination.limit)
            .bind(pagination.offset)
            .fetch_all(&self.pool)
            .await?;

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM pilot_programs WHERE status = 'active'",
        )
        .fetch_one(&self.pool)
        .await?;

        PaginatedResult::new(rows, total, pagination).try_map(Program::try_from)
    }
}

#[async_trait]
impl Repository<Program> for ProgramRepository {
    async fn find_by_id(&self, id: Id) -> RepositoryResult<Option<Program>> {
        let sql = format!("{SELECT_PROGRAM} WHERE p.id = $1");
        let row = sqlx::query_as::<_, ProgramRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Program::try_from).transpose()
    }

    async fn find_all(&self, pagination: Pagination) -> RepositoryResult<PaginatedResult<Program>> {
        let sql = format!(
            "{SELECT_PROGRAM} ORDER BY p.start_date DESC, p.id DESC LIMIT $1 OFFSET $2"
        );
        let rows = sqlx::query_as::<_, ProgramRow>(&sql)
            .bind(pagination.limit)
            .bind(pagination.offset)
            .fetch_all(&self.pool)
            .await?;

        let total = self.count().await?;

        PaginatedResult::new(rows, total, pagination).try_map(Program::try_from)
    }

    async fn count(&self) -> RepositoryResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM pilot_programs")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn create(&self, program: &Program) -> RepositoryResult<Program> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO pilot_programs (
                name, description, status, start_date, end_date, created_at, updated_at
            ) VALUES (
                $1, $2, $3, $4, $5, NOW(), NOW()
            )
            RETURNING id
            "#,
        )
        .bind(&program.name)
        .bind(&program.description)
        .bind(program.status.as_str())
        .bind(program.start_date)
        .bind(program.end_date)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "Program"))?;

        tracing::debug!(program_id = id, "program created");

        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepositoryError::not_found("Program", id))
    }

    async fn update(&self, program: &Program) -> RepositoryResult<Program> {
        let id = program
            .id
            .ok_or_else(|| RepositoryError::Conflict("Program is not persisted".to_string()))?;

        let result = sqlx::query(
            r#"
            UPDATE pilot_programs SET
                name = $1,
                description = $2,
                status = $3,
                start_date = $4,
                end_date = $5,
                updated_at = NOW()
            WHERE id = $6
            "#,
        )
        .bind(&program.name)
        .bind(&program.description)
        .bind(program.status.as_str())
        .bind(program.start_date)
        .bind(program.end_date)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::not_found("Program", id));
        }

        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepositoryError::not_found("Program", id))
    }

    async fn delete(&self, id: Id) -> RepositoryResult<()> {
        let has_sites = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM pilot_sites WHERE program_id = $1)",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        if has_sites {
            return Err(RepositoryError::Conflict(
                "Cannot delete a program that still has sites".to_string(),
            ));
        }

        let result = sqlx::query("DELETE FROM pilot_programs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::from_write(e, "Program"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::not_found("Program", id));
        }

        Ok(())
    }

    async fn exists(&self, id: Id) -> RepositoryResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM pilot_programs WHERE id = $1)",
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
    use pilot_models::ProgramStatus;

    fn row(status: &str) -> ProgramRow {
        ProgramRow {
            id: 3,
            name: "Cold chain".into(),
            description: None,
            status: status.into(),
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            total_sites: 2,
            total_submissions: 14,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_row_into_program() {
        let program = Program::try_from(row("inactive")).unwrap();
        assert_eq!(program.id, Some(3));
        assert_eq!(program.status, ProgramStatus::Inactive);
        assert_eq!(program.total_submissions, 14);
    }

    #[test]
    fn test_unknown_status_is_decode_error() {
        assert!(matches!(
            Program::try_from(row("archived")),
            Err(RepositoryError::Decode(_))
        ));
    }
}
