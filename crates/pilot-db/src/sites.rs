//! Site repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pilot_core::traits::Id;
use pilot_models::Site;
use sqlx::{FromRow, PgPool};

use crate::repository::{
    decode, Pagination, PaginatedResult, Repository, RepositoryError, RepositoryResult,
};

#[derive(Debug, Clone, FromRow)]
pub struct SiteRow {
    pub id: i64,
    pub program_id: i64,
    pub name: String,
    pub site_type: String,
    pub description: Option<String>,
    pub total_petris: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<SiteRow> for Site {
    type Error = RepositoryError;

    fn try_from(row: SiteRow) -> RepositoryResult<Self> {
        Ok(Site {
            id: Some(row.id),
            program_id: row.program_id,
            name: row.name,
            site_type: decode(&row.site_type)?,
            description: row.description,
            total_petris: row.total_petris,
            created_at: Some(row.created_at),
            updated_at: Some(row.updated_at),
        })
    }
}

pub struct SiteRepository {
    pool: PgPool,
}

impl SiteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_program(
        &self,
        program_id: Id,
        pagination: Pagination,
    ) -> RepositoryResult<PaginatedResult<Site>> {
        let rows = sqlx::query_as::<_, SiteRow>(
            r#"
            SELECT id, program_id, name, site_type, description, total_petris,
                   created_at, updated_at
            FROM pilot_sites
            WHERE program_id = $1
            ORDER BY name ASC, id ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(program_id)
        .bind(pagination.limit)
        .bind(pagination.offset)
        .fetch_all(&self.pool)
        .await?;

        let total =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM pilot_sites WHERE program_id = $1")
                .bind(program_id)
                .fetch_one(&self.pool)
                .await?;

        PaginatedResult::new(rows, total, pagination).try_map(Site::try_from)
    }
}

#[async_trait]
impl Repository<Site> for SiteRepository {
    async fn find_by_id(&self, id: Id) -> RepositoryResult<Option<Site>> {
        let row = sqlx::query_as::<_, SiteRow>(
            r#"
            SELECT id, program_id, name, site_type, description, total_petris,
                   created_at, updated_at
            FROM pilot_sites
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Site::try_from).transpose()
    }

    async fn find_all(&self, pagination: Pagination) -> RepositoryResult<PaginatedResult<Site>> {
        let rows = sqlx::query_as::<_, SiteRow>(
            r#"
            SELECT id, program_id, name, site_type, description, total_petris,
                   created_at, updated_at
            FROM pilot_sites
            ORDER BY program_id ASC, name ASC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(pagination.limit)
        .bind(pagination.offset)
        .fetch_all(&self.pool)
        .await?;

        let total = self.count().await?;

        PaginatedResult::new(rows, total, pagination).try_map(Site::try_from)
    }

    async fn count(&self) -> RepositoryResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM pilot_sites")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn create(&self, site: &Site) -> RepositoryResult<Site> {
        let row = sqlx::query_as::<_, SiteRow>(
            r#"
            INSERT INTO pilot_sites (
                program_id, name, site_type, description, total_petris, created_at, updated_at
            ) VALUES (
                $1, $2, $3, $4, $5, NOW(), NOW()
            )
            RETURNING id, program_id, name, site_type, description, total_petris,
                      created_at, updated_at
            "#,
        )
        .bind(site.program_id)
        .bind(&site.name)
        .bind(site.site_type.as_str())
        .bind(&site.description)
        .bind(site.total_petris)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "Site"))?;

        Site::try_from(row)
    }

    async fn update(&self, site: &Site) -> RepositoryResult<Site> {
        let id = site
            .id
            .ok_or_else(|| RepositoryError::Conflict("Site is not persisted".to_string()))?;

        let row = sqlx::query_as::<_, SiteRow>(
            r#"
            UPDATE pilot_sites SET
                name = $1,
                site_type = $2,
                description = $3,
                total_petris = $4,
                updated_at = NOW()
            WHERE id = $5
            RETURNING id, program_id, name, site_type, description, total_petris,
                      created_at, updated_at
            "#,
        )
        .bind(&site.name)
        .bind(site.site_type.as_str())
        .bind(&site.description)
        .bind(site.total_petris)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::not_found("Site", id))?;

        Site::try_from(row)
    }

    async fn delete(&self, id: Id) -> RepositoryResult<()> {
        let result = sqlx::query("DELETE FROM pilot_sites WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::from_write(e, "Site"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::not_found("Site", id));
        }

        Ok(())
    }

    async fn exists(&self, id: Id) -> RepositoryResult<bool> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM pilot_sites WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }
}
