//! Petri sample repository

use chrono::{DateTime, Utc};
use pilot_core::traits::Id;
use pilot_models::PetriSample;
use sqlx::{FromRow, PgPool};

use crate::repository::{decode, RepositoryError, RepositoryResult};

#[derive(Debug, Clone, FromRow)]
pub struct PetriSampleRow {
    pub id: i64,
    pub submission_id: i64,
    pub site_id: i64,
    pub petri_code: String,
    pub plant_type: String,
    pub fungicide_used: bool,
    pub surrounding_water_schedule: String,
    pub image_url: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<PetriSampleRow> for PetriSample {
    type Error = RepositoryError;

    fn try_from(row: PetriSampleRow) -> RepositoryResult<Self> {
        Ok(PetriSample {
            id: Some(row.id),
            submission_id: row.submission_id,
            site_id: row.site_id,
            petri_code: row.petri_code,
            plant_type: row.plant_type,
            fungicide_used: row.fungicide_used,
            surrounding_water_schedule: decode(&row.surrounding_water_schedule)?,
            image_url: row.image_url,
            notes: row.notes,
            created_at: Some(row.created_at),
            updated_at: Some(row.updated_at),
        })
    }
}

/// How many samples a submission has, and how many carry an image
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromRow)]
pub struct PetriCounts {
    pub total: i64,
    pub complete: i64,
}

pub struct PetriSampleRepository {
    pool: PgPool,
}

impl PetriSampleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Id) -> RepositoryResult<Option<PetriSample>> {
        let row = sqlx::query_as::<_, PetriSampleRow>(
            r#"
            SELECT id, submission_id, site_id, petri_code, plant_type, fungicide_used,
                   surrounding_water_schedule, image_url, notes, created_at, updated_at
            FROM pilot_petri_samples
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(PetriSample::try_from).transpose()
    }

    pub async fn find_by_submission(
        &self,
        submission_id: Id,
    ) -> RepositoryResult<Vec<PetriSample>> {
        let rows = sqlx::query_as::<_, PetriSampleRow>(
            r#"
            SELECT id, submission_id, site_id, petri_code, plant_type, fungicide_used,
                   surrounding_water_schedule, image_url, notes, created_at, updated_at
            FROM pilot_petri_samples
            WHERE submission_id = $1
            ORDER BY petri_code ASC
            "#,
        )
        .bind(submission_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(PetriSample::try_from).collect()
    }

    /// Complete means an image URL that is not blank, same as
    /// [`PetriSample::is_complete`].
    pub async fn counts_for_submission(&self, submission_id: Id) -> RepositoryResult<PetriCounts> {
        let counts = sqlx::query_as::<_, PetriCounts>(
            r#"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE btrim(COALESCE(image_url, '')) <> '') AS complete
            FROM pilot_petri_samples
            WHERE submission_id = $1
            "#,
        )
        .bind(submission_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(counts)
    }

    pub async fn create(&self, sample: &PetriSample) -> RepositoryResult<PetriSample> {
        let row = sqlx::query_as::<_, PetriSampleRow>(
            r#"
            INSERT INTO pilot_petri_samples (
                submission_id, site_id, petri_code, plant_type, fungicide_used,
                surrounding_water_schedule, image_url, notes, created_at, updated_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, NOW(), NOW()
            )
            RETURNING id, submission_id, site_id, petri_code, plant_type, fungicide_used,
                      surrounding_water_schedule, image_url, notes, created_at, updated_at
            "#,
        )
        .bind(sample.submission_id)
        .bind(sample.site_id)
        .bind(&sample.petri_code)
        .bind(&sample.plant_type)
        .bind(sample.fungicide_used)
        .bind(sample.surrounding_water_schedule.as_str())
        .bind(&sample.image_url)
        .bind(&sample.notes)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "Petri sample with this code"))?;

        PetriSample::try_from(row)
    }

    pub async fn update(&self, sample: &PetriSample) -> RepositoryResult<PetriSample> {
        let id = sample.id.ok_or_else(|| {
            RepositoryError::Conflict("Petri sample is not persisted".to_string())
        })?;

        let row = sqlx::query_as::<_, PetriSampleRow>(
            r#"
            UPDATE pilot_petri_samples SET
                petri_code = $1,
                plant_type = $2,
                fungicide_used = $3,
                surrounding_water_schedule = $4,
                image_url = $5,
                notes = $6,
                updated_at = NOW()
            WHERE id = $7
            RETURNING id, submission_id, site_id, petri_code, plant_type, fungicide_used,
                      surrounding_water_schedule, image_url, notes, created_at, updated_at
            "#,
        )
        .bind(&sample.petri_code)
        .bind(&sample.plant_type)
        .bind(sample.fungicide_used)
        .bind(sample.surrounding_water_schedule.as_str())
        .bind(&sample.image_url)
        .bind(&sample.notes)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "Petri sample with this code"))?
        .ok_or_else(|| RepositoryError::not_found("PetriSample", id))?;

        PetriSample::try_from(row)
    }
}
