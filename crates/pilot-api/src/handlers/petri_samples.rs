//! Petri sample API handlers
//!
//! Samples hang off a submission; whether they can still be added or edited
//! depends on the state of the submission's session.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use pilot_contracts::permissions::SUBMIT_DATA;
use pilot_contracts::sessions::SessionSnapshot;
use pilot_core::pagination::PaginatedResponse;
use pilot_core::traits::Id;
use pilot_db::{PetriCounts, PetriSampleRepository, SessionRepository};
use pilot_models::{CreatePetriSampleDto, UpdatePetriSampleDto};
use pilot_services::petri_samples::{AddPetriSampleService, UpdatePetriSampleService};

use super::sites::load_site;
use super::submissions::load_submission;
use super::{require_logged_in, require_permission, require_view, resource, Resource};
use crate::error::{ApiError, ApiResult};
use crate::extractors::{AppState, AuthenticatedUser, HalResponse};

/// The session owning `submission_id` as of now, plus the sample counts
async fn snapshot_for(
    state: &AppState,
    submission_id: Id,
) -> ApiResult<(SessionSnapshot, PetriCounts)> {
    let pool = state.pool()?;
    let session = SessionRepository::new(pool.clone())
        .find_by_submission(submission_id)
        .await?
        .ok_or_else(|| {
            ApiError::internal(format!("Submission {} has no session", submission_id))
        })?;
    let site = load_site(state, session.site_id).await?;
    let counts = PetriSampleRepository::new(pool.clone())
        .counts_for_submission(submission_id)
        .await?;

    let snapshot = SessionSnapshot {
        session,
        today: state.today(),
        expiry_enabled: state.session_expiry(),
        expected_petris: i64::from(site.total_petris),
        complete_petris: counts.complete,
    };
    Ok((snapshot, counts))
}

/// Ordered by petri code
///
/// GET /api/v1/submissions/:id/petri_samples
pub async fn list_petri_samples(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(submission_id): Path<Id>,
) -> ApiResult<impl IntoResponse> {
    let submission = load_submission(&state, submission_id).await?;
    require_view(&user, submission.program_id)?;

    let samples = PetriSampleRepository::new(state.pool()?.clone())
        .find_by_submission(submission_id)
        .await?;
    let elements = samples
        .into_iter()
        .map(|sample| Resource::new("PetriSample", sample))
        .collect();

    Ok(HalResponse(PaginatedResponse::all(
        elements,
        &format!("/api/v1/submissions/{}/petri_samples", submission_id),
    )))
}

/// POST /api/v1/submissions/:id/petri_samples
pub async fn add_petri_sample(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(submission_id): Path<Id>,
    Json(dto): Json<CreatePetriSampleDto>,
) -> ApiResult<impl IntoResponse> {
    require_logged_in(&user)?;
    let submission = load_submission(&state, submission_id).await?;
    require_permission(&user, SUBMIT_DATA, submission.program_id)?;

    let (snapshot, counts) = snapshot_for(&state, submission_id).await?;
    let sample = AddPetriSampleService::new(&user.0, &snapshot, counts.total)
        .call(dto)
        .into_result()?;
    let sample = PetriSampleRepository::new(state.pool()?.clone())
        .create(&sample)
        .await?;

    tracing::info!(
        sample_id = ?sample.id,
        submission_id,
        petri_code = %sample.petri_code,
        "petri sample added"
    );

    Ok((StatusCode::CREATED, resource("PetriSample", sample)))
}

/// Attaching an image marks the sample complete
///
/// PATCH /api/v1/petri_samples/:id
pub async fn update_petri_sample(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Id>,
    Json(dto): Json<UpdatePetriSampleDto>,
) -> ApiResult<impl IntoResponse> {
    require_logged_in(&user)?;
    let repo = PetriSampleRepository::new(state.pool()?.clone());
    let sample = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("PetriSample", id))?;

    let (snapshot, _) = snapshot_for(&state, sample.submission_id).await?;
    require_permission(&user, SUBMIT_DATA, snapshot.session.program_id)?;

    let sample = UpdatePetriSampleService::new(&user.0, &snapshot, sample)
        .call(&dto)
        .into_result()?;
    let sample = repo.update(&sample).await?;

    Ok(resource("PetriSample", sample))
}
