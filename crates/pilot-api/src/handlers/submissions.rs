//! Submission API handlers

use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use pilot_core::traits::Id;
use pilot_db::SubmissionRepository;
use pilot_models::Submission;

use super::{require_view, resource};
use crate::error::{ApiError, ApiResult};
use crate::extractors::{AppState, AuthenticatedUser};

pub(crate) async fn load_submission(state: &AppState, id: Id) -> ApiResult<Submission> {
    SubmissionRepository::new(state.pool()?.clone())
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Submission", id))
}

/// GET /api/v1/submissions/:id
pub async fn get_submission(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Id>,
) -> ApiResult<impl IntoResponse> {
    let submission = load_submission(&state, id).await?;
    require_view(&user, submission.program_id)?;

    Ok(resource("Submission", submission))
}
