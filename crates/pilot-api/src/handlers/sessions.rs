//! Submission session API handlers
//!
//! Opening a session creates its submission in the same transaction.
//! Every transition is computed from the row as read and written back only
//! if the row is unchanged, so a lost race answers 409.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use pilot_contracts::permissions::SUBMIT_DATA;
use pilot_contracts::sessions::{SessionSnapshot, SessionTransition};
use pilot_core::pagination::PaginatedResponse;
use pilot_core::traits::Id;
use pilot_db::{SessionDetailsRow, SessionRepository};
use pilot_models::{CreateSubmissionDto, SessionDetails, SessionStatus, Submission, SubmissionSession};
use pilot_services::sessions::{OpenSessionService, TransitionSessionService};
use serde::{Deserialize, Serialize};

use super::programs::load_program;
use super::sites::load_site;
use super::{require_logged_in, require_permission, require_view, resource, Resource};
use crate::error::{ApiError, ApiResult};
use crate::extractors::{AppState, AuthenticatedUser, HalResponse};

#[derive(Debug, Serialize)]
pub struct OpenedSessionResponse {
    pub submission: Submission,
    pub session: SessionDetails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscalateRequest {
    pub user_id: Id,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareRequest {
    pub user_ids: Vec<Id>,
}

async fn load_details(state: &AppState, id: Id) -> ApiResult<SessionDetailsRow> {
    SessionRepository::new(state.pool()?.clone())
        .find_details(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Session", id))
}

fn project(state: &AppState, row: SessionDetailsRow) -> ApiResult<SessionDetails> {
    Ok(row.into_details(state.today(), state.session_expiry())?)
}

/// Open a session at a site: creates the submission and its session
///
/// POST /api/v1/sites/:id/sessions
pub async fn open_session(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(site_id): Path<Id>,
    Json(dto): Json<CreateSubmissionDto>,
) -> ApiResult<impl IntoResponse> {
    require_logged_in(&user)?;
    let site = load_site(&state, site_id).await?;
    let program = load_program(&state, site.program_id).await?;
    require_permission(&user, SUBMIT_DATA, site.program_id)?;

    let opened = OpenSessionService::new(&user.0, &program, &site, &*state.clock)
        .call(dto)
        .into_result()?;

    let repo = SessionRepository::new(state.pool()?.clone());
    let (submission, session) = repo.open(&opened.submission, &opened.session).await?;
    let session_id = session
        .id
        .ok_or_else(|| ApiError::internal("Session insert returned no id"))?;

    tracing::info!(
        session_id,
        site_id,
        user_id = user.id,
        global_submission_id = ?submission.global_submission_id,
        "session opened"
    );

    let details = project(&state, load_details(&state, session_id).await?)?;

    Ok((
        StatusCode::CREATED,
        HalResponse(Resource::new(
            "OpenedSession",
            OpenedSessionResponse {
                submission,
                session: details,
            },
        )),
    ))
}

/// Sessions the user takes part in that are still open, most recently
/// active first. Admins see every open session.
///
/// GET /api/v1/sessions/active
pub async fn list_active_sessions(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<impl IntoResponse> {
    require_logged_in(&user)?;

    let rows = SessionRepository::new(state.pool()?.clone())
        .find_active_with_details(user.id, user.is_admin)
        .await?;

    let mut elements = Vec::with_capacity(rows.len());
    for row in rows {
        let details = project(&state, row)?;
        if details.effective_status != SessionStatus::Expired {
            elements.push(Resource::new("Session", details));
        }
    }

    Ok(HalResponse(PaginatedResponse::all(
        elements,
        "/api/v1/sessions/active",
    )))
}

/// GET /api/v1/sessions/:id
pub async fn get_session(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Id>,
) -> ApiResult<impl IntoResponse> {
    let row = load_details(&state, id).await?;
    require_view(&user, row.session.program_id)?;

    Ok(resource("Session", project(&state, row)?))
}

async fn apply_transition(
    state: AppState,
    user: AuthenticatedUser,
    id: Id,
    transition: SessionTransition,
) -> ApiResult<HalResponse<Resource<SessionDetails>>> {
    require_logged_in(&user)?;

    let row = load_details(&state, id).await?;
    require_view(&user, row.session.program_id)?;

    let snapshot = SessionSnapshot {
        session: SubmissionSession::try_from(row.session)?,
        today: state.today(),
        expiry_enabled: state.session_expiry(),
        expected_petris: row.expected_petris,
        complete_petris: row.complete_petris,
    };

    let change = TransitionSessionService::new(&user.0, &*state.clock)
        .with_sharing(state.config.features.session_sharing)
        .call(snapshot, &transition)
        .into_result()?;

    let repo = SessionRepository::new(state.pool()?.clone());
    repo.transition(
        &change.session,
        change.previous_status,
        change.previous_activity_time,
    )
    .await?;

    tracing::info!(
        session_id = id,
        user_id = user.id,
        transition = transition.name(),
        from = %change.previous_status,
        to = %change.session.session_status,
        "session transitioned"
    );

    let details = project(&state, load_details(&state, id).await?)?;
    Ok(resource("Session", details))
}

/// POST /api/v1/sessions/:id/claim
pub async fn claim_session(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Id>,
) -> ApiResult<impl IntoResponse> {
    apply_transition(state, user, id, SessionTransition::Claim).await
}

/// POST /api/v1/sessions/:id/unclaim
pub async fn unclaim_session(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Id>,
) -> ApiResult<impl IntoResponse> {
    apply_transition(state, user, id, SessionTransition::Unclaim).await
}

/// POST /api/v1/sessions/:id/escalate
pub async fn escalate_session(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Id>,
    Json(request): Json<EscalateRequest>,
) -> ApiResult<impl IntoResponse> {
    let transition = SessionTransition::Escalate {
        to: request.user_id,
    };
    apply_transition(state, user, id, transition).await
}

/// POST /api/v1/sessions/:id/share
pub async fn share_session(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Id>,
    Json(request): Json<ShareRequest>,
) -> ApiResult<impl IntoResponse> {
    let transition = SessionTransition::Share {
        with: request.user_ids,
    };
    apply_transition(state, user, id, transition).await
}

/// POST /api/v1/sessions/:id/complete
pub async fn complete_session(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Id>,
) -> ApiResult<impl IntoResponse> {
    apply_transition(state, user, id, SessionTransition::Complete).await
}

/// POST /api/v1/sessions/:id/cancel
pub async fn cancel_session(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Id>,
) -> ApiResult<impl IntoResponse> {
    apply_transition(state, user, id, SessionTransition::Cancel).await
}
