//! Program API handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use pilot_contracts::permissions::{can_view_program, MANAGE_PROGRAMS};
use pilot_contracts::UserContext;
use pilot_core::pagination::PaginatedResponse;
use pilot_core::traits::Id;
use pilot_db::{ProgramRepository, Repository};
use pilot_models::{CreateProgramDto, Program, UpdateProgramDto};
use pilot_services::programs::{CreateProgramService, DeleteProgramService, UpdateProgramService};
use serde::Deserialize;

use super::{require_logged_in, require_permission, require_view, resource, Resource};
use crate::error::{ApiError, ApiResult};
use crate::extractors::{AppState, AuthenticatedUser, HalResponse, Pagination};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramFilters {
    #[serde(default)]
    pub active_only: bool,
}

pub(crate) async fn load_program(state: &AppState, id: Id) -> ApiResult<Program> {
    let pool = state.pool()?;
    ProgramRepository::new(pool.clone())
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Program", id))
}

/// List programs with their progress.
///
/// Programs the user cannot see are left out of the page.
///
/// GET /api/v1/programs
pub async fn list_programs(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    pagination: Pagination,
    Query(filters): Query<ProgramFilters>,
) -> ApiResult<impl IntoResponse> {
    let pool = state.pool()?;
    let repo = ProgramRepository::new(pool.clone());

    let page = if filters.active_only {
        repo.find_active(pagination.window()).await?
    } else {
        repo.find_all(pagination.window()).await?
    };

    let elements: Vec<_> = page
        .items
        .into_iter()
        .filter(|program| program.id.is_some_and(|id| can_view_program(&user.0, id)))
        .map(|program| Resource::new("Program", program.with_progress(&*state.clock)))
        .collect();

    Ok(HalResponse(PaginatedResponse::new(
        elements,
        page.total,
        &pagination,
        "/api/v1/programs",
    )))
}

/// GET /api/v1/programs/:id
pub async fn get_program(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Id>,
) -> ApiResult<impl IntoResponse> {
    let program = load_program(&state, id).await?;
    require_view(&user, id)?;

    Ok(resource("Program", program.with_progress(&*state.clock)))
}

/// Progress fields only
///
/// GET /api/v1/programs/:id/progress
pub async fn get_program_progress(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Id>,
) -> ApiResult<impl IntoResponse> {
    let program = load_program(&state, id).await?;
    require_view(&user, id)?;

    Ok(resource("ProgramProgress", program.progress(&*state.clock)))
}

/// POST /api/v1/programs
pub async fn create_program(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(dto): Json<CreateProgramDto>,
) -> ApiResult<impl IntoResponse> {
    require_logged_in(&user)?;
    if !user.allowed_globally(MANAGE_PROGRAMS) {
        return Err(ApiError::forbidden("You are not authorized to manage programs"));
    }

    let pool = state.pool()?;
    let program = CreateProgramService::new(&user.0).call(dto).into_result()?;
    let program = ProgramRepository::new(pool.clone()).create(&program).await?;

    tracing::info!(program_id = ?program.id, user_id = user.id, "program created");

    Ok((
        StatusCode::CREATED,
        resource("Program", program.with_progress(&*state.clock)),
    ))
}

/// PATCH /api/v1/programs/:id
pub async fn update_program(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Id>,
    Json(dto): Json<UpdateProgramDto>,
) -> ApiResult<impl IntoResponse> {
    require_logged_in(&user)?;
    let program = load_program(&state, id).await?;
    require_permission(&user, MANAGE_PROGRAMS, id)?;

    let program = UpdateProgramService::new(&user.0, program)
        .call(&dto)
        .into_result()?;
    let program = ProgramRepository::new(state.pool()?.clone())
        .update(&program)
        .await?;

    Ok(resource("Program", program.with_progress(&*state.clock)))
}

/// Refused with 409 while the program still has sites
///
/// DELETE /api/v1/programs/:id
pub async fn delete_program(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Id>,
) -> ApiResult<impl IntoResponse> {
    require_logged_in(&user)?;
    let program = load_program(&state, id).await?;
    require_permission(&user, MANAGE_PROGRAMS, id)?;

    if program.total_sites > 0 {
        return Err(ApiError::conflict(format!(
            "Program still has {} sites",
            program.total_sites
        )));
    }

    DeleteProgramService::new(&user.0)
        .call(&program)
        .into_result()?;
    ProgramRepository::new(state.pool()?.clone())
        .delete(id)
        .await?;

    tracing::info!(program_id = id, user_id = user.id, "program deleted");

    Ok(StatusCode::NO_CONTENT)
}
