//! Site API handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use pilot_contracts::permissions::MANAGE_PROGRAMS;
use pilot_core::pagination::PaginatedResponse;
use pilot_core::traits::Id;
use pilot_db::{Repository, SiteRepository, SubmissionRepository};
use pilot_models::{CreateSiteDto, Site, UpdateSiteDto};
use pilot_services::sites::{CreateSiteService, UpdateSiteService};

use super::programs::load_program;
use super::{require_logged_in, require_permission, require_view, resource, Resource};
use crate::error::{ApiError, ApiResult};
use crate::extractors::{AppState, AuthenticatedUser, HalResponse, Pagination};

pub(crate) async fn load_site(state: &AppState, id: Id) -> ApiResult<Site> {
    let pool = state.pool()?;
    SiteRepository::new(pool.clone())
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Site", id))
}

/// GET /api/v1/programs/:id/sites
pub async fn list_program_sites(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(program_id): Path<Id>,
    pagination: Pagination,
) -> ApiResult<impl IntoResponse> {
    load_program(&state, program_id).await?;
    require_view(&user, program_id)?;

    let page = SiteRepository::new(state.pool()?.clone())
        .find_by_program(program_id, pagination.window())
        .await?;
    let elements = page
        .items
        .into_iter()
        .map(|site| Resource::new("Site", site))
        .collect();

    Ok(HalResponse(PaginatedResponse::new(
        elements,
        page.total,
        &pagination,
        &format!("/api/v1/programs/{}/sites", program_id),
    )))
}

/// POST /api/v1/programs/:id/sites
pub async fn create_site(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(program_id): Path<Id>,
    Json(dto): Json<CreateSiteDto>,
) -> ApiResult<impl IntoResponse> {
    require_logged_in(&user)?;
    let program = load_program(&state, program_id).await?;
    require_permission(&user, MANAGE_PROGRAMS, program_id)?;

    let site = CreateSiteService::new(&user.0, &program)
        .call(dto)
        .into_result()?;
    let site = SiteRepository::new(state.pool()?.clone())
        .create(&site)
        .await?;

    tracing::info!(site_id = ?site.id, program_id, "site created");

    Ok((StatusCode::CREATED, resource("Site", site)))
}

/// GET /api/v1/sites/:id
pub async fn get_site(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Id>,
) -> ApiResult<impl IntoResponse> {
    let site = load_site(&state, id).await?;
    require_view(&user, site.program_id)?;

    Ok(resource("Site", site))
}

/// PATCH /api/v1/sites/:id
pub async fn update_site(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Id>,
    Json(dto): Json<UpdateSiteDto>,
) -> ApiResult<impl IntoResponse> {
    require_logged_in(&user)?;
    let site = load_site(&state, id).await?;
    let program = load_program(&state, site.program_id).await?;
    require_permission(&user, MANAGE_PROGRAMS, site.program_id)?;

    let site = UpdateSiteService::new(&user.0, &program, site)
        .call(&dto)
        .into_result()?;
    let site = SiteRepository::new(state.pool()?.clone())
        .update(&site)
        .await?;

    Ok(resource("Site", site))
}

/// Newest first
///
/// GET /api/v1/sites/:id/submissions
pub async fn list_site_submissions(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Id>,
    pagination: Pagination,
) -> ApiResult<impl IntoResponse> {
    let site = load_site(&state, id).await?;
    require_view(&user, site.program_id)?;

    let page = SubmissionRepository::new(state.pool()?.clone())
        .find_by_site(id, pagination.window())
        .await?;
    let elements = page
        .items
        .into_iter()
        .map(|submission| Resource::new("Submission", submission))
        .collect();

    Ok(HalResponse(PaginatedResponse::new(
        elements,
        page.total,
        &pagination,
        &format!("/api/v1/sites/{}/submissions", id),
    )))
}
