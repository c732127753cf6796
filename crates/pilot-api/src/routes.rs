//! API routes

use axum::{
    routing::{get, patch, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::extractors::AppState;
use crate::handlers::{petri_samples, programs, sessions, sites, submissions};

/// Create the complete API router
pub fn router() -> Router<AppState> {
    Router::new().nest("/api/v1", api_v1_router())
}

fn api_v1_router() -> Router<AppState> {
    Router::new()
        .route("/", get(api_root))
        .nest("/programs", programs_router())
        .nest("/sites", sites_router())
        .nest("/sessions", sessions_router())
        .nest("/submissions", submissions_router())
        .route("/petri_samples/:id", patch(petri_samples::update_petri_sample))
}

fn programs_router() -> Router<AppState> {
    Router::new()
        .route("/", get(programs::list_programs).post(programs::create_program))
        .route(
            "/:id",
            get(programs::get_program)
                .patch(programs::update_program)
                .delete(programs::delete_program),
        )
        .route("/:id/progress", get(programs::get_program_progress))
        .route(
            "/:id/sites",
            get(sites::list_program_sites).post(sites::create_site),
        )
}

fn sites_router() -> Router<AppState> {
    Router::new()
        .route("/:id", get(sites::get_site).patch(sites::update_site))
        .route("/:id/submissions", get(sites::list_site_submissions))
        .route("/:id/sessions", post(sessions::open_session))
}

fn sessions_router() -> Router<AppState> {
    Router::new()
        .route("/active", get(sessions::list_active_sessions))
        .route("/:id", get(sessions::get_session))
        .route("/:id/claim", post(sessions::claim_session))
        .route("/:id/unclaim", post(sessions::unclaim_session))
        .route("/:id/escalate", post(sessions::escalate_session))
        .route("/:id/share", post(sessions::share_session))
        .route("/:id/complete", post(sessions::complete_session))
        .route("/:id/cancel", post(sessions::cancel_session))
}

fn submissions_router() -> Router<AppState> {
    Router::new()
        .route("/:id", get(submissions::get_submission))
        .route(
            "/:id/petri_samples",
            get(petri_samples::list_petri_samples).post(petri_samples::add_petri_sample),
        )
}

async fn api_root() -> Json<Value> {
    Json(json!({
        "_type": "Root",
        "instanceName": "Pilot Program Monitor",
        "_links": {
            "self": { "href": "/api/v1" },
            "programs": { "href": "/api/v1/programs" },
            "activeSessions": { "href": "/api/v1/sessions/active" },
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use pilot_auth::{Claims, Role};
    use pilot_contracts::permissions::{MANAGE_PROGRAMS, VIEW_PROGRAMS};
    use pilot_core::config::AppConfig;
    use pilot_core::SystemClock;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app(state: AppState) -> Router {
        router().with_state(state)
    }

    fn optional_auth() -> AppState {
        let mut config = AppConfig::default();
        config.auth.require_authentication = false;
        AppState::new(config, None, Arc::new(SystemClock))
    }

    fn bearer(state: &AppState, claims: Claims) -> String {
        format!("Bearer {}", state.jwt.create_token(&claims).unwrap())
    }

    async fn send(state: AppState, request: Request<Body>) -> (StatusCode, Value) {
        let response = app(state).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_api_root() {
        let request = Request::get("/api/v1").body(Body::empty()).unwrap();
        let (status, json) = send(AppState::default(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["_type"], "Root");
        assert_eq!(json["_links"]["programs"]["href"], "/api/v1/programs");
    }

    #[tokio::test]
    async fn test_token_required_by_default() {
        let request = Request::get("/api/v1/programs").body(Body::empty()).unwrap();
        let (status, json) = send(AppState::default(), request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["errorIdentifier"], "urn:pilot:api:v1:errors:Unauthenticated");
    }

    #[tokio::test]
    async fn test_without_database_is_unavailable() {
        let state = AppState::default();
        let claims = Claims::new(3, Role::User, 600).with_permissions([VIEW_PROGRAMS]);
        let token = bearer(&state, claims);
        let request = Request::get("/api/v1/programs/1")
            .header(header::AUTHORIZATION, token)
            .body(Body::empty())
            .unwrap();

        let (status, json) = send(state, request).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["_type"], "Error");
    }

    #[tokio::test]
    async fn test_anonymous_cannot_write() {
        let request = Request::post("/api/v1/programs")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                r#"{"name":"Cold chain","startDate":"2025-01-01","endDate":"2025-03-31"}"#,
            ))
            .unwrap();

        let (status, _) = send(optional_auth(), request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_create_program_needs_manage_permission() {
        let state = AppState::default();
        let claims = Claims::new(3, Role::User, 600).with_permissions([VIEW_PROGRAMS]);
        let token = bearer(&state, claims);
        let request = Request::post("/api/v1/programs")
            .header(header::AUTHORIZATION, token)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                r#"{"name":"Cold chain","startDate":"2025-01-01","endDate":"2025-03-31"}"#,
            ))
            .unwrap();

        let (status, json) = send(state, request).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json["errorIdentifier"], "urn:pilot:api:v1:errors:MissingPermission");
    }

    #[tokio::test]
    async fn test_manager_reaches_database_layer() {
        let state = AppState::default();
        let claims = Claims::new(3, Role::User, 600).with_permissions([MANAGE_PROGRAMS]);
        let token = bearer(&state, claims);
        let request = Request::post("/api/v1/programs")
            .header(header::AUTHORIZATION, token)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                r#"{"name":"Cold chain","startDate":"2025-01-01","endDate":"2025-03-31"}"#,
            ))
            .unwrap();

        let (status, _) = send(state, request).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_active_sessions_requires_login() {
        let request = Request::get("/api/v1/sessions/active").body(Body::empty()).unwrap();
        let (status, _) = send(optional_auth(), request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_expired_token_rejected() {
        let state = AppState::default();
        let token = bearer(&state, Claims::new(3, Role::Admin, -3600));
        let request = Request::post("/api/v1/sessions/9/claim")
            .header(header::AUTHORIZATION, token)
            .body(Body::empty())
            .unwrap();

        let (status, _) = send(state, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
