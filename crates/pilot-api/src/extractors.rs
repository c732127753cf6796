//! Axum extractors and shared state for API handlers

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Query},
    http::{header, request::Parts},
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use pilot_auth::{extract_bearer_token, CurrentUser, JwtService};
use pilot_core::config::AppConfig;
use pilot_core::pagination::PaginationParams;
use pilot_core::{SharedClock, SystemClock};
use sqlx::PgPool;

use crate::error::{ApiError, ApiResult};

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: Option<PgPool>,
    pub clock: SharedClock,
    pub jwt: Arc<JwtService>,
}

impl AppState {
    pub fn new(config: AppConfig, db: Option<PgPool>, clock: SharedClock) -> Self {
        let mut jwt = JwtService::new(config.auth.jwt_secret.as_bytes());
        if let Some(ref issuer) = config.auth.jwt_issuer {
            jwt = jwt.with_issuer(issuer.clone());
        }
        if let Some(ref audience) = config.auth.jwt_audience {
            jwt = jwt.with_audience(audience.clone());
        }

        Self {
            config: Arc::new(config),
            db,
            clock,
            jwt: Arc::new(jwt),
        }
    }

    pub fn pool(&self) -> ApiResult<&PgPool> {
        self.db
            .as_ref()
            .ok_or_else(|| ApiError::service_unavailable("Database is not configured"))
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn session_expiry(&self) -> bool {
        self.config.features.session_expiry
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(AppConfig::default(), None, Arc::new(SystemClock))
    }
}

/// The user behind the request.
///
/// A bearer token is validated when present. Without one the request runs
/// as the anonymous user, unless authentication is required.
pub struct AuthenticatedUser(pub CurrentUser);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let Some(value) = parts.headers.get(header::AUTHORIZATION) else {
            if !app_state.config.auth.require_authentication {
                return Ok(AuthenticatedUser(CurrentUser::anonymous()));
            }
            return Err(ApiError::unauthorized("Authentication required"));
        };

        let token = value
            .to_str()
            .ok()
            .and_then(extract_bearer_token)
            .ok_or_else(|| ApiError::unauthorized("Expected a bearer token"))?;

        let claims = app_state.jwt.validate_token(token)?;
        let user = CurrentUser::from_claims(&claims)?;
        tracing::debug!(user_id = user.id, admin = user.is_admin, "request authenticated");

        Ok(AuthenticatedUser(user))
    }
}

impl std::ops::Deref for AuthenticatedUser {
    type Target = CurrentUser;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// `?offset=&pageSize=` with out of range values clamped
pub struct Pagination(pub PaginationParams);

impl Pagination {
    /// LIMIT/OFFSET window for repository queries
    pub fn window(&self) -> pilot_db::Pagination {
        pilot_db::Pagination::from(&self.0)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Pagination
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(params) = Query::<PaginationParams>::from_request_parts(parts, state)
            .await
            .unwrap_or_else(|_| Query(PaginationParams::default()));
        Ok(Pagination(params.normalized()))
    }
}

impl std::ops::Deref for Pagination {
    type Target = PaginationParams;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// HAL+JSON response wrapper
pub struct HalResponse<T: serde::Serialize>(pub T);

impl<T: serde::Serialize> IntoResponse for HalResponse<T> {
    fn into_response(self) -> Response {
        (
            [(header::CONTENT_TYPE, "application/hal+json; charset=utf-8")],
            Json(self.0),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use pilot_auth::{Claims, Role};
    use pilot_contracts::UserContext;

    fn parts(authorization: Option<&str>, uri: &str) -> Parts {
        let mut builder = Request::builder().uri(uri);
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    fn optional_auth_state() -> AppState {
        let mut config = AppConfig::default();
        config.auth.require_authentication = false;
        AppState::new(config, None, Arc::new(SystemClock))
    }

    #[tokio::test]
    async fn test_missing_token_rejected_when_required() {
        let state = AppState::default();
        let result = AuthenticatedUser::from_request_parts(&mut parts(None, "/"), &state).await;
        assert!(matches!(result, Err(ApiError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_missing_token_is_anonymous_when_optional() {
        let state = optional_auth_state();
        let user = AuthenticatedUser::from_request_parts(&mut parts(None, "/"), &state)
            .await
            .unwrap();
        assert!(user.is_anonymous());
    }

    #[tokio::test]
    async fn test_valid_token_builds_user() {
        let state = AppState::default();
        let claims = Claims::new(42, Role::User, 3600).with_permissions(["submit_data"]);
        let token = state.jwt.create_token(&claims).unwrap();
        let header_value = format!("Bearer {}", token);

        let user = AuthenticatedUser::from_request_parts(
            &mut parts(Some(&header_value), "/"),
            &state,
        )
        .await
        .unwrap();
        assert_eq!(user.id, 42);
        assert!(user.allowed_globally("submit_data"));
    }

    #[tokio::test]
    async fn test_garbage_token_rejected_even_when_optional() {
        let state = optional_auth_state();
        let result =
            AuthenticatedUser::from_request_parts(&mut parts(Some("Bearer nope"), "/"), &state)
                .await;
        assert!(matches!(result, Err(ApiError::Unauthorized(_))));

        let result =
            AuthenticatedUser::from_request_parts(&mut parts(Some("Basic abc"), "/"), &state)
                .await;
        assert!(matches!(result, Err(ApiError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_pagination_clamps_and_defaults() {
        let Pagination(params) =
            Pagination::from_request_parts(&mut parts(None, "/?offset=-3&pageSize=9000"), &())
                .await
                .unwrap();
        assert_eq!(params.offset, 0);
        assert_eq!(params.page_size, pilot_core::pagination::MAX_PAGE_SIZE);

        let Pagination(params) = Pagination::from_request_parts(&mut parts(None, "/?pageSize=x"), &())
            .await
            .unwrap();
        assert_eq!(params, PaginationParams::default());
    }

    #[test]
    fn test_pool_unavailable_without_database() {
        let state = AppState::default();
        assert!(matches!(state.pool(), Err(ApiError::ServiceUnavailable(_))));
    }
}
