//! Pilot program monitor server

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{extract::DefaultBodyLimit, middleware, routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pilot_api::AppState;
use pilot_core::config::{AppConfig, ServerConfig};
use pilot_core::SystemClock;
use pilot_db::{Database, DatabaseConfig};

mod health;
mod metrics;

use health::{HealthChecker, HealthConfig};
use metrics::Metrics;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::load().context("failed to load configuration")?;

    init_tracing(config.server.log_json);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        host = %config.server.host,
        port = config.server.port,
        session_expiry = config.features.session_expiry,
        session_sharing = config.features.session_sharing,
        "Starting pilot program monitor"
    );

    let db = connect_database(&config).await?;

    let metrics = Arc::new(Metrics::new());
    let mut health_checker = HealthChecker::new(HealthConfig::default());
    if let Some(ref db) = db {
        health_checker = health_checker.with_database(db.clone());
    }

    let api_state = AppState::new(
        config.clone(),
        db.as_ref().map(|d| d.pool().clone()),
        Arc::new(SystemClock),
    );

    let app = build_router(api_state, Arc::new(health_checker), metrics, &config.server);

    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(db) = db {
        db.close().await;
    }

    info!("Server shutdown complete");
    Ok(())
}

/// `RUST_LOG` style filter; JSON lines when `server.log_json` is set
fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "info,pilot_server=debug,pilot_api=debug,tower_http=debug".into()
    });

    let json_layer = json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(true)
    });
    let text_layer = (!json).then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

/// Without a database URL, or when the connection fails, the server still
/// starts: health reports unhealthy and data routes answer 503.
async fn connect_database(config: &AppConfig) -> anyhow::Result<Option<Database>> {
    if !config.has_database() {
        warn!("No database configured. Running without database.");
        return Ok(None);
    }

    let db = match Database::connect(&DatabaseConfig::from(&config.database)).await {
        Ok(db) => {
            info!("Connected to database");
            db
        }
        Err(e) => {
            warn!("Failed to connect to database: {}. Running without database.", e);
            return Ok(None);
        }
    };

    if config.database.run_migrations {
        db.migrate()
            .await
            .context("failed to apply database migrations")?;
    }

    Ok(Some(db))
}

fn build_router(
    api_state: AppState,
    health: Arc<HealthChecker>,
    metrics: Arc<Metrics>,
    server: &ServerConfig,
) -> Router {
    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(health);

    let metrics_routes = Router::new()
        .route("/metrics", get(metrics::prometheus_metrics))
        .route("/metrics.json", get(metrics::json_metrics))
        .with_state(metrics.clone());

    Router::new()
        .merge(pilot_api::router().with_state(api_state))
        .merge(health_routes)
        .merge(metrics_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(Duration::from_secs(
                    server.request_timeout_seconds,
                )))
                .layer(CompressionLayer::new())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
        .layer(DefaultBodyLimit::max(server.max_body_size_bytes))
        .layer(middleware::from_fn_with_state(
            metrics,
            metrics::metrics_middleware,
        ))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn test_app() -> (Router, Arc<Metrics>) {
        let config = AppConfig::default();
        let metrics = Arc::new(Metrics::new());
        let health = Arc::new(HealthChecker::new(HealthConfig::default()));
        let state = AppState::new(config.clone(), None, Arc::new(SystemClock));

        (
            build_router(state, health, metrics.clone(), &config.server),
            metrics,
        )
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_liveness() {
        let (app, _) = test_app();
        let (status, body) = get(app, "/health/live").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "OK");
    }

    #[tokio::test]
    async fn test_health_without_database() {
        let (app, _) = test_app();
        let (status, body) = get(app, "/health").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["status"], "unhealthy");
        assert_eq!(json["components"][0]["message"], "Not configured");
    }

    #[tokio::test]
    async fn test_api_root_mounted() {
        let (app, _) = test_app();
        let (status, body) = get(app, "/api/v1").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("\"_type\":\"Root\""));
    }

    #[tokio::test]
    async fn test_requests_are_counted() {
        let (app, metrics) = test_app();
        let (status, _) = get(app.clone(), "/api/v1/programs").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = get(app, "/metrics").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("pilot_http_requests_by_status{status=\"4xx\"} 1"));
        assert_eq!(
            metrics
                .http_requests_4xx
                .load(std::sync::atomic::Ordering::Relaxed),
            1
        );
    }
}
