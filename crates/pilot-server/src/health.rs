//! Health checks
//!
//! The only component with an external dependency is the database; its
//! report is cached briefly so probes do not hammer the pool.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use pilot_db::Database;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy | Self::Degraded)
    }

    /// The worse of the two
    fn combine(self, other: HealthStatus) -> HealthStatus {
        match (self, other) {
            (Self::Unhealthy, _) | (_, Self::Unhealthy) => Self::Unhealthy,
            (Self::Degraded, _) | (_, Self::Degraded) => Self::Degraded,
            _ => Self::Healthy,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ComponentHealth {
    pub name: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub response_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_seconds: u64,
    pub components: Vec<ComponentHealth>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl HealthReport {
    pub fn http_status(&self) -> StatusCode {
        if self.status.is_healthy() {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

#[derive(Debug, Clone)]
pub struct HealthConfig {
    /// Timeout for the database ping
    pub check_timeout: Duration,
    /// Pings slower than this report the database as degraded
    pub slow_threshold: Duration,
    pub cache_duration: Duration,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            check_timeout: Duration::from_secs(5),
            slow_threshold: Duration::from_secs(1),
            cache_duration: Duration::from_secs(10),
        }
    }
}

struct CachedHealth {
    report: HealthReport,
    cached_at: Instant,
}

pub struct HealthChecker {
    config: HealthConfig,
    start_time: Instant,
    cache: RwLock<Option<CachedHealth>>,
    database: Option<Database>,
}

impl HealthChecker {
    pub fn new(config: HealthConfig) -> Self {
        Self {
            config,
            start_time: Instant::now(),
            cache: RwLock::new(None),
            database: None,
        }
    }

    pub fn with_database(mut self, database: Database) -> Self {
        self.database = Some(database);
        self
    }

    /// Cached report, refreshed once it is older than `cache_duration`
    pub async fn check(&self) -> HealthReport {
        {
            let cache = self.cache.read().await;
            if let Some(ref cached) = *cache {
                if cached.cached_at.elapsed() < self.config.cache_duration {
                    debug!("Returning cached health report");
                    return cached.report.clone();
                }
            }
        }

        let report = self.perform_checks().await;

        let mut cache = self.cache.write().await;
        *cache = Some(CachedHealth {
            report: report.clone(),
            cached_at: Instant::now(),
        });

        report
    }

    async fn perform_checks(&self) -> HealthReport {
        let components = vec![self.check_database().await];
        let status = components
            .iter()
            .fold(HealthStatus::Healthy, |acc, c| acc.combine(c.status));

        HealthReport {
            status,
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            components,
            timestamp: chrono::Utc::now(),
        }
    }

    async fn check_database(&self) -> ComponentHealth {
        let start = Instant::now();

        let Some(ref database) = self.database else {
            return ComponentHealth {
                name: "database".to_string(),
                status: HealthStatus::Unhealthy,
                message: Some("Not configured".to_string()),
                response_time_ms: 0,
                details: None,
            };
        };

        let (status, message) =
            match tokio::time::timeout(self.config.check_timeout, database.ping()).await {
                Ok(Ok(())) if start.elapsed() > self.config.slow_threshold => {
                    (HealthStatus::Degraded, "Slow response".to_string())
                }
                Ok(Ok(())) => (HealthStatus::Healthy, "Connected".to_string()),
                Ok(Err(e)) => {
                    warn!(error = %e, "database health check failed");
                    (HealthStatus::Unhealthy, e.to_string())
                }
                Err(_) => {
                    warn!("database health check timed out");
                    (HealthStatus::Unhealthy, "Timed out".to_string())
                }
            };

        let stats = database.stats();
        ComponentHealth {
            name: "database".to_string(),
            status,
            message: Some(message),
            response_time_ms: start.elapsed().as_millis() as u64,
            details: Some(serde_json::json!({
                "type": "postgresql",
                "pool_size": stats.size,
                "idle_connections": stats.idle,
            })),
        }
    }
}

/// Liveness probe: the process answers
pub async fn liveness() -> &'static str {
    "OK"
}

/// Readiness probe: the database answers
pub async fn readiness(State(health): State<Arc<HealthChecker>>) -> StatusCode {
    health.check().await.http_status()
}

/// Full report
pub async fn health(State(health): State<Arc<HealthChecker>>) -> (StatusCode, Json<HealthReport>) {
    let report = health.check().await;
    (report.http_status(), Json(report))
}
