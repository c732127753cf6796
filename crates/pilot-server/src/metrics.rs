//! Request metrics
//!
//! Counters fed by [`metrics_middleware`] and exported as Prometheus text
//! or JSON.

use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;
use tracing::{debug, info_span, Instrument};

pub struct Metrics {
    pub http_requests_total: AtomicU64,
    pub http_requests_2xx: AtomicU64,
    pub http_requests_4xx: AtomicU64,
    pub http_requests_5xx: AtomicU64,
    /// 409 answers: lost session races and refused deletes
    pub http_conflicts_total: AtomicU64,
    pub http_request_duration_ms_total: AtomicU64,
    pub in_flight_requests: AtomicU64,
    start_time: Instant,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            http_requests_total: AtomicU64::new(0),
            http_requests_2xx: AtomicU64::new(0),
            http_requests_4xx: AtomicU64::new(0),
            http_requests_5xx: AtomicU64::new(0),
            http_conflicts_total: AtomicU64::new(0),
            http_request_duration_ms_total: AtomicU64::new(0),
            in_flight_requests: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_request(&self, status: StatusCode, duration_ms: u64) {
        self.http_requests_total.fetch_add(1, Ordering::Relaxed);
        self.http_request_duration_ms_total
            .fetch_add(duration_ms, Ordering::Relaxed);

        let code = status.as_u16();
        if (200..300).contains(&code) {
            self.http_requests_2xx.fetch_add(1, Ordering::Relaxed);
        } else if (400..500).contains(&code) {
            self.http_requests_4xx.fetch_add(1, Ordering::Relaxed);
        } else if code >= 500 {
            self.http_requests_5xx.fetch_add(1, Ordering::Relaxed);
        }
        if status == StatusCode::CONFLICT {
            self.http_conflicts_total.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Prometheus text exposition format
    pub fn export_prometheus(&self) -> String {
        let counters: [(&str, &str, &str, u64); 6] = [
            (
                "pilot_http_requests_total",
                "counter",
                "Total number of HTTP requests",
                self.http_requests_total.load(Ordering::Relaxed),
            ),
            (
                "pilot_http_conflicts_total",
                "counter",
                "HTTP requests answered with 409 Conflict",
                self.http_conflicts_total.load(Ordering::Relaxed),
            ),
            (
                "pilot_http_request_duration_ms_total",
                "counter",
                "Total HTTP request duration in milliseconds",
                self.http_request_duration_ms_total.load(Ordering::Relaxed),
            ),
            (
                "pilot_http_requests_in_flight",
                "gauge",
                "Requests currently being served",
                self.in_flight_requests.load(Ordering::Relaxed),
            ),
            (
                "pilot_uptime_seconds",
                "gauge",
                "Server uptime in seconds",
                self.uptime_seconds(),
            ),
            (
                "pilot_http_requests_5xx_total",
                "counter",
                "HTTP requests that failed on the server side",
                self.http_requests_5xx.load(Ordering::Relaxed),
            ),
        ];

        let mut output = String::new();
        for (name, kind, help, value) in counters {
            let _ = writeln!(output, "# HELP {name} {help}");
            let _ = writeln!(output, "# TYPE {name} {kind}");
            let _ = writeln!(output, "{name} {value}");
        }

        output.push_str("# HELP pilot_http_requests_by_status HTTP requests by status class\n");
        output.push_str("# TYPE pilot_http_requests_by_status counter\n");
        for (class, counter) in [
            ("2xx", &self.http_requests_2xx),
            ("4xx", &self.http_requests_4xx),
            ("5xx", &self.http_requests_5xx),
        ] {
            let _ = writeln!(
                output,
                "pilot_http_requests_by_status{{status=\"{class}\"}} {}",
                counter.load(Ordering::Relaxed)
            );
        }

        output
    }

    pub fn export_json(&self) -> serde_json::Value {
        serde_json::json!({
            "http": {
                "requests_total": self.http_requests_total.load(Ordering::Relaxed),
                "requests_2xx": self.http_requests_2xx.load(Ordering::Relaxed),
                "requests_4xx": self.http_requests_4xx.load(Ordering::Relaxed),
                "requests_5xx": self.http_requests_5xx.load(Ordering::Relaxed),
                "conflicts_total": self.http_conflicts_total.load(Ordering::Relaxed),
                "request_duration_ms_total":
                    self.http_request_duration_ms_total.load(Ordering::Relaxed),
                "in_flight": self.in_flight_requests.load(Ordering::Relaxed),
            },
            "uptime_seconds": self.uptime_seconds(),
        })
    }
}

pub async fn metrics_middleware(
    State(metrics): State<Arc<Metrics>>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let uri = request.uri().path().to_string();

    metrics.in_flight_requests.fetch_add(1, Ordering::Relaxed);

    let response = next
        .run(request)
        .instrument(info_span!("http_request", %method, %uri))
        .await;

    let duration = start.elapsed();
    let status = response.status();

    debug!(
        method = %method,
        uri = %uri,
        status = %status,
        duration_ms = %duration.as_millis(),
        "Request completed"
    );

    metrics.record_request(status, duration.as_millis() as u64);
    metrics.in_flight_requests.fetch_sub(1, Ordering::Relaxed);

    response
}

/// GET /metrics
pub async fn prometheus_metrics(State(metrics): State<Arc<Metrics>>) -> String {
    metrics.export_prometheus()
}

/// GET /metrics.json
pub async fn json_metrics(State(metrics): State<Arc<Metrics>>) -> axum::Json<serde_json::Value> {
    axum::Json(metrics.export_json())
}
