//! Prometheus metrics for the API server.

use axum::body::Body;
use axum::extract::MatchedPath;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

/// Install the Prometheus recorder and return a handle to render it.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "qledger_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "qledger_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "qledger_http_requests_in_flight";

    // Ledger metrics
    pub const DECISIONS_TOTAL: &str = "qledger_decisions_total";
    pub const WINDOW_RESETS_TOTAL: &str = "qledger_window_resets_total";
    pub const COMMIT_CONFLICTS_TOTAL: &str = "qledger_commit_conflicts_total";
    pub const PERSIST_FAILURES_TOTAL: &str = "qledger_persist_failures_total";
    pub const CREDITS_DEBITED_TOTAL: &str = "qledger_credits_debited_total";

    // Rate limiting metrics
    pub const RATE_LIMIT_HITS_TOTAL: &str = "qledger_rate_limit_hits_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", path.to_string()),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record an affordability decision.
pub fn record_decision(kind: &str, outcome: &str) {
    let labels = [("kind", kind.to_string()), ("outcome", outcome.to_string())];
    counter!(names::DECISIONS_TOTAL, &labels).increment(1);
}

/// Record a window reset. `window` is `credit` or `image`.
pub fn record_window_reset(window: &'static str) {
    counter!(names::WINDOW_RESETS_TOTAL, "window" => window).increment(1);
}

/// Record a conditional write that lost to a concurrent writer.
pub fn record_commit_conflict() {
    counter!(names::COMMIT_CONFLICTS_TOTAL).increment(1);
}

/// Record a debit that could not be persisted.
pub fn record_persist_failure() {
    counter!(names::PERSIST_FAILURES_TOTAL).increment(1);
}

/// Record credits taken by a committed action.
pub fn record_credits_debited(kind: &str, credits: u32) {
    let labels = [("kind", kind.to_string())];
    counter!(names::CREDITS_DEBITED_TOTAL, &labels).increment(u64::from(credits));
}

/// Record rate limit hit.
pub fn record_rate_limit_hit(endpoint: &str) {
    let labels = [("endpoint", endpoint.to_string())];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

/// Label for a request path: the matched route template, or a fixed bucket.
fn route_label(request: &Request<Body>) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string())
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = route_label(&request);
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);
    let response = next.run(request).await;
    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    record_http_request(&method, &path, response.status().as_u16(), start.elapsed().as_secs_f64());

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unmatched_paths_share_one_label() {
        let request = Request::builder()
            .uri("/random/abc123")
            .body(Body::empty())
            .unwrap();
        assert_eq!(route_label(&request), "unmatched");
    }

    #[test]
    fn test_metric_names_are_prefixed() {
        for name in [
            names::HTTP_REQUESTS_TOTAL,
            names::DECISIONS_TOTAL,
            names::WINDOW_RESETS_TOTAL,
            names::COMMIT_CONFLICTS_TOTAL,
        ] {
            assert!(name.starts_with("qledger_"), "{}", name);
        }
    }
}
