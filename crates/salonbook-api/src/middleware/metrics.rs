//! # Request Metrics
//!
//! Records a request counter and a latency histogram through the `metrics`
//! facade, labelled by method, matched route, and status. Recording is a
//! no-op until the binary installs the Prometheus recorder.

use std::time::Instant;

use axum::extract::{MatchedPath, Request};
use axum::middleware::Next;
use axum::response::Response;

/// Requests served, labelled by method, route and status.
pub const HTTP_REQUESTS_TOTAL: &str = "salonbook_http_requests_total";
/// Request latency in seconds, labelled by method and route.
pub const HTTP_REQUEST_DURATION_SECONDS: &str = "salonbook_http_request_duration_seconds";

/// Middleware that records request count and latency.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let method = request.method().as_str().to_owned();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());
    let started = Instant::now();

    let response = next.run(request).await;

    let status = response.status().as_u16().to_string();
    metrics::counter!(
        HTTP_REQUESTS_TOTAL,
        "method" => method.clone(),
        "route" => route.clone(),
        "status" => status
    )
    .increment(1);
    metrics::histogram!(
        HTTP_REQUEST_DURATION_SECONDS,
        "method" => method,
        "route" => route
    )
    .record(started.elapsed().as_secs_f64());

    response
}
