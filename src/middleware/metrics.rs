//! Prometheus instrumentation for every request except the scrape endpoint.
//!
//! Responsibility:
//! - Request size from `Content-Length` (before forwarding)
//! - Count, latency and response size keyed by method, route template and
//!   final status (after forwarding)
//! - A request dropped mid-flight is still recorded, with status `499`
//!
//! Labels come from `MatchedPath`, so a raw path never becomes a series.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    Router,
    body::HttpBody,
    extract::{MatchedPath, Request, State},
    http::{HeaderMap, header},
    middleware::{self, Next},
    response::Response,
};

use crate::services::metrics::{HttpMetrics, UNMATCHED_ROUTE};

pub const METRICS_PATH: &str = "/metrics";

/// Status recorded for requests whose future was dropped before completion.
pub const CLIENT_CLOSED_REQUEST: &str = "499";

pub fn apply<S>(router: Router<S>, metrics: Arc<HttpMetrics>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(middleware::from_fn_with_state(metrics, record_metrics))
}

async fn record_metrics(
    State(metrics): State<Arc<HttpMetrics>>,
    req: Request,
    next: Next,
) -> Response {
    if req.uri().path() == METRICS_PATH {
        return next.run(req).await;
    }

    let method = req.method().as_str().to_owned();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_owned())
        .unwrap_or_else(|| UNMATCHED_ROUTE.to_owned());

    if let Some(bytes) = content_length(req.headers()) {
        metrics.observe_request_size(&method, &route, bytes);
    }

    let mut in_flight = InFlight {
        metrics,
        method,
        route,
        started: Instant::now(),
        done: false,
    };

    let response = next.run(req).await;

    let bytes = response
        .body()
        .size_hint()
        .exact()
        .or_else(|| content_length(response.headers()))
        .unwrap_or(0);
    in_flight.finish(response.status().as_str(), bytes);

    response
}

fn content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
}

/// Finalises the series exactly once, either from `finish` or from `Drop`
/// when the surrounding future is cancelled.
struct InFlight {
    metrics: Arc<HttpMetrics>,
    method: String,
    route: String,
    started: Instant,
    done: bool,
}

impl InFlight {
    fn finish(&mut self, status: &str, response_bytes: u64) {
        self.record(status, self.started.elapsed(), response_bytes);
    }

    fn record(&mut self, status: &str, duration: Duration, response_bytes: u64) {
        if self.done {
            return;
        }
        self.done = true;
        self.metrics
            .record_response(&self.method, &self.route, status, duration, response_bytes);
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if !self.done {
            let elapsed = self.started.elapsed();
            tracing::debug!(
                method = %self.method,
                path = %self.route,
                "request dropped before completion"
            );
            self.record(CLIENT_CLOSED_REQUEST, elapsed, 0);
        }
    }
}
