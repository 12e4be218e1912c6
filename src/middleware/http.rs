//! HTTP-level middleware (cross-cutting concerns).
//!
//! Responsibility:
//! - Access logging / request tracing (TraceLayer)
//! - Panic recovery (500 JSON instead of a dropped connection)
//! - Global request timeout
//!
//! Request-Id tagging lives in `request_id`, body limits in `body_limit`.
//! Every function here is generic over the router state so the pipeline
//! can wrap any router.

use std::any::Any;
use std::time::{Duration, Instant};

use axum::Router;
use axum::error_handling::HandleErrorLayer;
use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use tower::timeout::TimeoutLayer;
use tower::{BoxError, ServiceBuilder};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use crate::error::AppError;
use crate::middleware::request_id::request_id;

/// Access log around every request.
///
/// Two records per request, both inside a span carrying the request id:
/// - `request started` with method and path
/// - `request finished` with status, status text and latency
///
/// The response record reads the status the downstream committed, so a
/// handler that never set one logs 200. A request dropped before the
/// downstream answered still gets its `request finished` record, with
/// status 499.
pub fn apply_access_log<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let trace = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let request_id = request_id(req.extensions()).unwrap_or("-");
            tracing::info_span!("http_request", request_id = %request_id)
        })
        .on_request(|req: &Request, _span: &Span| {
            tracing::info!(
                method = %req.method(),
                path = %req.uri().path(),
                "request started"
            );
        })
        .on_response(|res: &Response, latency: Duration, _span: &Span| {
            let status = res.status();
            tracing::info!(
                status = status.as_u16(),
                status_text = status.canonical_reason().unwrap_or(""),
                latency_ms = latency.as_secs_f64() * 1000.0,
                "request finished"
            );
        })
        // 5xx responses are already covered by `request finished`.
        .on_failure(());

    router
        .layer(middleware::from_fn(log_cancelled))
        .layer(trace)
}

/// Status logged for requests whose future was dropped before completion.
const CLIENT_CLOSED_REQUEST: u16 = 499;

async fn log_cancelled(req: Request, next: Next) -> Response {
    let mut pending = PendingLog {
        started: Instant::now(),
        done: false,
    };
    let response = next.run(req).await;
    pending.done = true;
    response
}

/// Runs inside the request span, so the record carries the request id.
struct PendingLog {
    started: Instant,
    done: bool,
}

impl Drop for PendingLog {
    fn drop(&mut self) {
        if !self.done {
            tracing::info!(
                status = CLIENT_CLOSED_REQUEST,
                status_text = "Client Closed Request",
                latency_ms = self.started.elapsed().as_secs_f64() * 1000.0,
                "request finished"
            );
        }
    }
}

/// Turn a panicking handler into a 500 JSON response the outer layers can
/// observe and count.
pub fn apply_catch_panic<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(CatchPanicLayer::custom(panic_response))
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = %detail, "handler panicked");
    AppError::Internal.into_response()
}

/// Bound the downstream call. An elapsed deadline becomes a 408 JSON error
/// that the outer layers (metrics, access log) observe like any response.
pub fn apply_timeout<S>(router: Router<S>, timeout: Duration) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let layers = ServiceBuilder::new()
        // Make the service error `Infallible` by converting errors into responses.
        .layer(HandleErrorLayer::new(timeout_error))
        .layer(TimeoutLayer::new(timeout));

    router.layer(layers)
}

async fn timeout_error(err: BoxError) -> AppError {
    if err.is::<tower::timeout::error::Elapsed>() {
        AppError::RequestTimeout
    } else {
        tracing::error!(error = %err, "unhandled middleware error");
        AppError::Internal
    }
}
