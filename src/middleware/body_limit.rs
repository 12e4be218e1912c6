//! Request body size cap for API routes.
//!
//! Responsibility:
//! - Reject a declared length above the cap with 413 before any read
//! - Wrap the body so an undeclared or lying body fails once it crosses the cap
//! - Rewrite an extractor's plain-text 413 into the JSON error body
//!
//! Paths outside `/api/v1/` are forwarded untouched.

use axum::{
    Router,
    body::{Body, HttpBody},
    extract::{DefaultBodyLimit, Request, State},
    http::{StatusCode, header},
    middleware::{self, Next},
    response::Response,
};
use http_body_util::Limited;

use crate::error::AppError;
use crate::middleware::auth::access::API_PREFIX;

pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyLimit {
    pub max_bytes: usize,
}

impl Default for BodyLimit {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl BodyLimit {
    pub fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }

    fn exceeded_by(&self, declared: u64) -> bool {
        declared > self.max_bytes as u64
    }
}

pub fn apply<S>(router: Router<S>, limit: BodyLimit) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .layer(middleware::from_fn_with_state(limit, limit_body))
        // The cap above replaces axum's 2 MiB extractor default.
        .layer(DefaultBodyLimit::disable())
}

async fn limit_body(
    State(limit): State<BodyLimit>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !req.uri().path().starts_with(API_PREFIX) {
        return Ok(next.run(req).await);
    }

    let declared = req
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .or_else(|| req.body().size_hint().exact());

    if let Some(declared) = declared.filter(|len| limit.exceeded_by(*len)) {
        tracing::info!(
            path = %req.uri().path(),
            declared,
            max_bytes = limit.max_bytes,
            "request body too large"
        );
        return Err(AppError::PayloadTooLarge);
    }

    let path = req.uri().path().to_owned();
    let req = req.map(|body| Body::new(Limited::new(body, limit.max_bytes)));
    let response = next.run(req).await;

    if response.status() == StatusCode::PAYLOAD_TOO_LARGE && !is_json(&response) {
        tracing::info!(
            path = %path,
            max_bytes = limit.max_bytes,
            "request body exceeded limit while reading"
        );
        return Err(AppError::PayloadTooLarge);
    }

    Ok(response)
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"))
}
