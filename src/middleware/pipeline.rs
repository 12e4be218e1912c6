//! Admission pipeline composition.
//!
//! Outermost first:
//!
//! ```text
//! RequestId -> AccessLog -> Metrics -> CatchPanic -> Timeout -> BodyLimit -> Auth -> (RoleGate) -> handler
//! ```
//!
//! `Router::layer` wraps previously added layers, so `apply` adds them
//! innermost first. Role gates are attached per route by `api::v1::routes`.

use std::time::Duration;

use axum::Router;

use crate::middleware::{
    auth,
    body_limit::{self, BodyLimit, DEFAULT_MAX_BODY_BYTES},
    http, metrics, request_id,
};
use crate::state::AppState;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    pub max_body_bytes: usize,
    pub request_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

pub fn apply(
    router: Router<AppState>,
    state: &AppState,
    config: &PipelineConfig,
) -> Router<AppState> {
    let router = auth::access::apply(router, state.clone());
    let router = body_limit::apply(router, BodyLimit::new(config.max_body_bytes));
    let router = http::apply_timeout(router, config.request_timeout);
    let router = http::apply_catch_panic(router);
    let router = metrics::apply(router, state.metrics.clone());
    let router = http::apply_access_log(router);
    request_id::apply(router)
}
