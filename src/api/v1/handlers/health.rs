/*
 * Responsibility
 * - GET /public/_health (疎通用、常に 200)
 * - GET /public/_ready (store に ping できれば 200、できなければ 503)
 */
use axum::{extract::State, http::StatusCode, response::Response};

use crate::{api::v1::dto::health::StatusResponse, response::write_json, state::AppState};

pub async fn health() -> Response {
    write_json(StatusCode::OK, &StatusResponse::ok())
}

pub async fn ready(State(state): State<AppState>) -> Response {
    match state.readiness.ping().await {
        Ok(()) => write_json(StatusCode::OK, &StatusResponse::ok()),
        Err(err) => {
            tracing::warn!(error = %err, "readiness check failed");
            write_json(StatusCode::SERVICE_UNAVAILABLE, &StatusResponse::not_ok())
        }
    }
}
