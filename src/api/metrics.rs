/*
 * Responsibility
 * - GET /metrics: Prometheus text exposition
 * - 計測対象外 (metrics middleware が skip する)
 */
use axum::{
    extract::State,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::{error::AppError, state::AppState};

pub async fn metrics(State(state): State<AppState>) -> Response {
    match state.metrics.render() {
        Ok(body) => {
            let mut response = (StatusCode::OK, body).into_response();
            response.headers_mut().insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static(prometheus::TEXT_FORMAT),
            );
            response
        }
        Err(err) => {
            tracing::error!(error = %err, "failed to render metrics");
            AppError::Internal.into_response()
        }
    }
}
