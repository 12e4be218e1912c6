//! JSON response writer shared by handlers, middlewares and error mapping.

use axum::{
    body::Body,
    http::{HeaderValue, StatusCode, header},
    response::Response,
};
use serde::Serialize;

const INTERNAL_ERROR_BODY: &str = r#"{"errorMessage":"Internal server error"}"#;

/// Serialize `data` as the response body with `Content-Type: application/json`.
///
/// A serialization failure is logged and turned into a 500 carrying the
/// canonical error body, so callers never have to handle it.
pub fn write_json<T: Serialize + ?Sized>(status: StatusCode, data: &T) -> Response {
    let (status, body) = match serde_json::to_vec(data) {
        Ok(bytes) => (status, Body::from(bytes)),
        Err(err) => {
            tracing::error!(error = %err, "failed to write JSON response");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Body::from(INTERNAL_ERROR_BODY),
            )
        }
    };

    let mut response = Response::new(body);
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    response
}
