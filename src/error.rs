/*
 * Responsibility
 * - Shared AppError definition for handlers and middlewares
 * - IntoResponse implementation (HTTP status / JSON error body)
 * - Subsystem errors (RepoError, SessionError, ...) are mapped where they occur
 *
 * Every error leaves the pipeline as `{"errorMessage": "<text>"}`.
 * Internal causes are logged, never echoed to the client.
 */
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::response::write_json;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    #[serde(rename = "errorMessage")]
    pub error_message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error_message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("unauthorized: {0}")]
    Unauthorized(&'static str),
    #[error("forbidden: {0}")]
    Forbidden(&'static str),
    #[error("payload too large")]
    PayloadTooLarge,
    #[error("request timed out")]
    RequestTimeout,
    #[error("internal server error")]
    Internal,
}

impl AppError {
    pub const NOT_AUTHENTICATED: &'static str = "Not authenticated";
    pub const INVALID_API_KEY: &'static str = "Invalid API key";
    pub const INVALID_SESSION: &'static str = "Invalid or expired session";
    pub const ACCOUNT_INACTIVE: &'static str = "Account is inactive";
    pub const INSUFFICIENT_PERMISSIONS: &'static str = "Insufficient permissions";

    pub fn not_authenticated() -> Self {
        Self::Unauthorized(Self::NOT_AUTHENTICATED)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::RequestTimeout => StatusCode::REQUEST_TIMEOUT,
            AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            AppError::Unauthorized(message) | AppError::Forbidden(message) => {
                (*message).to_string()
            }
            AppError::PayloadTooLarge => "Request body too large".into(),
            AppError::RequestTimeout => "Request timed out".into(),
            AppError::Internal => "Internal server error".into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        write_json(self.status(), &ErrorResponse::new(self.message()))
    }
}
