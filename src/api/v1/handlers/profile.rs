/*
 * Responsibility
 * - GET /action/profile: 認証済み主体をそのまま返す
 * - role gate は routes 側で掛ける
 */
use axum::{http::StatusCode, response::Response};

use crate::{
    api::v1::{dto::profile::ProfileResponse, extractors::CurrentUser},
    response::write_json,
};

pub async fn profile(CurrentUser(principal): CurrentUser) -> Response {
    write_json(StatusCode::OK, &ProfileResponse::from(principal))
}
