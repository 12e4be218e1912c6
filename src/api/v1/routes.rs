/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - public 配下は認証なし、action 配下は role gate 付き
 * - role gate は route_layer で route ごとに掛ける (access middleware は pipeline 側)
 */
use axum::{Router, routing::get};

use crate::middleware::auth::RoleGate;
use crate::repos::user_repo::{ROLE_ADMIN, ROLE_READONLY, ROLE_USER};
use crate::state::AppState;

use crate::api::v1::handlers::{
    health::{health, ready},
    profile::profile,
};

pub fn routes() -> Router<AppState> {
    let any_role = RoleGate::any_of([ROLE_ADMIN, ROLE_USER, ROLE_READONLY]);

    Router::new()
        .route("/public/_health", get(health))
        .route("/public/_ready", get(ready))
        .route("/action/profile", any_role.guard(get(profile)))
}
