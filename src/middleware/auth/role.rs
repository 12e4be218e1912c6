/*
 * Responsibility
 * - route 単位の認可 (role gate)
 * - Principal が active で、許可 role のいずれかを持つことを確認する
 *
 * Notes
 * - access middleware の後ろ (route_layer) に置く前提
 * - role の比較は大文字小文字を区別する
 * - 許可 role が空なら認証済みでも全て 403
 */
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::MethodRouter,
};

use crate::api::v1::extractors::Principal;
use crate::error::AppError;

#[derive(Debug, Clone, Default)]
pub struct RoleGate {
    allowed: Arc<[String]>,
}

impl RoleGate {
    pub fn any_of<I, R>(roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        Self {
            allowed: roles.into_iter().map(Into::into).collect(),
        }
    }

    pub fn allows(&self, role: &str) -> bool {
        self.allowed.iter().any(|allowed| allowed == role)
    }

    pub fn check(&self, principal: Option<&Principal>) -> Result<(), AppError> {
        let principal = principal.ok_or_else(AppError::not_authenticated)?;

        if !principal.is_active {
            return Err(AppError::Forbidden(AppError::ACCOUNT_INACTIVE));
        }

        if !self.allows(&principal.role) {
            return Err(AppError::Forbidden(AppError::INSUFFICIENT_PERMISSIONS));
        }

        Ok(())
    }

    /// この gate を route に掛ける
    pub fn guard<S>(self, route: MethodRouter<S>) -> MethodRouter<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        route.route_layer(middleware::from_fn_with_state(self, require_role))
    }
}

pub async fn require_role(
    State(gate): State<RoleGate>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let principal = req.extensions().get::<Principal>();

    if let Err(err) = gate.check(principal) {
        match principal {
            Some(principal) => tracing::info!(
                user_id = principal.user_id,
                role = %principal.role,
                error = %err,
                "role gate rejected request"
            ),
            None => tracing::info!(error = %err, "role gate rejected request"),
        }
        return Err(err);
    }

    Ok(next.run(req).await)
}
