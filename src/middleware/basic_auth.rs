/*
 * Responsibility
 * - /metrics の HTTP Basic 認証 (METRICS_USERNAME / METRICS_SECRET が両方ある時だけ)
 * - 失敗時は 401 JSON + `WWW-Authenticate: Basic realm="metrics"`
 */
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::MethodRouter,
};
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub username: String,
    pub secret: String,
}

impl BasicCredentials {
    pub fn new(username: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            secret: secret.into(),
        }
    }

    fn matches(&self, headers: &HeaderMap) -> bool {
        let Some(encoded) = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Basic "))
        else {
            return false;
        };

        let Ok(decoded) = BASE64.decode(encoded.trim()) else {
            return false;
        };
        let Ok(decoded) = String::from_utf8(decoded) else {
            return false;
        };

        match decoded.split_once(':') {
            Some((username, secret)) => username == self.username && secret == self.secret,
            None => false,
        }
    }
}

/// `credentials` が None なら route はそのまま
pub fn protect<S>(route: MethodRouter<S>, credentials: Option<BasicCredentials>) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    match credentials {
        Some(credentials) => route.route_layer(middleware::from_fn_with_state(
            Arc::new(credentials),
            require_basic_auth,
        )),
        None => route,
    }
}

async fn require_basic_auth(
    State(credentials): State<Arc<BasicCredentials>>,
    req: Request,
    next: Next,
) -> Response {
    if credentials.matches(req.headers()) {
        return next.run(req).await;
    }

    tracing::info!(path = %req.uri().path(), "metrics basic auth rejected");
    let mut response = AppError::not_authenticated().into_response();
    response.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"metrics\""),
    );
    response
}
