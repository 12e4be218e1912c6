//! API key / session cookie 検証 → Principal を extensions に入れる
//!
//! 判定順:
//! 1. `should_skip_auth(path)` → principal なしで通す
//! 2. `X-API-Key` が空でない → API key で user を引く (cookie は見ない)
//! 3. `_mut_session` cookie が空でない → session を検証する
//! 4. それ以外 → 401 `Not authenticated`
//!
//! 1 リクエストにつきログは 1 件だけ出す (成功/skip/拒否のいずれか)。

use axum::{
    Router,
    extract::{Request, State},
    http::HeaderMap,
    middleware::{self, Next},
    response::Response,
};
use thiserror::Error;

use crate::api::v1::extractors::{AuthMethod, Principal};
use crate::error::AppError;
use crate::repos::RepoError;
use crate::services::auth::SessionError;
use crate::services::cookies::{SESSION_COOKIE, get_cookie};
use crate::state::AppState;

pub const API_PREFIX: &str = "/api/v1/";
pub const PUBLIC_PREFIX: &str = "/api/v1/public/";
pub const API_KEY_HEADER: &str = "x-api-key";

/// Why a request was not admitted. Kept apart from `AppError` so the log
/// record carries the cause while the client only sees the fixed message.
#[derive(Debug, Error)]
pub enum AuthFailure {
    #[error("no credentials")]
    Missing,
    #[error("unknown api key")]
    UnknownApiKey,
    #[error("api key lookup failed: {0}")]
    ApiKeyLookup(#[from] RepoError),
    #[error("session rejected: {0}")]
    Session(#[from] SessionError),
}

impl From<AuthFailure> for AppError {
    fn from(failure: AuthFailure) -> Self {
        match failure {
            AuthFailure::Missing => AppError::not_authenticated(),
            AuthFailure::UnknownApiKey | AuthFailure::ApiKeyLookup(_) => {
                AppError::Unauthorized(AppError::INVALID_API_KEY)
            }
            AuthFailure::Session(_) => AppError::Unauthorized(AppError::INVALID_SESSION),
        }
    }
}

/// public 配下と `/api/v1/` の外は認証しない
pub fn should_skip_auth(path: &str) -> bool {
    path.starts_with(PUBLIC_PREFIX) || !path.starts_with(API_PREFIX)
}

/// Router 全体に認証を掛ける。
///
/// 例：
/// ```ignore
/// let app = Router::new().nest("/api/v1", api::v1::routes());
/// let app = middleware::auth::access::apply(app, state.clone());
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8 の from_fn は State extractor を受け取れないため、`from_fn_with_state` で明示的に state を渡す
    router.layer(middleware::from_fn_with_state(state, access_middleware))
}

async fn access_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = req.uri().path().to_owned();

    if should_skip_auth(&path) {
        tracing::info!(path = %path, "authentication skipped");
        return Ok(next.run(req).await);
    }

    match authenticate(&state, req.headers()).await {
        Ok(principal) => {
            tracing::info!(
                path = %path,
                user_id = principal.user_id,
                method = ?principal.method,
                "authenticated"
            );
            // middleware → extractor への受け渡し
            req.extensions_mut().insert(principal);
            Ok(next.run(req).await)
        }
        Err(failure) => {
            tracing::info!(path = %path, error = %failure, "authentication rejected");
            Err(failure.into())
        }
    }
}

/// 資格情報から Principal を解決する。API key が優先され、その場合 session
/// repository には触れない。
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<Principal, AuthFailure> {
    if let Some(api_key) = non_empty_header(headers, API_KEY_HEADER) {
        let user = state
            .users
            .get_by_api_key(api_key)
            .await?
            .ok_or(AuthFailure::UnknownApiKey)?;
        return Ok(Principal::from_user(user, AuthMethod::ApiKey));
    }

    if let Some(token) = get_cookie(headers, SESSION_COOKIE).filter(|token| !token.is_empty()) {
        let (user, _session) = state.sessions.validate_session(&token).await?;
        return Ok(Principal::from_user(user, AuthMethod::Session));
    }

    Err(AuthFailure::Missing)
}

fn non_empty_header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
}
