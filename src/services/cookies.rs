/*
 * Responsibility
 * - Cookie の読み取り (Cookie ヘッダ) と書き込み (Set-Cookie ヘッダ)
 * - session cookie `_mut_session` の既定オプション (default / secure)
 * - 削除は Max-Age と Expires=epoch の両方を出す (古いクライアント互換)
 */
use axum::http::{HeaderMap, HeaderValue, header};
use cookie::time::{Duration, OffsetDateTime};
use cookie::{Cookie, SameSite};

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "_mut_session";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CookieOptions {
    /// Seconds until expiry. Zero means a browser-session cookie, negative
    /// expires the cookie immediately.
    pub max_age: i64,
    pub path: String,
    pub domain: Option<String>,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: SameSite,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            max_age: 0,
            path: "/".to_string(),
            domain: None,
            secure: false,
            http_only: true,
            same_site: SameSite::Lax,
        }
    }
}

impl CookieOptions {
    /// Options for deployments served over HTTPS.
    pub fn secure() -> Self {
        Self {
            secure: true,
            same_site: SameSite::Strict,
            ..Self::default()
        }
    }

    pub fn with_max_age(mut self, seconds: i64) -> Self {
        self.max_age = seconds;
        self
    }

    fn build(&self, name: &str, value: &str) -> Cookie<'static> {
        let mut builder = Cookie::build((name.to_string(), value.to_string()))
            .path(self.path.clone())
            .secure(self.secure)
            .http_only(self.http_only)
            .same_site(self.same_site);

        if let Some(domain) = &self.domain {
            builder = builder.domain(domain.clone());
        }

        builder.build()
    }
}

/// Appends a `Set-Cookie` header. A positive `max_age` also sets `Expires`.
pub fn set_cookie(headers: &mut HeaderMap, name: &str, value: &str, options: &CookieOptions) {
    let mut cookie = options.build(name, value);

    if options.max_age > 0 {
        cookie.set_max_age(Duration::seconds(options.max_age));
        cookie.set_expires(OffsetDateTime::now_utc() + Duration::seconds(options.max_age));
    } else if options.max_age < 0 {
        expire(&mut cookie);
    }

    append(headers, &cookie);
}

/// Value of the first cookie called `name`, if any.
pub fn get_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    all_cookies(headers)
        .into_iter()
        .find(|c| c.name() == name)
        .map(|c| c.value().to_string())
}

pub fn has_cookie(headers: &HeaderMap, name: &str) -> bool {
    get_cookie(headers, name).is_some()
}

/// Every cookie from every `Cookie` header. Malformed pairs are skipped.
pub fn all_cookies(headers: &HeaderMap) -> Vec<Cookie<'static>> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| Cookie::split_parse(value.to_string()))
        .filter_map(Result::ok)
        .collect()
}

/// Deletes a cookie set on path `/`.
pub fn delete_cookie(headers: &mut HeaderMap, name: &str) {
    let mut cookie = Cookie::build((name.to_string(), String::new()))
        .path("/")
        .build();
    expire(&mut cookie);
    append(headers, &cookie);
}

/// Deletes a cookie that was set with a custom path or domain.
pub fn delete_cookie_with_options(headers: &mut HeaderMap, name: &str, options: &CookieOptions) {
    let mut cookie = options.build(name, "");
    expire(&mut cookie);
    append(headers, &cookie);
}

fn expire(cookie: &mut Cookie<'static>) {
    cookie.set_max_age(Duration::ZERO);
    cookie.set_expires(OffsetDateTime::UNIX_EPOCH);
}

fn append(headers: &mut HeaderMap, cookie: &Cookie<'_>) {
    match HeaderValue::from_str(&cookie.to_string()) {
        Ok(value) => {
            headers.append(header::SET_COOKIE, value);
        }
        Err(err) => tracing::warn!(error = %err, cookie = cookie.name(), "invalid cookie value"),
    }
}
