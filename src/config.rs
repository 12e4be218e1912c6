/*
 * Responsibility
 * - 環境変数や設定の読み込み (PORT, DATABASE_URL, body/timeout 上限, metrics 認証)
 * - 設定値のバリデーション (不足・不正なら起動失敗)
 */
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::middleware::basic_auth::BasicCredentials;
use crate::middleware::body_limit::DEFAULT_MAX_BODY_BYTES;
use crate::middleware::pipeline::{DEFAULT_REQUEST_TIMEOUT, PipelineConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(value: Option<&str>) -> Self {
        match value.unwrap_or("development").to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing configuration: {0}")]
    Missing(&'static str),
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,

    pub app_env: AppEnv,

    pub max_body_bytes: usize,
    pub request_timeout: Duration,

    pub metrics_credentials: Option<BasicCredentials>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// `from_env` の本体。テストでは HashMap などから値を渡す。
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port: u16 = parse_or(&lookup, "PORT", 3000)?;

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let database_url = lookup("DATABASE_URL")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let app_env = AppEnv::parse(lookup("APP_ENV").as_deref());

        let max_body_bytes: usize = parse_or(&lookup, "MAX_BODY_BYTES", DEFAULT_MAX_BODY_BYTES)?;
        if max_body_bytes == 0 {
            return Err(ConfigError::Invalid("MAX_BODY_BYTES"));
        }

        let timeout_seconds: u64 = parse_or(
            &lookup,
            "REQUEST_TIMEOUT_SECONDS",
            DEFAULT_REQUEST_TIMEOUT.as_secs(),
        )?;
        if timeout_seconds == 0 {
            return Err(ConfigError::Invalid("REQUEST_TIMEOUT_SECONDS"));
        }

        let metrics_credentials = match (
            lookup("METRICS_USERNAME").filter(|s| !s.is_empty()),
            lookup("METRICS_SECRET").filter(|s| !s.is_empty()),
        ) {
            (Some(username), Some(secret)) => Some(BasicCredentials::new(username, secret)),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing("METRICS_SECRET")),
            (None, Some(_)) => return Err(ConfigError::Missing("METRICS_USERNAME")),
        };

        Ok(Self {
            addr,
            database_url,
            app_env,
            max_body_bytes,
            request_timeout: Duration::from_secs(timeout_seconds),
            metrics_credentials,
        })
    }

    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            max_body_bytes: self.max_body_bytes,
            request_timeout: self.request_timeout,
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => {
            raw.trim().parse().map_err(|_| ConfigError::Invalid(key))
        }
        _ => Ok(default),
    }
}
