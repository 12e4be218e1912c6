//! HTTP client for the v1 API.
//!
//! Every request carries `Content-Type: application/json` and, when an API
//! key is configured, `X-API-Key`. Responses with a status of 400 or above
//! become [`SdkError::Status`] with the raw body.

use std::time::Duration;

use reqwest::header;
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("base url is required")]
    MissingBaseUrl,
    #[error("invalid base url: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),
    #[error("failed to perform request: {0}")]
    Request(#[from] reqwest::Error),
    #[error("request failed with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    /// Ignored when `http_client` is given.
    pub timeout: Option<Duration>,
    pub http_client: Option<reqwest::Client>,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    http: reqwest::Client,
    api_key: Option<String>,
}

impl Client {
    pub fn new(config: ClientConfig) -> Result<Self, SdkError> {
        if config.base_url.trim().is_empty() {
            return Err(SdkError::MissingBaseUrl);
        }
        Url::parse(&config.base_url)?;

        let http = match config.http_client {
            Some(http) => http,
            None => reqwest::Client::builder()
                .timeout(config.timeout.unwrap_or(DEFAULT_TIMEOUT))
                .build()?,
        };

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
            api_key: config.api_key.filter(|key| !key.is_empty()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) async fn get_json<T>(&self, endpoint: &str) -> Result<T, SdkError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, endpoint);

        let mut request = self
            .http
            .get(url)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(api_key) = &self.api_key {
            request = request.header(API_KEY_HEADER, api_key);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status.as_u16() >= 400 {
            return Err(SdkError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}
