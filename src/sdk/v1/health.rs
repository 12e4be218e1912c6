use serde::Deserialize;

use super::client::{Client, ClientConfig, SdkError};

pub const HEALTH_PATH: &str = "/api/v1/public/_health";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

impl Client {
    /// Liveness of the service.
    pub async fn health(&self) -> Result<HealthResponse, SdkError> {
        self.get_json(HEALTH_PATH).await
    }
}

/// One-shot health check against `base_url` with a default client.
pub async fn health(base_url: &str) -> Result<HealthResponse, SdkError> {
    Client::new(ClientConfig::new(base_url))?.health().await
}
