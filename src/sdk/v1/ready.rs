use serde::Deserialize;

use super::client::{Client, ClientConfig, SdkError};

pub const READY_PATH: &str = "/api/v1/public/_ready";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReadyResponse {
    pub status: String,
}

impl Client {
    /// Whether the service can reach its store. A 503 surfaces as
    /// `SdkError::Status` with the `{"status":"not_ok"}` body.
    pub async fn ready(&self) -> Result<ReadyResponse, SdkError> {
        self.get_json(READY_PATH).await
    }
}

pub async fn ready(base_url: &str) -> Result<ReadyResponse, SdkError> {
    Client::new(ClientConfig::new(base_url))?.ready().await
}
