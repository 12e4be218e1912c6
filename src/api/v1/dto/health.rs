use serde::{Deserialize, Serialize};

/// Body of the health and readiness endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }

    pub fn not_ok() -> Self {
        Self {
            status: "not_ok".to_string(),
        }
    }
}
