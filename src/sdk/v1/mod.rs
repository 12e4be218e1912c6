//! v1 client SDK for the public endpoints.

mod client;
mod health;
mod ready;

pub use client::{Client, ClientConfig, DEFAULT_TIMEOUT, SdkError};
pub use health::{HealthResponse, health};
pub use ready::{ReadyResponse, ready};
