//! mut-api: HTTP service scaffold built around an admission pipeline
//! (request id, access log, Prometheus metrics, body limit, API key /
//! session authentication, role gate) plus a client SDK.

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod repos;
pub mod response;
pub mod sdk;
pub mod services;
pub mod state;
