pub mod auth;
pub mod cookies;
pub mod metrics;
pub mod password;
pub mod validators;
