/*
 * Responsibility
 * - middleware の公開インターフェース
 * - pipeline::apply(...) が全 layer を正しい順で掛ける
 */
pub mod auth;
pub mod basic_auth;
pub mod body_limit;
pub mod http;
pub mod metrics;
pub mod pipeline;
pub mod request_id;
