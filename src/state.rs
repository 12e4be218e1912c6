/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - users / sessions / readiness: repository trait object
 *   - metrics: process-wide Prometheus registry
 * - Clone 前提で持つ (内部は Arc で Clone cheap)
 */
use std::sync::Arc;

use crate::repos::{ReadinessProbe, SessionRepository, UserRepository};
use crate::services::auth::{Clock, SessionManager, SystemClock};
use crate::services::metrics::HttpMetrics;

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub sessions: SessionManager,
    pub readiness: Arc<dyn ReadinessProbe>,
    pub metrics: Arc<HttpMetrics>,
}

impl AppState {
    /// Wire every repository to one store (Postgres in production, memory in tests).
    pub fn from_store<T>(store: Arc<T>, metrics: Arc<HttpMetrics>) -> Self
    where
        T: UserRepository + SessionRepository + ReadinessProbe + 'static,
    {
        Self::from_store_with_clock(store, metrics, Arc::new(SystemClock))
    }

    pub fn from_store_with_clock<T>(
        store: Arc<T>,
        metrics: Arc<HttpMetrics>,
        clock: Arc<dyn Clock>,
    ) -> Self
    where
        T: UserRepository + SessionRepository + ReadinessProbe + 'static,
    {
        let users: Arc<dyn UserRepository> = store.clone();
        let sessions: Arc<dyn SessionRepository> = store.clone();

        Self {
            users: users.clone(),
            sessions: SessionManager::with_clock(sessions, users, clock),
            readiness: store,
            metrics,
        }
    }
}
