//! Postgres-backed store: thin trait adapters over the `user_repo` /
//! `session_repo` query functions.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::repos::{
    ReadinessProbe, RepoError, Session, SessionRepository, User, UserRepository, session_repo,
    user_repo,
};

#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn get_by_id(&self, id: i64) -> Result<Option<User>, RepoError> {
        user_repo::get_by_id(&self.pool, id).await
    }

    async fn get_by_api_key(&self, api_key: &str) -> Result<Option<User>, RepoError> {
        user_repo::get_by_api_key(&self.pool, api_key).await
    }
}

#[async_trait]
impl SessionRepository for PgStore {
    async fn get_by_token(&self, token: &str) -> Result<Option<Session>, RepoError> {
        session_repo::get_by_token(&self.pool, token).await
    }

    async fn delete(&self, id: i64) -> Result<bool, RepoError> {
        session_repo::delete(&self.pool, id).await
    }
}

#[async_trait]
impl ReadinessProbe for PgStore {
    async fn ping(&self) -> Result<(), RepoError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
