/*
 * Responsibility
 * - Repository の境界 (trait) を定義する
 *   - UserRepository: API key / id による user lookup
 *   - SessionRepository: token による session lookup と削除
 *   - ReadinessProbe: backing store への疎通確認
 * - 実装: PgStore (sqlx / Postgres), MemoryStore (テスト・ローカル用)
 */
use async_trait::async_trait;

pub mod error;
pub mod memory;
pub mod postgres;
pub mod session_repo;
pub mod user_repo;

pub use error::RepoError;
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use session_repo::Session;
pub use user_repo::User;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get_by_id(&self, id: i64) -> Result<Option<User>, RepoError>;
    async fn get_by_api_key(&self, api_key: &str) -> Result<Option<User>, RepoError>;
}

#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn get_by_token(&self, token: &str) -> Result<Option<Session>, RepoError>;
    async fn delete(&self, id: i64) -> Result<bool, RepoError>;
}

#[async_trait]
pub trait ReadinessProbe: Send + Sync {
    async fn ping(&self) -> Result<(), RepoError>;
}
