/*
 * Responsibility
 * - sessions テーブル向け SQLx 操作
 * - token lookup と期限切れ session の削除のみ (発行はこのサービスの範囲外)
 */
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use crate::repos::error::RepoError;

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Session {
    pub id: i64,
    pub token: String,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
}

pub async fn get_by_token(db: &PgPool, token: &str) -> Result<Option<Session>, RepoError> {
    let row = sqlx::query_as::<_, Session>(
        r#"
        SELECT id, token, user_id, expires_at, revoked
        FROM sessions
        WHERE token = $1
        "#,
    )
    .bind(token)
    .fetch_optional(db)
    .await?;

    Ok(row)
}

pub async fn delete(db: &PgPool, id: i64) -> Result<bool, RepoError> {
    let result = sqlx::query(
        r#"
        DELETE FROM sessions
        WHERE id = $1
        "#,
    )
    .bind(id)
    .execute(db)
    .await?;

    Ok(result.rows_affected() > 0)
}
