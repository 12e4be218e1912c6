/*
 * Responsibility
 * - users テーブル向け SQLx 操作 (read-only: 認証に必要な lookup のみ)
 * - PgPool を受け取り、見つからない場合は Ok(None) を返す
 * - user 管理 (作成/更新) はこのサービスの範囲外
 */
use sqlx::{FromRow, PgPool};

use crate::repos::error::RepoError;

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_USER: &str = "user";
pub const ROLE_READONLY: &str = "readonly";

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub role: String,
    pub api_key: Option<String>,
    pub is_active: bool,
}

pub async fn get_by_id(db: &PgPool, id: i64) -> Result<Option<User>, RepoError> {
    let row = sqlx::query_as::<_, User>(
        r#"
        SELECT id, email, role, api_key, is_active
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?;

    Ok(row)
}

pub async fn get_by_api_key(db: &PgPool, api_key: &str) -> Result<Option<User>, RepoError> {
    let row = sqlx::query_as::<_, User>(
        r#"
        SELECT id, email, role, api_key, is_active
        FROM users
        WHERE api_key = $1
        "#,
    )
    .bind(api_key)
    .fetch_optional(db)
    .await?;

    Ok(row)
}
