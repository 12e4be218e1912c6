/*
 * Responsibility
 * - Handler から見える「認証済み主体 (Principal)」の型
 * - authenticator middleware が request extensions に格納し、以降は読み取り専用
 *
 * Notes
 * - API key / session の検証ロジックは middleware/services 側の責務
 * - API key そのものは context に載せない (どの方式で認証したかだけを持つ)
 */
use crate::repos::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    ApiKey,
    Session,
}

/// 認証済みのリクエストに付与される主体
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: i64,
    pub email: String,
    pub role: String,
    pub is_active: bool,
    pub method: AuthMethod,
}

impl Principal {
    pub fn from_user(user: User, method: AuthMethod) -> Self {
        Self {
            user_id: user.id,
            email: user.email,
            role: user.role,
            is_active: user.is_active,
            method,
        }
    }
}
