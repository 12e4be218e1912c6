/*
 * Responsibility
 * - GET /action/profile の response DTO
 * - api key や認証方式は返さない
 */
use serde::Serialize;

use crate::api::v1::extractors::Principal;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: i64,
    pub email: String,
    pub role: String,
    pub is_active: bool,
}

impl From<Principal> for ProfileResponse {
    fn from(principal: Principal) -> Self {
        Self {
            id: principal.user_id,
            email: principal.email,
            role: principal.role,
            is_active: principal.is_active,
        }
    }
}
