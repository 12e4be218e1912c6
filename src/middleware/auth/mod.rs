/*
 * Responsibility
 * - access: 認証 (API key / session cookie → Principal)
 * - role: 認可 (route 単位の role gate)
 */
pub mod access;
pub mod role;

pub use access::{authenticate, should_skip_auth};
pub use role::RoleGate;
