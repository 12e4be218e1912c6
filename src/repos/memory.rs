//! In-memory store used by tests and local runs without a database.

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::repos::{ReadinessProbe, RepoError, Session, SessionRepository, User, UserRepository};

#[derive(Debug)]
pub struct MemoryStore {
    users: RwLock<HashMap<i64, User>>,
    sessions: RwLock<HashMap<i64, Session>>,
    reachable: AtomicBool,
    session_lookups: AtomicUsize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            sessions: RwLock::new(HashMap::new()),
            reachable: AtomicBool::new(true),
            session_lookups: AtomicUsize::new(0),
        }
    }

    pub fn insert_user(&self, user: User) {
        if let Ok(mut users) = self.users.write() {
            users.insert(user.id, user);
        }
    }

    pub fn insert_session(&self, session: Session) {
        if let Ok(mut sessions) = self.sessions.write() {
            sessions.insert(session.id, session);
        }
    }

    pub fn has_session(&self, id: i64) -> bool {
        self.sessions
            .read()
            .map(|sessions| sessions.contains_key(&id))
            .unwrap_or(false)
    }

    /// Simulates the backing store going away (or coming back).
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    /// Number of `get_by_token` calls served so far.
    pub fn session_lookups(&self) -> usize {
        self.session_lookups.load(Ordering::SeqCst)
    }

    fn ensure_reachable(&self) -> Result<(), RepoError> {
        if self.reachable.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(RepoError::Unavailable)
        }
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn get_by_id(&self, id: i64) -> Result<Option<User>, RepoError> {
        self.ensure_reachable()?;
        let users = self.users.read().map_err(|_| RepoError::Unavailable)?;
        Ok(users.get(&id).cloned())
    }

    async fn get_by_api_key(&self, api_key: &str) -> Result<Option<User>, RepoError> {
        self.ensure_reachable()?;
        let users = self.users.read().map_err(|_| RepoError::Unavailable)?;
        Ok(users
            .values()
            .find(|u| u.api_key.as_deref() == Some(api_key))
            .cloned())
    }
}

#[async_trait]
impl SessionRepository for MemoryStore {
    async fn get_by_token(&self, token: &str) -> Result<Option<Session>, RepoError> {
        self.session_lookups.fetch_add(1, Ordering::SeqCst);
        self.ensure_reachable()?;
        let sessions = self.sessions.read().map_err(|_| RepoError::Unavailable)?;
        Ok(sessions.values().find(|s| s.token == token).cloned())
    }

    async fn delete(&self, id: i64) -> Result<bool, RepoError> {
        self.ensure_reachable()?;
        let mut sessions = self.sessions.write().map_err(|_| RepoError::Unavailable)?;
        Ok(sessions.remove(&id).is_some())
    }
}

#[async_trait]
impl ReadinessProbe for MemoryStore {
    async fn ping(&self) -> Result<(), RepoError> {
        self.ensure_reachable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::user_repo::ROLE_USER;

    fn user(id: i64, api_key: Option<&str>) -> User {
        User {
            id,
            email: format!("user{id}@example.com"),
            role: ROLE_USER.to_string(),
            api_key: api_key.map(str::to_string),
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_lookup_by_api_key_is_exact() {
        let store = MemoryStore::new();
        store.insert_user(user(1, Some("key-1")));
        store.insert_user(user(2, None));

        let found = store.get_by_api_key("key-1").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(1));
        assert!(store.get_by_api_key("key-").await.unwrap().is_none());
        assert!(store.get_by_api_key("").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unreachable_store_fails_every_call() {
        let store = MemoryStore::new();
        store.insert_user(user(1, Some("key-1")));
        store.set_reachable(false);

        assert!(store.ping().await.is_err());
        assert!(store.get_by_id(1).await.is_err());
        assert!(store.get_by_token("t").await.is_err());
        assert_eq!(store.session_lookups(), 1);
    }
}
