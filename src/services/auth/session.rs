//! Session token validation.
//!
//! A token is valid iff:
//! - a session with exactly this token exists,
//! - the session is not revoked,
//! - its expiry is strictly after the clock reading,
//! - the owning user exists and is loadable.
//!
//! Expiry is checked again after the user load: a session that lapses while
//! the user is being fetched is rejected.

use std::sync::Arc;

use thiserror::Error;

use crate::repos::{RepoError, Session, SessionRepository, User, UserRepository};
use crate::services::auth::clock::{Clock, SystemClock};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session not found")]
    NotFound,
    #[error("session revoked")]
    Revoked,
    #[error("session expired")]
    Expired,
    #[error("user not found")]
    UserNotFound,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Clone)]
pub struct SessionManager {
    sessions: Arc<dyn SessionRepository>,
    users: Arc<dyn UserRepository>,
    clock: Arc<dyn Clock>,
}

impl SessionManager {
    pub fn new(sessions: Arc<dyn SessionRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self::with_clock(sessions, users, Arc::new(SystemClock))
    }

    pub fn with_clock(
        sessions: Arc<dyn SessionRepository>,
        users: Arc<dyn UserRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            sessions,
            users,
            clock,
        }
    }

    pub async fn validate_session(&self, token: &str) -> Result<(User, Session), SessionError> {
        let session = self
            .sessions
            .get_by_token(token)
            .await?
            .ok_or(SessionError::NotFound)?;

        if session.revoked {
            return Err(SessionError::Revoked);
        }

        if !self.is_live(&session) {
            self.discard(&session).await;
            return Err(SessionError::Expired);
        }

        let user = self
            .users
            .get_by_id(session.user_id)
            .await?
            .ok_or(SessionError::UserNotFound)?;

        if !self.is_live(&session) {
            self.discard(&session).await;
            return Err(SessionError::Expired);
        }

        Ok((user, session))
    }

    fn is_live(&self, session: &Session) -> bool {
        session.expires_at > self.clock.now()
    }

    async fn discard(&self, session: &Session) {
        if let Err(err) = self.sessions.delete(session.id).await {
            tracing::warn!(
                error = ?err,
                session_id = session.id,
                "failed to discard expired session"
            );
        }
    }
}
