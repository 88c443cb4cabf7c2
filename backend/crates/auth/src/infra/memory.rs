//! In-memory session store, for tests and throwaway development servers

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::repository::SessionStore;
use crate::domain::session::{Session, SessionToken};
use crate::error::AuthResult;

#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<SessionToken, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

impl SessionStore for MemorySessionStore {
    async fn get(&self, token: &SessionToken) -> AuthResult<Option<Session>> {
        Ok(self.sessions.read().await.get(token).copied())
    }

    async fn put(&self, token: &SessionToken, session: Session) -> AuthResult<()> {
        self.sessions.write().await.insert(token.clone(), session);
        Ok(())
    }

    async fn replace(&self, old: &SessionToken, new: &SessionToken, session: Session) -> AuthResult<()> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(old);
        sessions.insert(new.clone(), session);
        Ok(())
    }

    async fn delete(&self, token: &SessionToken) -> AuthResult<bool> {
        Ok(self.sessions.write().await.remove(token).is_some())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> AuthResult<usize> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| session.valid_until >= now);
        Ok(before - sessions.len())
    }
}
