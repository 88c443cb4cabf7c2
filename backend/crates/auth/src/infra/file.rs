//! File-backed session store
//!
//! The whole mapping lives in memory and is rewritten as one JSON document
//! on every mutation. The document is written to a sibling temp file and
//! renamed over the target; only after that succeeds does the in-memory
//! mapping change.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

use crate::domain::repository::SessionStore;
use crate::domain::session::{Session, SessionToken};
use crate::error::AuthResult;

type Mapping = HashMap<String, Session>;

pub struct FileSessionStore {
    path: PathBuf,
    sessions: RwLock<Mapping>,
}

impl FileSessionStore {
    /// Load the mapping at `path`; a missing or empty file is an empty mapping
    pub async fn open(path: impl Into<PathBuf>) -> AuthResult<Self> {
        let path = path.into();
        let sessions: Mapping = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Mapping::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Mapping::new(),
            Err(e) => return Err(e.into()),
        };

        tracing::info!(
            path = %path.display(),
            sessions = sessions.len(),
            "Session mapping loaded"
        );

        Ok(Self {
            path,
            sessions: RwLock::new(sessions),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("sessions"));
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn persist(&self, sessions: &Mapping) -> AuthResult<()> {
        let encoded = serde_json::to_vec_pretty(sessions)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let temp = self.temp_path();
        tokio::fs::write(&temp, &encoded).await?;
        tokio::fs::rename(&temp, &self.path).await?;
        Ok(())
    }

    /// Apply `change` to a copy, persist the copy, then commit it
    async fn mutate<T>(&self, change: impl FnOnce(&mut Mapping) -> T) -> AuthResult<T> {
        let mut sessions = self.sessions.write().await;
        let mut next = sessions.clone();
        let outcome = change(&mut next);

        self.persist(&next).await?;
        *sessions = next;
        Ok(outcome)
    }
}

impl SessionStore for FileSessionStore {
    async fn get(&self, token: &SessionToken) -> AuthResult<Option<Session>> {
        Ok(self.sessions.read().await.get(token.as_str()).copied())
    }

    async fn put(&self, token: &SessionToken, session: Session) -> AuthResult<()> {
        self.mutate(|sessions| {
            sessions.insert(token.as_str().to_string(), session);
        })
        .await
    }

    async fn replace(&self, old: &SessionToken, new: &SessionToken, session: Session) -> AuthResult<()> {
        self.mutate(|sessions| {
            sessions.remove(old.as_str());
            sessions.insert(new.as_str().to_string(), session);
        })
        .await
    }

    async fn delete(&self, token: &SessionToken) -> AuthResult<bool> {
        if !self.sessions.read().await.contains_key(token.as_str()) {
            return Ok(false);
        }
        self.mutate(|sessions| sessions.remove(token.as_str()).is_some())
            .await
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> AuthResult<usize> {
        let expired = self
            .sessions
            .read()
            .await
            .values()
            .filter(|session| session.valid_until < now)
            .count();
        if expired == 0 {
            return Ok(0);
        }

        self.mutate(|sessions| {
            let before = sessions.len();
            sessions.retain(|_, session| session.valid_until >= now);
            before - sessions.len()
        })
        .await
    }
}
