//! Session Manager
//!
//! Anonymous --create--> Authenticated(t1)
//! Authenticated(t) --validate, fresh--> Authenticated(t)
//! Authenticated(t) --validate, renew due--> Authenticated(t2), t deleted
//! Authenticated(t) --validate, expired--> Anonymous, t deleted
//! Authenticated(t) --logout--> Anonymous
//!
//! One mutex spans every read-modify-persist cycle, including plain
//! validation, so a rotation can never interleave with another request
//! presenting the same token.
//!
//! A mapping that cannot be persisted is fatal: the failing request still
//! gets its error, and [`SessionManager::fatal_signal`] flips to `true` so
//! the binary can stop the process.

use platform::clock::Clock;
use std::sync::Arc;
use tokio::sync::{Mutex, watch};

use crate::application::config::AuthConfig;
use crate::domain::repository::SessionStore;
use crate::domain::session::{Session, SessionStatus, SessionToken};
use crate::error::{AuthError, AuthResult};

/// Outcome of a successful validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCheck {
    /// The presented token stays in use
    Valid(Session),
    /// The presented token was replaced; the client must switch to `token`
    Rotated { token: SessionToken, session: Session },
}

impl SessionCheck {
    pub fn session(&self) -> &Session {
        match self {
            SessionCheck::Valid(session) | SessionCheck::Rotated { session, .. } => session,
        }
    }
}

pub struct SessionManager<S>
where
    S: SessionStore + Send + Sync + 'static,
{
    store: Arc<S>,
    config: Arc<AuthConfig>,
    clock: Arc<dyn Clock>,
    lock: Mutex<()>,
    fatal: watch::Sender<bool>,
}

impl<S> SessionManager<S>
where
    S: SessionStore + Send + Sync + 'static,
{
    pub fn new(store: Arc<S>, config: Arc<AuthConfig>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            config,
            clock,
            lock: Mutex::new(()),
            fatal: watch::Sender::new(false),
        }
    }

    /// Flips to `true` once the session mapping could not be persisted
    pub fn fatal_signal(&self) -> watch::Receiver<bool> {
        self.fatal.subscribe()
    }

    fn durable<T>(&self, result: AuthResult<T>) -> AuthResult<T> {
        if let Err(e) = &result {
            if e.is_persistence_failure() {
                tracing::error!(error = %e, "Session mapping is not durable, requesting shutdown");
                self.fatal.send_replace(true);
            }
        }
        result
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }

    fn issue(&self) -> Session {
        Session::issue(self.clock.now(), self.config.renew_after, self.config.valid_for)
    }

    /// Mint and persist a new session
    pub async fn create(&self) -> AuthResult<(SessionToken, Session)> {
        let _guard = self.lock.lock().await;

        let token = SessionToken::mint();
        let session = self.issue();
        self.durable(self.store.put(&token, session).await)?;

        tracing::info!(valid_until = %session.valid_until, "Moderator session created");
        Ok((token, session))
    }

    /// Check a presented token, rotating or deleting it as its deadlines demand
    pub async fn validate(&self, token: &SessionToken) -> AuthResult<SessionCheck> {
        let _guard = self.lock.lock().await;

        let session = self
            .store
            .get(token)
            .await?
            .ok_or(AuthError::SessionInvalid)?;

        match session.status_at(self.clock.now()) {
            SessionStatus::Fresh => Ok(SessionCheck::Valid(session)),
            SessionStatus::RenewDue => {
                let rotated = SessionToken::mint();
                let renewed = self.issue();
                self.durable(self.store.replace(token, &rotated, renewed).await)?;

                tracing::debug!("Moderator session rotated");
                Ok(SessionCheck::Rotated {
                    token: rotated,
                    session: renewed,
                })
            }
            SessionStatus::Expired => {
                self.durable(self.store.delete(token).await)?;
                tracing::info!("Expired moderator session removed");
                Err(AuthError::SessionInvalid)
            }
        }
    }

    /// Delete a session regardless of its deadlines; returns whether it existed
    pub async fn logout(&self, token: &SessionToken) -> AuthResult<bool> {
        let _guard = self.lock.lock().await;
        let existed = self.durable(self.store.delete(token).await)?;
        if existed {
            tracing::info!("Moderator session ended");
        }
        Ok(existed)
    }

    /// Drop sessions past their hard expiry
    pub async fn purge_expired(&self) -> AuthResult<usize> {
        let _guard = self.lock.lock().await;
        let now = self.clock.now();
        self.durable(self.store.purge_expired(now).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::memory::MemorySessionStore;
    use chrono::{DateTime, Duration, SubsecRound, Utc};
    use platform::clock::ManualClock;

    struct Fixture {
        store: Arc<MemorySessionStore>,
        clock: Arc<ManualClock>,
        manager: SessionManager<MemorySessionStore>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemorySessionStore::new());
        let clock = Arc::new(ManualClock::starting_now());
        let manager = SessionManager::new(
            store.clone(),
            Arc::new(AuthConfig::development()),
            clock.clone(),
        );
        Fixture {
            store,
            clock,
            manager,
        }
    }

    #[tokio::test]
    async fn test_fresh_session_keeps_token() {
        let f = fixture();
        let (token, session) = f.manager.create().await.unwrap();

        f.clock.advance(Duration::minutes(59));
        assert_eq!(
            f.manager.validate(&token).await.unwrap(),
            SessionCheck::Valid(session)
        );
    }

    #[tokio::test]
    async fn test_renew_due_rotates_token() {
        let f = fixture();
        let (old, _) = f.manager.create().await.unwrap();

        f.clock.advance(Duration::hours(2));
        let check = f.manager.validate(&old).await.unwrap();
        let SessionCheck::Rotated { token, session } = check else {
            panic!("expected rotation, got {check:?}");
        };

        assert_ne!(token, old);
        assert_eq!(
            session.renew_at,
            f.clock.now().trunc_subsecs(0) + Duration::hours(1)
        );
        assert_eq!(f.store.len().await, 1);
        assert!(matches!(
            f.manager.validate(&old).await,
            Err(AuthError::SessionInvalid)
        ));
        assert!(matches!(
            f.manager.validate(&token).await,
            Ok(SessionCheck::Valid(_))
        ));
    }

    #[tokio::test]
    async fn test_expired_session_is_deleted() {
        let f = fixture();
        let (token, _) = f.manager.create().await.unwrap();

        f.clock.advance(Duration::days(61));
        assert!(matches!(
            f.manager.validate(&token).await,
            Err(AuthError::SessionInvalid)
        ));
        assert_eq!(f.store.len().await, 0);
    }

    #[tokio::test]
    async fn test_logout() {
        let f = fixture();
        let (token, _) = f.manager.create().await.unwrap();

        assert!(f.manager.logout(&token).await.unwrap());
        assert!(!f.manager.logout(&token).await.unwrap());
        assert!(f.manager.validate(&token).await.is_err());
    }

    #[tokio::test]
    async fn test_unknown_token() {
        let f = fixture();
        assert!(matches!(
            f.manager.validate(&SessionToken::from_client("forged")).await,
            Err(AuthError::SessionInvalid)
        ));
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let f = fixture();
        f.manager.create().await.unwrap();
        f.clock.advance(Duration::days(30));
        f.manager.create().await.unwrap();
        f.clock.advance(Duration::days(31));

        assert_eq!(f.manager.purge_expired().await.unwrap(), 1);
        assert_eq!(f.store.len().await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_rotation_issues_one_token() {
        let f = fixture();
        let manager = Arc::new(f.manager);
        let (old, _) = manager.create().await.unwrap();
        f.clock.advance(Duration::hours(2));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let manager = manager.clone();
            let old = old.clone();
            handles.push(tokio::spawn(async move { manager.validate(&old).await }));
        }

        let mut rotated = 0;
        for handle in handles {
            if let Ok(SessionCheck::Rotated { .. }) = handle.await.unwrap() {
                rotated += 1;
            }
        }
        assert_eq!(rotated, 1);
        assert_eq!(f.store.len().await, 1);
    }

    /// Store whose writes always fail
    struct ReadOnlyStore(MemorySessionStore);

    fn refused() -> AuthError {
        AuthError::Persistence(std::io::Error::other("read-only file system"))
    }

    impl SessionStore for ReadOnlyStore {
        async fn get(&self, token: &SessionToken) -> AuthResult<Option<Session>> {
            self.0.get(token).await
        }

        async fn put(&self, _: &SessionToken, _: Session) -> AuthResult<()> {
            Err(refused())
        }

        async fn replace(&self, _: &SessionToken, _: &SessionToken, _: Session) -> AuthResult<()> {
            Err(refused())
        }

        async fn delete(&self, _: &SessionToken) -> AuthResult<bool> {
            Err(refused())
        }

        async fn purge_expired(&self, _: DateTime<Utc>) -> AuthResult<usize> {
            Err(refused())
        }
    }

    #[tokio::test]
    async fn test_persistence_failure_raises_fatal_signal() {
        let manager = SessionManager::new(
            Arc::new(ReadOnlyStore(MemorySessionStore::new())),
            Arc::new(AuthConfig::development()),
            Arc::new(ManualClock::starting_now()),
        );
        let fatal = manager.fatal_signal();
        assert!(!*fatal.borrow());

        assert!(matches!(
            manager.validate(&SessionToken::from_client("forged")).await,
            Err(AuthError::SessionInvalid)
        ));
        assert!(!*fatal.borrow());

        assert!(matches!(
            manager.create().await,
            Err(AuthError::Persistence(_))
        ));
        assert!(*fatal.borrow());
    }

    #[tokio::test]
    async fn test_failed_rotation_keeps_old_token() {
        let inner = MemorySessionStore::new();
        let clock = Arc::new(ManualClock::starting_now());
        let old = SessionToken::mint();
        let issued = Session::issue(clock.now(), Duration::hours(1), Duration::days(60));
        inner.put(&old, issued).await.unwrap();

        let manager = SessionManager::new(
            Arc::new(ReadOnlyStore(inner)),
            Arc::new(AuthConfig::development()),
            clock.clone(),
        );
        let fatal = manager.fatal_signal();

        clock.advance(Duration::hours(2));
        assert!(matches!(
            manager.validate(&old).await,
            Err(AuthError::Persistence(_))
        ));
        assert!(*fatal.borrow());
        assert_eq!(manager.store.get(&old).await.unwrap(), Some(issued));
    }
}
