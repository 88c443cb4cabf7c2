//! Session Store Trait
//!
//! Storage of the token -> session mapping. Implementations own their
//! persistence; callers serialize read-modify-write cycles themselves.

use chrono::{DateTime, Utc};

use crate::domain::session::{Session, SessionToken};
use crate::error::AuthResult;

#[trait_variant::make(SessionStore: Send)]
pub trait LocalSessionStore {
    async fn get(&self, token: &SessionToken) -> AuthResult<Option<Session>>;

    /// Insert or replace; the change is durable once this returns `Ok`
    async fn put(&self, token: &SessionToken, session: Session) -> AuthResult<()>;

    /// Swap `old` for `new` in a single durable change
    async fn replace(&self, old: &SessionToken, new: &SessionToken, session: Session) -> AuthResult<()>;

    /// Returns whether the token existed
    async fn delete(&self, token: &SessionToken) -> AuthResult<bool>;

    /// Drop every session whose hard expiry lies before `now`
    async fn purge_expired(&self, now: DateTime<Utc>) -> AuthResult<usize>;
}
