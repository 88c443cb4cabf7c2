//! Rate Limiter
//!
//! Daily per-address budgets. The counter is incremented unconditionally
//! before the quota check, so the request crossing the threshold is itself
//! counted and rejected. Its expiry is reset to the next local midnight on
//! every hit; an idle counter simply expires and the next request opens a
//! fresh window.

use crate::application::config::CatalogConfig;
use crate::domain::keys;
use crate::domain::repository::KvStore;
use crate::domain::value_objects::ClientAddress;
use crate::error::{CatalogError, CatalogResult};
use chrono::Local;
use platform::clock::Clock;
use platform::rate_limit::{RequestClass, seconds_until_midnight};
use std::sync::Arc;
use std::time::Duration;

pub struct RateLimiter<S>
where
    S: KvStore,
{
    store: Arc<S>,
    config: Arc<CatalogConfig>,
    clock: Arc<dyn Clock>,
}

impl<S> RateLimiter<S>
where
    S: KvStore,
{
    pub fn new(store: Arc<S>, config: Arc<CatalogConfig>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            config,
            clock,
        }
    }

    /// Count one request of `class` from `client`; returns today's count
    ///
    /// INCR and EXPIRE are two commands. A crash between them leaves a
    /// counter without expiry.
    pub async fn check_and_consume(
        &self,
        client: &ClientAddress,
        class: RequestClass,
    ) -> CatalogResult<u64> {
        let policy = self.config.failure_policy;
        let key = keys::rate_counter(class, client);

        let count = policy.settle("incr", self.store.incr(&key).await)?;

        let now = self.clock.now().with_timezone(&Local);
        let ttl = Duration::from_secs(seconds_until_midnight(&now).unsigned_abs());
        policy.settle("expire", self.store.expire(&key, ttl).await)?;

        Ok(u64::try_from(count).unwrap_or(0))
    }

    /// Consume and reject once the daily quota of `class` is exceeded
    pub async fn enforce(&self, client: &ClientAddress, class: RequestClass) -> CatalogResult<u64> {
        let count = self.check_and_consume(client, class).await?;
        if !self.config.quota.allows(class, count) {
            return Err(CatalogError::QuotaExceeded { class, count });
        }
        Ok(count)
    }
}
