//! Vote/Report Dedup Guard
//!
//! One counter per (client, barcode, name) and action. Only the caller that
//! observes the 0 -> 1 transition may apply the score change; the store's
//! atomic increment makes that true for racing duplicates as well. Guard
//! records never expire.

use crate::application::config::CatalogConfig;
use crate::domain::keys;
use crate::domain::repository::KvStore;
use crate::domain::value_objects::{Barcode, ClientAddress, ProductName};
use crate::error::CatalogResult;
use std::sync::Arc;

/// Action protected by the guard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardedAction {
    Vote,
    Report,
}

pub struct DedupGuard<S>
where
    S: KvStore,
{
    store: Arc<S>,
    config: Arc<CatalogConfig>,
}

impl<S> DedupGuard<S>
where
    S: KvStore,
{
    pub fn new(store: Arc<S>, config: Arc<CatalogConfig>) -> Self {
        Self { store, config }
    }

    /// Record the action; `true` only for the first occurrence ever
    pub async fn register_first(
        &self,
        action: GuardedAction,
        client: &ClientAddress,
        barcode: &Barcode,
        name: &ProductName,
    ) -> CatalogResult<bool> {
        let key = match action {
            GuardedAction::Vote => keys::vote_guard(client, barcode, name),
            GuardedAction::Report => keys::report_guard(client, barcode, name),
        };

        // A degraded increment yields 0, which never counts as first
        let count = self
            .config
            .failure_policy
            .settle("incr", self.store.incr(&key).await)?;

        Ok(count == 1)
    }
}
