//! Moderation Queue
//!
//! The `reports` sorted set is the queue. Entries are addressed by their
//! content-derived [`ReportId`], never by list position, so a stale listing
//! cannot resolve the wrong name.

use crate::application::config::CatalogConfig;
use crate::domain::entities::{ReportEntry, ReportId, Resolution};
use crate::domain::keys;
use crate::domain::repository::KvStore;
use crate::domain::value_objects::{Barcode, DISMISSED_SCORE, ProductName, REMOVED_SCORE};
use crate::error::{CatalogError, CatalogResult};
use std::sync::Arc;

pub struct ModerationQueue<S>
where
    S: KvStore,
{
    store: Arc<S>,
    config: Arc<CatalogConfig>,
}

impl<S> ModerationQueue<S>
where
    S: KvStore,
{
    pub fn new(store: Arc<S>, config: Arc<CatalogConfig>) -> Self {
        Self { store, config }
    }

    /// Outstanding reports, most reported first
    pub async fn list(&self) -> CatalogResult<Vec<ReportEntry>> {
        let members = self.config.failure_policy.settle(
            "zrevrangebyscore",
            self.store.zrevrange_by_score(keys::REPORTS, 0, None).await,
        )?;

        let mut entries = Vec::with_capacity(members.len());
        for (member, count) in members {
            match ReportEntry::from_member(entries.len(), member, count) {
                Some(entry) => entries.push(entry),
                None => tracing::warn!("Skipping malformed moderation queue member"),
            }
        }
        Ok(entries)
    }

    /// Resolve the entry carrying `id` against a fresh read of the queue
    pub async fn resolve(&self, id: &ReportId, resolution: Resolution) -> CatalogResult<ReportEntry> {
        let entry = self
            .list()
            .await?
            .into_iter()
            .find(|entry| &entry.id == id)
            .ok_or(CatalogError::ReportNotFound)?;

        self.resolve_entry(&entry, resolution).await?;
        Ok(entry)
    }

    /// Apply a decision and drop the queue bookkeeping
    ///
    /// The name's score is overwritten regardless of its current value.
    pub async fn resolve_entry(&self, entry: &ReportEntry, resolution: Resolution) -> CatalogResult<()> {
        let policy = self.config.failure_policy;
        let barcode = Barcode::from_stored(entry.barcode.as_str());
        let name = ProductName::from_stored(entry.name.as_str());

        let score = match resolution {
            Resolution::Remove => REMOVED_SCORE,
            Resolution::Dismiss => DISMISSED_SCORE,
        };

        policy.settle(
            "zadd",
            self.store
                .zadd(&keys::barcode(&barcode), name.as_str(), score)
                .await,
        )?;
        policy.settle(
            "zrem",
            self.store.zrem(&keys::reported(&barcode), name.as_str()).await,
        )?;
        policy.settle(
            "zrem",
            self.store.zrem(keys::REPORTS, &entry.member).await,
        )?;

        tracing::info!(
            report_id = %entry.id,
            barcode = %barcode,
            name = %name,
            resolution = %resolution,
            "Report resolved"
        );
        Ok(())
    }
}
