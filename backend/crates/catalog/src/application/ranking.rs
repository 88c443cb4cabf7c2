//! Name Ranking Store
//!
//! Per barcode an ordered set name -> score. Names are never deleted; a
//! removed name sits at the removed score, below the visibility floor.

use crate::application::config::CatalogConfig;
use crate::application::dedup::{DedupGuard, GuardedAction};
use crate::domain::entities::{BulkOutcome, SubmissionEntry};
use crate::domain::keys;
use crate::domain::repository::KvStore;
use crate::domain::value_objects::{
    Barcode, ClientAddress, OriginTag, ProductName, REPORT_PENALTY, SUBMITTED_SCORE,
    VISIBLE_MIN_SCORE, VOTE_WEIGHT,
};
use crate::error::{CatalogError, CatalogResult};
use std::sync::Arc;

pub struct NameRanking<S>
where
    S: KvStore,
{
    store: Arc<S>,
    config: Arc<CatalogConfig>,
    guard: DedupGuard<S>,
}

impl<S> NameRanking<S>
where
    S: KvStore,
{
    pub fn new(store: Arc<S>, config: Arc<CatalogConfig>) -> Self {
        let guard = DedupGuard::new(store.clone(), config.clone());
        Self {
            store,
            config,
            guard,
        }
    }

    /// Visible names of a barcode, highest score first
    ///
    /// With `count_hit` the popularity counter is bumped, whether or not the
    /// barcode turns out to be known.
    pub async fn lookup(&self, barcode: &Barcode, count_hit: bool) -> CatalogResult<Vec<String>> {
        let names = self.ranked_names(barcode).await?;

        if count_hit {
            self.config.failure_policy.settle(
                "zincrby",
                self.store.zincrby(keys::HITS, barcode.as_str(), 1).await,
            )?;
        }

        if names.is_empty() {
            return Err(CatalogError::NotFound);
        }
        Ok(names)
    }

    /// Visible names without touching the popularity counter; may be empty
    pub async fn ranked_names(&self, barcode: &Barcode) -> CatalogResult<Vec<String>> {
        visible_names(self.store.as_ref(), &self.config, &keys::barcode(barcode)).await
    }

    /// Vote for a name, creating it at score 1 if unknown
    ///
    /// Returns `false` for any repeat of the same client's vote.
    pub async fn vote(
        &self,
        client: &ClientAddress,
        barcode: &Barcode,
        name: &ProductName,
    ) -> CatalogResult<bool> {
        if !self
            .guard
            .register_first(GuardedAction::Vote, client, barcode, name)
            .await?
        {
            tracing::debug!(client = %client, barcode = %barcode, "Repeated vote ignored");
            return Ok(false);
        }

        let score = self.config.failure_policy.settle(
            "zincrby",
            self.store
                .zincrby(&keys::barcode(barcode), name.as_str(), VOTE_WEIGHT)
                .await,
        )?;

        tracing::info!(barcode = %barcode, name = %name, score, "Vote accepted");
        Ok(true)
    }

    /// Report a name as wrong
    ///
    /// Only the first report of a client counts, and only against a name
    /// that exists; a blind increment would create phantom names.
    pub async fn report(
        &self,
        client: &ClientAddress,
        barcode: &Barcode,
        name: &ProductName,
    ) -> CatalogResult<bool> {
        let policy = self.config.failure_policy;

        if !self
            .guard
            .register_first(GuardedAction::Report, client, barcode, name)
            .await?
        {
            tracing::debug!(client = %client, barcode = %barcode, "Repeated report ignored");
            return Ok(false);
        }

        let barcode_key = keys::barcode(barcode);
        let existing = policy.settle(
            "zscore",
            self.store.zscore(&barcode_key, name.as_str()).await,
        )?;
        if existing.is_none() {
            tracing::debug!(barcode = %barcode, name = %name, "Report against unknown name");
            return Ok(false);
        }

        policy.settle(
            "zincrby",
            self.store
                .zincrby(&barcode_key, name.as_str(), REPORT_PENALTY)
                .await,
        )?;
        policy.settle(
            "zincrby",
            self.store
                .zincrby(&keys::reported(barcode), name.as_str(), 1)
                .await,
        )?;
        let queued = policy.settle(
            "zincrby",
            self.store
                .zincrby(keys::REPORTS, &keys::report_member(barcode, name), 1)
                .await,
        )?;

        tracing::info!(barcode = %barcode, name = %name, reports = queued, "Report accepted");
        Ok(true)
    }

    /// Insert sanitized pairs that are not ranked yet
    ///
    /// Invalid pairs are skipped one by one; existing names keep their score.
    /// Every valid pair gets a short-lived provenance marker.
    pub async fn submit_bulk<I, B, N>(&self, entries: I, origin: &OriginTag) -> CatalogResult<BulkOutcome>
    where
        I: IntoIterator<Item = (B, N)>,
        B: AsRef<str>,
        N: AsRef<str>,
    {
        let policy = self.config.failure_policy;
        let mut outcome = BulkOutcome::default();

        for (raw_barcode, raw_name) in entries {
            let Some(entry) = SubmissionEntry::sanitize(raw_barcode.as_ref(), raw_name.as_ref())
            else {
                outcome.skipped += 1;
                continue;
            };

            let inserted = policy.settle(
                "zadd",
                self.store
                    .zadd_nx(
                        &keys::barcode(&entry.barcode),
                        entry.name.as_str(),
                        SUBMITTED_SCORE,
                    )
                    .await,
            )?;
            if inserted {
                outcome.inserted += 1;
            } else {
                outcome.existing += 1;
            }

            policy.settle(
                "set",
                self.store
                    .set_ex(
                        &keys::provenance(&entry.barcode, &entry.name),
                        origin.as_str(),
                        self.config.provenance_ttl,
                    )
                    .await,
            )?;
        }

        tracing::info!(
            origin = origin.as_str(),
            inserted = outcome.inserted,
            existing = outcome.existing,
            skipped = outcome.skipped,
            "Bulk submission stored"
        );
        Ok(outcome)
    }
}

/// Visible names stored under a `barcode:<code>` key
pub(crate) async fn visible_names<S: KvStore>(
    store: &S,
    config: &CatalogConfig,
    key: &str,
) -> CatalogResult<Vec<String>> {
    let ranked = config.failure_policy.settle(
        "zrevrangebyscore",
        store.zrevrange_by_score(key, VISIBLE_MIN_SCORE, None).await,
    )?;
    Ok(ranked.into_iter().map(|(name, _)| name).collect())
}
