//! Usage/Telemetry Counters
//!
//! Read-only rollups over the other namespaces plus the distinct/active user
//! markers. The total barcode count needs a full key scan, so it is cached
//! and refreshed by a background job.

use crate::application::config::CatalogConfig;
use crate::application::ranking::visible_names;
use crate::domain::entities::{ProductRecord, TopBarcode, UsageTotals};
use crate::domain::keys;
use crate::domain::repository::KvStore;
use crate::domain::value_objects::ClientUuid;
use crate::error::CatalogResult;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Last known number of stored barcodes
#[derive(Debug, Default)]
pub struct CachedCount(AtomicU64);

impl CachedCount {
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    pub fn set(&self, value: u64) {
        self.0.store(value, Ordering::Relaxed);
    }
}

pub struct Telemetry<S>
where
    S: KvStore,
{
    store: Arc<S>,
    config: Arc<CatalogConfig>,
    barcode_count: Arc<CachedCount>,
}

impl<S> Telemetry<S>
where
    S: KvStore,
{
    pub fn new(store: Arc<S>, config: Arc<CatalogConfig>, barcode_count: Arc<CachedCount>) -> Self {
        Self {
            store,
            config,
            barcode_count,
        }
    }

    /// Add the uuid to the distinct users and mark it active
    pub async fn record_user(&self, uuid: &ClientUuid) -> CatalogResult<()> {
        let policy = self.config.failure_policy;
        policy.settle("sadd", self.store.sadd(keys::USERS, uuid.as_str()).await)?;
        policy.settle(
            "set",
            self.store
                .set_ex(&keys::active_user(uuid), "1", self.config.active_user_ttl)
                .await,
        )?;
        Ok(())
    }

    /// Recount stored barcodes and update the cache
    pub async fn refresh_barcode_count(&self) -> CatalogResult<u64> {
        let count = self.config.failure_policy.settle(
            "scan",
            self.store.count_keys(keys::BARCODE_PREFIX).await,
        )?;
        self.barcode_count.set(count);
        tracing::debug!(count, "Barcode count refreshed");
        Ok(count)
    }

    pub fn cached_barcode_count(&self) -> u64 {
        self.barcode_count.get()
    }

    pub async fn totals(&self) -> CatalogResult<UsageTotals> {
        let policy = self.config.failure_policy;
        Ok(UsageTotals {
            barcodes: self.barcode_count.get(),
            users: policy.settle("scard", self.store.scard(keys::USERS).await)?,
            active_users: policy.settle(
                "scan",
                self.store.count_keys(keys::ACTIVE_USER_PREFIX).await,
            )?,
            votes: policy.settle("scan", self.store.count_keys(keys::VOTE_PREFIX).await)?,
            reports: policy.settle("scan", self.store.count_keys(keys::REPORT_PREFIX).await)?,
        })
    }

    /// Most looked-up barcodes with their visible names
    pub async fn top_barcodes(&self) -> CatalogResult<Vec<TopBarcode>> {
        let hits = self.config.failure_policy.settle(
            "zrevrangebyscore",
            self.store
                .zrevrange_by_score(keys::HITS, 1, Some(self.config.top_limit))
                .await,
        )?;

        let mut top = Vec::with_capacity(hits.len());
        for (barcode, hits) in hits {
            let key = format!("{}{barcode}", keys::BARCODE_PREFIX);
            let names = visible_names(self.store.as_ref(), &self.config, &key).await?;
            top.push(TopBarcode {
                barcode,
                hits,
                names,
            });
        }
        Ok(top)
    }

    /// Every stored barcode with its visible names, ordered by barcode
    pub async fn export(&self) -> CatalogResult<Vec<ProductRecord>> {
        let mut barcode_keys = self
            .config
            .failure_policy
            .settle("scan", self.store.keys(keys::BARCODE_PREFIX).await)?;
        barcode_keys.sort_unstable();

        let mut records = Vec::with_capacity(barcode_keys.len());
        for key in barcode_keys {
            let Some(barcode) = keys::barcode_from_key(&key) else {
                continue;
            };
            let names = visible_names(self.store.as_ref(), &self.config, &key).await?;
            records.push(ProductRecord {
                barcode: barcode.to_string(),
                names,
            });
        }
        Ok(records)
    }
}
