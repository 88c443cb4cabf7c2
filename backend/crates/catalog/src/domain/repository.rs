//! Repository Traits
//!
//! The engine only needs a handful of key-value and sorted-set commands.
//! Each method is a single store round trip; atomicity holds per command,
//! never across commands.

use crate::error::CatalogResult;
use std::time::Duration;

/// Key-value and sorted-set store
#[trait_variant::make(KvStore: Send)]
pub trait LocalKvStore {
    /// Atomically increment a counter, creating it at 0; returns the new value
    async fn incr(&self, key: &str) -> CatalogResult<i64>;

    /// (Re)set the time to live of an existing key
    async fn expire(&self, key: &str, ttl: Duration) -> CatalogResult<()>;

    /// Set a string value with a time to live
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> CatalogResult<()>;

    async fn get(&self, key: &str) -> CatalogResult<Option<String>>;

    /// Add a member to a set; returns whether it was new
    async fn sadd(&self, key: &str, member: &str) -> CatalogResult<bool>;

    async fn scard(&self, key: &str) -> CatalogResult<u64>;

    /// Add `delta` to a member's score, creating it at 0; returns the new score
    async fn zincrby(&self, key: &str, member: &str, delta: i64) -> CatalogResult<i64>;

    /// Set a member's score unconditionally
    async fn zadd(&self, key: &str, member: &str, score: i64) -> CatalogResult<()>;

    /// Add a member only if absent; returns whether it was added
    async fn zadd_nx(&self, key: &str, member: &str, score: i64) -> CatalogResult<bool>;

    async fn zscore(&self, key: &str, member: &str) -> CatalogResult<Option<i64>>;

    /// Remove a member; returns whether it was present
    async fn zrem(&self, key: &str, member: &str) -> CatalogResult<bool>;

    /// Members with score >= `min`, highest score first, at most `limit`
    async fn zrevrange_by_score(
        &self,
        key: &str,
        min: i64,
        limit: Option<usize>,
    ) -> CatalogResult<Vec<(String, i64)>>;

    /// Number of live keys starting with `prefix`
    async fn count_keys(&self, prefix: &str) -> CatalogResult<u64>;

    /// Live keys starting with `prefix`, unordered
    async fn keys(&self, prefix: &str) -> CatalogResult<Vec<String>>;
}
