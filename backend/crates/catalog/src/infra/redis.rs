//! # Redis
//!
//! The production store. One multiplexed [`ConnectionManager`] is shared by
//! every request; it reconnects on its own after a dropped connection.
//!
//! Scores are integers by construction but Redis replies with floats, so
//! every score is rounded back on the way out. Key counting walks the
//! keyspace with `SCAN MATCH` instead of blocking the server with `KEYS`.

use crate::domain::repository::KvStore;
use crate::error::CatalogResult;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::{AsyncCommands, Client};
use std::collections::HashSet;
use std::time::Duration;

const CONNECTION_TIMEOUT: Duration = Duration::from_millis(500);
const SCAN_BATCH: usize = 500;

/// Redis-backed store
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    pub async fn connect(url: &str) -> CatalogResult<Self> {
        let config = ConnectionManagerConfig::new()
            .set_number_of_retries(1)
            .set_connection_timeout(CONNECTION_TIMEOUT);

        let client = Client::open(url)?;
        let conn = client.get_connection_manager_with_config(config).await?;

        tracing::info!("Connected to Redis");
        Ok(Self { conn })
    }

    /// Walk the keyspace for `prefix*`; SCAN may repeat keys, so they are deduplicated
    async fn scan_prefix(&self, prefix: &str) -> CatalogResult<HashSet<String>> {
        let mut conn = self.conn.clone();
        let pattern = format!("{}*", escape_glob(prefix));
        let mut found = HashSet::new();
        let mut cursor: u64 = 0;

        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await?;
            found.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }

        Ok(found)
    }
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore").finish_non_exhaustive()
    }
}

/// Escape glob metacharacters so a prefix matches literally
fn escape_glob(prefix: &str) -> String {
    let mut out = String::with_capacity(prefix.len());
    for c in prefix.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn to_score(raw: f64) -> i64 {
    raw.round() as i64
}

impl KvStore for RedisStore {
    async fn incr(&self, key: &str) -> CatalogResult<i64> {
        let mut conn = self.conn.clone();
        let count: i64 = conn.incr(key, 1_i64).await?;
        Ok(count)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> CatalogResult<()> {
        let mut conn = self.conn.clone();
        let seconds = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        let _: bool = conn.expire(key, seconds).await?;
        Ok(())
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> CatalogResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.set_ex(key, value, ttl.as_secs().max(1)).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> CatalogResult<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn sadd(&self, key: &str, member: &str) -> CatalogResult<bool> {
        let mut conn = self.conn.clone();
        let added: i64 = conn.sadd(key, member).await?;
        Ok(added > 0)
    }

    async fn scard(&self, key: &str) -> CatalogResult<u64> {
        let mut conn = self.conn.clone();
        let count: u64 = conn.scard(key).await?;
        Ok(count)
    }

    async fn zincrby(&self, key: &str, member: &str, delta: i64) -> CatalogResult<i64> {
        let mut conn = self.conn.clone();
        let score: f64 = conn.zincr(key, member, delta).await?;
        Ok(to_score(score))
    }

    async fn zadd(&self, key: &str, member: &str, score: i64) -> CatalogResult<()> {
        let mut conn = self.conn.clone();
        let _: i64 = conn.zadd(key, member, score).await?;
        Ok(())
    }

    async fn zadd_nx(&self, key: &str, member: &str, score: i64) -> CatalogResult<bool> {
        let mut conn = self.conn.clone();
        let added: i64 = redis::cmd("ZADD")
            .arg(key)
            .arg("NX")
            .arg(score)
            .arg(member)
            .query_async(&mut conn)
            .await?;
        Ok(added > 0)
    }

    async fn zscore(&self, key: &str, member: &str) -> CatalogResult<Option<i64>> {
        let mut conn = self.conn.clone();
        let score: Option<f64> = conn.zscore(key, member).await?;
        Ok(score.map(to_score))
    }

    async fn zrem(&self, key: &str, member: &str) -> CatalogResult<bool> {
        let mut conn = self.conn.clone();
        let removed: i64 = conn.zrem(key, member).await?;
        Ok(removed > 0)
    }

    async fn zrevrange_by_score(
        &self,
        key: &str,
        min: i64,
        limit: Option<usize>,
    ) -> CatalogResult<Vec<(String, i64)>> {
        let mut conn = self.conn.clone();
        let min = if min == i64::MIN {
            "-inf".to_string()
        } else {
            min.to_string()
        };

        let mut cmd = redis::cmd("ZREVRANGEBYSCORE");
        cmd.arg(key).arg("+inf").arg(min).arg("WITHSCORES");
        if let Some(limit) = limit {
            cmd.arg("LIMIT").arg(0).arg(limit);
        }

        let rows: Vec<(String, f64)> = cmd.query_async(&mut conn).await?;
        Ok(rows
            .into_iter()
            .map(|(member, score)| (member, to_score(score)))
            .collect())
    }

    async fn count_keys(&self, prefix: &str) -> CatalogResult<u64> {
        Ok(self.scan_prefix(prefix).await?.len() as u64)
    }

    async fn keys(&self, prefix: &str) -> CatalogResult<Vec<String>> {
        Ok(self.scan_prefix(prefix).await?.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_glob() {
        assert_eq!(escape_glob("barcode:"), "barcode:");
        assert_eq!(escape_glob("a*b?[c]\\"), "a\\*b\\?\\[c\\]\\\\");
    }

    #[test]
    fn test_to_score_rounds() {
        assert_eq!(to_score(-100.0), -100);
        assert_eq!(to_score(0.9999999), 1);
        assert_eq!(to_score(-1.0000001), -1);
    }
}
