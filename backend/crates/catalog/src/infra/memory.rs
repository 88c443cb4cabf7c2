//! In-memory store
//!
//! Single-process stand-in for the external store with the same command
//! semantics: atomic per command, expiry against a [`Clock`], empty
//! sorted sets disappear, reverse range order is score then member
//! descending.
//!
//! Expired keys are dropped when touched, and the whole keyspace is swept at
//! most once per [`SWEEP_INTERVAL`] so keys nobody reads again do not pile up.

use crate::domain::repository::KvStore;
use crate::error::{CatalogError, CatalogResult};
use chrono::{DateTime, Utc};
use platform::clock::{Clock, SystemClock};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

#[derive(Debug)]
enum Value {
    Str(String),
    Set(HashSet<String>),
    Zset(HashMap<String, i64>),
}

#[derive(Debug)]
struct Entry {
    value: Value,
    expires_at: Option<DateTime<Utc>>,
}

impl Entry {
    fn new(value: Value) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }

    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

fn wrong_type(key: &str) -> CatalogError {
    CatalogError::Internal(format!("WRONGTYPE operation against key {key}"))
}

fn deadline(now: DateTime<Utc>, ttl: Duration) -> CatalogResult<DateTime<Utc>> {
    chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or_else(|| CatalogError::Internal(format!("invalid expiry {ttl:?}")))
}

/// Minimum spacing between two full sweeps of the keyspace
pub const SWEEP_INTERVAL: chrono::TimeDelta = chrono::TimeDelta::minutes(1);

#[derive(Debug, Default)]
struct Keyspace {
    entries: HashMap<String, Entry>,
    next_sweep: Option<DateTime<Utc>>,
}

impl Keyspace {
    /// Drop every expired entry; returns how many went
    fn sweep(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(now));
        self.next_sweep = Some(now + SWEEP_INTERVAL);
        before - self.entries.len()
    }

    fn sweep_if_due(&mut self, now: DateTime<Utc>) {
        if self.next_sweep.is_none_or(|at| now >= at) {
            let removed = self.sweep(now);
            if removed > 0 {
                tracing::debug!(removed, "Expired keys swept");
            }
        }
    }

    fn evict_expired(&mut self, key: &str, now: DateTime<Utc>) {
        if self.entries.get(key).is_some_and(|entry| !entry.is_live(now)) {
            self.entries.remove(key);
        }
    }

    fn live(&mut self, key: &str, now: DateTime<Utc>) -> Option<&mut Entry> {
        self.evict_expired(key, now);
        self.entries.get_mut(key)
    }

    fn zset(&mut self, key: &str, now: DateTime<Utc>) -> CatalogResult<Option<&HashMap<String, i64>>> {
        match self.live(key, now) {
            None => Ok(None),
            Some(Entry {
                value: Value::Zset(zset),
                ..
            }) => Ok(Some(zset)),
            Some(_) => Err(wrong_type(key)),
        }
    }

    fn zset_mut(&mut self, key: &str, now: DateTime<Utc>) -> CatalogResult<&mut HashMap<String, i64>> {
        self.evict_expired(key, now);
        let entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Entry::new(Value::Zset(HashMap::new())));
        match &mut entry.value {
            Value::Zset(zset) => Ok(zset),
            _ => Err(wrong_type(key)),
        }
    }

    fn live_keys<'a>(&'a self, prefix: &'a str, now: DateTime<Utc>) -> impl Iterator<Item = &'a String> {
        self.entries
            .iter()
            .filter(move |(key, entry)| key.starts_with(prefix) && entry.is_live(now))
            .map(|(key, _)| key)
    }
}

/// Store kept in process memory
pub struct MemoryStore {
    keyspace: Mutex<Keyspace>,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            keyspace: Mutex::new(Keyspace::default()),
            clock,
        }
    }

    pub fn with_system_clock() -> Self {
        Self::new(Arc::new(SystemClock))
    }

    fn lock(&self) -> (MutexGuard<'_, Keyspace>, DateTime<Utc>) {
        let mut guard = self.keyspace.lock().unwrap_or_else(|e| e.into_inner());
        let now = self.clock.now();
        guard.sweep_if_due(now);
        (guard, now)
    }

    /// Keys held in memory, expired or not
    #[cfg(test)]
    fn resident_keys(&self) -> usize {
        self.keyspace
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entries
            .len()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore").finish_non_exhaustive()
    }
}

impl KvStore for MemoryStore {
    async fn incr(&self, key: &str) -> CatalogResult<i64> {
        let (mut keyspace, now) = self.lock();
        keyspace.evict_expired(key, now);
        let entry = keyspace
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Entry::new(Value::Str("0".to_string())));
        let Value::Str(raw) = &mut entry.value else {
            return Err(wrong_type(key));
        };
        let next = raw
            .parse::<i64>()
            .ok()
            .and_then(|n| n.checked_add(1))
            .ok_or_else(|| CatalogError::Internal(format!("value at {key} is not an integer")))?;
        *raw = next.to_string();
        Ok(next)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> CatalogResult<()> {
        let (mut keyspace, now) = self.lock();
        let at = deadline(now, ttl)?;
        if let Some(entry) = keyspace.live(key, now) {
            entry.expires_at = Some(at);
        }
        Ok(())
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> CatalogResult<()> {
        let (mut keyspace, now) = self.lock();
        let entry = Entry {
            value: Value::Str(value.to_string()),
            expires_at: Some(deadline(now, ttl)?),
        };
        keyspace.entries.insert(key.to_string(), entry);
        Ok(())
    }

    async fn get(&self, key: &str) -> CatalogResult<Option<String>> {
        let (mut keyspace, now) = self.lock();
        match keyspace.live(key, now) {
            None => Ok(None),
            Some(Entry {
                value: Value::Str(raw),
                ..
            }) => Ok(Some(raw.clone())),
            Some(_) => Err(wrong_type(key)),
        }
    }

    async fn sadd(&self, key: &str, member: &str) -> CatalogResult<bool> {
        let (mut keyspace, now) = self.lock();
        keyspace.evict_expired(key, now);
        let entry = keyspace
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Entry::new(Value::Set(HashSet::new())));
        match &mut entry.value {
            Value::Set(set) => Ok(set.insert(member.to_string())),
            _ => Err(wrong_type(key)),
        }
    }

    async fn scard(&self, key: &str) -> CatalogResult<u64> {
        let (mut keyspace, now) = self.lock();
        match keyspace.live(key, now) {
            None => Ok(0),
            Some(Entry {
                value: Value::Set(set),
                ..
            }) => Ok(set.len() as u64),
            Some(_) => Err(wrong_type(key)),
        }
    }

    async fn zincrby(&self, key: &str, member: &str, delta: i64) -> CatalogResult<i64> {
        let (mut keyspace, now) = self.lock();
        let score = keyspace
            .zset_mut(key, now)?
            .entry(member.to_string())
            .or_insert(0);
        *score += delta;
        Ok(*score)
    }

    async fn zadd(&self, key: &str, member: &str, score: i64) -> CatalogResult<()> {
        let (mut keyspace, now) = self.lock();
        keyspace.zset_mut(key, now)?.insert(member.to_string(), score);
        Ok(())
    }

    async fn zadd_nx(&self, key: &str, member: &str, score: i64) -> CatalogResult<bool> {
        let (mut keyspace, now) = self.lock();
        let zset = keyspace.zset_mut(key, now)?;
        if zset.contains_key(member) {
            return Ok(false);
        }
        zset.insert(member.to_string(), score);
        Ok(true)
    }

    async fn zscore(&self, key: &str, member: &str) -> CatalogResult<Option<i64>> {
        let (mut keyspace, now) = self.lock();
        Ok(keyspace
            .zset(key, now)?
            .and_then(|zset| zset.get(member).copied()))
    }

    async fn zrem(&self, key: &str, member: &str) -> CatalogResult<bool> {
        let (mut keyspace, now) = self.lock();
        let (removed, now_empty) = match keyspace.live(key, now) {
            None => return Ok(false),
            Some(Entry {
                value: Value::Zset(zset),
                ..
            }) => (zset.remove(member).is_some(), zset.is_empty()),
            Some(_) => return Err(wrong_type(key)),
        };
        if now_empty {
            keyspace.entries.remove(key);
        }
        Ok(removed)
    }

    async fn zrevrange_by_score(
        &self,
        key: &str,
        min: i64,
        limit: Option<usize>,
    ) -> CatalogResult<Vec<(String, i64)>> {
        let (mut keyspace, now) = self.lock();
        let Some(zset) = keyspace.zset(key, now)? else {
            return Ok(Vec::new());
        };

        let mut members: Vec<(String, i64)> = zset
            .iter()
            .filter(|(_, score)| **score >= min)
            .map(|(member, score)| (member.clone(), *score))
            .collect();
        members.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| b.0.cmp(&a.0)));
        if let Some(limit) = limit {
            members.truncate(limit);
        }
        Ok(members)
    }

    async fn count_keys(&self, prefix: &str) -> CatalogResult<u64> {
        let (keyspace, now) = self.lock();
        Ok(keyspace.live_keys(prefix, now).count() as u64)
    }

    async fn keys(&self, prefix: &str) -> CatalogResult<Vec<String>> {
        let (keyspace, now) = self.lock();
        Ok(keyspace.live_keys(prefix, now).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use platform::clock::ManualClock;

    fn store() -> (MemoryStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::starting_now());
        (MemoryStore::new(clock.clone()), clock)
    }

    #[tokio::test]
    async fn test_incr_keeps_expiry_and_restarts_after_it() {
        let (store, clock) = store();
        assert_eq!(store.incr("requests:a").await.unwrap(), 1);
        store.expire("requests:a", Duration::from_secs(10)).await.unwrap();
        assert_eq!(store.incr("requests:a").await.unwrap(), 2);

        clock.advance(ChronoDuration::seconds(10));
        assert_eq!(store.incr("requests:a").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_expire_on_missing_key_is_noop() {
        let (store, _) = store();
        store.expire("nothing", Duration::from_secs(5)).await.unwrap();
        assert_eq!(store.count_keys("").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_set_ex_and_get() {
        let (store, clock) = store();
        store.set_ex("log:uuid:x", "origin", Duration::from_secs(60)).await.unwrap();
        assert_eq!(store.get("log:uuid:x").await.unwrap().as_deref(), Some("origin"));
        clock.advance(ChronoDuration::seconds(61));
        assert_eq!(store.get("log:uuid:x").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_sets() {
        let (store, _) = store();
        assert!(store.sadd("users", "a").await.unwrap());
        assert!(!store.sadd("users", "a").await.unwrap());
        assert!(store.sadd("users", "b").await.unwrap());
        assert_eq!(store.scard("users").await.unwrap(), 2);
        assert_eq!(store.scard("missing").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_sorted_set_commands() {
        let (store, _) = store();
        assert_eq!(store.zincrby("z", "a", 1).await.unwrap(), 1);
        assert_eq!(store.zincrby("z", "a", -3).await.unwrap(), -2);
        assert!(store.zadd_nx("z", "b", 1).await.unwrap());
        assert!(!store.zadd_nx("z", "b", 7).await.unwrap());
        store.zadd("z", "c", 1).await.unwrap();
        assert_eq!(store.zscore("z", "b").await.unwrap(), Some(1));
        assert_eq!(store.zscore("z", "zz").await.unwrap(), None);

        let ranked = store.zrevrange_by_score("z", -1, None).await.unwrap();
        assert_eq!(ranked, vec![("c".to_string(), 1), ("b".to_string(), 1)]);

        let limited = store.zrevrange_by_score("z", i64::MIN, Some(1)).await.unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_sorted_set_disappears() {
        let (store, _) = store();
        store.zincrby("reports", "1:a", 1).await.unwrap();
        assert!(store.zrem("reports", "1:a").await.unwrap());
        assert!(!store.zrem("reports", "1:a").await.unwrap());
        assert!(store.keys("reports").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_wrong_type() {
        let (store, _) = store();
        store.incr("counter").await.unwrap();
        assert!(matches!(
            store.zincrby("counter", "a", 1).await,
            Err(CatalogError::Internal(_))
        ));
        assert!(!store.zincrby("counter", "a", 1).await.unwrap_err().is_store_failure());
    }

    #[tokio::test]
    async fn test_untouched_expired_keys_are_swept_on_later_access() {
        let (store, clock) = store();
        for n in 0..20 {
            let key = format!("requests:10.0.0.{n}");
            store.incr(&key).await.unwrap();
            store.expire(&key, Duration::from_secs(30)).await.unwrap();
        }
        store.set_ex("users:active:a", "1", Duration::from_secs(30)).await.unwrap();
        store.sadd("users", "a").await.unwrap();
        assert_eq!(store.resident_keys(), 22);

        // Within the sweep interval nothing unrelated is dropped
        clock.advance(ChronoDuration::seconds(31));
        store.incr("requests:other").await.unwrap();
        assert_eq!(store.resident_keys(), 23);

        clock.advance(SWEEP_INTERVAL);
        store.incr("requests:other").await.unwrap();
        assert_eq!(store.resident_keys(), 2);
    }

    #[tokio::test]
    async fn test_key_scans_skip_expired() {
        let (store, clock) = store();
        store.set_ex("users:active:a", "1", Duration::from_secs(5)).await.unwrap();
        store.set_ex("users:active:b", "1", Duration::from_secs(50)).await.unwrap();
        store.sadd("users", "a").await.unwrap();
        assert_eq!(store.count_keys("users:active:").await.unwrap(), 2);

        clock.advance(ChronoDuration::seconds(6));
        assert_eq!(store.count_keys("users:active:").await.unwrap(), 1);
        assert_eq!(store.keys("users").await.unwrap().len(), 2);
    }
}
