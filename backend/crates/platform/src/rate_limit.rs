//! Rate window arithmetic
//!
//! Quotas are counted per client address and per request class from local
//! midnight to local midnight. Counters are never flushed explicitly: their
//! expiry is reset to "seconds until the next midnight" on every hit.
//!
//! [`FailureLockout`] counts failed attempts per address in process memory
//! and locks an address out once its budget for the window is spent.

use chrono::{DateTime, Duration, TimeZone, Timelike, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::clock::Clock;

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Request class with its own daily budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestClass {
    /// Lookup, vote and report
    Read,
    /// Bulk submission
    Upload,
}

impl RequestClass {
    /// Key namespace of the per-address counter
    pub fn key_prefix(&self) -> &'static str {
        match self {
            RequestClass::Read => "requests",
            RequestClass::Upload => "requests_upload",
        }
    }
}

impl std::fmt::Display for RequestClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestClass::Read => f.write_str("read"),
            RequestClass::Upload => f.write_str("upload"),
        }
    }
}

/// Daily budgets per request class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyQuota {
    pub read: u64,
    pub upload: u64,
}

impl Default for DailyQuota {
    fn default() -> Self {
        Self {
            read: 200,
            upload: 5,
        }
    }
}

impl DailyQuota {
    pub fn new(read: u64, upload: u64) -> Self {
        Self { read, upload }
    }

    pub fn limit_for(&self, class: RequestClass) -> u64 {
        match class {
            RequestClass::Read => self.read,
            RequestClass::Upload => self.upload,
        }
    }

    /// Whether the `count`-th request of the day is still within budget
    pub fn allows(&self, class: RequestClass, count: u64) -> bool {
        count <= self.limit_for(class)
    }
}

/// Seconds from `now` until the next midnight of `now`'s time zone
///
/// Always at least 1 so that a counter written at 23:59:59 still gets a
/// positive TTL.
pub fn seconds_until_midnight<Tz: TimeZone>(now: &DateTime<Tz>) -> i64 {
    let next_midnight = now
        .date_naive()
        .succ_opt()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .and_then(|naive| now.timezone().from_local_datetime(&naive).earliest());

    let seconds = match next_midnight {
        Some(midnight) => midnight.signed_duration_since(now).num_seconds(),
        // No local midnight (DST gap), count a nominal day
        None => SECONDS_PER_DAY - i64::from(now.num_seconds_from_midnight()),
    };

    seconds.max(1)
}

/// Failed attempts an address may make per window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutPolicy {
    pub max_failures: u32,
    /// Failures and blocks are forgotten once the window has passed
    pub window: Duration,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            max_failures: 10,
            window: Duration::hours(6),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct FailureWindow {
    failures: u32,
    opened_at: DateTime<Utc>,
}

/// Per-address failure counter with lockout
pub struct FailureLockout {
    policy: LockoutPolicy,
    clock: Arc<dyn Clock>,
    windows: Mutex<HashMap<String, FailureWindow>>,
}

impl FailureLockout {
    pub fn new(policy: LockoutPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            policy,
            clock,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn policy(&self) -> LockoutPolicy {
        self.policy
    }

    /// Lock the table and drop windows that have run out
    fn current(&self) -> MutexGuard<'_, HashMap<String, FailureWindow>> {
        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());
        let now = self.clock.now();
        let window = self.policy.window;
        windows.retain(|_, w| now < w.opened_at + window);
        windows
    }

    pub fn is_blocked(&self, address: &str) -> bool {
        self.current()
            .get(address)
            .is_some_and(|w| w.failures >= self.policy.max_failures)
    }

    /// Count one failure; returns `true` once the address is locked out
    pub fn record_failure(&self, address: &str) -> bool {
        let now = self.clock.now();
        let mut windows = self.current();
        let window = windows
            .entry(address.to_string())
            .or_insert(FailureWindow {
                failures: 0,
                opened_at: now,
            });
        window.failures = window.failures.saturating_add(1);
        window.failures >= self.policy.max_failures
    }

    /// Forget the failures of an address
    pub fn clear(&self, address: &str) {
        self.current().remove(address);
    }

    /// Addresses currently locked out
    pub fn blocked_count(&self) -> usize {
        self.current()
            .values()
            .filter(|w| w.failures >= self.policy.max_failures)
            .count()
    }
}

impl std::fmt::Debug for FailureLockout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FailureLockout")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
