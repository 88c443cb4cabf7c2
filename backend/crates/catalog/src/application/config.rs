//! Application Configuration
//!
//! Configuration for the catalog application layer.

use crate::error::{CatalogError, CatalogResult};
use std::str::FromStr;
use std::time::Duration;

/// Re-export the daily budgets from platform
pub use platform::rate_limit::DailyQuota;

/// How the engine treats a failed store round trip
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StoreFailurePolicy {
    /// Surface the failure to the caller as `StoreUnavailable`
    FailFast,
    /// Log and continue with the neutral value (0, empty, false)
    #[default]
    Degrade,
}

impl StoreFailurePolicy {
    /// Apply the policy to the outcome of one store command
    ///
    /// Errors that do not originate from the store always propagate.
    pub fn settle<T: Default>(&self, op: &'static str, result: CatalogResult<T>) -> CatalogResult<T> {
        match result {
            Ok(value) => Ok(value),
            Err(err) if err.is_store_failure() => match self {
                StoreFailurePolicy::FailFast => {
                    tracing::error!(op, error = %err, "Store command failed");
                    Err(match err {
                        CatalogError::StoreUnavailable(msg) => CatalogError::StoreUnavailable(msg),
                        other => CatalogError::StoreUnavailable(format!("{op}: {other}")),
                    })
                }
                StoreFailurePolicy::Degrade => {
                    tracing::warn!(op, error = %err, "Store command failed, continuing degraded");
                    Ok(T::default())
                }
            },
            Err(err) => Err(err),
        }
    }
}

impl FromStr for StoreFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "degrade" => Ok(StoreFailurePolicy::Degrade),
            "fail-fast" | "failfast" | "fail_fast" => Ok(StoreFailurePolicy::FailFast),
            other => Err(format!("unknown store failure policy: {other}")),
        }
    }
}

/// Catalog application configuration
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Daily budgets per request class
    pub quota: DailyQuota,
    /// Store failure handling
    pub failure_policy: StoreFailurePolicy,
    /// Expiry of the provenance marker written for bulk submissions
    pub provenance_ttl: Duration,
    /// Window in which a client uuid counts as active
    pub active_user_ttl: Duration,
    /// Number of entries of the popularity listing
    pub top_limit: usize,
    /// Origin tag recorded for product-feed imports
    pub feed_origin: String,
    /// Redirect target of `/`
    pub home_redirect: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            quota: DailyQuota::default(),
            failure_policy: StoreFailurePolicy::default(),
            provenance_ttl: Duration::from_secs(4 * 24 * 60 * 60),
            active_user_ttl: Duration::from_secs(30 * 24 * 60 * 60),
            top_limit: 50,
            feed_origin: "feed".to_string(),
            home_redirect: "https://github.com/Forceu/barcodebuddy".to_string(),
        }
    }
}

impl CatalogConfig {
    /// Create config for development (fail fast so store problems are visible)
    pub fn development() -> Self {
        Self {
            failure_policy: StoreFailurePolicy::FailFast,
            ..Default::default()
        }
    }
}
