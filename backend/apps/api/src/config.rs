//! Environment configuration
//!
//! Every setting has a default so `memory://` development servers start with
//! an empty environment. A `.env` file is loaded by `main` before this runs.

use anyhow::anyhow;
use auth::AuthConfig;
use catalog::{CatalogConfig, DailyQuota, StoreFailurePolicy};
use std::fmt::Display;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Product feed endpoint; import runs only when both parts are set
#[derive(Clone)]
pub struct FeedSettings {
    pub url: String,
    pub api_key: String,
}

impl std::fmt::Debug for FeedSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedSettings")
            .field("url", &self.url)
            .field("api_key", &"***")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub listen_addr: SocketAddr,
    pub store_url: String,
    pub session_file: PathBuf,
    pub catalog: CatalogConfig,
    pub auth: AuthConfig,
    pub feed: Option<FeedSettings>,
    pub barcode_count_refresh: Duration,
    pub feed_import_interval: Duration,
}

impl ApiConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let quota = DailyQuota::new(
            parse_or(&var, "API_DAILY_CALLS", 200)?,
            parse_or(&var, "API_DAILY_CALLS_UPLOAD", 5)?,
        );

        let mut catalog = CatalogConfig {
            quota,
            failure_policy: parse_or(&var, "STORE_FAILURE_POLICY", StoreFailurePolicy::Degrade)?,
            ..CatalogConfig::default()
        };
        if let Some(origin) = var("FEED_ORIGIN") {
            catalog.feed_origin = origin;
        }
        if let Some(redirect) = var("HOME_REDIRECT") {
            catalog.home_redirect = redirect;
        }

        let mut auth = AuthConfig::default().with_credentials(
            var("ADMIN_USER").unwrap_or_else(|| "admin".to_string()),
            &var("ADMIN_PASSWORD").unwrap_or_else(|| "admin".to_string()),
        );
        auth.cookie.secure = parse_or(&var, "COOKIE_SECURE", true)?;
        auth.login_failure_delay =
            Duration::from_millis(parse_or(&var, "LOGIN_FAILURE_DELAY_MS", 3000)?);

        let feed = match (var("FEED_URL"), var("FEED_API_KEY")) {
            (Some(url), Some(api_key)) => Some(FeedSettings { url, api_key }),
            _ => None,
        };

        Ok(Self {
            listen_addr: parse_or(&var, "LISTEN_ADDR", SocketAddr::from(([127, 0, 0, 1], 18900)))?,
            store_url: var("STORE_URL").unwrap_or_else(|| "redis://127.0.0.1:6379".to_string()),
            session_file: var("SESSION_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("config/sessions.json")),
            catalog,
            auth,
            feed,
            barcode_count_refresh: Duration::from_secs(parse_or(
                &var,
                "BARCODE_COUNT_REFRESH_SECS",
                6 * 60 * 60,
            )?),
            feed_import_interval: Duration::from_secs(parse_or(
                &var,
                "FEED_IMPORT_INTERVAL_SECS",
                24 * 60 * 60,
            )?),
        })
    }

    /// `memory://` selects the in-process store
    pub fn uses_memory_store(&self) -> bool {
        self.store_url.starts_with("memory://")
    }
}

fn parse_or<T>(var: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match var(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{name} has an invalid value {raw:?}: {e}")),
        None => Ok(default),
    }
}
