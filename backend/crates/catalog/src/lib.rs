//! Barcode Catalog Engine
//!
//! Clean Architecture structure:
//! - `domain/` - Value objects, entities, store key namespaces, store trait
//! - `application/` - Use cases (rate limiting, ranking, moderation, telemetry, import)
//! - `infra/` - Redis and in-memory stores, HTTP product feed
//! - `presentation/` - HTTP handlers
//!
//! ## Consensus Model
//! - Untrusted clients propose, vote for and report names per barcode
//! - One effective vote and one effective report per (client, barcode, name), ever
//! - Every client action is counted against a daily per-address quota first
//! - Names are never deleted; moderation moves them above or below the visibility floor

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::{CatalogConfig, DailyQuota, StoreFailurePolicy};
pub use application::telemetry::CachedCount;
pub use domain::repository::KvStore;
pub use error::{CatalogError, CatalogResult};
pub use infra::feed::FeedClient;
pub use infra::memory::MemoryStore;
pub use infra::redis::RedisStore;
pub use presentation::handlers::CatalogAppState;
pub use presentation::router::{admin_router, catalog_router};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

#[cfg(test)]
mod tests;
