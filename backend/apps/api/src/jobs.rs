//! Background jobs
//!
//! Each job runs one pass immediately, then sleeps for its interval. A job
//! stops when the shutdown signal flips to `true` or its sender is dropped.

use catalog::KvStore;
use catalog::application::import::{ImportFeedUseCase, ProductFeed};
use catalog::application::telemetry::Telemetry;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Sleep for `every`; `false` once shutdown was requested
async fn wait_or_stop(every: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    if *shutdown.borrow() {
        return false;
    }
    let changed = tokio::select! {
        _ = tokio::time::sleep(every) => return true,
        changed = shutdown.changed() => changed,
    };
    changed.is_ok() && !*shutdown.borrow()
}

/// Keep the cached barcode total fresh
pub fn spawn_barcode_count_refresh<S>(
    telemetry: Telemetry<S>,
    every: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()>
where
    S: KvStore + Send + Sync + 'static,
{
    tokio::spawn(async move {
        loop {
            match telemetry.refresh_barcode_count().await {
                Ok(count) => tracing::debug!(barcodes = count, "Barcode count refreshed"),
                Err(e) => tracing::warn!(error = %e, "Barcode count refresh failed"),
            }
            if !wait_or_stop(every, &mut shutdown).await {
                break;
            }
        }
        tracing::info!("Barcode count refresh stopped");
    })
}

/// Re-import the external product feed
pub fn spawn_feed_import<S, F>(
    import: ImportFeedUseCase<S, F>,
    every: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()>
where
    S: KvStore + Send + Sync + 'static,
    F: ProductFeed + Send + Sync + 'static,
{
    tokio::spawn(async move {
        loop {
            match import.execute().await {
                Ok(outcome) => tracing::info!(
                    inserted = outcome.inserted,
                    existing = outcome.existing,
                    skipped = outcome.skipped,
                    "Product feed imported"
                ),
                Err(e) => tracing::warn!(error = %e, "Product feed import failed"),
            }
            if !wait_or_stop(every, &mut shutdown).await {
                break;
            }
        }
        tracing::info!("Product feed import stopped");
    })
}
