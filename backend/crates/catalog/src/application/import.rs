//! Import Feed Use Case
//!
//! A product feed is just another producer of bulk submissions.

use crate::application::config::CatalogConfig;
use crate::application::ranking::NameRanking;
use crate::domain::entities::{BulkOutcome, FeedItem};
use crate::domain::repository::KvStore;
use crate::domain::value_objects::OriginTag;
use crate::error::CatalogResult;
use std::sync::Arc;

/// Source of feed items
#[trait_variant::make(ProductFeed: Send)]
pub trait LocalProductFeed {
    async fn fetch(&self) -> CatalogResult<Vec<FeedItem>>;
}

/// Flatten feed items into (barcode, name) pairs
///
/// Every code of the first EAN group maps to the item's display name; items
/// without codes contribute nothing.
pub fn items_to_entries(items: &[FeedItem]) -> Vec<(String, String)> {
    items
        .iter()
        .filter_map(|item| item.ean.first().map(|codes| (item, codes)))
        .flat_map(|(item, codes)| {
            let name = item.display_name();
            codes.iter().map(move |code| (code.clone(), name.clone()))
        })
        .collect()
}

pub struct ImportFeedUseCase<S, F>
where
    S: KvStore,
    F: ProductFeed,
{
    ranking: NameRanking<S>,
    feed: Arc<F>,
    origin: OriginTag,
}

impl<S, F> ImportFeedUseCase<S, F>
where
    S: KvStore,
    F: ProductFeed,
{
    pub fn new(store: Arc<S>, feed: Arc<F>, config: Arc<CatalogConfig>) -> Self {
        let origin = OriginTag::new(config.feed_origin.clone());
        Self {
            ranking: NameRanking::new(store, config),
            feed,
            origin,
        }
    }

    pub async fn execute(&self) -> CatalogResult<BulkOutcome> {
        let items = self.feed.fetch().await?;
        let entries = items_to_entries(&items);

        tracing::info!(
            products = items.len(),
            barcodes = entries.len(),
            origin = self.origin.as_str(),
            "Importing product feed"
        );

        self.ranking.submit_bulk(entries, &self.origin).await
    }
}
