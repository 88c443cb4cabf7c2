//! Product feed over HTTP

use crate::application::import::ProductFeed;
use crate::domain::entities::FeedItem;
use crate::error::{CatalogError, CatalogResult};
use std::time::Duration;

const FEED_TIMEOUT: Duration = Duration::from_secs(10);
const USER_AGENT: &str = "Barcode Buddy Federation";
/// Literal body the feed answers with for a rejected key
const WRONG_KEY_BODY: &str = "Wrong API Key";

/// Fetches the product list from `<url><api key>`
pub struct FeedClient {
    http: reqwest::Client,
    url: String,
}

impl FeedClient {
    pub fn new(base_url: &str, api_key: &str) -> CatalogResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(FEED_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| CatalogError::Feed(e.without_url().to_string()))?;

        Ok(Self {
            http,
            url: format!("{base_url}{api_key}"),
        })
    }
}

impl std::fmt::Debug for FeedClient {
    // The url embeds the api key
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedClient").finish_non_exhaustive()
    }
}

/// Decode a feed response body
pub fn parse_feed_body(body: &str) -> CatalogResult<Vec<FeedItem>> {
    if body.trim() == WRONG_KEY_BODY {
        return Err(CatalogError::Feed("incorrect api key".to_string()));
    }
    serde_json::from_str(body).map_err(|e| CatalogError::Feed(format!("invalid feed body: {e}")))
}

impl ProductFeed for FeedClient {
    async fn fetch(&self) -> CatalogResult<Vec<FeedItem>> {
        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| CatalogError::Feed(e.without_url().to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CatalogError::Feed(e.without_url().to_string()))?;

        if !status.is_success() && body.trim() != WRONG_KEY_BODY {
            return Err(CatalogError::Feed(format!("unexpected status {status}")));
        }

        parse_feed_body(&body)
    }
}
