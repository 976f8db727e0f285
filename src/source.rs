//! Remote item store.
//!
//! The store is a read-only JSON API with two endpoints:
//!
//! | Method | Path | Body |
//! |--------|------|------|
//! | `GET` | `{base_url}/topstories.json` | `[u64]`, best first |
//! | `GET` | `{base_url}/item/{id}.json` | item object, or `null` |
//!
//! [`ItemSource`] is the seam the fetch orchestrator talks to, so tests and
//! alternative stores can stand in for [`HttpItemSource`].

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::config::SourceConfig;
use crate::models::RawItem;

/// A read-only store of feed items.
#[async_trait]
pub trait ItemSource: Send + Sync {
    /// Ids of the current top items, best first.
    async fn top_ids(&self) -> Result<Vec<u64>>;

    /// A single item. `Ok(None)` means the store answered but has no such item.
    async fn item(&self, id: u64) -> Result<Option<RawItem>>;
}

/// [`ItemSource`] backed by the Hacker News Firebase API (or anything that
/// speaks the same two endpoints).
pub struct HttpItemSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpItemSource {
    /// Build a client with the configured per-request timeout.
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("hn-ranker/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn top_ids_url(&self) -> String {
        format!("{}/topstories.json", self.base_url)
    }

    fn item_url(&self, id: u64) -> String {
        format!("{}/item/{}.json", self.base_url, id)
    }
}

#[async_trait]
impl ItemSource for HttpItemSource {
    async fn top_ids(&self) -> Result<Vec<u64>> {
        let url = self.top_ids_url();
        let ids = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("GET {} failed", url))?
            .error_for_status()?
            .json::<Vec<u64>>()
            .await
            .with_context(|| format!("Malformed top id list from {}", url))?;
        Ok(ids)
    }

    async fn item(&self, id: u64) -> Result<Option<RawItem>> {
        let url = self.item_url(id);
        let item = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("GET {} failed", url))?
            .error_for_status()?
            .json::<Option<RawItem>>()
            .await
            .with_context(|| format!("Malformed item payload from {}", url))?;
        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_strip_trailing_slash() {
        let cfg = SourceConfig {
            base_url: "http://localhost:9000/v0/".to_string(),
            ..Default::default()
        };
        let source = HttpItemSource::new(&cfg).unwrap();
        assert_eq!(source.top_ids_url(), "http://localhost:9000/v0/topstories.json");
        assert_eq!(source.item_url(8863), "http://localhost:9000/v0/item/8863.json");
    }
}
