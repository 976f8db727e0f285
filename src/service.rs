//! The ranking pipeline shared by the HTTP endpoint, the HTML form and the CLI.
//!
//! ```text
//! bio ─▶ validate_bio ─▶ StoryCache::get_fresh ─▶ rank_stories ─▶ ranked stories
//! ```

use anyhow::Result;
use std::sync::Arc;
use thiserror::Error;

use crate::bio::{validate_bio, BioError};
use crate::cache::{CacheStatus, StoryCache};
use crate::config::Config;
use crate::embedding::{create_provider, EmbeddingProvider};
use crate::models::Story;
use crate::rank::rank_stories;
use crate::source::{HttpItemSource, ItemSource};

/// A [`StoryCache`] over the HTTP item source described by `config`.
///
/// Needs no embedding provider, so unranked listings work even when the
/// embedding section is unusable.
pub fn story_cache_from_config(config: &Config) -> Result<StoryCache> {
    let source: Arc<dyn ItemSource> = Arc::new(HttpItemSource::new(&config.source)?);
    Ok(StoryCache::new(
        source,
        config.source.clone(),
        config.cache.ttl(),
    ))
}

/// Why a ranking request failed.
#[derive(Debug, Error)]
pub enum RankError {
    /// The caller sent an unusable bio.
    #[error(transparent)]
    InvalidBio(#[from] BioError),
    /// The embedding provider failed.
    #[error("Ranking failed: {0:#}")]
    Embedding(anyhow::Error),
}

pub struct StoryRanker {
    cache: Arc<StoryCache>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl StoryRanker {
    pub fn new(cache: Arc<StoryCache>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { cache, embedder }
    }

    /// Wire up the HTTP item source, the cache and the embedding provider
    /// described by `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let cache = Arc::new(story_cache_from_config(config)?);
        let embedder = create_provider(&config.embedding)?;
        Ok(Self::new(cache, embedder))
    }

    /// Validate `bio` and rank the current top stories against it.
    ///
    /// No stories available is not an error; the result is just empty.
    pub async fn ranked_for_bio(&self, bio: &str) -> Result<Vec<Story>, RankError> {
        let bio = validate_bio(bio)?;
        let stories = self.cache.get_fresh().await;
        rank_stories(self.embedder.as_ref(), bio, &stories)
            .await
            .map_err(RankError::Embedding)
    }

    /// The current top stories in feed order.
    pub async fn top_stories(&self) -> Arc<Vec<Story>> {
        self.cache.get_fresh().await
    }

    pub async fn cache_status(&self) -> CacheStatus {
        self.cache.status().await
    }

    pub fn embedder(&self) -> &dyn EmbeddingProvider {
        self.embedder.as_ref()
    }
}
