//! Time-bounded cache of the top stories.
//!
//! The cache holds the last successful batch and the instant it was
//! fetched. Staleness is checked lazily on [`StoryCache::get_fresh`]; there
//! is no background refresh.
//!
//! Readers only take a short read lock on the current snapshot. Refreshes
//! are serialized by a separate async mutex and the freshness check is
//! repeated once it is held, so callers that pile up behind a stale entry
//! share a single fetch burst instead of each hitting the remote store.
//! Every finished attempt bumps a counter, so callers queued behind a
//! failed refresh return what is cached instead of retrying one by one.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;

use crate::config::SourceConfig;
use crate::fetch::fetch_top_stories;
use crate::models::Story;
use crate::source::ItemSource;

/// One successful fetch. Replaced as a whole, never edited.
#[derive(Debug)]
struct CacheEntry {
    stories: Arc<Vec<Story>>,
    fetched_at: Instant,
    refreshed_at: DateTime<Utc>,
}

/// Snapshot of the cache for health reporting.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatus {
    pub stories: usize,
    pub refreshed_at: Option<DateTime<Utc>>,
    pub fresh: bool,
}

pub struct StoryCache {
    source: Arc<dyn ItemSource>,
    config: SourceConfig,
    ttl: Duration,
    entry: RwLock<Option<Arc<CacheEntry>>>,
    refresh_lock: Mutex<()>,
    /// Finished refresh attempts, successful or not.
    attempts: AtomicU64,
}

impl StoryCache {
    pub fn new(source: Arc<dyn ItemSource>, config: SourceConfig, ttl: Duration) -> Self {
        Self {
            source,
            config,
            ttl,
            entry: RwLock::new(None),
            refresh_lock: Mutex::new(()),
            attempts: AtomicU64::new(0),
        }
    }

    /// Return the cached stories, refreshing them first if they are stale.
    ///
    /// A failed refresh keeps serving the previous batch; with no previous
    /// batch the result is empty.
    pub async fn get_fresh(&self) -> Arc<Vec<Story>> {
        let current = self.snapshot().await;
        if let Some(entry) = &current {
            if self.is_fresh(entry) {
                return entry.stories.clone();
            }
        }

        let seen = self.attempts.load(Ordering::SeqCst);
        let _guard = self.refresh_lock.lock().await;

        // Someone else attempted a refresh while we waited; take its outcome.
        let current = self.snapshot().await;
        if self.attempts.load(Ordering::SeqCst) != seen {
            return Self::stories_of(current);
        }
        if let Some(entry) = &current {
            if self.is_fresh(entry) {
                return entry.stories.clone();
            }
        }

        let refreshed = self.refresh().await;
        let stories = match refreshed {
            Some(entry) => {
                let stories = entry.stories.clone();
                *self.entry.write().await = Some(Arc::new(entry));
                stories
            }
            None => Self::stories_of(current),
        };
        self.attempts.fetch_add(1, Ordering::SeqCst);
        stories
    }

    pub async fn status(&self) -> CacheStatus {
        match self.snapshot().await {
            Some(entry) => CacheStatus {
                stories: entry.stories.len(),
                refreshed_at: Some(entry.refreshed_at),
                fresh: self.is_fresh(&entry),
            },
            None => CacheStatus {
                stories: 0,
                refreshed_at: None,
                fresh: false,
            },
        }
    }

    fn stories_of(entry: Option<Arc<CacheEntry>>) -> Arc<Vec<Story>> {
        entry.map(|entry| entry.stories.clone()).unwrap_or_default()
    }

    async fn snapshot(&self) -> Option<Arc<CacheEntry>> {
        self.entry.read().await.clone()
    }

    fn is_fresh(&self, entry: &CacheEntry) -> bool {
        entry.fetched_at.elapsed() <= self.ttl
    }

    /// Fetch a new batch. `None` means the refresh failed and the current
    /// entry must stay in place.
    async fn refresh(&self) -> Option<CacheEntry> {
        let report = match fetch_top_stories(self.source.clone(), &self.config).await {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!("Refreshing stories failed, keeping cached data: {:#}", e);
                return None;
            }
        };

        if report.stories.is_empty() && !report.failures.is_empty() {
            tracing::warn!(
                "All {} story fetches failed, keeping cached data",
                report.failures.len()
            );
            return None;
        }

        Some(CacheEntry {
            stories: Arc::new(report.stories),
            fetched_at: Instant::now(),
            refreshed_at: Utc::now(),
        })
    }
}
