//! Bounded-concurrency fetch of the top stories.
//!
//! Every id is fetched independently; at most `concurrency` requests are in
//! flight at once. A failing id is logged and dropped without touching the
//! rest of the batch, and surviving stories come back in input id order.

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::config::SourceConfig;
use crate::models::Story;
use crate::source::ItemSource;

/// Why a single id did not make it into the batch.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchFailure {
    pub id: u64,
    pub reason: String,
}

/// Result of fetching one id.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Fetched(Story),
    Failed(FetchFailure),
}

/// Aggregated result of a batch: the stories that made it, in input order,
/// and the ids that did not.
#[derive(Debug, Clone, Default)]
pub struct FetchReport {
    pub stories: Vec<Story>,
    pub failures: Vec<FetchFailure>,
}

impl FetchReport {
    /// Number of ids attempted.
    pub fn attempted(&self) -> usize {
        self.stories.len() + self.failures.len()
    }
}

/// Fetch and normalize one item.
pub async fn fetch_one(source: &dyn ItemSource, id: u64, discussion_url: &str) -> FetchOutcome {
    match source.item(id).await {
        Ok(Some(raw)) => FetchOutcome::Fetched(Story::from_raw(id, raw, discussion_url)),
        Ok(None) => FetchOutcome::Failed(FetchFailure {
            id,
            reason: "item not found".to_string(),
        }),
        Err(e) => FetchOutcome::Failed(FetchFailure {
            id,
            reason: format!("{:#}", e),
        }),
    }
}

/// Resolve `ids` into stories with at most `concurrency` requests in flight.
///
/// Waits for every dispatched fetch; there is no early cancellation. A
/// `concurrency` of zero is treated as one.
pub async fn fetch_batch(
    source: Arc<dyn ItemSource>,
    ids: &[u64],
    concurrency: usize,
    discussion_url: &str,
) -> FetchReport {
    let permits = Arc::new(Semaphore::new(concurrency.max(1)));
    let discussion_url: Arc<str> = Arc::from(discussion_url);
    let mut tasks = JoinSet::new();

    for (index, &id) in ids.iter().enumerate() {
        let source = source.clone();
        let permits = permits.clone();
        let discussion_url = discussion_url.clone();
        tasks.spawn(async move {
            let outcome = match permits.acquire_owned().await {
                Ok(_permit) => fetch_one(source.as_ref(), id, &discussion_url).await,
                Err(e) => FetchOutcome::Failed(FetchFailure {
                    id,
                    reason: format!("worker pool closed: {}", e),
                }),
            };
            (index, outcome)
        });
    }

    let mut outcomes: Vec<(usize, FetchOutcome)> = Vec::with_capacity(ids.len());
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(pair) => outcomes.push(pair),
            Err(e) => tracing::error!("Fetch task panicked: {}", e),
        }
    }
    outcomes.sort_by_key(|(index, _)| *index);

    let mut report = FetchReport::default();
    for (_, outcome) in outcomes {
        match outcome {
            FetchOutcome::Fetched(story) => report.stories.push(story),
            FetchOutcome::Failed(failure) => {
                tracing::warn!("Error fetching story {}: {}", failure.id, failure.reason);
                report.failures.push(failure);
            }
        }
    }

    report
}

/// List the top ids, keep the first `top_n`, and fetch them.
///
/// A failure of the id list itself is returned as an error and not retried.
pub async fn fetch_top_stories(
    source: Arc<dyn ItemSource>,
    config: &SourceConfig,
) -> Result<FetchReport> {
    let mut ids = source
        .top_ids()
        .await
        .context("Failed to fetch top story ids")?;
    ids.truncate(config.top_n);

    tracing::info!(
        "Fetching {} stories ({} concurrent)",
        ids.len(),
        config.concurrency
    );

    let report = fetch_batch(source, &ids, config.concurrency, &config.discussion_url).await;

    tracing::info!(
        "Fetched {} of {} stories ({} failed)",
        report.stories.len(),
        report.attempted(),
        report.failures.len()
    );

    Ok(report)
}
