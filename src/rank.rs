//! Similarity ranking.
//!
//! A story is represented by `"{title} {text}"` (missing parts are empty).
//! The query and every story representation are embedded in one provider
//! call, each story is scored by cosine similarity against the query, and
//! the stories are returned in descending score order. Ties keep their input
//! order.

use anyhow::{bail, Result};
use std::cmp::Ordering;

use crate::embedding::{cosine_similarity, EmbeddingProvider};
use crate::models::Story;

/// The text a story is embedded as.
pub fn story_text(story: &Story) -> String {
    format!(
        "{} {}",
        story.title.as_deref().unwrap_or(""),
        story.text.as_deref().unwrap_or("")
    )
}

/// Score every document vector against `query` and return `(index, score)`
/// pairs, best first.
///
/// The sort is stable, so equal scores keep input order. NaN scores compare
/// equal to everything.
pub fn similarity_order(query: &[f32], docs: &[Vec<f32>]) -> Vec<(usize, f32)> {
    let mut scored: Vec<(usize, f32)> = docs
        .iter()
        .enumerate()
        .map(|(i, doc)| (i, cosine_similarity(query, doc)))
        .collect();

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    scored
}

/// Rank `stories` by similarity to `query`.
///
/// Returns a permutation of `stories`. An empty query or an empty batch
/// yields an empty result without calling the provider.
pub async fn rank_stories(
    provider: &dyn EmbeddingProvider,
    query: &str,
    stories: &[Story],
) -> Result<Vec<Story>> {
    if query.is_empty() || stories.is_empty() {
        return Ok(Vec::new());
    }

    let mut texts = Vec::with_capacity(stories.len() + 1);
    texts.push(query.to_string());
    texts.extend(stories.iter().map(story_text));

    let mut vectors = provider.embed(&texts).await?;
    if vectors.len() != texts.len() {
        bail!(
            "Embedding provider {} returned {} vectors for {} texts",
            provider.model_name(),
            vectors.len(),
            texts.len()
        );
    }

    let docs = vectors.split_off(1);
    let query_vec = &vectors[0];

    let order = similarity_order(query_vec, &docs);
    if let Some((best, score)) = order.first() {
        tracing::debug!(
            "Ranked {} stories, best {} (score {:.3})",
            stories.len(),
            stories[*best].id,
            score
        );
    }

    Ok(order
        .into_iter()
        .map(|(index, _)| stories[index].clone())
        .collect())
}
