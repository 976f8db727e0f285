//! Core data models.
//!
//! [`RawItem`] is what the remote item store sends; [`Story`] is the
//! normalized record that flows through the cache, the ranker and every
//! presentation surface.

use serde::{Deserialize, Serialize};

/// An item exactly as returned by `item/{id}.json`. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawItem {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub by: Option<String>,
    #[serde(default)]
    pub score: Option<i64>,
    #[serde(default)]
    pub time: Option<i64>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub descendants: Option<i64>,
}

/// A normalized feed story.
///
/// `url` is never empty: stories without a link (Ask HN threads and the
/// like) point at their discussion page instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<i64>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descendants: Option<i64>,
}

impl Story {
    /// Normalize a raw item fetched for `id`.
    ///
    /// The requested id wins over whatever id the payload carries.
    pub fn from_raw(id: u64, raw: RawItem, discussion_url: &str) -> Self {
        let url = match raw.url {
            Some(u) if !u.trim().is_empty() => u,
            _ => discussion_link(discussion_url, id),
        };

        Self {
            id,
            title: raw.title,
            text: raw.text,
            url,
            by: raw.by,
            score: raw.score,
            time: raw.time,
            kind: raw.kind,
            descendants: raw.descendants,
        }
    }

    /// Title for display, falling back to a placeholder.
    pub fn display_title(&self) -> &str {
        match self.title.as_deref() {
            Some(t) if !t.trim().is_empty() => t,
            _ => "No Title",
        }
    }
}

/// Canonical discussion page for an item id.
pub fn discussion_link(prefix: &str, id: u64) -> String {
    format!("{}{}", prefix, id)
}
