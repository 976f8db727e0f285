//! Command implementations for the `hnr` binary.
//!
//! Each `run_*` function prints user-facing output to stdout; diagnostics go
//! through `tracing` to stderr.

use anyhow::{bail, Context, Result};
use std::io::{BufRead, Write};
use std::time::Duration;

use crate::bio::validate_bio;
use crate::config::Config;
use crate::models::Story;
use crate::service::{story_cache_from_config, RankError, StoryRanker};

/// Render stories as a Markdown link list, or the empty-result notice.
pub fn format_story_list(heading: &str, stories: &[Story], limit: Option<usize>) -> String {
    if stories.is_empty() {
        return "No stories found.\n".to_string();
    }

    let shown = limit.unwrap_or(stories.len()).min(stories.len());
    let mut out = format!("{}\n", heading);
    for story in &stories[..shown] {
        out.push_str(&format!("- [{}]({})\n", story.display_title(), story.url));
    }
    if shown < stories.len() {
        out.push_str(&format!("... {} more\n", stories.len() - shown));
    }
    out
}

/// Read a bio from stdin.
///
/// On a terminal the user is prompted and the bio ends at the first empty
/// line; piped input is read to EOF.
fn read_bio_from_stdin() -> Result<String> {
    let stdin = std::io::stdin();

    if atty::is(atty::Stream::Stdin) {
        println!("Enter your bio (finish with an empty line):");
        std::io::stdout().flush()?;
        let mut lines = Vec::new();
        for line in stdin.lock().lines() {
            let line = line?;
            if line.trim().is_empty() {
                break;
            }
            lines.push(line);
        }
        Ok(lines.join("\n"))
    } else {
        let mut bio = String::new();
        for line in stdin.lock().lines() {
            if !bio.is_empty() {
                bio.push('\n');
            }
            bio.push_str(&line?);
        }
        Ok(bio)
    }
}

/// `hnr rank [BIO]`: rank the top stories against a bio.
pub async fn run_rank(cfg: &Config, bio: Option<String>, limit: Option<usize>) -> Result<()> {
    let bio = match bio {
        Some(bio) => bio,
        None => read_bio_from_stdin()?,
    };

    // Reject bad input before touching the network or loading a model.
    validate_bio(&bio)?;

    let ranker = StoryRanker::from_config(cfg)?;
    match ranker.ranked_for_bio(&bio).await {
        Ok(ranked) => {
            print!("{}", format_story_list("Ranked Stories:", &ranked, limit));
            Ok(())
        }
        Err(RankError::InvalidBio(e)) => Err(e.into()),
        Err(RankError::Embedding(e)) => Err(e.context("Ranking failed")),
    }
}

/// `hnr stories`: print the current top stories in feed order.
pub async fn run_stories(cfg: &Config, limit: Option<usize>) -> Result<()> {
    let cache = story_cache_from_config(cfg)?;
    let stories = cache.get_fresh().await;
    print!("{}", format_story_list("Top Stories:", &stories, limit));
    Ok(())
}

/// `hnr client [BIO]`: ask a running server to rank, and print its answer.
pub async fn run_client(server: &str, bio: Option<String>, limit: Option<usize>) -> Result<()> {
    let bio = match bio {
        Some(bio) => bio,
        None => read_bio_from_stdin()?,
    };

    if bio.is_empty() {
        bail!("Please enter a bio.");
    }

    let url = format!("{}/ranked_stories", server.trim_end_matches('/'));
    // The first request after a restart pays for fetching every story.
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(300))
        .build()?;

    let response = client
        .post(&url)
        .json(&serde_json::json!({ "bio": bio }))
        .send()
        .await
        .with_context(|| format!("Failed to reach ranking server at {}", url))?;

    let status = response.status();
    if status.is_success() {
        let ranked: Vec<Story> = response
            .json()
            .await
            .context("Malformed response from ranking server")?;
        print!("{}", format_story_list("Ranked Stories:", &ranked, limit));
        return Ok(());
    }

    let body: serde_json::Value = response.json().await.unwrap_or_default();
    match body.get("error").and_then(|e| e.as_str()) {
        Some(message) => bail!("{}", message),
        None => bail!("Ranking server returned {}", status),
    }
}
