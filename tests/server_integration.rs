//! Integration tests for the HTTP server.
//!
//! Each test starts a mock item store and the real server on free local
//! ports, then talks to the server over HTTP. Embeddings come from a
//! deterministic keyword counter so rankings are predictable.

use anyhow::Result;
use async_trait::async_trait;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use hn_ranker::cache::StoryCache;
use hn_ranker::config::{Config, SourceConfig};
use hn_ranker::embedding::EmbeddingProvider;
use hn_ranker::server::run_server_with_ranker;
use hn_ranker::service::StoryRanker;
use hn_ranker::source::HttpItemSource;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ─── Mock item store ────────────────────────────────────────────────

#[derive(Clone, Default)]
struct StoreHits {
    top: Arc<AtomicUsize>,
    items: Arc<AtomicUsize>,
    ids: Arc<Vec<u64>>,
}

async fn top_stories(State(hits): State<StoreHits>) -> Json<Value> {
    hits.top.fetch_add(1, Ordering::SeqCst);
    Json(json!(hits.ids.as_slice()))
}

async fn item(State(hits): State<StoreHits>, Path(file): Path<String>) -> Response {
    hits.items.fetch_add(1, Ordering::SeqCst);
    let id = file.trim_end_matches(".json");
    match id {
        "1" => Json(json!({ "id": 1, "type": "story", "title": "Rust guide" })).into_response(),
        "2" => Json(json!({
            "id": 2,
            "type": "story",
            "title": "Cooking",
            "url": "https://example.com/cooking"
        }))
        .into_response(),
        "3" => Json(json!({ "id": 3, "type": "story", "title": "Systems programming", "url": "" }))
            .into_response(),
        // Deleted item.
        "4" => Json(Value::Null).into_response(),
        // Hangs well past the client timeout.
        "6" => {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Json(json!({ "id": 6, "type": "story", "title": "Rust too late" })).into_response()
        }
        // Broken payload.
        _ => (StatusCode::OK, "{not json").into_response(),
    }
}

/// Serve the mock store on a free port and return its base URL.
async fn start_store() -> (String, StoreHits) {
    start_store_with(vec![1, 2, 3, 4, 5]).await
}

async fn start_store_with(ids: Vec<u64>) -> (String, StoreHits) {
    let hits = StoreHits {
        ids: Arc::new(ids),
        ..Default::default()
    };
    let app = Router::new()
        .route("/v0/topstories.json", get(top_stories))
        .route("/v0/item/{file}", get(item))
        .with_state(hits.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    (format!("http://{}/v0", addr), hits)
}

// ─── Test embedders ─────────────────────────────────────────────────

/// Counts vocabulary words.
struct KeywordEmbedder;

const VOCAB: [&str; 6] = ["rust", "systems", "programming", "cooking", "guide", "love"];

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    fn model_name(&self) -> &str {
        "keywords"
    }
    fn dims(&self) -> usize {
        VOCAB.len()
    }
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| {
                let lower = text.to_lowercase();
                let words: Vec<&str> = lower
                    .split(|c: char| !c.is_alphanumeric())
                    .filter(|w| !w.is_empty())
                    .collect();
                VOCAB
                    .iter()
                    .map(|v| words.iter().filter(|w| *w == v).count() as f32)
                    .collect()
            })
            .collect())
    }
}

struct BrokenEmbedder;

#[async_trait]
impl EmbeddingProvider for BrokenEmbedder {
    fn model_name(&self) -> &str {
        "broken"
    }
    fn dims(&self) -> usize {
        0
    }
    async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        anyhow::bail!("inference backend crashed")
    }
}

// ─── Server harness ─────────────────────────────────────────────────

fn find_free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

async fn wait_for_server(port: u16) {
    let client = reqwest::Client::new();
    let url = format!("http://127.0.0.1:{}/health", port);
    for _ in 0..50 {
        tokio::time::sleep(Duration::from_millis(100)).await;
        if let Ok(resp) = client.get(&url).send().await {
            if resp.status().is_success() {
                return;
            }
        }
    }
    panic!("Server did not become ready within 5 seconds");
}

/// Start the server against `store_url` and return its base URL.
async fn start_server(store_url: &str, embedder: Arc<dyn EmbeddingProvider>) -> String {
    let port = find_free_port();
    let mut config = Config::default();
    config.server.bind = format!("127.0.0.1:{}", port);
    config.source = SourceConfig {
        base_url: store_url.to_string(),
        timeout_secs: 2,
        ..Default::default()
    };

    let source = Arc::new(HttpItemSource::new(&config.source).unwrap());
    let cache = Arc::new(StoryCache::new(
        source,
        config.source.clone(),
        config.cache.ttl(),
    ));
    let ranker = Arc::new(StoryRanker::new(cache, embedder));

    tokio::spawn(async move {
        run_server_with_ranker(&config, ranker).await.ok();
    });
    wait_for_server(port).await;

    format!("http://127.0.0.1:{}", port)
}

fn ids(stories: &Value) -> Vec<u64> {
    stories
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_u64().unwrap())
        .collect()
}

// ─── Tests ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_ranked_stories_end_to_end() {
    let (store, _) = start_store().await;
    let server = start_server(&store, Arc::new(KeywordEmbedder)).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/ranked_stories", server))
        .json(&json!({ "bio": "I love systems programming and Rust" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    // 4 is deleted and 5 is malformed; both are dropped.
    assert_eq!(ids(&body), vec![3, 1, 2]);

    for story in body.as_array().unwrap() {
        assert!(!story["url"].as_str().unwrap().is_empty());
    }
    assert_eq!(body[0]["url"], "https://news.ycombinator.com/item?id=3");
    assert_eq!(body[2]["url"], "https://example.com/cooking");
    assert_eq!(body[0]["type"], "story");
}

#[tokio::test]
async fn test_second_request_is_served_from_cache() {
    let (store, hits) = start_store().await;
    let server = start_server(&store, Arc::new(KeywordEmbedder)).await;
    let client = reqwest::Client::new();

    for bio in ["rust", "cooking guide"] {
        let resp = client
            .post(format!("{}/ranked_stories", server))
            .json(&json!({ "bio": bio }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }

    assert_eq!(hits.top.load(Ordering::SeqCst), 1);
    assert_eq!(hits.items.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn test_invalid_bio_is_400() {
    let (store, hits) = start_store().await;
    let server = start_server(&store, Arc::new(KeywordEmbedder)).await;
    let client = reqwest::Client::new();

    for body in [json!({ "bio": "!!!" }), json!({ "bio": "   " }), json!({})] {
        let resp = client
            .post(format!("{}/ranked_stories", server))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400, "body {} should be rejected", body);
        let err: Value = resp.json().await.unwrap();
        assert!(err["error"].as_str().unwrap().contains("User bio"));
    }

    // Nothing was fetched for invalid input.
    assert_eq!(hits.top.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_malformed_body_is_400() {
    let (store, _) = start_store().await;
    let server = start_server(&store, Arc::new(KeywordEmbedder)).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/ranked_stories", server))
        .header("Content-Type", "application/json")
        .body("{\"bio\": ")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let err: Value = resp.json().await.unwrap();
    assert!(err["error"].is_string());
}

#[tokio::test]
async fn test_embedding_failure_is_500() {
    let (store, _) = start_store().await;
    let server = start_server(&store, Arc::new(BrokenEmbedder)).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/ranked_stories", server))
        .json(&json!({ "bio": "rust" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);
    let err: Value = resp.json().await.unwrap();
    assert!(err["error"]
        .as_str()
        .unwrap()
        .contains("inference backend crashed"));
}

#[tokio::test]
async fn test_unreachable_store_degrades_to_empty() {
    let store = format!("http://127.0.0.1:{}/v0", find_free_port());
    let server = start_server(&store, Arc::new(KeywordEmbedder)).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/ranked_stories", server))
        .json(&json!({ "bio": "rust" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_hung_item_is_dropped_and_batch_survives() {
    let (store, hits) = start_store_with(vec![1, 6, 2, 3]).await;
    let server = start_server(&store, Arc::new(KeywordEmbedder)).await;

    let started = std::time::Instant::now();
    let resp = reqwest::Client::new()
        .post(format!("{}/ranked_stories", server))
        .json(&json!({ "bio": "I love systems programming and Rust" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(ids(&body), vec![3, 1, 2]);
    assert_eq!(hits.items.load(Ordering::SeqCst), 4);
    // The source times out after 2 s instead of waiting for the hung item.
    assert!(started.elapsed() < Duration::from_secs(20));
}

#[tokio::test]
async fn test_stories_and_health() {
    let (store, _) = start_store().await;
    let server = start_server(&store, Arc::new(KeywordEmbedder)).await;
    let client = reqwest::Client::new();

    let health: Value = client
        .get(format!("{}/health", server))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["model"], "keywords");
    assert_eq!(health["stories"], 0);
    assert_eq!(health["fresh"], false);

    let stories: Value = client
        .get(format!("{}/stories", server))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(ids(&stories), vec![1, 2, 3]);

    let health: Value = client
        .get(format!("{}/health", server))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["stories"], 3);
    assert_eq!(health["fresh"], true);
    assert!(health["refreshed_at"].is_string());
}

#[tokio::test]
async fn test_form_page_and_submission() {
    let (store, _) = start_store().await;
    let server = start_server(&store, Arc::new(KeywordEmbedder)).await;
    let client = reqwest::Client::new();

    let page = client
        .get(format!("{}/", server))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("Hacker News Story Ranker"));
    assert!(page.contains("<textarea"));

    let resp = client
        .post(format!("{}/", server))
        .form(&[("bio", "I love systems programming and Rust")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let page = resp.text().await.unwrap();
    assert!(page.contains("Ranked Stories:"));
    let systems = page.find("Systems programming").unwrap();
    let cooking = page.find("Cooking</a>").unwrap();
    assert!(systems < cooking);

    let resp = client
        .post(format!("{}/", server))
        .form(&[("bio", "!!!")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let page = resp.text().await.unwrap();
    assert!(page.contains("class=\"error\""));
    assert!(page.contains("at least one alphanumeric character"));
}
