//! # hn-ranker
//!
//! Ranks the current Hacker News top stories by semantic similarity to a
//! user-supplied bio.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌─────────────┐
//! │  Item store  │──▶│ Fetch (10 ∥) │──▶│ StoryCache  │
//! │ top + items  │   │  order-kept  │   │  TTL 1h     │
//! └──────────────┘   └──────────────┘   └──────┬──────┘
//!                                              ▼
//!                    ┌──────────────┐   ┌─────────────┐
//!                    │  Embeddings  │──▶│   Ranker    │
//!                    │ local/remote │   │   cosine    │
//!                    └──────────────┘   └──────┬──────┘
//!                              ┌───────────────┼──────────────┐
//!                              ▼               ▼              ▼
//!                        ┌──────────┐   ┌────────────┐  ┌──────────┐
//!                        │ JSON API │   │ HTML form  │  │   CLI    │
//!                        └──────────┘   └────────────┘  └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! hnr rank "I write compilers in Rust"   # one-shot ranking
//! hnr serve                              # JSON API + form on 127.0.0.1:5000
//! hnr client "distributed systems"       # ask a running server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Raw items and normalized stories |
//! | [`source`] | Remote item store client |
//! | [`fetch`] | Bounded-concurrency batch fetch |
//! | [`cache`] | Time-bounded story cache |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`rank`] | Cosine-similarity ranking |
//! | [`bio`] | Bio validation |
//! | [`service`] | Validate → cache → rank pipeline |
//! | [`server`] | HTTP server |
//! | [`form`] | HTML form rendering |
//! | [`commands`] | CLI command implementations |

pub mod bio;
pub mod cache;
pub mod commands;
pub mod config;
pub mod embedding;
pub mod fetch;
pub mod form;
pub mod models;
pub mod rank;
pub mod server;
pub mod service;
pub mod source;
