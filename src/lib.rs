//! # moltpulse
//!
//! Daily trend reports for the Moltbook agent forum.
//!
//! ## Architecture
//!
//! ```text
//! Crawler → Analyzer → Report → Store → HTTP API
//! ```
//!
//! - [`scraper`]: tiered post extraction (headless browser, then plain HTTP)
//! - [`analyzer`]: keyword topic clustering
//! - [`report`]: daily report assembly with a canned fallback
//! - [`store`]: Redis or in-memory persistence with history pruning
//! - [`server`]: axum JSON API
//!
//! ## Quick Start
//!
//! ```bash
//! # Serve the API on :3001, crawling once a day
//! moltpulse serve
//!
//! # One-off crawl, printing the topics found
//! moltpulse crawl
//!
//! # Crawl and store today's report
//! moltpulse crawl --save
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together the store,
/// crawler and report service.
pub mod app;

/// Keyword topic clustering over crawled posts.
pub mod analyzer;

/// Command-line interface using clap.
///
/// - `serve [--port N] [--crawl-every 1d] [--crawl-now]` - Run the API
/// - `crawl [--save]` - Crawl once
/// - `mock` - Print the fallback report
pub mod cli;

/// Configuration loaded from `~/.config/moltpulse/config.toml`.
pub mod config;

/// In-process crawl scheduler.
pub mod daemon;

/// Core domain models.
///
/// - [`Post`](domain::Post) and [`Submolt`](domain::Submolt): what the crawler extracts
/// - [`Topic`](domain::Topic): a keyword cluster with a heat score
/// - [`DailyReport`](domain::DailyReport): the document served to the dashboard
pub mod domain;

/// Raw page fetching over HTTP.
pub mod fetcher;

/// Daily report assembly.
pub mod report;

/// Post extraction with a fallback cascade.
pub mod scraper;

/// axum HTTP API.
pub mod server;

/// Report lifecycle: crawl, store, history and trends.
pub mod service;

/// Key-value persistence (Redis or in-memory).
pub mod store;
