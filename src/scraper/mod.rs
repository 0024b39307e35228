//! Post extraction for the Moltbook home feed.
//!
//! The site is a client-rendered SPA with no stable markup, so extraction is a
//! cascade of increasingly blunt strategies:
//!
//! ```text
//! headless browser → __NEXT_DATA__ JSON → DOM query → regex over raw HTML
//! ```
//!
//! Each tier implements [`PostSource`]; [`Crawler`] walks them in order and
//! keeps the first one that yields posts.
//!
//! # Usage
//!
//! ```rust,ignore
//! use moltpulse::scraper::{Crawler, ScraperConfig};
//!
//! let crawler = Crawler::from_config(ScraperConfig::default())?;
//! let outcome = crawler.crawl().await?;
//! println!("{} posts via {}", outcome.posts.len(), outcome.tier);
//! ```

mod chrome;
mod config;
mod extractor;
pub mod html;
pub mod parse;

pub use chrome::ChromeScraper;
pub use config::ScraperConfig;
pub use extractor::PageScripts;
pub use html::HtmlScraper;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::analyzer;
use crate::app::{PulseError, Result};
use crate::domain::{ExtractionTier, Post, Submolt, Topic};
use crate::fetcher::HttpFetcher;

/// What one extraction tier found
#[derive(Debug, Clone)]
pub struct Harvest {
    pub posts: Vec<Post>,
    pub submolts: Vec<Submolt>,
    pub tier: ExtractionTier,
}

/// A successful crawl: posts, boards and the topics derived from them
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub posts: Vec<Post>,
    pub submolts: Vec<Submolt>,
    pub topics: Vec<Topic>,
    pub tier: ExtractionTier,
}

/// One strategy for getting posts off the site
#[async_trait]
pub trait PostSource: Send + Sync {
    /// Human-readable name used in logs
    fn name(&self) -> &'static str;

    async fn harvest(&self) -> Result<Harvest>;
}

/// Ordered fallback over extraction tiers
pub struct Crawler {
    sources: Vec<Box<dyn PostSource>>,
    base_url: String,
}

impl Crawler {
    pub fn new(sources: Vec<Box<dyn PostSource>>, base_url: impl Into<String>) -> Self {
        Self {
            sources,
            base_url: base_url.into(),
        }
    }

    /// Browser tier (when enabled) followed by the plain HTTP tier
    pub fn from_config(config: ScraperConfig) -> Result<Self> {
        let fetcher = Arc::new(HttpFetcher::new(
            &config.user_agent,
            config.http_timeout(),
        )?);

        let mut sources: Vec<Box<dyn PostSource>> = Vec::new();
        if config.use_browser {
            sources.push(Box::new(ChromeScraper::new(config.clone())));
        } else {
            info!("Browser tier disabled, using HTML fallback only");
        }
        let base_url = config.base().to_string();
        sources.push(Box::new(HtmlScraper::new(config, fetcher)));

        Ok(Self::new(sources, base_url))
    }

    /// Names of the configured tiers, in the order they are tried
    pub fn tiers(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    pub async fn crawl(&self) -> Result<CrawlOutcome> {
        let mut last_error = PulseError::Crawl("No extraction tiers configured".to_string());

        for source in &self.sources {
            match source.harvest().await {
                Ok(harvest) if !harvest.posts.is_empty() => {
                    let topics = analyzer::analyze(&harvest.posts, &self.base_url);
                    info!(
                        "Crawl via {}: {} posts, {} topics",
                        source.name(),
                        harvest.posts.len(),
                        topics.len()
                    );
                    return Ok(CrawlOutcome {
                        posts: harvest.posts,
                        submolts: harvest.submolts,
                        topics,
                        tier: harvest.tier,
                    });
                }
                Ok(_) => {
                    warn!("{} returned no posts, trying next tier", source.name());
                    last_error = PulseError::Crawl(format!("{} returned no posts", source.name()));
                }
                Err(e) => {
                    warn!("{} failed: {}", source.name(), e);
                    last_error = e;
                }
            }
        }

        Err(match last_error {
            PulseError::Crawl(msg) => PulseError::Crawl(msg),
            other => PulseError::Crawl(other.to_string()),
        })
    }
}
