use std::time::Instant;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::app::{PulseError, Result};
use crate::domain::{ExtractionTier, Submolt};
use crate::scraper::config::ScraperConfig;
use crate::scraper::extractor::PageScripts;
use crate::scraper::parse::{cards_to_posts, dedupe_by_id, merge_cards, RawPostCard};
use crate::scraper::{Harvest, PostSource};

const SCROLL_SETTLE_MS: u64 = 2000;
const TOP_TAB_EXTRA_MS: u64 = 500;
const SELECTOR_POLL_MS: u64 = 250;

/// Chrome-based tier: renders the SPA and reads post cards from the live DOM
pub struct ChromeScraper {
    config: ScraperConfig,
}

/// A launched browser and the task driving its CDP connection
struct Session {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl Session {
    async fn launch(config: &ScraperConfig) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .arg("--no-sandbox")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-software-rasterizer")
            .window_size(1280, 800)
            .request_timeout(config.nav_timeout());

        if config.block_images {
            builder = builder.arg("--blink-settings=imagesEnabled=false");
        }

        if !config.headless {
            builder = builder.with_head();
        }

        let browser_config = builder
            .build()
            .map_err(|e| PulseError::Browser(format!("Failed to build browser config: {}", e)))?;

        let (browser, mut handler) = Browser::launch(browser_config).await.map_err(|e| {
            PulseError::Browser(format!(
                "Failed to launch browser: {}. Is Chrome or Chromium installed and in PATH?",
                e
            ))
        })?;

        // Spawn the browser handler
        let handler = tokio::spawn(async move {
            while let Some(_event) = handler.next().await {
                // Handle browser events
            }
        });

        Ok(Self { browser, handler })
    }

    async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            debug!("Browser close failed: {}", e);
        }
        self.handler.abort();
    }
}

impl ChromeScraper {
    pub fn new(config: ScraperConfig) -> Self {
        Self { config }
    }

    async fn evaluate<T: DeserializeOwned>(page: &Page, script: String) -> Result<T> {
        page.evaluate(script)
            .await
            .map_err(|e| PulseError::Browser(format!("Script execution failed: {}", e)))?
            .into_value()
            .map_err(|e| PulseError::Browser(format!("Failed to parse result: {:?}", e)))
    }

    /// Poll for `selector` until it appears or the timeout elapses
    async fn wait_for_selector(&self, page: &Page, selector: &str) -> bool {
        let deadline = Instant::now() + self.config.selector_timeout();
        loop {
            if page.find_element(selector).await.is_ok() {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(std::time::Duration::from_millis(SELECTOR_POLL_MS)).await;
        }
    }

    /// Cards for every configured post-link selector, deduplicated by id
    async fn extract_cards(&self, page: &Page) -> Result<Vec<RawPostCard>> {
        let mut cards = Vec::new();
        for selector in &self.config.post_link_selectors {
            let script = PageScripts::post_cards(selector, self.config.base());
            let batch: Vec<RawPostCard> = Self::evaluate(page, script).await?;
            cards.extend(batch);
        }
        Ok(dedupe_by_id(cards, |c| c.id.clone()))
    }

    async fn click_top_tab(&self, page: &Page) -> bool {
        let clicked: bool = Self::evaluate(page, PageScripts::click_top_tab())
            .await
            .unwrap_or(false);
        if clicked {
            tokio::time::sleep(self.config.wait_after_top_click()).await;
        }
        clicked
    }

    async fn crawl_submolts(&self, page: &Page) -> Result<Vec<Submolt>> {
        page.goto(self.config.submolts_url())
            .await
            .map_err(|e| PulseError::Browser(format!("Navigation to submolts failed: {}", e)))?;
        tokio::time::sleep(self.config.request_delay()).await;

        Self::evaluate(page, PageScripts::submolts()).await
    }

    async fn crawl_page(&self, page: &Page) -> Result<Harvest> {
        page.set_user_agent(&self.config.user_agent)
            .await
            .map_err(|e| PulseError::Browser(format!("Failed to set user agent: {}", e)))?;

        page.goto(self.config.base())
            .await
            .map_err(|e| PulseError::Browser(format!("Navigation failed: {}", e)))?;

        // Additional wait for the SPA to render
        tokio::time::sleep(self.config.wait_after_nav()).await;

        let first_selector = self
            .config
            .post_link_selectors
            .first()
            .map(String::as_str)
            .unwrap_or("a[href*=\"/post/\"]");

        if !self.wait_for_selector(page, first_selector).await {
            debug!("No post link yet, scrolling to trigger lazy loading");
            let _: serde_json::Value = Self::evaluate(page, PageScripts::scroll_to_bottom())
                .await
                .unwrap_or_default();
            tokio::time::sleep(std::time::Duration::from_millis(SCROLL_SETTLE_MS)).await;
        }

        let new_cards = self.extract_cards(page).await?;
        info!("Home feed: {} raw cards", new_cards.len());

        let mut top_cards = Vec::new();
        if self.click_top_tab(page).await {
            tokio::time::sleep(std::time::Duration::from_millis(TOP_TAB_EXTRA_MS)).await;
            top_cards = self.extract_cards(page).await?;
            info!("Top feed: {} raw cards", top_cards.len());
        }

        let merged = merge_cards(vec![new_cards, top_cards]);
        let posts = cards_to_posts(&merged, self.config.base());

        if posts.is_empty() {
            return Err(PulseError::Crawl("No posts found after crawl".to_string()));
        }
        info!("Merged & filtered: {} posts", posts.len());

        let mut submolts = Vec::new();
        if self.config.crawl_submolts {
            tokio::time::sleep(self.config.request_delay()).await;
            match self.crawl_submolts(page).await {
                Ok(boards) => {
                    if !boards.is_empty() {
                        info!("Submolts: {} boards", boards.len());
                    }
                    submolts = boards;
                }
                Err(e) => warn!("Submolts crawl failed: {}", e),
            }
        }

        Ok(Harvest {
            posts,
            submolts,
            tier: ExtractionTier::Browser,
        })
    }
}

#[async_trait]
impl PostSource for ChromeScraper {
    fn name(&self) -> &'static str {
        "headless browser"
    }

    async fn harvest(&self) -> Result<Harvest> {
        let started = Instant::now();
        let session = Session::launch(&self.config).await?;

        let result = match session.browser.new_page("about:blank").await {
            Ok(page) => {
                let result = self.crawl_page(&page).await;
                let _ = page.close().await;
                result
            }
            Err(e) => Err(PulseError::Browser(format!("Failed to create page: {}", e))),
        };

        session.close().await;
        debug!("Browser crawl finished in {:?}", started.elapsed());
        result
    }
}
