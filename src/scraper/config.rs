use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the Moltbook scraper
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Site root, the home feed lives here (default: https://www.moltbook.com)
    pub base_url: String,

    /// Try the headless browser tier before plain HTTP (default: true)
    pub use_browser: bool,

    /// Whether to run the browser in headless mode (default: true)
    pub headless: bool,

    /// Navigation timeout in seconds (default: 25)
    pub nav_timeout_secs: u64,

    /// Wait after navigation for the SPA to render, in milliseconds (default: 6000)
    pub wait_after_nav_ms: u64,

    /// How long to wait for the first post link to appear, in seconds (default: 20)
    pub selector_timeout_secs: u64,

    /// Wait after clicking the Top tab, in milliseconds (default: 2500)
    pub wait_after_top_click_ms: u64,

    /// Delay between page visits, in milliseconds (default: 1500)
    pub request_delay_ms: u64,

    /// Timeout for the plain HTTP fallback, in seconds (default: 15)
    pub http_timeout_secs: u64,

    /// Also visit `/m` and collect the board list (default: true)
    pub crawl_submolts: bool,

    /// CSS selectors for post links, tried in order
    pub post_link_selectors: Vec<String>,

    /// Maximum rows read from embedded page data (default: 50)
    pub max_embedded_posts: usize,

    /// Maximum placeholder posts from the regex tier (default: 30)
    pub max_regex_posts: usize,

    /// Whether to disable image loading in the browser (default: true)
    pub block_images: bool,

    /// User agent string to use
    pub user_agent: String,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.moltbook.com".to_string(),
            use_browser: true,
            headless: true,
            nav_timeout_secs: 25,
            wait_after_nav_ms: 6000,
            selector_timeout_secs: 20,
            wait_after_top_click_ms: 2500,
            request_delay_ms: 1500,
            http_timeout_secs: 15,
            crawl_submolts: true,
            post_link_selectors: vec![
                "a[href*=\"/post/\"]".to_string(),
                "a[href*=\"post/\"]".to_string(),
                "[href*=\"/post/\"]".to_string(),
            ],
            max_embedded_posts: 50,
            max_regex_posts: 30,
            block_images: true,
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
        }
    }
}

impl ScraperConfig {
    pub fn nav_timeout(&self) -> Duration {
        Duration::from_secs(self.nav_timeout_secs)
    }

    pub fn wait_after_nav(&self) -> Duration {
        Duration::from_millis(self.wait_after_nav_ms)
    }

    pub fn selector_timeout(&self) -> Duration {
        Duration::from_secs(self.selector_timeout_secs)
    }

    pub fn wait_after_top_click(&self) -> Duration {
        Duration::from_millis(self.wait_after_top_click_ms)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Base URL without a trailing slash
    pub fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    pub fn submolts_url(&self) -> String {
        format!("{}/m", self.base())
    }

    pub fn post_url(&self, id: &str) -> String {
        format!("{}/post/{}", self.base(), id)
    }
}
