//! Plain HTTP tier.
//!
//! Fetches the home page without rendering it and tries, in order, the
//! embedded `__NEXT_DATA__` payload, a DOM query over post links, and a bare
//! regex scan for post ids.

use std::collections::HashSet;
use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use tracing::{debug, info};

use crate::app::{PulseError, Result};
use crate::domain::{ExtractionTier, Post, Submolt};
use crate::fetcher::Fetcher;
use crate::scraper::config::ScraperConfig;
use crate::scraper::parse::{
    absolute_url, cards_to_posts, extract_post_id, find_post_ids, truncate_chars, RawPostCard,
    MAX_CARD_TEXT_CHARS, MAX_TITLE_CHARS,
};
use crate::scraper::{Harvest, PostSource};

static NEXT_DATA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<script\s+id="__NEXT_DATA__"\s+type="application/json">(.*?)</script>"#)
        .unwrap()
});
static SUBMOLT_MEMBERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)(?:^|[^a-z0-9_.])m/([a-z0-9_]+).*?(\d+)\s*members?").unwrap()
});
static SUBMOLT_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)href="[^"]*/m/([a-z0-9_]+)[^"]*""#).unwrap());
static POST_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"a[href*="/post/"]"#).unwrap());

const LIST_KEYS: [&str; 4] = ["posts", "feed", "listings", "initialPosts"];
const DOM_ANCESTOR_DEPTH: usize = 8;

pub struct HtmlScraper {
    config: ScraperConfig,
    fetcher: Arc<dyn Fetcher>,
}

impl HtmlScraper {
    pub fn new(config: ScraperConfig, fetcher: Arc<dyn Fetcher>) -> Self {
        Self { config, fetcher }
    }

    /// Run the three HTML strategies over an already fetched page
    pub fn extract(&self, html: &str) -> Result<Harvest> {
        let submolts = extract_submolts(html);

        if let Some(posts) = parse_next_data_posts(html, &self.config) {
            return Ok(self.found(ExtractionTier::NextData, posts, submolts));
        }

        let posts = extract_dom_posts(html, self.config.base());
        if !posts.is_empty() {
            return Ok(self.found(ExtractionTier::Dom, posts, submolts));
        }

        let posts = extract_regex_posts(html, &self.config);
        if posts.is_empty() {
            return Err(PulseError::Crawl("No post IDs in HTML".to_string()));
        }
        Ok(self.found(ExtractionTier::Regex, posts, submolts))
    }

    fn found(&self, tier: ExtractionTier, posts: Vec<Post>, submolts: Vec<Submolt>) -> Harvest {
        info!(
            "Fallback HTML ({}): {} posts, {} submolts",
            tier,
            posts.len(),
            submolts.len()
        );
        Harvest {
            posts,
            submolts,
            tier,
        }
    }
}

#[async_trait]
impl PostSource for HtmlScraper {
    fn name(&self) -> &'static str {
        "plain HTTP"
    }

    async fn harvest(&self) -> Result<Harvest> {
        let html = self.fetcher.fetch(self.config.base()).await?;
        debug!("Home page: {} bytes", html.len());
        self.extract(&html)
    }
}

fn string_field<'a>(row: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| row.get(*k))
        .find(|v| !v.is_null())
}

fn number_field(row: &Value, keys: &[&str]) -> u32 {
    keys.iter()
        .filter_map(|k| row.get(*k))
        .find_map(Value::as_u64)
        .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
        .unwrap_or(0)
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn row_to_post(row: &Value, config: &ScraperConfig) -> Option<Post> {
    let id = string_field(row, &["id", "postId", "uuid"])?.as_str()?.to_string();

    let title = string_field(row, &["title", "name"])
        .map(value_text)
        .unwrap_or_default();
    let title = match title.trim() {
        "" => "Post".to_string(),
        t => truncate_chars(t, MAX_TITLE_CHARS),
    };

    let author = match row.get("author") {
        Some(Value::Object(obj)) => obj.get("username").and_then(Value::as_str),
        Some(Value::String(s)) if !s.is_empty() => Some(s.as_str()),
        _ => None,
    };
    let author = author
        .map(|a| format!("u/{}", a))
        .unwrap_or_else(|| Post::UNKNOWN_AUTHOR.to_string());

    let submolt = match row.get("submolt") {
        Some(Value::Object(obj)) => obj.get("name").and_then(Value::as_str).map(String::from),
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    };

    Some(Post {
        url: config.post_url(&id),
        id,
        title,
        content: String::new(),
        author,
        votes: number_field(row, &["votes", "upvotes"]),
        comments: number_field(row, &["commentsCount", "comments"]),
        created_at: row
            .get("createdAt")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        submolt,
    })
}

/// Posts from the Next.js `__NEXT_DATA__` payload, `None` when absent or empty
pub fn parse_next_data_posts(html: &str, config: &ScraperConfig) -> Option<Vec<Post>> {
    let payload = NEXT_DATA.captures(html)?.get(1)?.as_str();
    let data: Value = match serde_json::from_str(payload) {
        Ok(data) => data,
        Err(e) => {
            debug!("__NEXT_DATA__ is not valid JSON: {}", e);
            return None;
        }
    };

    let props = data.get("props")?.get("pageProps")?;
    let rows = string_field(props, &LIST_KEYS)?.as_array()?;

    let posts: Vec<Post> = rows
        .iter()
        .take(config.max_embedded_posts)
        .filter_map(|row| row_to_post(row, config))
        .collect();

    (!posts.is_empty()).then_some(posts)
}

/// Posts from `a[href*="/post/"]` links and the text of their enclosing cards
pub fn extract_dom_posts(html: &str, base: &str) -> Vec<Post> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut cards = Vec::new();

    for link in document.select(&POST_LINK) {
        let href = link.value().attr("href").unwrap_or("");
        let Some(id) = extract_post_id(href) else {
            continue;
        };
        if !seen.insert(id.clone()) {
            continue;
        }

        let text = joined_text(link, " ");
        let title = match text.as_str() {
            "" => "Post".to_string(),
            t => truncate_chars(t, MAX_TITLE_CHARS),
        };

        let mut card_text = title.clone();
        let mut card_len = card_text.chars().count();
        for ancestor in link
            .ancestors()
            .filter_map(ElementRef::wrap)
            .take(DOM_ANCESTOR_DEPTH)
        {
            let text = joined_text(ancestor, "\n");
            let len = text.chars().count();
            if len > card_len && len < MAX_CARD_TEXT_CHARS {
                card_text = text;
                card_len = len;
            }
        }

        cards.push(RawPostCard {
            id,
            href: absolute_url(base, href),
            title,
            card_text,
        });
    }

    cards_to_posts(&cards, base)
}

// Sibling spans carry no whitespace between them, so keep each text node apart
fn joined_text(element: ElementRef<'_>, separator: &str) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}

/// Placeholder posts for every post id in the raw markup
pub fn extract_regex_posts(html: &str, config: &ScraperConfig) -> Vec<Post> {
    let mut seen = HashSet::new();
    find_post_ids(html)
        .into_iter()
        .filter(|id| seen.insert(id.to_lowercase()))
        .take(config.max_regex_posts)
        .map(|id| {
            let url = config.post_url(&id);
            Post::placeholder(&id, url)
        })
        .collect()
}

/// Boards mentioned in the markup, with member counts when the page shows them
pub fn extract_submolts(html: &str) -> Vec<Submolt> {
    let mut seen = HashSet::new();
    let mut boards = Vec::new();

    for caps in SUBMOLT_MEMBERS.captures_iter(html) {
        let name = format!("m/{}", &caps[1]);
        if !seen.insert(name.clone()) {
            continue;
        }
        boards.push(Submolt {
            name,
            description: String::new(),
            member_count: caps[2].parse().unwrap_or(0),
        });
    }
    if !boards.is_empty() {
        return boards;
    }

    for caps in SUBMOLT_LINK.captures_iter(html) {
        let name = format!("m/{}", &caps[1]);
        if seen.insert(name.clone()) {
            boards.push(Submolt {
                name,
                description: String::new(),
                member_count: 0,
            });
        }
    }
    boards
}
