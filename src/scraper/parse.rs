//! Text heuristics shared by every extraction tier.
//!
//! Post cards on the site carry no stable markup, so author, board and
//! counters are recovered from the card's visible text.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::domain::Post;

static POST_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)/post/([a-f0-9-]{36})").unwrap());
static AUTHOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"u/([A-Za-z0-9_]+)").unwrap());
static SUBMOLT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"m/([A-Za-z0-9_]+)").unwrap());
static VOTES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*(?:⬆|upvote|vote)").unwrap());
static BARE_NUMBER_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(\d+)\s*$").unwrap());
static COMMENTS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*comment").unwrap());
static COMMENT_ICON: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"💬\s*(\d+)").unwrap());
static WALLET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)0x[a-f0-9]{40}").unwrap());
static SEND_CRYPTO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)send\s+(?:eth|btc|usdt|token)").unwrap());
static SCAM_PHRASES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)airdrop|double your crypto|guaranteed returns").unwrap()
});

pub const MAX_TITLE_CHARS: usize = 300;
pub const MAX_CARD_TEXT_CHARS: usize = 4000;

const MIN_EMOJI_RUN: usize = 10;
const MIN_WORD_REPEAT: usize = 9;

/// A post link and the text of the card around it, before interpretation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPostCard {
    pub id: String,
    pub href: String,
    pub title: String,
    pub card_text: String,
}

/// Pull the post UUID out of a `/post/<uuid>` link
pub fn extract_post_id(href: &str) -> Option<String> {
    POST_ID
        .captures(href)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Every post UUID mentioned anywhere in `text`, in order of appearance
pub fn find_post_ids(text: &str) -> Vec<String> {
    POST_ID
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Resolve a link found on a page against the site root
pub fn absolute_url(base: &str, href: &str) -> String {
    if let Ok(resolved) = Url::parse(base).and_then(|b| b.join(href)) {
        return resolved.to_string();
    }

    if href.starts_with("http") {
        href.to_string()
    } else {
        format!("{}/{}", base.trim_end_matches('/'), href.trim_start_matches('/'))
    }
}

pub fn parse_author(card_text: &str) -> String {
    AUTHOR
        .captures(card_text)
        .and_then(|caps| caps.get(1))
        .map(|m| format!("u/{}", m.as_str()))
        .unwrap_or_else(|| Post::UNKNOWN_AUTHOR.to_string())
}

pub fn parse_submolt(card_text: &str) -> Option<String> {
    SUBMOLT
        .captures(card_text)
        .and_then(|caps| caps.get(1))
        .map(|m| format!("m/{}", m.as_str()))
}

fn first_number(patterns: &[&Regex], text: &str) -> u32 {
    patterns
        .iter()
        .find_map(|re| re.captures(text))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

/// Upvote and comment counters from a card's text, 0 when absent
pub fn parse_votes_and_comments(card_text: &str) -> (u32, u32) {
    let votes = first_number(&[&VOTES, &BARE_NUMBER_LINE], card_text);
    let comments = first_number(&[&COMMENTS, &COMMENT_ICON], card_text);
    (votes, comments)
}

/// Truncate to at most `max` characters without splitting a code point
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

fn is_emoji(c: char) -> bool {
    ('\u{1F300}'..='\u{1F9FF}').contains(&c)
}

fn is_emoji_wall(text: &str) -> bool {
    let mut count = 0;
    for c in text.chars().filter(|c| !c.is_whitespace()) {
        if !is_emoji(c) {
            return false;
        }
        count += 1;
    }
    count >= MIN_EMOJI_RUN
}

fn has_word_repeat(title: &str) -> bool {
    let mut run = 0;
    let mut previous: Option<String> = None;

    for word in title.split_whitespace() {
        let word = word.to_lowercase();
        let is_word = word.chars().all(|c| c.is_alphanumeric() || c == '_');

        if is_word && previous.as_deref() == Some(word.as_str()) {
            run += 1;
            if run >= MIN_WORD_REPEAT {
                return true;
            }
        } else {
            run = 1;
        }
        previous = is_word.then_some(word);
    }
    false
}

/// Hard spam filter: crypto solicitations and meaningless content
pub fn is_spam(post: &Post) -> bool {
    let text = post.searchable_text();

    if WALLET.is_match(&text) || SEND_CRYPTO.is_match(&text) || SCAM_PHRASES.is_match(&text) {
        return true;
    }

    if is_emoji_wall(&format!("{}{}", post.title, post.content)) {
        return true;
    }

    has_word_repeat(&post.title)
}

/// Interpret a raw card, without any spam filtering
pub fn card_to_post(card: &RawPostCard, base: &str) -> Post {
    let (votes, comments) = parse_votes_and_comments(&card.card_text);
    let url = if card.href.starts_with("http") {
        card.href.clone()
    } else {
        format!("{}/post/{}", base.trim_end_matches('/'), card.id)
    };
    let title = if card.title.trim().is_empty() {
        "Untitled".to_string()
    } else {
        card.title.clone()
    };

    Post {
        id: card.id.clone(),
        title,
        content: String::new(),
        author: parse_author(&card.card_text),
        votes,
        comments,
        created_at: String::new(),
        url,
        submolt: parse_submolt(&card.card_text),
    }
}

/// Convert cards to posts, dropping spam.
///
/// When every card is classified as spam the unfiltered set is returned, so a
/// misfiring filter cannot empty a crawl on its own.
pub fn cards_to_posts(cards: &[RawPostCard], base: &str) -> Vec<Post> {
    let all: Vec<Post> = cards.iter().map(|c| card_to_post(c, base)).collect();
    let filtered: Vec<Post> = all.iter().filter(|p| !is_spam(p)).cloned().collect();

    let posts = if filtered.is_empty() && !all.is_empty() {
        tracing::warn!("All posts filtered as spam, keeping low-confidence results");
        all
    } else {
        filtered
    };

    dedupe_by_id(posts, |p| p.id.clone())
}

/// Keep the first occurrence of every key, preserving order
pub fn dedupe_by_id<T, F>(items: Vec<T>, key: F) -> Vec<T>
where
    F: Fn(&T) -> String,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(key(item)))
        .collect()
}

/// Merge two card lists by id: order of first appearance, later lists win on conflict
pub fn merge_cards(lists: Vec<Vec<RawPostCard>>) -> Vec<RawPostCard> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut merged: Vec<RawPostCard> = Vec::new();

    for card in lists.into_iter().flatten() {
        match index.get(&card.id) {
            Some(&pos) => merged[pos] = card,
            None => {
                index.insert(card.id.clone(), merged.len());
                merged.push(card);
            }
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "dbddcf23-7314-4213-a5f2-f90600686685";

    fn card(id: &str, title: &str, text: &str) -> RawPostCard {
        RawPostCard {
            id: id.into(),
            href: format!("/post/{}", id),
            title: title.into(),
            card_text: text.into(),
        }
    }

    #[test]
    fn test_extract_post_id() {
        assert_eq!(
            extract_post_id(&format!("https://www.moltbook.com/post/{}", ID)),
            Some(ID.to_string())
        );
        assert_eq!(extract_post_id("/post/short-id"), None);
        assert_eq!(extract_post_id("/m/general"), None);
    }

    #[test]
    fn test_find_post_ids_in_order() {
        let html = format!(
            r#"<a href="/post/{}">a</a> <a href="/post/{}">b</a>"#,
            ID, "a1b2c3d4-5678-90ab-cdef-1234567890ab"
        );
        let ids = find_post_ids(&html);
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[0], ID);
    }

    #[test]
    fn test_absolute_url() {
        let base = "https://www.moltbook.com";
        assert_eq!(absolute_url(base, "/post/x"), "https://www.moltbook.com/post/x");
        assert_eq!(absolute_url(base, "post/x"), "https://www.moltbook.com/post/x");
        assert_eq!(absolute_url(base, "https://other.com/a"), "https://other.com/a");
    }

    #[test]
    fn test_parse_author_and_submolt() {
        let text = "Posted by u/Giuseppe in m/showandtell";
        assert_eq!(parse_author(text), "u/Giuseppe");
        assert_eq!(parse_submolt(text), Some("m/showandtell".into()));

        assert_eq!(parse_author("nobody here"), "Unknown");
        assert_eq!(parse_submolt("nobody here"), None);
    }

    #[test]
    fn test_parse_votes_and_comments() {
        assert_eq!(parse_votes_and_comments("42 upvotes • 7 comments"), (42, 7));
        assert_eq!(parse_votes_and_comments("12 ⬆ 💬 3"), (12, 3));
        assert_eq!(parse_votes_and_comments("title\n15\nmore text"), (15, 0));
        assert_eq!(parse_votes_and_comments("no counters"), (0, 0));
    }

    #[test]
    fn test_spam_detection() {
        let mut post = Post::placeholder(ID, String::new());

        post.title = "Send ETH to 0x1234567890abcdef1234567890abcdef12345678".into();
        assert!(is_spam(&post));

        post.title = "Massive AIRDROP today".into();
        assert!(is_spam(&post));

        post.title = "🚀🚀🚀🚀🚀 🚀🚀🚀🚀🚀".into();
        assert!(is_spam(&post));

        post.title = "buy buy buy buy buy buy buy buy buy".into();
        assert!(is_spam(&post));

        post.title = "How I built a memory system with git worktrees".into();
        assert!(!is_spam(&post));

        post.title = "🚀 launch day".into();
        assert!(!is_spam(&post));
    }

    #[test]
    fn test_word_repeat_needs_nine_in_a_row() {
        assert!(!has_word_repeat("buy buy buy buy buy buy buy buy"));
        assert!(has_word_repeat("Buy buy BUY buy buy buy buy buy buy now"));
        assert!(!has_word_repeat("buy buy buy buy sell buy buy buy buy buy"));
    }

    #[test]
    fn test_card_to_post_resolves_fields() {
        let c = card(ID, "", "u/Henry m/memory 9 votes 2 comments");
        let post = card_to_post(&c, "https://www.moltbook.com/");

        assert_eq!(post.title, "Untitled");
        assert_eq!(post.author, "u/Henry");
        assert_eq!(post.submolt.as_deref(), Some("m/memory"));
        assert_eq!((post.votes, post.comments), (9, 2));
        assert_eq!(post.url, format!("https://www.moltbook.com/post/{}", ID));
    }

    #[test]
    fn test_cards_to_posts_filters_spam_and_dedupes() {
        let cards = vec![
            card(ID, "Git worktrees for agents", ""),
            card("a1b2c3d4-5678-90ab-cdef-1234567890ab", "Free airdrop", ""),
            card(ID, "Duplicate", ""),
        ];
        let posts = cards_to_posts(&cards, "https://www.moltbook.com");
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].title, "Git worktrees for agents");
    }

    #[test]
    fn test_cards_to_posts_keeps_all_when_everything_is_spam() {
        let cards = vec![card(ID, "Free airdrop", "")];
        let posts = cards_to_posts(&cards, "https://www.moltbook.com");
        assert_eq!(posts.len(), 1);
    }

    #[test]
    fn test_merge_cards_later_list_wins() {
        let other = "a1b2c3d4-5678-90ab-cdef-1234567890ab";
        let merged = merge_cards(vec![
            vec![card(ID, "new feed", ""), card(other, "other", "")],
            vec![card(ID, "top feed", "")],
        ]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].title, "top feed");
        assert_eq!(merged[1].id, other);
    }

    #[test]
    fn test_truncate_chars_respects_code_points() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }
}
