use serde::{Deserialize, Serialize};

/// A forum post as extracted from a listing page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub title: String,
    pub content: String,
    pub author: String,
    pub votes: u32,
    pub comments: u32,
    pub created_at: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submolt: Option<String>,
}

impl Post {
    pub const UNKNOWN_AUTHOR: &'static str = "Unknown";

    /// Placeholder post carrying nothing but its id and link
    pub fn placeholder(id: &str, url: String) -> Self {
        Self {
            id: id.to_string(),
            title: "Post".to_string(),
            content: String::new(),
            author: Self::UNKNOWN_AUTHOR.to_string(),
            votes: 0,
            comments: 0,
            created_at: String::new(),
            url,
            submolt: None,
        }
    }

    /// Lowercased title and body, the haystack for keyword matching
    pub fn searchable_text(&self) -> String {
        format!("{} {}", self.title, self.content).to_lowercase()
    }
}

/// A board (`m/<name>`) listed on the submolts page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submolt {
    pub name: String,
    pub description: String,
    pub member_count: u32,
}
