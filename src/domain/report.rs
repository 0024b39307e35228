use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A keyword-derived cluster of posts with a heat score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub id: String,
    pub title: String,
    pub heat: u8,
    pub heat_display: String,
    pub description: String,
    pub solution: String,
    pub verified: String,
    pub posts: Vec<String>,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_zh: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_zh: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution_zh: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_zh: Option<String>,
}

impl Topic {
    pub fn heat_display(heat: u8) -> String {
        format!("{}%", heat)
    }

    /// First three words of the title, the label used on the heat chart
    pub fn short_title(&self) -> String {
        self.title
            .split_whitespace()
            .take(3)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_posts: u32,
    pub high_value_posts: u32,
    pub total_comments: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    pub problem: String,
    pub solution: String,
    pub verified: String,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_zh: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_zh: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicHeat {
    pub topic: String,
    pub heat: u8,
    pub trend: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_zh: Option<String>,
}

impl TopicHeat {
    /// Chart glyph for a heat value
    pub fn trend_for(heat: u8) -> &'static str {
        if heat > 80 {
            "🔥"
        } else if heat > 60 {
            "📈"
        } else {
            "➡️"
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedReading {
    pub title: String,
    pub author: String,
    pub url: String,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_zh: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason_zh: Option<String>,
}

/// One day's analysis, the document the dashboard renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyReport {
    pub date: String,
    pub timestamp: i64,
    pub stats: Stats,
    pub top_issues: Vec<Topic>,
    pub solutions: Vec<Solution>,
    pub insights: Vec<Insight>,
    pub topic_heat: Vec<TopicHeat>,
    pub recommended_reading: Vec<RecommendedReading>,
}

impl DailyReport {
    /// Highest heat recorded for a topic whose label or title mentions `needle`
    pub fn heat_for(&self, needle: &str) -> Option<u8> {
        let needle = needle.to_lowercase();
        let from_chart = self
            .topic_heat
            .iter()
            .filter(|t| t.topic.to_lowercase().contains(&needle))
            .map(|t| t.heat);
        let from_issues = self
            .top_issues
            .iter()
            .filter(|t| t.title.to_lowercase().contains(&needle))
            .map(|t| t.heat);
        from_chart.chain(from_issues).max()
    }
}

/// Which extraction strategy produced the posts behind a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionTier {
    Browser,
    NextData,
    Dom,
    Regex,
}

impl fmt::Display for ExtractionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExtractionTier::Browser => "browser",
            ExtractionTier::NextData => "__NEXT_DATA__",
            ExtractionTier::Dom => "dom",
            ExtractionTier::Regex => "regex",
        };
        f.write_str(name)
    }
}

/// Where a report came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "tier", rename_all = "snake_case")]
pub enum ReportOrigin {
    Crawled(ExtractionTier),
    Mock,
}

impl fmt::Display for ReportOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportOrigin::Crawled(tier) => write!(f, "crawled ({})", tier),
            ReportOrigin::Mock => f.write_str("mock"),
        }
    }
}

/// One day on the trends chart: date plus a heat value per tracked topic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: String,
    #[serde(flatten)]
    pub values: BTreeMap<String, f64>,
}
