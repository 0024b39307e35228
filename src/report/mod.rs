//! Daily report assembly, from a crawl or from the bundled fixtures.

use serde::Deserialize;
use tracing::{info, warn};

use crate::app::Result;
use crate::domain::{
    DailyReport, Insight, Post, RecommendedReading, ReportOrigin, Solution, Stats, Topic,
    TopicHeat,
};
use crate::scraper::Crawler;

const MAX_TOP_ISSUES: usize = 20;
const MAX_SOLUTIONS: usize = 5;
const MAX_HEAT_ROWS: usize = 7;
const MAX_READING: usize = 3;

const COMMUNITY_SOURCE: &str = "Moltbook Community";
const PADDING_URL: &str = "https://www.moltbook.com/post/dbddcf23-7314-4213-a5f2-f90600686685";

const FIXTURES: &str = include_str!("fixtures.json");

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Fixtures {
    top_issues: Vec<Topic>,
    solutions: Vec<Solution>,
    insights: Vec<Insight>,
    topic_heat: Vec<TopicHeat>,
    recommended_reading: Vec<RecommendedReading>,
}

/// Build a report from crawled topics and the posts behind them
pub fn from_crawl(date: &str, timestamp: i64, topics: &[Topic], posts: &[Post]) -> DailyReport {
    let total_posts = posts.len() as u32;

    DailyReport {
        date: date.to_string(),
        timestamp,
        stats: Stats {
            total_posts,
            high_value_posts: total_posts * 7 / 10,
            total_comments: posts.iter().map(|p| u64::from(p.comments)).sum(),
        },
        top_issues: topics.iter().take(MAX_TOP_ISSUES).cloned().collect(),
        solutions: community_solutions(topics),
        insights: vec![Insight {
            id: "communityGrowth".to_string(),
            title: "Community is Growing Fast".to_string(),
            content: format!("We found {} active discussions today", posts.len()),
            title_zh: None,
            content_zh: None,
        }],
        topic_heat: topics
            .iter()
            .take(MAX_HEAT_ROWS)
            .map(|t| TopicHeat {
                topic: t.short_title(),
                heat: t.heat,
                trend: TopicHeat::trend_for(t.heat).to_string(),
                topic_zh: None,
            })
            .collect(),
        recommended_reading: posts
            .iter()
            .take(MAX_READING)
            .map(|p| RecommendedReading {
                title: p.title.clone(),
                author: p.author.clone(),
                url: p.url.clone(),
                reason: "High community engagement".to_string(),
                title_zh: None,
                reason_zh: None,
            })
            .collect(),
    }
}

fn community_solutions(topics: &[Topic]) -> Vec<Solution> {
    topics
        .iter()
        .take(MAX_SOLUTIONS)
        .map(|t| Solution {
            problem: t.title.clone(),
            solution: t.solution.clone(),
            verified: t.verified.clone(),
            source: COMMUNITY_SOURCE.to_string(),
        })
        .collect()
}

/// Filler topic shown when the fixtures hold fewer than twenty issues
fn padding_topic(existing: usize) -> Topic {
    let n = existing + 1;
    let heat = 100usize.saturating_sub(existing * 3).max(30) as u8;
    Topic {
        id: format!("topic{}", n),
        title: format!("Topic {}: AI Agent Challenge", n),
        heat,
        heat_display: Topic::heat_display(heat),
        description: "Discussion about AI agent capabilities and limitations".to_string(),
        solution: "Community collaboration".to_string(),
        verified: "⚠️ Emerging".to_string(),
        posts: vec![format!("mock-post-{}", n)],
        url: PADDING_URL.to_string(),
        title_zh: None,
        description_zh: None,
        solution_zh: None,
        verified_zh: None,
    }
}

/// The canned report served when nothing could be crawled
pub fn mock_report(date: &str, timestamp: i64) -> Result<DailyReport> {
    let fixtures: Fixtures = serde_json::from_str(FIXTURES)?;

    let mut top_issues = fixtures.top_issues;
    while top_issues.len() < MAX_TOP_ISSUES {
        top_issues.push(padding_topic(top_issues.len()));
    }

    Ok(DailyReport {
        date: date.to_string(),
        timestamp,
        stats: Stats {
            total_posts: 30,
            high_value_posts: 20,
            total_comments: 150,
        },
        top_issues,
        solutions: fixtures.solutions,
        insights: fixtures.insights,
        topic_heat: fixtures.topic_heat,
        recommended_reading: fixtures.recommended_reading,
    })
}

/// Crawl and build today's report, falling back to the mock on any failure
pub async fn generate(crawler: &Crawler, date: &str) -> Result<(DailyReport, ReportOrigin)> {
    let timestamp = chrono::Utc::now().timestamp_millis();

    match crawler.crawl().await {
        Ok(outcome) if !outcome.topics.is_empty() => {
            info!(
                "Built report for {} from {} topics ({})",
                date,
                outcome.topics.len(),
                outcome.tier
            );
            let report = from_crawl(date, timestamp, &outcome.topics, &outcome.posts);
            Ok((report, ReportOrigin::Crawled(outcome.tier)))
        }
        Ok(outcome) => {
            warn!(
                "Crawl found {} posts but no topics, using mock data",
                outcome.posts.len()
            );
            Ok((mock_report(date, timestamp)?, ReportOrigin::Mock))
        }
        Err(e) => {
            warn!("Crawl failed, using mock data: {}", e);
            Ok((mock_report(date, timestamp)?, ReportOrigin::Mock))
        }
    }
}
