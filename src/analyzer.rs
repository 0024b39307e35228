//! Keyword topic clustering.
//!
//! A post belongs to a topic when its title or body mentions the topic's
//! keyword. Heat is a fixed editorial score per topic, not a measurement.

use crate::domain::{Post, Topic};

const MAX_TOPIC_POSTS: usize = 3;

struct KeywordTopic {
    keyword: &'static str,
    id: &'static str,
    title: &'static str,
    description: &'static str,
    solution: &'static str,
    verified: &'static str,
    heat: u8,
}

const KEYWORD_TOPICS: &[KeywordTopic] = &[
    KeywordTopic {
        keyword: "git",
        id: "gitCollaboration",
        title: "Git Collaboration and Version Control for Agents",
        description: "Multiple agents working in the same codebase",
        solution: "Git Worktrees + Branch Protection",
        verified: "✅ Best Practice",
        heat: 90,
    },
    KeywordTopic {
        keyword: "memory",
        id: "memorySystem",
        title: "AI Memory Systems and Context Persistence",
        description: "How to maintain memory across agent sessions",
        solution: "Vector Database + RAG",
        verified: "✅ Widely Used",
        heat: 95,
    },
    KeywordTopic {
        keyword: "cost",
        id: "costOptimization",
        title: "API Cost Optimization Strategies",
        description: "Reducing LLM API costs while maintaining quality",
        solution: "Caching + Local Models",
        verified: "✅ Proven",
        heat: 85,
    },
    KeywordTopic {
        keyword: "autonomous",
        id: "autonomy",
        title: "Autonomous Agent Operations",
        description: "Agents working without human intervention",
        solution: "Night Shift Mode",
        verified: "⚠️ Experimental",
        heat: 80,
    },
    KeywordTopic {
        keyword: "collaborate",
        id: "collaboration",
        title: "Agent Collaboration and Trust",
        description: "How agents coordinate without centralized platforms",
        solution: "Smart Contract Coordination Pool",
        verified: "⚠️ Exploring",
        heat: 75,
    },
    KeywordTopic {
        keyword: "context",
        id: "contextWindow",
        title: "Context Window and Long-term Memory",
        description: "Fitting more information into limited context",
        solution: "Hierarchical Context Compression",
        verified: "✅ Best Practice",
        heat: 82,
    },
];

/// Cluster posts into keyword topics.
///
/// Topics come out in the order they are first matched while walking the
/// posts; keywords hit by the same post keep table order. Each topic links to
/// `{base_url}/post/{id}` of its first post.
pub fn analyze(posts: &[Post], base_url: &str) -> Vec<Topic> {
    let haystacks: Vec<String> = posts.iter().map(Post::searchable_text).collect();
    let base = base_url.trim_end_matches('/');

    let mut matches: Vec<(usize, Topic)> = KEYWORD_TOPICS
        .iter()
        .filter_map(|kt| {
            let mut first_seen = None;
            let mut matched: Vec<&str> = Vec::new();
            for (index, (post, text)) in posts.iter().zip(&haystacks).enumerate() {
                if !text.contains(kt.keyword) {
                    continue;
                }
                if first_seen.is_none() {
                    first_seen = Some(index);
                }
                if !matched.contains(&post.id.as_str()) {
                    matched.push(&post.id);
                }
            }
            let first_seen = first_seen?;

            let topic = Topic {
                id: kt.id.to_string(),
                title: kt.title.to_string(),
                heat: kt.heat,
                heat_display: Topic::heat_display(kt.heat),
                description: kt.description.to_string(),
                solution: kt.solution.to_string(),
                verified: kt.verified.to_string(),
                url: format!("{}/post/{}", base, matched[0]),
                posts: matched
                    .iter()
                    .take(MAX_TOPIC_POSTS)
                    .map(|id| id.to_string())
                    .collect(),
                title_zh: None,
                description_zh: None,
                solution_zh: None,
                verified_zh: None,
            };
            Some((first_seen, topic))
        })
        .collect();

    // Stable: ties keep keyword-table order
    matches.sort_by_key(|(first_seen, _)| *first_seen);
    matches.into_iter().map(|(_, topic)| topic).collect()
}
