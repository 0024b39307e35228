use chrono::Utc;

use crate::app::{AppContext, PulseError, Result};
use crate::daemon::ScheduleConfig;
use crate::report;
use crate::server;
use crate::service;

/// Resolve the schedule for `serve`: CLI flag first, then config
pub fn schedule_for(
    configured: &str,
    flag: Option<&str>,
    crawl_now: bool,
) -> Result<Option<ScheduleConfig>> {
    let raw = flag.unwrap_or(configured).trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("off") {
        return Ok(None);
    }

    let interval_secs = ScheduleConfig::parse_interval(raw).map_err(PulseError::Config)?;
    Ok(Some(ScheduleConfig {
        interval_secs,
        crawl_on_start: crawl_now,
    }))
}

pub async fn serve(
    mut ctx: AppContext,
    port: Option<u16>,
    crawl_every: Option<String>,
    crawl_now: bool,
) -> Result<()> {
    if let Some(port) = port {
        ctx.config.server.port = port;
    }

    let crawl_now = crawl_now || ctx.config.server.crawl_on_start;
    let schedule = schedule_for(
        &ctx.config.server.crawl_interval,
        crawl_every.as_deref(),
        crawl_now,
    )?;

    match &schedule {
        Some(s) => println!(
            "Crawling every {}",
            ScheduleConfig::format_interval(s.interval_secs)
        ),
        None => println!("Scheduled crawls disabled"),
    }

    server::start_server(ctx, schedule).await
}

/// One crawl; with `save`, also build and store today's report
pub async fn crawl(ctx: &AppContext, save: bool) -> Result<()> {
    if save {
        let stored = ctx.service.crawl_and_store().await?;
        println!(
            "Stored {} report for {} ({} topics)",
            stored.origin,
            stored.date,
            stored.report.top_issues.len()
        );
        for topic in stored.report.top_issues.iter().take(5) {
            println!("  {:>4}  {}", topic.heat_display, topic.title);
        }
        return Ok(());
    }

    println!("Crawling via {}...", ctx.crawler.tiers().join(" → "));
    let outcome = ctx.crawler.crawl().await?;

    println!(
        "{} posts, {} submolts, {} topics (via {})",
        outcome.posts.len(),
        outcome.submolts.len(),
        outcome.topics.len(),
        outcome.tier
    );

    for topic in &outcome.topics {
        println!(
            "  {:>4}  {} ({} posts)",
            topic.heat_display,
            topic.title,
            topic.posts.len()
        );
    }

    if outcome.topics.is_empty() {
        for post in outcome.posts.iter().take(10) {
            println!("  - {} [{}]", post.title, post.url);
        }
    }

    Ok(())
}

/// Print the fallback report for today as pretty JSON
pub fn print_mock() -> Result<()> {
    let report = report::mock_report(&service::today(), Utc::now().timestamp_millis())?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_from_config() {
        let schedule = schedule_for("1d", None, false).unwrap().unwrap();
        assert_eq!(schedule.interval_secs, 86400);
        assert!(!schedule.crawl_on_start);
    }

    #[test]
    fn test_schedule_flag_wins() {
        let schedule = schedule_for("1d", Some("30m"), true).unwrap().unwrap();
        assert_eq!(schedule.interval_secs, 1800);
        assert!(schedule.crawl_on_start);
    }

    #[test]
    fn test_schedule_disabled() {
        assert!(schedule_for("", None, false).unwrap().is_none());
        assert!(schedule_for("1d", Some("off"), false).unwrap().is_none());
    }

    #[test]
    fn test_schedule_invalid() {
        assert!(matches!(
            schedule_for("soon", None, false),
            Err(PulseError::Config(_))
        ));
    }
}
