//! Periodic crawling inside the server process.
//!
//! Replaces an external cron: the scheduler wakes on a fixed interval and
//! runs one crawl-and-store cycle each time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Notify;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

use crate::service::ReportService;

/// Scheduler configuration
#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    /// Crawl interval in seconds (default: 86400 = 1 day)
    pub interval_secs: u64,
    /// Whether to crawl immediately on start
    pub crawl_on_start: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: 86400,
            crawl_on_start: true,
        }
    }
}

impl ScheduleConfig {
    /// Parse interval string like "1h", "30m", "6h", "1d"
    pub fn parse_interval(s: &str) -> Result<u64, String> {
        let s = s.trim().to_lowercase();

        let secs = if let Some(hours) = s.strip_suffix('h') {
            hours
                .parse::<u64>()
                .map(|h| h * 3600)
                .map_err(|_| format!("Invalid hours: {}", hours))
        } else if let Some(minutes) = s.strip_suffix('m') {
            minutes
                .parse::<u64>()
                .map(|m| m * 60)
                .map_err(|_| format!("Invalid minutes: {}", minutes))
        } else if let Some(days) = s.strip_suffix('d') {
            days.parse::<u64>()
                .map(|d| d * 86400)
                .map_err(|_| format!("Invalid days: {}", days))
        } else if let Some(secs) = s.strip_suffix('s') {
            secs.parse::<u64>()
                .map_err(|_| format!("Invalid seconds: {}", secs))
        } else {
            // Raw seconds
            s.parse::<u64>()
                .map_err(|_| format!("Invalid interval: {}. Use format like '6h', '30m', '1d'", s))
        }?;

        if secs == 0 {
            return Err("Interval must be greater than zero".to_string());
        }
        Ok(secs)
    }

    /// Format interval for display
    pub fn format_interval(secs: u64) -> String {
        if secs >= 86400 && secs.is_multiple_of(86400) {
            format!("{}d", secs / 86400)
        } else if secs >= 3600 && secs.is_multiple_of(3600) {
            format!("{}h", secs / 3600)
        } else if secs >= 60 && secs.is_multiple_of(60) {
            format!("{}m", secs / 60)
        } else {
            format!("{}s", secs)
        }
    }
}

/// Runs `crawl_and_store` on a fixed interval until stopped
pub struct Scheduler {
    service: Arc<ReportService>,
    config: ScheduleConfig,
    running: AtomicBool,
    wake: Notify,
}

impl Scheduler {
    pub fn new(service: Arc<ReportService>, config: ScheduleConfig) -> Self {
        Self {
            service,
            config,
            running: AtomicBool::new(true),
            wake: Notify::new(),
        }
    }

    pub async fn run(&self) {
        info!(
            "Crawl scheduler started (interval: {})",
            ScheduleConfig::format_interval(self.config.interval_secs)
        );

        if self.config.crawl_on_start {
            info!("Running initial crawl...");
            self.run_once().await;
        }

        let mut timer = interval(Duration::from_secs(self.config.interval_secs));
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        timer.tick().await; // Skip the first immediate tick

        while self.is_running() {
            tokio::select! {
                _ = timer.tick() => {}
                _ = self.wake.notified() => {}
            }

            if !self.is_running() {
                break;
            }

            info!("Running scheduled crawl...");
            self.run_once().await;
        }

        info!("Crawl scheduler stopped");
    }

    /// Run a single crawl cycle, logging the outcome
    pub async fn run_once(&self) {
        let start = Utc::now();

        match self.service.crawl_and_store().await {
            Ok(stored) => {
                let elapsed = Utc::now().signed_duration_since(start);
                info!(
                    "Crawl complete: {} report for {}, {} topics ({:.1}s)",
                    stored.origin,
                    stored.date,
                    stored.report.top_issues.len(),
                    elapsed.num_milliseconds() as f64 / 1000.0
                );
            }
            Err(e) => error!("Scheduled crawl failed: {}", e),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stop the scheduler (called externally)
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.wake.notify_one();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::tests::FakeSource;
    use crate::scraper::Crawler;
    use crate::store::{MemoryStore, StoreConfig};

    #[test]
    fn test_parse_interval() {
        assert_eq!(ScheduleConfig::parse_interval("1h").unwrap(), 3600);
        assert_eq!(ScheduleConfig::parse_interval("30m").unwrap(), 1800);
        assert_eq!(ScheduleConfig::parse_interval("1d").unwrap(), 86400);
        assert_eq!(ScheduleConfig::parse_interval("90s").unwrap(), 90);
        assert_eq!(ScheduleConfig::parse_interval("3600").unwrap(), 3600);
        assert_eq!(ScheduleConfig::parse_interval(" 6H ").unwrap(), 21600);
    }

    #[test]
    fn test_parse_interval_invalid() {
        assert!(ScheduleConfig::parse_interval("abc").is_err());
        assert!(ScheduleConfig::parse_interval("1x").is_err());
        assert!(ScheduleConfig::parse_interval("h").is_err());
        assert!(ScheduleConfig::parse_interval("0m").is_err());
    }

    #[test]
    fn test_format_interval() {
        assert_eq!(ScheduleConfig::format_interval(86400), "1d");
        assert_eq!(ScheduleConfig::format_interval(3600), "1h");
        assert_eq!(ScheduleConfig::format_interval(1800), "30m");
        assert_eq!(ScheduleConfig::format_interval(90), "90s");
    }

    #[tokio::test]
    async fn test_initial_crawl_then_stop() {
        let service = Arc::new(ReportService::new(
            Arc::new(MemoryStore::new()),
            Arc::new(Crawler::new(
                vec![Box::new(FakeSource::failing("offline"))],
                "https://www.moltbook.com",
            )),
            StoreConfig::default(),
        ));
        let scheduler = Arc::new(Scheduler::new(service.clone(), ScheduleConfig::default()));

        let handle = tokio::spawn({
            let scheduler = scheduler.clone();
            async move { scheduler.run().await }
        });

        // The initial crawl lands in history before the first long wait
        for _ in 0..100 {
            if !service.history().await.unwrap().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(service.history().await.unwrap().len(), 1);

        scheduler.stop();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(!scheduler.is_running());
    }
}
