//! Report lifecycle on top of the crawler and the key-value store.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::app::Result;
use crate::domain::{DailyReport, ReportOrigin, TrendPoint};
use crate::report;
use crate::scraper::Crawler;
use crate::store::{self, KvStore, StoreConfig, HISTORY_KEY};

const TREND_DAYS: i64 = 7;

/// Topics plotted on the trends chart: (lookup keyword, label)
pub const TRACKED_TOPICS: &[(&str, &str)] = &[
    ("memory", "Memory System"),
    ("collaboration", "Multi-Agent Collaboration"),
    ("branching", "Branching Conversations"),
    ("coordination", "Autonomous Coordination"),
    ("night", "Night Operations"),
];

/// Result of one crawl-and-store cycle
#[derive(Debug, Clone)]
pub struct StoredReport {
    pub date: String,
    pub report: DailyReport,
    pub origin: ReportOrigin,
}

pub fn today() -> String {
    Utc::now().date_naive().format("%Y-%m-%d").to_string()
}

pub struct ReportService {
    store: Arc<dyn KvStore>,
    crawler: Arc<Crawler>,
    store_config: StoreConfig,
}

impl ReportService {
    pub fn new(store: Arc<dyn KvStore>, crawler: Arc<Crawler>, store_config: StoreConfig) -> Self {
        Self {
            store,
            crawler,
            store_config,
        }
    }

    pub fn store(&self) -> &dyn KvStore {
        self.store.as_ref()
    }

    pub async fn crawl_and_store(&self) -> Result<StoredReport> {
        self.crawl_and_store_on(&today()).await
    }

    /// Generate the report for `date`, persist it and record it in history
    pub async fn crawl_and_store_on(&self, date: &str) -> Result<StoredReport> {
        let (report, origin) = report::generate(&self.crawler, date).await?;
        let kv = self.store();

        store::save_report(kv, &report).await?;

        let newest = kv.lrange(HISTORY_KEY, 0, 0).await?;
        if newest.first().and_then(|v| v.as_str()) != Some(date) {
            kv.lpush(HISTORY_KEY, &json!(date)).await?;
        }

        store::prune_oldest_week_if_needed(
            kv,
            self.store_config.prune_threshold_bytes,
            self.store_config.prune_days,
        )
        .await;

        info!("Stored {} report for {}", origin, date);
        Ok(StoredReport {
            date: date.to_string(),
            report,
            origin,
        })
    }

    pub async fn latest_report(&self) -> Result<DailyReport> {
        self.latest_report_on(&today()).await
    }

    /// The stored report for `date`, or a mock that is stored first
    pub async fn latest_report_on(&self, date: &str) -> Result<DailyReport> {
        if let Some(report) = store::load_report(self.store(), date).await? {
            return Ok(report);
        }

        debug!("No report for {}, storing mock", date);
        let report = report::mock_report(date, Utc::now().timestamp_millis())?;
        store::save_report(self.store(), &report).await?;
        Ok(report)
    }

    pub async fn report_for(&self, date: &str) -> Result<Option<DailyReport>> {
        store::load_report(self.store(), date).await
    }

    /// Stored report dates, newest first, without duplicates
    pub async fn history(&self) -> Result<Vec<String>> {
        let mut seen = HashSet::new();
        Ok(store::history_dates(self.store())
            .await?
            .into_iter()
            .filter(|d| seen.insert(d.clone()))
            .collect())
    }

    /// Seven days of tracked-topic heat ending at `today`, oldest first
    pub async fn trends(&self, today: NaiveDate) -> Result<Vec<TrendPoint>> {
        let mut points = Vec::with_capacity(TREND_DAYS as usize);

        for offset in (0..TREND_DAYS).rev() {
            let date = (today - Duration::days(offset))
                .format("%Y-%m-%d")
                .to_string();
            let stored = store::load_report(self.store(), &date).await?;

            let values: BTreeMap<String, f64> = TRACKED_TOPICS
                .iter()
                .map(|(keyword, label)| {
                    let heat = stored
                        .as_ref()
                        .and_then(|r| r.heat_for(keyword))
                        .map(f64::from)
                        .unwrap_or_else(|| synthetic_heat(&date, label));
                    (label.to_string(), heat)
                })
                .collect();

            points.push(TrendPoint { date, values });
        }

        Ok(points)
    }
}

/// Stable stand-in heat in 50.0..=99.9 for days without a stored figure
pub fn synthetic_heat(date: &str, topic: &str) -> f64 {
    let digest = Sha256::digest(format!("{}:{}", date, topic).as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    let tenths = 500 + u64::from_be_bytes(bytes) % 500;
    tenths as f64 / 10.0
}
