//! Key-value persistence for daily reports.
//!
//! Reports live under `report:<YYYY-MM-DD>`; the `history` list holds report
//! dates, newest first. Both backends speak a small Redis-flavoured command set
//! over JSON values so the service layer does not care which one it got.

pub mod memory;
pub mod redis_store;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::app::Result;
use crate::domain::DailyReport;

pub use self::memory::MemoryStore;
pub use self::redis_store::RedisStore;

pub const HISTORY_KEY: &str = "history";

pub fn report_key(date: &str) -> String {
    format!("report:{}", date)
}

#[async_trait]
pub trait KvStore: Send + Sync {
    /// Backend name for logs
    fn backend(&self) -> &'static str;

    async fn get(&self, key: &str) -> Result<Option<Value>>;
    async fn set(&self, key: &str, value: &Value) -> Result<()>;
    /// Inclusive range; negative indices count from the end
    async fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<Value>>;
    /// Prepend, returning the new length
    async fn lpush(&self, key: &str, value: &Value) -> Result<usize>;
    async fn del(&self, key: &str) -> Result<bool>;
    async fn llen(&self, key: &str) -> Result<usize>;
    /// Keep only the inclusive range
    async fn ltrim(&self, key: &str, start: i64, stop: i64) -> Result<()>;
    /// Bytes used by the backend, 0 when unknown
    async fn memory_usage(&self) -> Result<u64>;
}

/// Resolve a Redis-style inclusive range against a list of `len` items.
///
/// Returns `None` when the range selects nothing.
pub fn resolve_range(len: usize, start: i64, stop: i64) -> Option<(usize, usize)> {
    let len = len as i64;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };

    if len == 0 || start > stop || start >= len {
        return None;
    }
    Some((start as usize, stop as usize))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// `redis://` URL; the in-memory store is used when unset
    pub redis_url: Option<String>,
    pub connect_timeout_ms: u64,
    pub prune_threshold_bytes: u64,
    pub prune_days: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            connect_timeout_ms: 5000,
            prune_threshold_bytes: 29 * 1024 * 1024,
            prune_days: 7,
        }
    }
}

impl StoreConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

/// Redis when configured and reachable, memory otherwise
pub async fn open_store(config: &StoreConfig) -> Arc<dyn KvStore> {
    let Some(url) = config.redis_url.as_deref().filter(|u| !u.trim().is_empty()) else {
        info!("No Redis URL configured, using in-memory store");
        return Arc::new(MemoryStore::new());
    };

    match RedisStore::connect(url, config.connect_timeout()).await {
        Ok(store) => {
            info!("Connected to Redis");
            Arc::new(store)
        }
        Err(e) => {
            warn!("Redis connect failed, using in-memory fallback: {}", e);
            Arc::new(MemoryStore::new())
        }
    }
}

pub async fn save_report(kv: &dyn KvStore, report: &DailyReport) -> Result<()> {
    let value = serde_json::to_value(report)?;
    kv.set(&report_key(&report.date), &value).await
}

pub async fn load_report(kv: &dyn KvStore, date: &str) -> Result<Option<DailyReport>> {
    match kv.get(&report_key(date)).await? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

/// History dates, newest first. Non-string entries are skipped.
pub async fn history_dates(kv: &dyn KvStore) -> Result<Vec<String>> {
    let values = kv.lrange(HISTORY_KEY, 0, -1).await?;
    Ok(values
        .into_iter()
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect())
}

/// Drop the oldest `days` reports once the backend grows past `threshold`
/// bytes. Returns how many days were removed; failures are logged and count
/// as zero.
pub async fn prune_oldest_week_if_needed(kv: &dyn KvStore, threshold: u64, days: usize) -> usize {
    match prune(kv, threshold, days).await {
        Ok(removed) => removed,
        Err(e) => {
            warn!("Pruning old reports failed: {}", e);
            0
        }
    }
}

async fn prune(kv: &dyn KvStore, threshold: u64, days: usize) -> Result<usize> {
    let used = kv.memory_usage().await?;
    if used < threshold {
        return Ok(0);
    }

    let to_remove = days.min(kv.llen(HISTORY_KEY).await?);
    if to_remove == 0 {
        return Ok(0);
    }

    let n = to_remove as i64;
    for date in kv.lrange(HISTORY_KEY, -n, -1).await? {
        if let Some(date) = date.as_str() {
            kv.del(&report_key(date)).await?;
        }
    }
    kv.ltrim(HISTORY_KEY, 0, -(n + 1)).await?;

    info!(
        "Pruned {} oldest day(s) from {} store (used was {} MB)",
        to_remove,
        kv.backend(),
        used / 1024 / 1024
    );
    Ok(to_remove)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Memory store that reports a fixed usage figure
    struct Bloated {
        inner: MemoryStore,
        used: u64,
    }

    #[async_trait]
    impl KvStore for Bloated {
        fn backend(&self) -> &'static str {
            "bloated"
        }
        async fn get(&self, key: &str) -> Result<Option<Value>> {
            self.inner.get(key).await
        }
        async fn set(&self, key: &str, value: &Value) -> Result<()> {
            self.inner.set(key, value).await
        }
        async fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<Value>> {
            self.inner.lrange(key, start, stop).await
        }
        async fn lpush(&self, key: &str, value: &Value) -> Result<usize> {
            self.inner.lpush(key, value).await
        }
        async fn del(&self, key: &str) -> Result<bool> {
            self.inner.del(key).await
        }
        async fn llen(&self, key: &str) -> Result<usize> {
            self.inner.llen(key).await
        }
        async fn ltrim(&self, key: &str, start: i64, stop: i64) -> Result<()> {
            self.inner.ltrim(key, start, stop).await
        }
        async fn memory_usage(&self) -> Result<u64> {
            Ok(self.used)
        }
    }

    async fn seeded(days: u32, used: u64) -> Bloated {
        let store = Bloated {
            inner: MemoryStore::new(),
            used,
        };
        for day in 1..=days {
            let date = format!("2026-01-{:02}", day);
            store.set(&report_key(&date), &json!({"date": date})).await.unwrap();
            store.lpush(HISTORY_KEY, &json!(date)).await.unwrap();
        }
        store
    }

    #[test]
    fn test_resolve_range() {
        assert_eq!(resolve_range(5, 0, -1), Some((0, 4)));
        assert_eq!(resolve_range(5, -2, -1), Some((3, 4)));
        assert_eq!(resolve_range(5, 0, -3), Some((0, 2)));
        assert_eq!(resolve_range(5, -10, 1), Some((0, 1)));
        assert_eq!(resolve_range(5, 2, 99), Some((2, 4)));
        assert_eq!(resolve_range(5, 0, -6), None);
        assert_eq!(resolve_range(5, 5, 9), None);
        assert_eq!(resolve_range(0, 0, -1), None);
    }

    #[test]
    fn test_default_config() {
        let config = StoreConfig::default();
        assert_eq!(config.prune_threshold_bytes, 30_408_704);
        assert_eq!(config.connect_timeout(), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_prune_below_threshold_is_noop() {
        let store = seeded(10, 1024).await;
        assert_eq!(prune_oldest_week_if_needed(&store, 2048, 7).await, 0);
        assert_eq!(store.llen(HISTORY_KEY).await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_prune_removes_oldest_week() {
        let store = seeded(10, 4096).await;
        assert_eq!(prune_oldest_week_if_needed(&store, 2048, 7).await, 7);

        let left = history_dates(&store).await.unwrap();
        assert_eq!(left, vec!["2026-01-10", "2026-01-09", "2026-01-08"]);
        assert!(store.get("report:2026-01-01").await.unwrap().is_none());
        assert!(store.get("report:2026-01-07").await.unwrap().is_none());
        assert!(store.get("report:2026-01-08").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_prune_short_history_clears_everything() {
        let store = seeded(3, 4096).await;
        assert_eq!(prune_oldest_week_if_needed(&store, 2048, 7).await, 3);
        assert_eq!(store.llen(HISTORY_KEY).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_open_store_without_url_is_memory() {
        let store = open_store(&StoreConfig::default()).await;
        assert_eq!(store.backend(), "memory");
    }

    #[tokio::test]
    async fn test_open_store_falls_back_when_redis_unreachable() {
        let config = StoreConfig {
            redis_url: Some("redis://127.0.0.1:1".to_string()),
            connect_timeout_ms: 200,
            ..Default::default()
        };
        let store = open_store(&config).await;
        assert_eq!(store.backend(), "memory");

        store.set("report:2026-01-31", &json!(1)).await.unwrap();
        assert_eq!(store.get("report:2026-01-31").await.unwrap(), Some(json!(1)));
    }

    #[tokio::test]
    async fn test_report_round_trip_through_store() {
        let store = MemoryStore::new();
        let report = crate::report::mock_report("2026-01-31", 1).unwrap();
        save_report(&store, &report).await.unwrap();

        let loaded = load_report(&store, "2026-01-31").await.unwrap();
        assert_eq!(loaded, Some(report));
        assert_eq!(load_report(&store, "2026-02-01").await.unwrap(), None);
    }
}
