use std::sync::Arc;

use crate::app::error::Result;
use crate::config::Config;
use crate::scraper::Crawler;
use crate::service::ReportService;
use crate::store::{self, KvStore, MemoryStore};

/// Wires the store, crawler and report service from one configuration.
pub struct AppContext {
    pub config: Config,
    pub store: Arc<dyn KvStore>,
    pub crawler: Arc<Crawler>,
    pub service: Arc<ReportService>,
}

impl AppContext {
    /// Connect to the configured store (Redis when reachable)
    pub async fn new(config: Config) -> Result<Self> {
        let store = store::open_store(&config.store).await;
        Self::with_store(config, store)
    }

    /// Context backed by a fresh in-memory store
    pub fn in_memory(config: Config) -> Result<Self> {
        Self::with_store(config, Arc::new(MemoryStore::new()))
    }

    pub fn with_store(config: Config, store: Arc<dyn KvStore>) -> Result<Self> {
        let crawler = Arc::new(Crawler::from_config(config.scraper.clone())?);
        let service = Arc::new(ReportService::new(
            store.clone(),
            crawler.clone(),
            config.store.clone(),
        ));

        Ok(Self {
            config,
            store,
            crawler,
            service,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_context() {
        let ctx = AppContext::in_memory(Config::default()).unwrap();
        assert_eq!(ctx.store.backend(), "memory");
        assert!(ctx.service.history().await.unwrap().is_empty());
    }
}
