use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use serde_json::Value;

use crate::app::{PulseError, Result};
use crate::store::KvStore;

/// Redis-backed store. Values are kept as JSON text.
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Connect, giving up after `timeout`
    pub async fn connect(url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::open(url)?;
        let conn = tokio::time::timeout(timeout, client.get_connection_manager())
            .await
            .map_err(|_| {
                PulseError::Store(format!("Redis connect timed out after {:?}", timeout))
            })??;

        Ok(Self { conn })
    }

    fn conn(&self) -> ConnectionManager {
        self.conn.clone()
    }
}

fn decode(raw: &str) -> Result<Value> {
    Ok(serde_json::from_str(raw)?)
}

/// `used_memory:<bytes>` line of `INFO memory`
pub(crate) fn parse_used_memory(info: &str) -> u64 {
    info.lines()
        .find_map(|line| line.trim().strip_prefix("used_memory:"))
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(0)
}

#[async_trait]
impl KvStore for RedisStore {
    fn backend(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let raw: Option<String> = self.conn().get(key).await?;
        raw.as_deref().map(decode).transpose()
    }

    async fn set(&self, key: &str, value: &Value) -> Result<()> {
        let _: () = self.conn().set(key, value.to_string()).await?;
        Ok(())
    }

    async fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<Value>> {
        let raw: Vec<String> = self
            .conn()
            .lrange(key, start as isize, stop as isize)
            .await?;
        raw.iter().map(|s| decode(s)).collect()
    }

    async fn lpush(&self, key: &str, value: &Value) -> Result<usize> {
        let len: usize = self.conn().lpush(key, value.to_string()).await?;
        Ok(len)
    }

    async fn del(&self, key: &str) -> Result<bool> {
        let removed: usize = self.conn().del(key).await?;
        Ok(removed > 0)
    }

    async fn llen(&self, key: &str) -> Result<usize> {
        let len: usize = self.conn().llen(key).await?;
        Ok(len)
    }

    async fn ltrim(&self, key: &str, start: i64, stop: i64) -> Result<()> {
        let _: () = self
            .conn()
            .ltrim(key, start as isize, stop as isize)
            .await?;
        Ok(())
    }

    async fn memory_usage(&self) -> Result<u64> {
        let mut conn = self.conn();
        let info: String = redis::cmd("INFO")
            .arg("memory")
            .query_async(&mut conn)
            .await?;
        Ok(parse_used_memory(&info))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_used_memory() {
        let info = "# Memory\r\nused_memory:1048576\r\nused_memory_human:1.00M\r\n";
        assert_eq!(parse_used_memory(info), 1_048_576);
        assert_eq!(parse_used_memory("# Memory\r\n"), 0);
    }

    #[tokio::test]
    async fn test_connect_to_bad_url_fails() {
        let result = RedisStore::connect("not a url", Duration::from_millis(50)).await;
        assert!(result.is_err());
    }
}
