use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;

use crate::app::{PulseError, Result};
use crate::store::{resolve_range, KvStore};

enum Entry {
    Value(Value),
    List(VecDeque<Value>),
}

/// Process-local store, used when Redis is not configured or unreachable.
#[derive(Default)]
pub struct MemoryStore {
    data: Mutex<HashMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Entry>>> {
        self.data
            .lock()
            .map_err(|e| PulseError::Store(format!("Memory store poisoned: {}", e)))
    }
}

fn wrong_type(key: &str) -> PulseError {
    PulseError::Store(format!("WRONGTYPE key {} holds the wrong kind of value", key))
}

#[async_trait]
impl KvStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<Value>> {
        match self.lock()?.get(key) {
            None => Ok(None),
            Some(Entry::Value(v)) => Ok(Some(v.clone())),
            Some(Entry::List(_)) => Err(wrong_type(key)),
        }
    }

    async fn set(&self, key: &str, value: &Value) -> Result<()> {
        self.lock()?
            .insert(key.to_string(), Entry::Value(value.clone()));
        Ok(())
    }

    async fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<Value>> {
        match self.lock()?.get(key) {
            None => Ok(Vec::new()),
            Some(Entry::List(list)) => Ok(match resolve_range(list.len(), start, stop) {
                Some((from, to)) => list.range(from..=to).cloned().collect(),
                None => Vec::new(),
            }),
            Some(Entry::Value(_)) => Err(wrong_type(key)),
        }
    }

    async fn lpush(&self, key: &str, value: &Value) -> Result<usize> {
        let mut data = self.lock()?;
        let entry = data
            .entry(key.to_string())
            .or_insert_with(|| Entry::List(VecDeque::new()));
        match entry {
            Entry::List(list) => {
                list.push_front(value.clone());
                Ok(list.len())
            }
            Entry::Value(_) => Err(wrong_type(key)),
        }
    }

    async fn del(&self, key: &str) -> Result<bool> {
        Ok(self.lock()?.remove(key).is_some())
    }

    async fn llen(&self, key: &str) -> Result<usize> {
        match self.lock()?.get(key) {
            None => Ok(0),
            Some(Entry::List(list)) => Ok(list.len()),
            Some(Entry::Value(_)) => Err(wrong_type(key)),
        }
    }

    async fn ltrim(&self, key: &str, start: i64, stop: i64) -> Result<()> {
        let mut data = self.lock()?;
        let list = match data.get_mut(key) {
            None => return Ok(()),
            Some(Entry::List(list)) => list,
            Some(Entry::Value(_)) => return Err(wrong_type(key)),
        };

        match resolve_range(list.len(), start, stop) {
            Some((from, to)) => {
                list.truncate(to + 1);
                list.drain(..from);
            }
            None => {
                // Redis deletes a list trimmed to nothing
                data.remove(key);
            }
        }
        Ok(())
    }

    async fn memory_usage(&self) -> Result<u64> {
        Ok(0)
    }
}
