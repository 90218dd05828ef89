use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::DurableStore;
use crate::error::AppResult;

#[derive(Debug, Default)]
struct HashRecord {
    fields: HashMap<String, String>,
    expires_at: Option<DateTime<Utc>>,
}

impl HashRecord {
    fn expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(at) if at <= now)
    }
}

/// In-memory store with timestamp-based expiry. Used by the tests as the
/// substitutable fake and usable as a single-process fallback; state does not
/// survive a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, HashRecord>>,
    queues: RwLock<HashMap<String, VecDeque<String>>>,
    logs: RwLock<HashMap<String, Vec<(i64, String)>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DurableStore for MemoryStore {
    async fn hash_set(&self, key: &str, field: &str, value: &str) -> AppResult<()> {
        let mut records = self.records.write().await;
        records
            .entry(key.to_string())
            .or_default()
            .fields
            .insert(field.to_string(), value.to_string());
        Ok(())
    }

    async fn hash_get(&self, key: &str, field: &str) -> AppResult<Option<String>> {
        let now = Utc::now();
        let mut records = self.records.write().await;
        match records.get(key) {
            Some(record) if record.expired(now) => {
                records.remove(key);
                Ok(None)
            }
            Some(record) => Ok(record.fields.get(field).cloned()),
            None => Ok(None),
        }
    }

    async fn hash_get_all(&self, key: &str) -> AppResult<HashMap<String, String>> {
        let now = Utc::now();
        let mut records = self.records.write().await;
        match records.get(key) {
            Some(record) if record.expired(now) => {
                records.remove(key);
                Ok(HashMap::new())
            }
            Some(record) => Ok(record.fields.clone()),
            None => Ok(HashMap::new()),
        }
    }

    async fn expire(&self, key: &str, ttl: Duration) -> AppResult<()> {
        let mut records = self.records.write().await;
        if let Some(record) = records.get_mut(key) {
            record.expires_at =
                Some(Utc::now() + chrono::Duration::from_std(ttl).unwrap_or_default());
        }
        Ok(())
    }

    async fn queue_push(&self, key: &str, value: &str) -> AppResult<()> {
        let mut queues = self.queues.write().await;
        queues
            .entry(key.to_string())
            .or_default()
            .push_back(value.to_string());
        Ok(())
    }

    async fn queue_pop(&self, key: &str) -> AppResult<Option<String>> {
        let mut queues = self.queues.write().await;
        Ok(queues.get_mut(key).and_then(|queue| queue.pop_front()))
    }

    async fn log_append(&self, key: &str, score: i64, value: &str) -> AppResult<()> {
        let mut logs = self.logs.write().await;
        logs.entry(key.to_string())
            .or_default()
            .push((score, value.to_string()));
        Ok(())
    }

    async fn log_entries(&self, key: &str) -> AppResult<Vec<String>> {
        let logs = self.logs.read().await;
        let mut entries = logs.get(key).cloned().unwrap_or_default();
        entries.sort_by_key(|(score, _)| *score);
        Ok(entries.into_iter().map(|(_, value)| value).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_set_then_get_all_returns_fields() {
        let store = MemoryStore::new();
        store.hash_set("req:1", "status", "0").await.unwrap();
        store.hash_set("req:1", "signer", "addr").await.unwrap();

        let record = store.hash_get_all("req:1").await.unwrap();
        assert_eq!(record.get("status").map(String::as_str), Some("0"));
        assert_eq!(record.get("signer").map(String::as_str), Some("addr"));
    }

    #[tokio::test]
    async fn expired_record_reads_as_absent() {
        let store = MemoryStore::new();
        store.hash_set("req:1", "status", "0").await.unwrap();
        store.expire("req:1", Duration::from_secs(0)).await.unwrap();

        assert!(store.hash_get_all("req:1").await.unwrap().is_empty());
        assert_eq!(store.hash_get("req:1", "status").await.unwrap(), None);
    }

    #[tokio::test]
    async fn queue_is_fifo() {
        let store = MemoryStore::new();
        store.queue_push("q", "a").await.unwrap();
        store.queue_push("q", "b").await.unwrap();

        assert_eq!(store.queue_pop("q").await.unwrap().as_deref(), Some("a"));
        assert_eq!(store.queue_pop("q").await.unwrap().as_deref(), Some("b"));
        assert_eq!(store.queue_pop("q").await.unwrap(), None);
    }

    #[tokio::test]
    async fn set_field_does_not_reset_expiry() {
        let store = MemoryStore::new();
        store.hash_set("req:1", "status", "0").await.unwrap();
        store.expire("req:1", Duration::from_secs(0)).await.unwrap();
        store.hash_set("req:1", "status", "1").await.unwrap();

        // The update landed on the old record; the expiry is still in force.
        assert!(store.hash_get_all("req:1").await.unwrap().is_empty());
    }
}
