use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use super::{CredentialStore, StoreError};

#[derive(Debug, Clone)]
enum Value {
    Text(String),
    Int(i64),
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    /// `None` when the TTL is too large to represent
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

/// In-process credential store. Expired entries read as missing and are
/// dropped on the next write.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) entries.
    pub async fn len(&self) -> usize {
        self.entries
            .read()
            .await
            .values()
            .filter(|e| !e.is_expired())
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn insert(&self, key: &str, value: Value, ttl: Duration) {
        let mut entries = self.entries.write().await;
        entries.retain(|_, e| !e.is_expired());
        entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Instant::now().checked_add(ttl),
            },
        );
    }

    async fn get(&self, key: &str) -> Result<Value, StoreError> {
        let entries = self.entries.read().await;
        match entries.get(key) {
            Some(entry) if !entry.is_expired() => Ok(entry.value.clone()),
            _ => Err(StoreError::NotFound(key.to_string())),
        }
    }
}

impl CredentialStore for MemoryStore {
    async fn set_string(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        self.insert(key, Value::Text(value.to_string()), ttl).await;
        Ok(())
    }

    async fn set_int(&self, key: &str, value: i64, ttl: Duration) -> Result<(), StoreError> {
        self.insert(key, Value::Int(value), ttl).await;
        Ok(())
    }

    async fn get_string(&self, key: &str) -> Result<String, StoreError> {
        match self.get(key).await? {
            Value::Text(s) => Ok(s),
            Value::Int(n) => Ok(n.to_string()),
        }
    }

    async fn get_int(&self, key: &str) -> Result<i64, StoreError> {
        match self.get(key).await? {
            Value::Int(n) => Ok(n),
            Value::Text(s) => s
                .parse()
                .map_err(|_| StoreError::NotAnInteger(key.to_string())),
        }
    }
}
