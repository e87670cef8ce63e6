use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use super::{CredentialStore, StoreError};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
enum StoredValue {
    String(String),
    Int(i64),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredEntry {
    value: StoredValue,
    stored_at: DateTime<Utc>,
    /// Absent when the TTL runs past what `chrono` can represent
    #[serde(default)]
    expires_at: Option<DateTime<Utc>>,
}

impl StoredEntry {
    fn new(value: StoredValue, ttl: Duration) -> Self {
        let now = Utc::now();
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl));
        Self {
            value,
            stored_at: now,
            expires_at,
        }
    }

    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Utc::now() >= at)
    }
}

/// Credential store keeping one JSON file per entry in a directory.
///
/// Expiry is checked on read; expired files are removed when encountered.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Keys made of `[A-Za-z0-9_-]` map to their own file name; anything
    /// else is hashed so it cannot escape the directory.
    fn entry_path(&self, key: &str) -> PathBuf {
        let safe = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        let name = if safe {
            key.to_string()
        } else {
            hex::encode(Sha256::digest(key.as_bytes()))
        };
        self.dir.join(format!("{}.json", name))
    }

    async fn save(&self, key: &str, value: StoredValue, ttl: Duration) -> Result<(), StoreError> {
        let entry = StoredEntry::new(value, ttl);
        let contents = serde_json::to_string_pretty(&entry)?;
        tokio::fs::write(self.entry_path(key), contents).await?;
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<StoredValue, StoreError> {
        let path = self.entry_path(key);
        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound(key.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        let entry: StoredEntry = serde_json::from_str(&contents)?;

        if entry.is_expired() {
            debug!(key, "Removing expired credential entry");
            if let Err(e) = tokio::fs::remove_file(&path).await {
                debug!(key, error = %e, "Failed to remove expired credential entry");
            }
            return Err(StoreError::NotFound(key.to_string()));
        }

        Ok(entry.value)
    }
}

impl CredentialStore for FileStore {
    async fn set_string(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        self.save(key, StoredValue::String(value.to_string()), ttl).await
    }

    async fn set_int(&self, key: &str, value: i64, ttl: Duration) -> Result<(), StoreError> {
        self.save(key, StoredValue::Int(value), ttl).await
    }

    async fn get_string(&self, key: &str) -> Result<String, StoreError> {
        match self.load(key).await? {
            StoredValue::String(s) => Ok(s),
            StoredValue::Int(n) => Ok(n.to_string()),
        }
    }

    async fn get_int(&self, key: &str) -> Result<i64, StoreError> {
        match self.load(key).await? {
            StoredValue::Int(n) => Ok(n),
            StoredValue::String(s) => s
                .parse()
                .map_err(|_| StoreError::NotAnInteger(key.to_string())),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
