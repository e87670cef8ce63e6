//! Credential stores for caching gateway sessions.
//!
//! The client persists each session field as its own entry with a TTL equal
//! to the account's session length. Any key/value store with per-entry
//! expiry can back it by implementing [`CredentialStore`].
//!
//! Provided backends:
//! - `MemoryStore`: in-process map, shared between clients via `Arc`
//! - `FileStore`: one JSON file per entry, survives process restarts

pub mod file;
pub mod memory;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

pub use file::FileStore;
pub use memory::MemoryStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Entry not found: {0}")]
    NotFound(String),

    #[error("Stored value for {0} is not an integer")]
    NotAnInteger(String),

    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Key/value persistence with per-entry TTL.
///
/// Reads of missing or expired keys return `StoreError::NotFound`. Keys are
/// never declared up front.
pub trait CredentialStore: Send + Sync {
    fn set_string(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn set_int(
        &self,
        key: &str,
        value: i64,
        ttl: Duration,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn get_string(&self, key: &str) -> impl Future<Output = Result<String, StoreError>> + Send;

    fn get_int(&self, key: &str) -> impl Future<Output = Result<i64, StoreError>> + Send;
}

impl<T: CredentialStore> CredentialStore for Arc<T> {
    fn set_string(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        (**self).set_string(key, value, ttl)
    }

    fn set_int(
        &self,
        key: &str,
        value: i64,
        ttl: Duration,
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        (**self).set_int(key, value, ttl)
    }

    fn get_string(&self, key: &str) -> impl Future<Output = Result<String, StoreError>> + Send {
        (**self).get_string(key)
    }

    fn get_int(&self, key: &str) -> impl Future<Output = Result<i64, StoreError>> + Send {
        (**self).get_int(key)
    }
}
