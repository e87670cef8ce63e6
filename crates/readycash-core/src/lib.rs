//! Client library for the ReadyCash agent gateway.
//!
//! The gateway hands out short-lived sessions (a bearer token plus a session
//! id) and expects every transaction request to carry them. This crate keeps
//! those sessions in a pluggable [`CredentialStore`] so that several client
//! instances, or several runs of the same process, share one login. When the
//! gateway revokes a session mid-flight the affected operation logs in again
//! and is retried once.
//!
//! Modules:
//! - `api`: `ApiClient`, login protocol and request execution
//! - `auth`: accounts, session state, cache keys, PIN cipher, keychain secrets
//! - `store`: the `CredentialStore` seam plus in-memory and file backends
//! - `models`: typed gateway responses

pub mod api;
pub mod auth;
pub mod error;
pub mod models;
pub mod store;

pub use api::{ApiClient, ClientBuilder};
pub use auth::{Account, AccountSecrets, CacheKeySet, ChaChaPinCipher, PinCipher, SessionState};
pub use error::{Error, Result};
pub use store::{CredentialStore, FileStore, MemoryStore, StoreError};
