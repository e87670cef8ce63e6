//! Authentication building blocks for gateway sessions.
//!
//! This module provides:
//! - `Account`: the agent's login and PIN, validated up front
//! - `SessionState`: token, session id, encrypted PIN and expiry
//! - `CacheKeySet`: stable store keys for one account and endpoint
//! - `PinCipher`: protects the PIN under the current session id
//! - `AccountSecrets`: OS keychain storage for password and PIN
//!
//! Sessions are cached in a `CredentialStore` and expire after the
//! account's configured session length.

pub mod account;
pub mod cipher;
pub mod credentials;
pub mod keys;
pub mod session;

pub use account::Account;
pub use cipher::{ChaChaPinCipher, CipherError, PinCipher};
pub use credentials::{AccountSecrets, Secrets};
pub use keys::CacheKeySet;
pub use session::SessionState;
