//! REST client for the ReadyCash agent gateway.
//!
//! `ApiClient` logs in with form-encoded credentials, caches the session in
//! a `CredentialStore`, and signs every request with the `Authorization` and
//! `X-SessionID` headers. A 403 from the gateway resets the session and the
//! operation is retried once after logging in again.

pub mod client;

pub use client::{
    ApiClient, ClientBuilder, BALANCE_PATH, LOGIN_PATH, TRANSACTIONS_PATH, USSD_CHECK_PATH,
    USSD_PATH,
};
