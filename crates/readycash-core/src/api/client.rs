//! API client for the ReadyCash agent gateway.
//!
//! Every operation follows the same template: make sure a valid session is
//! available (hydrating it from the credential store or logging in), sign
//! the request with the session headers, and decode the response. A 403
//! means the gateway revoked the session; the client clears it and runs the
//! whole operation once more.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::auth::{Account, CacheKeySet, ChaChaPinCipher, PinCipher, SessionState};
use crate::error::{Error, Result};
use crate::models::{Balance, TransactionQuery, UssdTransaction, WalletTransaction};
use crate::store::CredentialStore;

// ============================================================================
// Constants
// ============================================================================

pub const LOGIN_PATH: &str = "/rc/rest/agent/login";
pub const BALANCE_PATH: &str = "/rc/rest/agent/balance";
pub const USSD_PATH: &str = "/rc/rest/agent/transact/ussd/cashout";
pub const USSD_CHECK_PATH: &str = "/rc/rest/agent/transact/ussd/cashout/check";
pub const TRANSACTIONS_PATH: &str = "/rc/rest/agent/tranlist";

/// Session id header, sent by the gateway on login and echoed on requests
const SESSION_ID_HEADER: HeaderName = HeaderName::from_static("x-sessionid");

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Number of times an operation is re-run after the gateway rejects its session.
const MAX_SESSION_RETRIES: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Hydration {
    /// Read cached fields from the store before checking validity
    FromStore,
    /// The cached session was just rejected by the gateway
    Skip,
}

fn is_success(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::OK | StatusCode::CREATED | StatusCode::ACCEPTED
    )
}

fn header_string(headers: &HeaderMap, name: &HeaderName) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Trim trailing slashes and check the URL parses.
fn normalize_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    let url = Url::parse(trimmed)
        .map_err(|e| Error::Configuration(format!("invalid base URL {:?}: {}", raw, e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::Configuration(format!(
            "base URL must use http or https: {}",
            raw
        )));
    }
    Ok(trimmed.to_string())
}

// ============================================================================
// Builder
// ============================================================================

pub struct ClientBuilder<S, C = ChaChaPinCipher> {
    base_url: String,
    account: Account,
    store: S,
    cipher: C,
    http: Option<Client>,
    timeout: Duration,
}

impl<S: CredentialStore> ClientBuilder<S> {
    pub fn new(base_url: impl Into<String>, account: Account, store: S) -> Self {
        Self {
            base_url: base_url.into(),
            account,
            store,
            cipher: ChaChaPinCipher::default(),
            http: None,
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
        }
    }
}

impl<S: CredentialStore, C: PinCipher> ClientBuilder<S, C> {
    /// Use an existing HTTP client. The request timeout is then the client's own.
    pub fn http_client(mut self, client: Client) -> Self {
        self.http = Some(client);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Replace the PIN cipher.
    pub fn cipher<D: PinCipher>(self, cipher: D) -> ClientBuilder<S, D> {
        ClientBuilder {
            base_url: self.base_url,
            account: self.account,
            store: self.store,
            cipher,
            http: self.http,
            timeout: self.timeout,
        }
    }

    /// Validate the account and base URL and create the client.
    ///
    /// No request is made until the first operation.
    pub fn build(self) -> Result<ApiClient<S, C>> {
        self.account.validate()?;
        let base_url = normalize_base_url(&self.base_url)?;

        let http = match self.http {
            Some(client) => client,
            None => Client::builder().timeout(self.timeout).build()?,
        };
        let keys = CacheKeySet::derive(&base_url, LOGIN_PATH, &self.account.username);

        Ok(ApiClient {
            http,
            base_url,
            account: self.account,
            keys,
            store: self.store,
            cipher: self.cipher,
            session: RwLock::new(SessionState::default()),
        })
    }
}

// ============================================================================
// Client
// ============================================================================

/// Gateway client for one agent account.
///
/// Operations take `&self` and may run concurrently; they share the session
/// behind a lock. Two operations can race to log in, in which case the later
/// login wins in the store.
pub struct ApiClient<S, C = ChaChaPinCipher> {
    http: Client,
    base_url: String,
    account: Account,
    keys: CacheKeySet,
    store: S,
    cipher: C,
    session: RwLock<SessionState>,
}

impl<S: CredentialStore> ApiClient<S> {
    /// Create a client with the default cipher and HTTP settings
    pub fn new(base_url: impl Into<String>, account: Account, store: S) -> Result<Self> {
        ClientBuilder::new(base_url, account, store).build()
    }

    pub fn builder(base_url: impl Into<String>, account: Account, store: S) -> ClientBuilder<S> {
        ClientBuilder::new(base_url, account, store)
    }
}

impl<S: CredentialStore, C: PinCipher> ApiClient<S, C> {
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn username(&self) -> &str {
        &self.account.username
    }

    pub fn cache_keys(&self) -> &CacheKeySet {
        &self.keys
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Snapshot of the in-memory session.
    pub async fn session(&self) -> SessionState {
        self.session.read().await.clone()
    }

    // ===== Authentication =====

    /// Make sure a valid session is available, logging in if needed.
    pub async fn ensure_authenticated(&self) -> Result<()> {
        self.authenticate(Hydration::FromStore).await
    }

    async fn authenticate(&self, hydration: Hydration) -> Result<()> {
        if hydration == Hydration::FromStore {
            self.hydrate().await;
        }
        if self.session.read().await.is_valid() {
            debug!(username = %self.account.username, "Using cached gateway session");
            return Ok(());
        }
        self.login().await
    }

    /// Best-effort load of the cached session. Fields the store cannot
    /// provide keep their in-memory value.
    async fn hydrate(&self) {
        let token = self.read_string(&self.keys.token).await;
        let session_id = self.read_string(&self.keys.session_id).await;
        let encrypted_pin = self.read_string(&self.keys.encrypted_pin).await;
        let expires_at = self.read_expiry().await;

        let mut session = self.session.write().await;
        if let Some(token) = token {
            session.token = token;
        }
        if let Some(session_id) = session_id {
            session.session_id = session_id;
        }
        if let Some(encrypted_pin) = encrypted_pin {
            session.encrypted_pin = encrypted_pin;
        }
        if let Some(expires_at) = expires_at {
            session.expires_at = Some(expires_at);
        }
    }

    async fn read_string(&self, key: &str) -> Option<String> {
        match self.store.get_string(key).await {
            Ok(value) if !value.is_empty() => Some(value),
            Ok(_) => None,
            Err(e) => {
                debug!(key, error = %e, "Cached session field unavailable");
                None
            }
        }
    }

    async fn read_expiry(&self) -> Option<DateTime<Utc>> {
        match self.store.get_int(&self.keys.expiration).await {
            Ok(secs) if secs > 0 => DateTime::from_timestamp(secs, 0),
            Ok(_) => None,
            Err(e) => {
                debug!(key = %self.keys.expiration, error = %e, "Cached session field unavailable");
                None
            }
        }
    }

    async fn login(&self) -> Result<()> {
        let url = self.endpoint(LOGIN_PATH, &[])?;
        let session_length = self.account.session_length_secs();
        let session_length_field = session_length.to_string();
        let form = [
            ("userName", self.account.username.as_str()),
            ("password", self.account.password.as_str()),
            ("sessionLength", session_length_field.as_str()),
        ];

        debug!(url = %url, username = %self.account.username, "Logging in to gateway");
        let response = self.http.post(url).form(&form).send().await?;

        let status = response.status();
        let token = header_string(response.headers(), &header::AUTHORIZATION);
        let session_id = header_string(response.headers(), &SESSION_ID_HEADER);
        let body = response.text().await?;

        if !is_success(status) {
            warn!(status = status.as_u16(), username = %self.account.username, "Gateway login failed");
            return Err(Error::LoginFailed {
                status: status.as_u16(),
                body: Error::truncate_body(&body),
            });
        }
        if token.is_empty() || session_id.is_empty() {
            warn!(status = status.as_u16(), username = %self.account.username, "Gateway login response lacks session headers");
            return Err(Error::LoginFailed {
                status: status.as_u16(),
                body: format!(
                    "response is missing the {} header",
                    if token.is_empty() { "Authorization" } else { "X-SessionID" }
                ),
            });
        }

        let expires_at = chrono::Duration::from_std(Duration::from_secs(session_length))
            .ok()
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
            .ok_or_else(|| {
                Error::Configuration(format!("session length out of range: {}s", session_length))
            })?;

        let mut fresh = SessionState {
            token,
            session_id,
            encrypted_pin: String::new(),
            expires_at: Some(expires_at),
        };
        // The PIN key is the session id, so the ciphertext changes every login
        let key = fresh.session_id.clone();
        fresh.set_pin(&self.account.pin, &key, &self.cipher)?;

        self.persist(&fresh).await?;

        info!(username = %self.account.username, expires_at = %expires_at, "Logged in to gateway");
        *self.session.write().await = fresh;
        Ok(())
    }

    /// Write the session to the store. The first failing write aborts and
    /// later fields are left untouched.
    async fn persist(&self, session: &SessionState) -> Result<()> {
        let ttl = Duration::from_secs(self.account.session_length_secs());
        let expires_at = session.expires_at.map(|t| t.timestamp()).unwrap_or_default();

        self.store.set_string(&self.keys.token, &session.token, ttl).await?;
        self.store.set_string(&self.keys.session_id, &session.session_id, ttl).await?;
        self.store.set_string(&self.keys.encrypted_pin, &session.encrypted_pin, ttl).await?;
        self.store.set_int(&self.keys.expiration, expires_at, ttl).await?;
        Ok(())
    }

    // ===== Request execution =====

    async fn auth_headers(&self) -> Result<HeaderMap> {
        let session = self.session.read().await;
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(&session.token)?);
        headers.insert(SESSION_ID_HEADER, HeaderValue::from_str(&session.session_id)?);
        Ok(headers)
    }

    /// Run one authenticated operation, re-running it once if the gateway
    /// rejects the session.
    ///
    /// Everything logged on the way, including hydration and login, sits in
    /// a `gateway_operation` span carrying the operation name.
    async fn execute<T, F>(&self, operation: &'static str, build: F) -> Result<T>
    where
        T: DeserializeOwned,
        F: Fn() -> RequestBuilder,
    {
        self.run_with_retry(build)
            .instrument(info_span!("gateway_operation", operation))
            .await
    }

    async fn run_with_retry<T, F>(&self, build: F) -> Result<T>
    where
        T: DeserializeOwned,
        F: Fn() -> RequestBuilder,
    {
        let mut hydration = Hydration::FromStore;
        let mut retries = 0;

        loop {
            self.authenticate(hydration).await?;

            let response = build().headers(self.auth_headers().await?).send().await?;
            let status = response.status();
            let body = response.text().await?;
            debug!(status = status.as_u16(), "Gateway responded");

            if status == StatusCode::FORBIDDEN && retries < MAX_SESSION_RETRIES {
                warn!("Gateway rejected session, logging in again");
                self.session.write().await.reset();
                retries += 1;
                hydration = Hydration::Skip;
                continue;
            }

            if !is_success(status) {
                warn!(status = status.as_u16(), "Gateway request failed");
                return Err(Error::from_response(status, &body));
            }
            if body.trim().is_empty() {
                warn!("Gateway returned an empty body");
                return Err(Error::EmptyResponse);
            }
            return Ok(serde_json::from_str(&body)?);
        }
    }

    fn endpoint(&self, path: &str, query: &[(&str, String)]) -> Result<Url> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| Error::Configuration(format!("invalid endpoint {}: {}", path, e)))?;
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    // ===== Operations =====

    /// Fetch the agent's wallet balances
    pub async fn balance(&self) -> Result<Balance> {
        let url = self.endpoint(BALANCE_PATH, &[])?;
        self.execute("balance", || self.http.get(url.clone())).await
    }

    /// Generate a USSD code the payer dials to deposit `amount` from their bank
    pub async fn generate_ussd(
        &self,
        reference: &str,
        amount: f64,
        bank_code: &str,
    ) -> Result<UssdTransaction> {
        let url = self.endpoint(USSD_PATH, &[])?;
        let payload = serde_json::json!({
            "amount": amount,
            "bankCode": bank_code,
            "ref": reference,
        });

        let mut transaction: UssdTransaction = self
            .execute("generate_ussd", || self.http.post(url.clone()).json(&payload))
            .await?;
        transaction.user_defined_reference = reference.to_string();
        Ok(transaction)
    }

    /// Look up a USSD transaction by the caller's reference
    pub async fn fetch_ussd_transaction(&self, reference: &str) -> Result<UssdTransaction> {
        let url = self.endpoint(USSD_CHECK_PATH, &[("senderRef", reference.to_string())])?;

        let mut transaction: UssdTransaction = self
            .execute("fetch_ussd_transaction", || self.http.get(url.clone()))
            .await?;
        transaction.user_defined_reference = reference.to_string();
        Ok(transaction)
    }

    /// Fetch the wallet's transaction history
    pub async fn fetch_transactions(&self, query: &TransactionQuery) -> Result<Vec<WalletTransaction>> {
        let url = self.endpoint(TRANSACTIONS_PATH, &query.to_query_pairs())?;

        let transactions: Option<Vec<WalletTransaction>> = self
            .execute("fetch_transactions", || self.http.get(url.clone()))
            .await?;
        Ok(transactions.unwrap_or_default())
    }
}
