// Shared by several test binaries; not every helper is used by each.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use readycash_core::api::{BALANCE_PATH, LOGIN_PATH, TRANSACTIONS_PATH, USSD_CHECK_PATH, USSD_PATH};
use readycash_core::{Account, CredentialStore, MemoryStore, StoreError};
use serde_json::{json, Value};
use tokio::net::TcpListener;

pub const SESSION_LENGTH: Duration = Duration::from_secs(3600);

pub fn sample_account() -> Account {
    Account::new("sample", "password", "1234").with_session_length(SESSION_LENGTH)
}

// ============================================================================
// Stub gateway
// ============================================================================

/// In-process stand-in for the agent gateway that records what it sees.
#[derive(Default)]
pub struct Gateway {
    pub requests: AtomicUsize,
    pub logins: AtomicUsize,
    pub balance_calls: AtomicUsize,
    /// Authenticated calls still to be answered with 403
    pub forbidden_remaining: AtomicUsize,
    pub reject_login: AtomicBool,
    /// Answer logins with 200 but no Authorization header
    pub omit_token: AtomicBool,
    pub login_forms: Mutex<Vec<HashMap<String, String>>>,
    /// (Authorization, X-SessionID) of every authenticated call
    pub auth_headers: Mutex<Vec<(String, String)>>,
    pub content_types: Mutex<Vec<Option<String>>>,
    pub ussd_bodies: Mutex<Vec<Value>>,
    pub queries: Mutex<Vec<HashMap<String, String>>>,
}

impl Gateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn logins(&self) -> usize {
        self.logins.load(Ordering::SeqCst)
    }

    pub fn balance_calls(&self) -> usize {
        self.balance_calls.load(Ordering::SeqCst)
    }

    pub fn forbid_next(&self, calls: usize) {
        self.forbidden_remaining.store(calls, Ordering::SeqCst);
    }

    pub fn login_form(&self, index: usize) -> HashMap<String, String> {
        self.login_forms.lock().unwrap()[index].clone()
    }

    pub fn auth_header(&self, index: usize) -> (String, String) {
        self.auth_headers.lock().unwrap()[index].clone()
    }

    pub fn last_query(&self) -> HashMap<String, String> {
        self.queries.lock().unwrap().last().cloned().unwrap_or_default()
    }

    /// Count an authenticated call; returns a 403 response while any are queued.
    fn authenticated_call(&self, headers: &HeaderMap) -> Option<Response> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.auth_headers.lock().unwrap().push((
            header_str(headers, "authorization"),
            header_str(headers, "x-sessionid"),
        ));
        self.content_types
            .lock()
            .unwrap()
            .push(headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()).map(String::from));

        let forbidden = self
            .forbidden_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        forbidden.then(|| {
            (
                StatusCode::FORBIDDEN,
                Json(json!({"status": 403, "code": 403, "message": "Session expired"})),
            )
                .into_response()
        })
    }
}

fn header_str(headers: &HeaderMap, name: &str) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

pub fn ussd_payload(status: &str, completion_date: Option<i64>) -> Value {
    json!({
        "merchantRef": "0000000000011715",
        "transactionRef": "0000000000001070108",
        "ussdString": "*901*000*1111#",
        "amount": 1000,
        "responseCode": "09",
        "transactionDate": 1622307058834i64,
        "expiryDate": 1622307350001i64,
        "paymentRef": null,
        "completionDate": completion_date,
        "payerPhone": null,
        "paymentBank": null,
        "paymentNetwork": null,
        "paymentBankCode": null,
        "thirdParty": null,
        "status": status
    })
}

async fn login(State(gw): State<Arc<Gateway>>, Form(form): Form<HashMap<String, String>>) -> Response {
    gw.requests.fetch_add(1, Ordering::SeqCst);
    let attempt = gw.logins.fetch_add(1, Ordering::SeqCst) + 1;
    gw.login_forms.lock().unwrap().push(form);

    if gw.reject_login.load(Ordering::SeqCst) {
        return (StatusCode::UNAUTHORIZED, "invalid username or password").into_response();
    }

    // First login hands out session id 1234, the next 1235, and so on
    let session_id = (1233 + attempt).to_string();
    if gw.omit_token.load(Ordering::SeqCst) {
        return (
            StatusCode::OK,
            [(HeaderName::from_static("x-sessionid"), session_id)],
            Json(json!({"first_time": false})),
        )
            .into_response();
    }
    (
        StatusCode::OK,
        [
            (header::AUTHORIZATION, "Bearer Token".to_string()),
            (HeaderName::from_static("x-sessionid"), session_id),
        ],
        Json(json!({"first_time": false})),
    )
        .into_response()
}

async fn balance(State(gw): State<Arc<Gateway>>, headers: HeaderMap) -> Response {
    gw.balance_calls.fetch_add(1, Ordering::SeqCst);
    if let Some(rejected) = gw.authenticated_call(&headers) {
        return rejected;
    }
    Json(json!({"income": "5000.000000", "main": "1000.000000"})).into_response()
}

async fn generate_ussd(
    State(gw): State<Arc<Gateway>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Some(rejected) = gw.authenticated_call(&headers) {
        return rejected;
    }
    gw.ussd_bodies.lock().unwrap().push(body);
    (StatusCode::CREATED, Json(ussd_payload("AWAITING CUSTOMER", None))).into_response()
}

async fn check_ussd(
    State(gw): State<Arc<Gateway>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if let Some(rejected) = gw.authenticated_call(&headers) {
        return rejected;
    }
    let missing = query.get("senderRef").map(String::as_str) == Some("missing");
    gw.queries.lock().unwrap().push(query);
    if missing {
        return (StatusCode::NOT_FOUND, "no such transaction").into_response();
    }
    Json(ussd_payload("COMPLETED", Some(1622307100000))).into_response()
}

async fn transactions(
    State(gw): State<Arc<Gateway>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if let Some(rejected) = gw.authenticated_call(&headers) {
        return rejected;
    }
    let invalid = query.get("trantype").map(String::as_str) == Some("INVALID");
    gw.queries.lock().unwrap().push(query);
    if invalid {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "Status": 400,
                "Code": 91,
                "Message": "Invalid transaction type",
                "DeveloperMessage": "unknown trantype INVALID"
            })),
        )
            .into_response();
    }
    Json(json!([
        {
            "debit": false,
            "tranId": 101,
            "tranType": "420.00.010.0000",
            "description": "Deposit",
            "date": 1622307058834i64,
            "amount": 2500.0,
            "reciept": {"amount": 2500.0, "date": 1622307058834i64, "reference": "R-101", "recipient": "self"},
            "balance": 7500.0
        },
        {
            "debit": true,
            "tranId": 102,
            "tranType": "200.00.010.0000",
            "description": "Airtime",
            "date": 1622307158834i64,
            "amount": 100.0,
            "balance": 7400.0
        }
    ]))
    .into_response()
}

/// Serve the stub gateway on an ephemeral port and return its base URL.
pub async fn start_gateway(gateway: Arc<Gateway>) -> String {
    let app = Router::new()
        .route(LOGIN_PATH, post(login))
        .route(BALANCE_PATH, get(balance))
        .route(USSD_PATH, post(generate_ussd))
        .route(USSD_CHECK_PATH, get(check_ussd))
        .route(TRANSACTIONS_PATH, get(transactions))
        .with_state(gateway);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

// ============================================================================
// Recording store
// ============================================================================

/// Memory store that records writes, can fail the nth one, and can fail
/// every read of one key.
#[derive(Default)]
pub struct RecordingStore {
    pub inner: MemoryStore,
    writes: Mutex<Vec<String>>,
    fail_on_write: Option<usize>,
    unreadable_key: Option<String>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the `n`th write (1-based) with a backend error.
    pub fn failing_on(n: usize) -> Self {
        Self {
            fail_on_write: Some(n),
            ..Self::default()
        }
    }

    /// Reads of `key` fail with a backend error; writes still succeed.
    pub fn unreadable(key: &str) -> Self {
        Self {
            unreadable_key: Some(key.to_string()),
            ..Self::default()
        }
    }

    pub fn written_keys(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }

    fn record(&self, key: &str) -> Result<(), StoreError> {
        let mut writes = self.writes.lock().unwrap();
        writes.push(key.to_string());
        if Some(writes.len()) == self.fail_on_write {
            return Err(StoreError::Backend("disk full".to_string()));
        }
        Ok(())
    }

    fn check_read(&self, key: &str) -> Result<(), StoreError> {
        if self.unreadable_key.as_deref() == Some(key) {
            return Err(StoreError::Backend("connection reset".to_string()));
        }
        Ok(())
    }
}

impl CredentialStore for RecordingStore {
    async fn set_string(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        self.record(key)?;
        self.inner.set_string(key, value, ttl).await
    }

    async fn set_int(&self, key: &str, value: i64, ttl: Duration) -> Result<(), StoreError> {
        self.record(key)?;
        self.inner.set_int(key, value, ttl).await
    }

    async fn get_string(&self, key: &str) -> Result<String, StoreError> {
        self.check_read(key)?;
        self.inner.get_string(key).await
    }

    async fn get_int(&self, key: &str) -> Result<i64, StoreError> {
        self.check_read(key)?;
        self.inner.get_int(key).await
    }
}
