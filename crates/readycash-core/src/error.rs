use reqwest::StatusCode;
use thiserror::Error;

use crate::auth::cipher::CipherError;
use crate::models::ErrorResponse;
use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Could not login to account (status {status}): {body}")]
    LoginFailed { status: u16, body: String },

    #[error("Credential store failure: {0}")]
    Storage(#[from] StoreError),

    #[error("PIN encryption failed: {0}")]
    Encryption(#[from] CipherError),

    #[error("Invalid Response Body")]
    EmptyResponse,

    #[error("Gateway error: {0}")]
    Remote(#[from] ErrorResponse),

    #[error("Session rejected by the gateway after logging in again: {0}")]
    SessionRevoked(String),

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl Error {
    /// Truncate a response body to avoid logging excessive data
    pub(crate) fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }

    /// Translate a non-success response body into an error.
    ///
    /// Structured gateway errors become `Remote`. A 403 whose body is not a
    /// structured error becomes `SessionRevoked`; any other unparseable body
    /// surfaces the parse failure.
    pub(crate) fn from_response(status: StatusCode, body: &str) -> Self {
        if body.trim().is_empty() {
            return Error::EmptyResponse;
        }
        match serde_json::from_str::<ErrorResponse>(body) {
            Ok(response) => Error::Remote(response),
            Err(_) if status == StatusCode::FORBIDDEN => {
                Error::SessionRevoked(Self::truncate_body(body))
            }
            Err(e) => Error::Decode(e),
        }
    }

    /// Status code carried by a gateway error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::LoginFailed { status, .. } => Some(*status),
            Error::Remote(response) => u16::try_from(response.status).ok(),
            Error::SessionRevoked(_) => Some(StatusCode::FORBIDDEN.as_u16()),
            Error::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
