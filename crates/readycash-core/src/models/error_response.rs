use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured error body returned by the gateway on non-success statuses.
///
/// Field names arrive both camelCased and PascalCased depending on the
/// endpoint, so both spellings are accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("Code: {code}, Message: {message}, Status: {status}")]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    #[serde(default, alias = "Status")]
    pub status: i64,
    #[serde(default, alias = "Code")]
    pub code: i64,
    #[serde(default, alias = "Message")]
    pub message: String,
    #[serde(default, alias = "DeveloperMessage", skip_serializing_if = "Option::is_none")]
    pub developer_message: Option<String>,
}

impl ErrorResponse {
    pub fn new(status: i64, code: i64, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            developer_message: None,
        }
    }
}
