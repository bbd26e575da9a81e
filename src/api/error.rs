use serde_json::Value;
use thiserror::Error;

use crate::models::ValidationError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not logged in. Please log in first.")]
    NoSession,

    #[error("Session expired. Please log in again.")]
    Unauthorized,

    #[error("Not allowed: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{message} (HTTP {code})")]
    Status { code: u16, message: String },

    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Could not reach the server: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Could not read {path}: {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ApiError {
    /// True for the errors that end the session.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized | Self::NoSession)
    }
}

/// Map a non-2xx response to an error. The server's `error` or `message`
/// field wins over `fallback`.
pub(crate) fn error_for_status(code: u16, body: &str, fallback: &str) -> ApiError {
    let message = server_message(body).unwrap_or_else(|| fallback.to_string());
    match code {
        401 => ApiError::Unauthorized,
        403 => ApiError::Forbidden(message),
        404 => ApiError::NotFound(message),
        _ => ApiError::Status { code, message },
    }
}

fn server_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["error", "message", "msg"]
        .iter()
        .find_map(|key| value.get(key).and_then(Value::as_str))
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}
