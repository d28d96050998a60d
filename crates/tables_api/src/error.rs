use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid origin URL '{origin}': {message}")]
    InvalidOrigin { origin: String, message: String },

    #[error("invalid header '{name}'")]
    InvalidHeader { name: String },

    #[error("JSON error while packaging payload: {0}")]
    PayloadEncode(#[source] serde_json::Error),

    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("no response within {0:?}")]
    Timeout(Duration),

    #[error("query failed with error status {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("query response error: failed to parse JSON response data: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("retry exhausted after max attempts (status: {}, last_error: {last_error:?})", display_status(.status))]
    RetryExhausted {
        status: Option<StatusCode>,
        last_error: Option<String>,
    },

    #[error("request was cancelled")]
    Cancelled,
}

impl TransportError {
    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::RetryExhausted { status, .. } => *status,
            Self::Request(error) => error.status(),
            _ => None,
        }
    }
}

fn display_status(status: &Option<StatusCode>) -> String {
    status
        .map(|status| status.as_u16().to_string())
        .unwrap_or_else(|| "n/a".to_owned())
}

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    error: Option<ErrorField>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorField {
    Message(String),
    Detailed { message: Option<String> },
}

/// Human-readable message for a failed response body.
///
/// Understands `{"error": "..."}`, `{"error": {"message": "..."}}` and
/// `{"message": "..."}`; otherwise falls back to the raw body, then to the
/// status reason phrase.
pub fn parse_error_message(status: StatusCode, body: &str) -> String {
    let from_payload = serde_json::from_str::<ErrorPayload>(body)
        .ok()
        .and_then(|payload| match payload.error {
            Some(ErrorField::Message(message)) => Some(message),
            Some(ErrorField::Detailed { message }) => message,
            None => payload.message,
        })
        .and_then(non_empty);
    if let Some(message) = from_payload {
        return message;
    }

    let body = body.trim();
    if body.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        body.to_string()
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}
