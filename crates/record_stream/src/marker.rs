//! The reserved `{"error": ...}` record shape.

use serde_json::{json, Value};
use thiserror::Error;

pub const ERROR_FIELD: &str = "error";

/// Upstream terminated the stream with an explicit error marker.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("stream terminated by upstream error: {message}")]
pub struct StreamProtocolError {
    pub message: String,
}

impl StreamProtocolError {
    /// Interpret `record` as an error marker, if it is one.
    pub fn from_record(record: &Value) -> Option<Self> {
        error_message(record).map(|message| Self { message })
    }
}

/// True for objects whose `error` field is present and truthy.
pub fn is_error_marker(record: &Value) -> bool {
    record
        .as_object()
        .and_then(|object| object.get(ERROR_FIELD))
        .is_some_and(is_truthy)
}

/// Message carried by an error marker. Non-string payloads are rendered as JSON.
pub fn error_message(record: &Value) -> Option<String> {
    if !is_error_marker(record) {
        return None;
    }
    match &record[ERROR_FIELD] {
        Value::String(message) => Some(message.clone()),
        other => Some(other.to_string()),
    }
}

/// Build the marker used for failures raised inside the pipeline.
pub fn error_marker(message: impl Into<String>) -> Value {
    let message: String = message.into();
    json!({ ERROR_FIELD: message })
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{error_marker, error_message, is_error_marker, StreamProtocolError};

    #[test]
    fn detects_error_markers() {
        assert!(is_error_marker(&json!({"error": "boom"})));
        assert!(is_error_marker(&json!({"error": {"code": 7}, "extra": 1})));
        assert!(!is_error_marker(&json!({"error": null})));
        assert!(!is_error_marker(&json!({"error": ""})));
        assert!(!is_error_marker(&json!({"error": false})));
        assert!(!is_error_marker(&json!({"errors": "x"})));
        assert!(!is_error_marker(&json!(["error"])));
        assert!(!is_error_marker(&json!("error")));
    }

    #[test]
    fn extracts_messages() {
        assert_eq!(error_message(&json!({"error": "boom"})).as_deref(), Some("boom"));
        assert_eq!(
            error_message(&json!({"error": {"code": 7}})).as_deref(),
            Some(r#"{"code":7}"#)
        );
        assert_eq!(error_message(&json!({"a": 1})), None);
        assert_eq!(
            StreamProtocolError::from_record(&error_marker("bad row")),
            Some(StreamProtocolError {
                message: "bad row".to_string()
            })
        );
    }
}
