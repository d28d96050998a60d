use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TransportError;

/// Body of `/query` and `/stream` requests: SQL text plus positional bindings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryPayload {
    pub sql: String,
    #[serde(default)]
    pub bindings: Vec<Value>,
}

impl QueryPayload {
    pub fn new(sql: impl Into<String>, bindings: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            bindings,
        }
    }

    /// Raw SQL without bindings.
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::new(sql, Vec::new())
    }

    pub fn to_body(&self) -> Result<Vec<u8>, TransportError> {
        serde_json::to_vec(self).map_err(TransportError::PayloadEncode)
    }
}
