use std::collections::BTreeMap;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::config::TablesConfig;
use crate::error::TransportError;

pub const HEADER_ACCEPT: &str = "accept";
pub const HEADER_CONTENT_TYPE: &str = "content-type";
pub const HEADER_USER_AGENT: &str = "user-agent";

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Headers for proxying a framed record stream as an HTTP response.
pub const STREAM_RESPONSE_HEADERS: [(&str, &str); 2] = [
    ("Content-Type", JSON_CONTENT_TYPE),
    ("Transfer-Encoding", "chunked"),
];

/// Build a deterministic header map for shared-table requests.
///
/// Extra headers are lower-cased and may override the defaults.
pub fn build_headers(config: &TablesConfig) -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();

    headers.insert(HEADER_CONTENT_TYPE.to_owned(), JSON_CONTENT_TYPE.to_owned());
    headers.insert(HEADER_ACCEPT.to_owned(), JSON_CONTENT_TYPE.to_owned());

    let user_agent = config
        .user_agent
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
        .unwrap_or_else(default_user_agent);
    headers.insert(HEADER_USER_AGENT.to_owned(), user_agent);

    for (key, value) in &config.extra_headers {
        let key = key.trim().to_ascii_lowercase();
        if key.is_empty() {
            continue;
        }
        headers.insert(key, value.trim().to_owned());
    }

    headers
}

/// Convert [`build_headers`] output into a `reqwest` header map.
pub fn to_header_map(headers: &BTreeMap<String, String>) -> Result<HeaderMap, TransportError> {
    let mut out = HeaderMap::with_capacity(headers.len());
    for (key, value) in headers {
        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|_| TransportError::InvalidHeader { name: key.clone() })?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| TransportError::InvalidHeader { name: key.clone() })?;
        out.insert(name, value);
    }
    Ok(out)
}

pub fn default_user_agent() -> String {
    format!("shared-tables-rs/{}", env!("CARGO_PKG_VERSION"))
}
