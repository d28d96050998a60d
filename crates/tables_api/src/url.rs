use url::Url;

use crate::config::DEFAULT_ORIGIN;
use crate::error::TransportError;

pub const QUERY_PATH: &str = "/query";
pub const STREAM_PATH: &str = "/stream";

/// Resolve `path` against `origin`, replacing whatever path the origin carries.
///
/// An empty origin resolves against [`DEFAULT_ORIGIN`].
pub fn endpoint_url(origin: &str, path: &str) -> Result<String, TransportError> {
    let origin = match origin.trim() {
        "" => DEFAULT_ORIGIN,
        trimmed => trimmed,
    };

    let mut url = Url::parse(origin).map_err(|error| TransportError::InvalidOrigin {
        origin: origin.to_string(),
        message: error.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(TransportError::InvalidOrigin {
            origin: origin.to_string(),
            message: "origin cannot carry a path".to_string(),
        });
    }

    url.set_path(path);
    url.set_query(None);
    url.set_fragment(None);
    Ok(url.to_string())
}

pub fn query_url(origin: &str) -> Result<String, TransportError> {
    endpoint_url(origin, QUERY_PATH)
}

pub fn stream_url(origin: &str) -> Result<String, TransportError> {
    endpoint_url(origin, STREAM_PATH)
}
