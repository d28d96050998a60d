//! HTTP transport for the shared tables service.
//!
//! Owns endpoint resolution, request headers, payload encoding, status
//! handling and the optional retry of the initial request. It knows nothing
//! about record framing: `/stream` responses are handed back as a raw
//! [`ByteStream`] paired with the [`CancellationToken`](tokio_util::sync::CancellationToken)
//! that aborts them.

pub mod client;
pub mod config;
pub mod error;
pub mod headers;
pub mod payload;
pub mod retry;
pub mod url;

pub use client::{ByteStream, StreamResponse, TablesHttpClient};
pub use config::TablesConfig;
pub use error::TransportError;
pub use headers::STREAM_RESPONSE_HEADERS;
pub use payload::QueryPayload;
pub use crate::url::{query_url, stream_url};
