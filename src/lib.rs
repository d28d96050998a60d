//! Client for the shared tables service.
//!
//! [`TablesClient::run_query`] fetches a whole result set from `/query`;
//! [`TablesClient::stream_query`] reads `/stream` incrementally and hands back a
//! [`RecordStream`] of framed JSON array bytes. Both run rows through the
//! caller's [`Pipeline`] and camelize keys unless told otherwise.
//!
//! ```no_run
//! use spec_tables::{ethereum, QueryOptions, TablesClient, TablesConfig};
//!
//! # async fn demo() -> Result<(), spec_tables::TablesError> {
//! let client = TablesClient::new(TablesConfig::from_env())?;
//! let query = ethereum::blocks().where_eq("number", 17_000_000).limit(1);
//! let rows: serde_json::Value = client.run_query(&query, &QueryOptions::new()).await?;
//! # let _ = rows;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod options;
pub mod query;
pub mod transport;

pub use client::TablesClient;
pub use error::TablesError;
pub use options::QueryOptions;
pub use query::TableQuery;
pub use transport::{QueryTransport, UpstreamBody};

pub use query_builder::{ethereum, BuildError, NativeQuery, Order, Select};
pub use record_stream::{
    filter, from_async, map, try_map, CamelizeKeys, Outcome, Pipeline, RecordStream,
    RecordTransform, StreamCanceller, TransformError,
};
pub use tables_api::{
    QueryPayload, TablesConfig, TablesHttpClient, TransportError, STREAM_RESPONSE_HEADERS,
};
pub use tokio_util::sync::CancellationToken;
