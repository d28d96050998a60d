use std::sync::Arc;

use record_stream::{Outcome, Pipeline, RecordSession, RecordStream};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tables_api::{TablesConfig, TablesHttpClient};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::TablesError;
use crate::options::QueryOptions;
use crate::query::TableQuery;
use crate::transport::QueryTransport;

/// Client for the shared tables service.
///
/// Cheap to clone; clones share the transport. Sessions started from one
/// client are independent of each other.
#[derive(Debug)]
pub struct TablesClient<T = TablesHttpClient> {
    transport: Arc<T>,
}

impl<T> Clone for TablesClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
        }
    }
}

impl TablesClient<TablesHttpClient> {
    pub fn new(config: TablesConfig) -> Result<Self, TablesError> {
        Ok(Self::with_transport(TablesHttpClient::new(config)?))
    }

    /// Client configured from `SHARED_TABLES_*` environment variables.
    pub fn from_env() -> Result<Self, TablesError> {
        Self::new(TablesConfig::from_env())
    }
}

impl<T: QueryTransport> TablesClient<T> {
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport: Arc::new(transport),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Run `query` through `/query` and deserialize the transformed result.
    ///
    /// An array result is transformed element by element and filtered
    /// elements are removed. Any other result is transformed as one record
    /// and becomes `null` when filtered.
    pub async fn run_query<R, Q>(&self, query: &Q, options: &QueryOptions) -> Result<R, TablesError>
    where
        R: DeserializeOwned,
        Q: TableQuery + ?Sized,
    {
        self.run_query_with_cancellation(query, options, &CancellationToken::new())
            .await
    }

    /// [`run_query`](Self::run_query) that gives up with
    /// [`TransportError::Cancelled`](tables_api::TransportError::Cancelled)
    /// once `cancellation` fires before the response body is read.
    pub async fn run_query_with_cancellation<R, Q>(
        &self,
        query: &Q,
        options: &QueryOptions,
        cancellation: &CancellationToken,
    ) -> Result<R, TablesError>
    where
        R: DeserializeOwned,
        Q: TableQuery + ?Sized,
    {
        let payload = query.to_payload()?;
        debug!(
            sql = %payload.sql,
            bindings = payload.bindings.len(),
            "running shared tables query"
        );

        let result = self.transport.query(&payload, cancellation).await?;
        let result = transform_result(&options.effective_pipeline(), result).await?;
        serde_json::from_value(result).map_err(TablesError::Decode)
    }

    /// Run `query` through `/stream` and re-frame the rows as one JSON array.
    ///
    /// Fails before streaming when the query cannot be built or the request is
    /// rejected. Once the stream is returned, failures arrive in-band as a
    /// final `{"error": ...}` element.
    pub async fn stream_query<Q>(
        &self,
        query: &Q,
        options: &QueryOptions,
    ) -> Result<RecordStream, TablesError>
    where
        Q: TableQuery + ?Sized,
    {
        let payload = query.to_payload()?;
        debug!(
            sql = %payload.sql,
            bindings = payload.bindings.len(),
            "opening shared tables stream"
        );

        let abort = CancellationToken::new();
        let upstream = self.transport.open_stream(&payload, abort.clone()).await?;
        let session = RecordSession::new(upstream, abort, options.effective_pipeline());
        Ok(session.into_stream())
    }
}

async fn transform_result(pipeline: &Pipeline, result: Value) -> Result<Value, TablesError> {
    if pipeline.is_empty() {
        return Ok(result);
    }

    match result {
        Value::Array(records) => {
            let mut kept = Vec::with_capacity(records.len());
            for record in records {
                if let Outcome::Record(record) = pipeline.apply(record).await? {
                    kept.push(record);
                }
            }
            Ok(Value::Array(kept))
        }
        single => Ok(pipeline.apply(single).await?.into_record().unwrap_or(Value::Null)),
    }
}
