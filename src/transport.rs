use bytes::Bytes;
use futures_util::future::BoxFuture;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use serde_json::Value;
use tables_api::{QueryPayload, TablesHttpClient, TransportError};
use tokio_util::sync::CancellationToken;

/// Raw `/stream` body as seen by a record session.
pub type UpstreamBody = BoxStream<'static, Result<Bytes, TransportError>>;

/// Request side of the tables service.
///
/// [`TablesHttpClient`] is the production implementation; tests substitute
/// in-memory transports.
pub trait QueryTransport: Send + Sync + 'static {
    /// Run a `/query` request and return its parsed JSON body.
    fn query<'a>(
        &'a self,
        payload: &'a QueryPayload,
        cancellation: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<Value, TransportError>>;

    /// Open a `/stream` request. The returned body must end once `abort`
    /// is cancelled.
    fn open_stream<'a>(
        &'a self,
        payload: &'a QueryPayload,
        abort: CancellationToken,
    ) -> BoxFuture<'a, Result<UpstreamBody, TransportError>>;
}

impl QueryTransport for TablesHttpClient {
    fn query<'a>(
        &'a self,
        payload: &'a QueryPayload,
        cancellation: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<Value, TransportError>> {
        Box::pin(TablesHttpClient::query(self, payload, cancellation))
    }

    fn open_stream<'a>(
        &'a self,
        payload: &'a QueryPayload,
        abort: CancellationToken,
    ) -> BoxFuture<'a, Result<UpstreamBody, TransportError>> {
        Box::pin(async move {
            let response = TablesHttpClient::open_stream(self, payload, abort).await?;
            let body: UpstreamBody = response
                .body
                .map(|chunk| chunk.map_err(TransportError::Request))
                .boxed();
            Ok::<_, TransportError>(body)
        })
    }
}
