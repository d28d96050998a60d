use std::fmt;
use std::future::Future;

use bytes::Bytes;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::TablesConfig;
use crate::error::{parse_error_message, TransportError};
use crate::headers::{build_headers, to_header_map};
use crate::payload::QueryPayload;
use crate::retry::{is_retryable_http_error, retry_delay};
use crate::url::{query_url, stream_url};

/// Raw chunked response body.
pub type ByteStream = BoxStream<'static, Result<Bytes, reqwest::Error>>;

/// An accepted `/stream` response: the body plus the token that aborts it.
///
/// The body ends as soon as `abort` is cancelled; dropping it closes the
/// underlying connection.
pub struct StreamResponse {
    pub status: StatusCode,
    pub body: ByteStream,
    pub abort: CancellationToken,
}

impl fmt::Debug for StreamResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamResponse")
            .field("status", &self.status)
            .field("aborted", &self.abort.is_cancelled())
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub struct TablesHttpClient {
    http: Client,
    config: TablesConfig,
    query_url: String,
    stream_url: String,
}

impl TablesHttpClient {
    pub fn new(config: TablesConfig) -> Result<Self, TransportError> {
        let query_url = query_url(&config.origin)?;
        let stream_url = stream_url(&config.origin)?;

        let http = Client::builder().build()?;

        Ok(Self {
            http,
            config,
            query_url,
            stream_url,
        })
    }

    pub fn config(&self) -> &TablesConfig {
        &self.config
    }

    pub fn query_url(&self) -> &str {
        &self.query_url
    }

    pub fn stream_url(&self) -> &str {
        &self.stream_url
    }

    pub fn build_request(
        &self,
        url: &str,
        payload: &QueryPayload,
    ) -> Result<RequestBuilder, TransportError> {
        let body = payload.to_body()?;
        let headers = to_header_map(&build_headers(&self.config))?;
        Ok(self.http.post(url).headers(headers).body(body))
    }

    /// POST `payload` to `url` and wait for a `200 OK` response.
    ///
    /// Transient failures are retried up to `max_retries` times. Any other
    /// status fails with [`TransportError::Status`]. The configured timeout
    /// bounds each attempt until response headers arrive, never the body.
    pub async fn send_with_retry(
        &self,
        url: &str,
        payload: &QueryPayload,
        cancellation: &CancellationToken,
    ) -> Result<Response, TransportError> {
        let max_retries = self.config.max_retries;
        let mut last_status = None;
        let mut last_error = None;

        for attempt in 0..=max_retries {
            if cancellation.is_cancelled() {
                return Err(TransportError::Cancelled);
            }

            debug!(url, attempt, "sending shared tables request");
            let request = self.build_request(url, payload)?;
            let response = await_or_cancel(self.send_once(request), cancellation).await?;

            match response {
                Ok(response) => {
                    let status = response.status();
                    if status == StatusCode::OK {
                        return Ok(response);
                    }

                    let body = await_or_cancel(response.text(), cancellation)
                        .await?
                        .unwrap_or_default();
                    let message = parse_error_message(status, &body);

                    if attempt < max_retries && is_retryable_http_error(status.as_u16(), &body) {
                        warn!(%status, attempt, "retrying shared tables request");
                        last_status = Some(status);
                        last_error = Some(message);
                        await_or_cancel(tokio::time::sleep(retry_delay(attempt)), cancellation)
                            .await?;
                        continue;
                    }

                    return Err(TransportError::Status { status, message });
                }
                Err(error) => {
                    if attempt < max_retries {
                        warn!(%error, attempt, "retrying shared tables request");
                        last_error = Some(error.to_string());
                        await_or_cancel(tokio::time::sleep(retry_delay(attempt)), cancellation)
                            .await?;
                        continue;
                    }
                    if max_retries == 0 {
                        return Err(error);
                    }
                    return Err(TransportError::RetryExhausted {
                        status: last_status,
                        last_error: Some(error.to_string()),
                    });
                }
            }
        }

        Err(TransportError::RetryExhausted {
            status: last_status,
            last_error,
        })
    }

    async fn send_once(&self, request: RequestBuilder) -> Result<Response, TransportError> {
        let Some(limit) = self.config.timeout else {
            return Ok(request.send().await?);
        };
        match tokio::time::timeout(limit, request.send()).await {
            Ok(response) => Ok(response?),
            Err(_) => Err(TransportError::Timeout(limit)),
        }
    }

    /// Run a `/query` request and parse the whole JSON body.
    pub async fn query(
        &self,
        payload: &QueryPayload,
        cancellation: &CancellationToken,
    ) -> Result<Value, TransportError> {
        let response = self
            .send_with_retry(&self.query_url, payload, cancellation)
            .await?;
        let body = await_or_cancel(response.bytes(), cancellation).await??;
        serde_json::from_slice(&body).map_err(TransportError::Decode)
    }

    /// Open a `/stream` request. Fails before any body byte is consumed when
    /// the request cannot be issued or the status is not `200 OK`.
    pub async fn open_stream(
        &self,
        payload: &QueryPayload,
        abort: CancellationToken,
    ) -> Result<StreamResponse, TransportError> {
        let response = self
            .send_with_retry(&self.stream_url, payload, &abort)
            .await?;
        let status = response.status();
        debug!(%status, "shared tables stream opened");

        let body = response
            .bytes_stream()
            .take_until(abort.clone().cancelled_owned())
            .boxed();

        Ok(StreamResponse {
            status,
            body,
            abort,
        })
    }
}

async fn await_or_cancel<F>(
    future: F,
    cancellation: &CancellationToken,
) -> Result<F::Output, TransportError>
where
    F: Future,
{
    tokio::select! {
        biased;
        _ = cancellation.cancelled() => Err(TransportError::Cancelled),
        output = future => Ok(output),
    }
}
