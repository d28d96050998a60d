use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_util::stream::{self, BoxStream, Stream, StreamExt};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::completion::{CompletionCoordinator, SessionPhase, Termination, TerminationKind};
use crate::decoder::JsonRecordDecoder;
use crate::marker::{error_message, is_error_marker};
use crate::transform::{Outcome, Pipeline};

/// One streaming query: upstream bytes in, one framed JSON array out.
///
/// The session is pull-driven. Each [`next_frame`](Self::next_frame) call
/// first drains values already buffered in the decoder and only then reads the
/// next upstream chunk, so at most one chunk plus one record is in flight.
/// The abort token is checked at every chunk and record boundary and raced
/// against every suspension.
pub struct RecordSession<S> {
    upstream: Option<S>,
    abort: CancellationToken,
    pipeline: Arc<Pipeline>,
    decoder: JsonRecordDecoder,
    completion: CompletionCoordinator,
    input_ended: bool,
    chunks_read: u64,
}

impl<S, E> RecordSession<S>
where
    S: Stream<Item = Result<Bytes, E>> + Send + Unpin + 'static,
    E: fmt::Display + Send + 'static,
{
    pub fn new(upstream: S, abort: CancellationToken, pipeline: Arc<Pipeline>) -> Self {
        Self {
            upstream: Some(upstream),
            abort,
            pipeline,
            decoder: JsonRecordDecoder::new(),
            completion: CompletionCoordinator::new(),
            input_ended: false,
            chunks_read: 0,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.completion.phase()
    }

    pub fn termination(&self) -> Option<TerminationKind> {
        self.completion.termination()
    }

    pub fn emitted_count(&self) -> usize {
        self.completion.emitted_count()
    }

    /// Next piece of framed output, or `None` once the session is closed.
    pub async fn next_frame(&mut self) -> Option<Bytes> {
        loop {
            match self.completion.phase() {
                SessionPhase::Closed => return None,
                SessionPhase::Draining => {
                    self.completion.close();
                    debug!(chunks = self.chunks_read, "record session closed");
                    return None;
                }
                SessionPhase::Pending | SessionPhase::Streaming => {}
            }

            if self.abort.is_cancelled() {
                self.cancel();
                continue;
            }

            if let Some(decoded) = self.decoder.next_value() {
                let frame = match decoded {
                    Ok(record) => self.process(record).await,
                    Err(error) => {
                        warn!(%error, "record stream decode failed");
                        self.finish(Termination::DecodeFailed(error))
                    }
                };
                if frame.is_some() {
                    return frame;
                }
                continue;
            }

            if self.input_ended {
                if let Some(frame) = self.finish(Termination::EndOfInput) {
                    return Some(frame);
                }
                continue;
            }

            if let Some(frame) = self.pull_chunk().await {
                return Some(frame);
            }
        }
    }

    async fn process(&mut self, record: Value) -> Option<Bytes> {
        if is_error_marker(&record) {
            warn!(
                error = %error_message(&record).unwrap_or_default(),
                "upstream sent error marker"
            );
            return self.finish(Termination::ErrorMarker(record));
        }

        let pipeline = Arc::clone(&self.pipeline);
        let abort = self.abort.clone();
        let outcome = tokio::select! {
            biased;
            _ = abort.cancelled() => None,
            outcome = pipeline.apply(record) => Some(outcome),
        };

        match outcome {
            None => {
                self.cancel();
                None
            }
            Some(Ok(Outcome::Record(record))) => self.completion.record(&record),
            Some(Ok(Outcome::Filtered)) => None,
            Some(Err(error)) => {
                warn!(%error, "record transform failed");
                self.finish(Termination::TransformFailed(error))
            }
        }
    }

    async fn pull_chunk(&mut self) -> Option<Bytes> {
        let Some(upstream) = self.upstream.as_mut() else {
            self.end_input();
            return None;
        };

        let abort = self.abort.clone();
        let next = tokio::select! {
            biased;
            _ = abort.cancelled() => None,
            chunk = upstream.next() => Some(chunk),
        };

        match next {
            None => {
                self.cancel();
                None
            }
            Some(None) => {
                debug!(chunks = self.chunks_read, "upstream reached end of input");
                self.end_input();
                None
            }
            Some(Some(Ok(chunk))) => {
                if !chunk.is_empty() {
                    self.completion.mark_streaming();
                    self.chunks_read += 1;
                    self.decoder.feed(&chunk);
                }
                None
            }
            Some(Some(Err(error))) => {
                let message = error.to_string();
                warn!(error = %message, "upstream stream failed");
                self.finish(Termination::UpstreamFailed(message))
            }
        }
    }

    fn end_input(&mut self) {
        self.upstream = None;
        self.input_ended = true;
        self.decoder.finish();
    }

    /// Terminate and stop reading; the remaining upstream is never requested.
    fn finish(&mut self, termination: Termination) -> Option<Bytes> {
        self.upstream = None;
        self.completion.terminate(termination)
    }

    fn cancel(&mut self) {
        debug!(
            emitted = self.completion.emitted_count(),
            "record session cancelled by sink"
        );
        self.abort.cancel();
        self.upstream = None;
        self.completion.abandon();
    }

    /// Convert into a framed output stream.
    pub fn into_stream(self) -> RecordStream {
        let canceller = StreamCanceller {
            token: self.abort.clone(),
        };
        let frames = stream::unfold(self, |mut session| async move {
            let frame = session.next_frame().await?;
            Some((frame, session))
        })
        .boxed();

        RecordStream { frames, canceller }
    }
}

impl<S> Drop for RecordSession<S> {
    fn drop(&mut self) {
        if self.completion.is_accepting() {
            self.abort.cancel();
        }
    }
}

impl<S> fmt::Debug for RecordSession<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordSession")
            .field("phase", &self.completion.phase())
            .field("emitted", &self.completion.emitted_count())
            .field("chunks_read", &self.chunks_read)
            .field("input_ended", &self.input_ended)
            .finish()
    }
}

/// Sink-side handle that cancels a running session.
#[derive(Debug, Clone)]
pub struct StreamCanceller {
    token: CancellationToken,
}

impl StreamCanceller {
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Framed JSON array output of a [`RecordSession`].
///
/// Dropping the stream before it finishes aborts the upstream exchange.
pub struct RecordStream {
    frames: BoxStream<'static, Bytes>,
    canceller: StreamCanceller,
}

impl RecordStream {
    pub fn cancel(&self) {
        self.canceller.cancel();
    }

    pub fn canceller(&self) -> StreamCanceller {
        self.canceller.clone()
    }

    /// Drain the whole stream into one buffer.
    pub async fn collect_bytes(mut self) -> Vec<u8> {
        let mut out = Vec::new();
        while let Some(frame) = self.frames.next().await {
            out.extend_from_slice(&frame);
        }
        out
    }
}

impl Stream for RecordStream {
    type Item = Bytes;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.frames.poll_next_unpin(cx)
    }
}

impl fmt::Debug for RecordStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordStream")
            .field("cancelled", &self.canceller.is_cancelled())
            .finish()
    }
}
