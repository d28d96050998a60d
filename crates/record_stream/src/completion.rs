use bytes::Bytes;
use serde_json::Value;

use crate::decoder::DecodeError;
use crate::framing::ArrayFramer;
use crate::marker::error_marker;
use crate::transform::TransformError;

/// Lifecycle of one streaming session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Created; no byte received yet.
    Pending,
    /// At least one byte received; records flow.
    Streaming,
    /// Terminated; the final frame has been produced but not yet handed out.
    Draining,
    Closed,
}

/// Why a session stopped.
#[derive(Debug, Clone, PartialEq)]
pub enum Termination {
    EndOfInput,
    /// Upstream sent an error marker; it is forwarded verbatim.
    ErrorMarker(Value),
    DecodeFailed(DecodeError),
    TransformFailed(TransformError),
    UpstreamFailed(String),
    /// The sink went away. Nothing further is written.
    Cancelled,
}

/// Discriminant of [`Termination`], kept after the payload is consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationKind {
    EndOfInput,
    ErrorMarker,
    DecodeFailed,
    TransformFailed,
    UpstreamFailed,
    Cancelled,
}

impl Termination {
    pub fn kind(&self) -> TerminationKind {
        match self {
            Self::EndOfInput => TerminationKind::EndOfInput,
            Self::ErrorMarker(_) => TerminationKind::ErrorMarker,
            Self::DecodeFailed(_) => TerminationKind::DecodeFailed,
            Self::TransformFailed(_) => TerminationKind::TransformFailed,
            Self::UpstreamFailed(_) => TerminationKind::UpstreamFailed,
            Self::Cancelled => TerminationKind::Cancelled,
        }
    }
}

/// Single authority over session termination.
///
/// Records pass through only while the session is accepting
/// (`Pending`/`Streaming`). The first [`terminate`](Self::terminate) wins and
/// finalizes the framing; later calls, and records arriving afterwards, are
/// no-ops.
#[derive(Debug)]
pub struct CompletionCoordinator {
    phase: SessionPhase,
    framer: ArrayFramer,
    termination: Option<TerminationKind>,
}

impl Default for CompletionCoordinator {
    fn default() -> Self {
        Self {
            phase: SessionPhase::Pending,
            framer: ArrayFramer::new(),
            termination: None,
        }
    }
}

impl CompletionCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn termination(&self) -> Option<TerminationKind> {
        self.termination
    }

    pub fn emitted_count(&self) -> usize {
        self.framer.emitted_count()
    }

    pub fn is_accepting(&self) -> bool {
        matches!(self.phase, SessionPhase::Pending | SessionPhase::Streaming)
    }

    pub fn is_closed(&self) -> bool {
        self.phase == SessionPhase::Closed
    }

    /// `Pending -> Streaming`; no-op in any other phase.
    pub fn mark_streaming(&mut self) {
        if self.phase == SessionPhase::Pending {
            self.phase = SessionPhase::Streaming;
        }
    }

    pub fn record(&mut self, record: &Value) -> Option<Bytes> {
        if !self.is_accepting() {
            return None;
        }
        self.framer.on_record(record)
    }

    /// Move to `Draining` and return the final frame, if any.
    ///
    /// Cancellation skips `Draining` and closes immediately without output.
    pub fn terminate(&mut self, termination: Termination) -> Option<Bytes> {
        if !self.is_accepting() {
            return None;
        }
        self.termination = Some(termination.kind());

        let flushed = match termination {
            Termination::EndOfInput => self.framer.on_end(),
            Termination::ErrorMarker(marker) => self.framer.on_error(&marker),
            Termination::DecodeFailed(error) => self.framer.on_error(&error_marker(error.to_string())),
            Termination::TransformFailed(error) => {
                self.framer.on_error(&error_marker(error.to_string()))
            }
            Termination::UpstreamFailed(message) => self
                .framer
                .on_error(&error_marker(format!("upstream stream failed: {message}"))),
            Termination::Cancelled => {
                self.framer.close_silently();
                self.phase = SessionPhase::Closed;
                return None;
            }
        };

        self.phase = SessionPhase::Draining;
        flushed
    }

    /// `Draining -> Closed`, once the final frame has been handed to the sink.
    pub fn close(&mut self) {
        if self.phase == SessionPhase::Draining {
            self.phase = SessionPhase::Closed;
        }
    }

    /// Close from any phase without further output.
    pub fn abandon(&mut self) {
        if self.is_accepting() {
            self.termination = Some(TerminationKind::Cancelled);
        }
        self.framer.close_silently();
        self.phase = SessionPhase::Closed;
    }
}
