//! Streaming record pipeline for shared-table query responses.
//!
//! Upstream bytes carry many independently serialized JSON rows. A
//! [`RecordSession`] decodes them incrementally ([`JsonRecordDecoder`]), runs
//! each row through an ordered, possibly asynchronous [`Pipeline`], and
//! re-frames the survivors as one JSON array ([`ArrayFramer`]). Termination is
//! decided in one place ([`CompletionCoordinator`]): end of input closes the
//! array, while error markers, decode failures, transform failures and upstream
//! failures are written as a final `{"error": ...}` element.
//!
//! This crate has no HTTP dependency; any `Stream` of byte chunks plus a
//! [`CancellationToken`](tokio_util::sync::CancellationToken) can drive a session.

pub mod camelize;
pub mod completion;
pub mod decoder;
pub mod framing;
pub mod marker;
pub mod session;
pub mod transform;

pub use camelize::{camelize, camelize_keys, CamelizeKeys};
pub use completion::{CompletionCoordinator, SessionPhase, Termination, TerminationKind};
pub use decoder::{decode_all, DecodeError, JsonRecordDecoder};
pub use framing::{ArrayFramer, FramePhase};
pub use marker::{error_marker, error_message, is_error_marker, StreamProtocolError};
pub use session::{RecordSession, RecordStream, StreamCanceller};
pub use transform::{
    filter, from_async, map, try_map, Outcome, Pipeline, RecordTransform, TransformError,
    TransformFuture,
};
