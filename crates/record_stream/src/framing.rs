use bytes::{BufMut, Bytes, BytesMut};
use serde_json::Value;
use tracing::warn;

const FALLBACK_ERROR_MARKER: &[u8] = br#"{"error":"unserializable error marker"}"#;

/// Framing state of the output array.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FramePhase {
    /// Nothing written yet.
    #[default]
    Unopened,
    /// `[` written, followed by `emitted` elements.
    Open { emitted: usize },
    /// `]` written (or the sink went away) after `emitted` elements. Nothing
    /// more is ever written.
    Closed { emitted: usize },
}

impl FramePhase {
    /// Elements written so far, error marker included.
    pub fn emitted(self) -> usize {
        match self {
            Self::Unopened => 0,
            Self::Open { emitted } | Self::Closed { emitted } => emitted,
        }
    }
}

/// Re-frames records as one JSON array, emitted incrementally.
///
/// Every method returns the bytes to hand to the sink, or `None` when there is
/// nothing to write. After the array is closed every event is a no-op.
#[derive(Debug, Default)]
pub struct ArrayFramer {
    phase: FramePhase,
}

impl ArrayFramer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_record(&mut self, record: &Value) -> Option<Bytes> {
        if self.is_closed() {
            return None;
        }

        let body = match serde_json::to_vec(record) {
            Ok(body) => body,
            Err(error) => {
                warn!(%error, "skipping record that failed to serialize");
                return None;
            }
        };

        let mut out = BytesMut::with_capacity(body.len() + 1);
        self.put_separator(&mut out);
        out.extend_from_slice(&body);
        Some(out.freeze())
    }

    /// Emit `marker` as the final element and close the array.
    pub fn on_error(&mut self, marker: &Value) -> Option<Bytes> {
        if self.is_closed() {
            return None;
        }

        let body = serde_json::to_vec(marker).unwrap_or_else(|_| FALLBACK_ERROR_MARKER.to_vec());
        let mut out = BytesMut::with_capacity(body.len() + 2);
        self.put_separator(&mut out);
        out.extend_from_slice(&body);
        out.put_u8(b']');
        self.close_silently();
        Some(out.freeze())
    }

    pub fn on_end(&mut self) -> Option<Bytes> {
        let closing: &'static [u8] = match self.phase {
            FramePhase::Unopened => b"[]",
            FramePhase::Open { .. } => b"]",
            FramePhase::Closed { .. } => return None,
        };
        self.close_silently();
        Some(Bytes::from_static(closing))
    }

    /// Close without writing anything; used when the sink has gone away.
    pub fn close_silently(&mut self) {
        self.phase = FramePhase::Closed {
            emitted: self.phase.emitted(),
        };
    }

    pub fn phase(&self) -> FramePhase {
        self.phase
    }

    /// True while `[` has been written and `]` has not.
    pub fn is_opened(&self) -> bool {
        matches!(self.phase, FramePhase::Open { .. })
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.phase, FramePhase::Closed { .. })
    }

    /// Elements written so far, error marker included.
    pub fn emitted_count(&self) -> usize {
        self.phase.emitted()
    }

    fn put_separator(&mut self, out: &mut BytesMut) {
        let emitted = match self.phase {
            FramePhase::Unopened => {
                out.put_u8(b'[');
                0
            }
            FramePhase::Open { emitted } => {
                out.put_u8(b',');
                emitted
            }
            FramePhase::Closed { .. } => return,
        };
        self.phase = FramePhase::Open {
            emitted: emitted + 1,
        };
    }
}
