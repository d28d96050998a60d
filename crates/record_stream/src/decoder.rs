use serde_json::Value;
use thiserror::Error;

/// Malformed input that no amount of further bytes can complete.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed JSON in record stream at byte {offset}: {message}")]
pub struct DecodeError {
    /// Absolute stream offset where the failing value starts.
    pub offset: u64,
    pub message: String,
}

/// Where the boundary scanner stands inside the current top-level value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Scan {
    /// Between values.
    #[default]
    Idle,
    Container {
        depth: usize,
        in_string: bool,
        escaped: bool,
    },
    String {
        escaped: bool,
    },
    /// Bare number or literal; ends at whitespace or a structural byte.
    Scalar,
}

enum Boundary {
    /// `buffer[cursor..end]` holds exactly one value.
    Complete(usize),
    NeedMore,
}

/// Incremental decoder for a byte stream of concatenated top-level JSON values.
///
/// Bytes are buffered with [`feed`](Self::feed) and complete values are pulled
/// one at a time with [`next_value`](Self::next_value). Chunk boundaries are
/// irrelevant: a value split anywhere (inside a string, a number, a literal or a
/// multi-byte UTF-8 sequence) is produced once the rest of it arrives.
///
/// A byte-level scanner finds top-level value boundaries and keeps its state
/// between feeds, so every byte is scanned once and handed to `serde_json`
/// once. Malformed content inside an unfinished value surfaces when the value
/// closes or at [`finish`](Self::finish). Bytes belonging to values already
/// handed out are discarded on the next feed.
#[derive(Debug, Default)]
pub struct JsonRecordDecoder {
    buffer: Vec<u8>,
    /// Start of the unconsumed input; the start of the current value while one
    /// is in progress.
    cursor: usize,
    /// Next byte the scanner has not looked at.
    scanned: usize,
    scan: Scan,
    discarded: u64,
    decoded: usize,
    finished: bool,
    failed: bool,
}

impl JsonRecordDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the next chunk of input.
    ///
    /// Ignored once the input has been finished or a decode error was reported.
    pub fn feed(&mut self, bytes: &[u8]) {
        if self.finished || self.failed {
            return;
        }
        self.compact();
        self.buffer.extend_from_slice(bytes);
    }

    /// Mark the end of input. Trailing bytes must now form complete values.
    pub fn finish(&mut self) {
        self.finished = true;
    }

    /// Pull the next complete value.
    ///
    /// `None` means more input is required (or, after [`finish`](Self::finish),
    /// that the input is exhausted). A decode error is returned exactly once;
    /// the decoder yields nothing afterwards.
    pub fn next_value(&mut self) -> Option<Result<Value, DecodeError>> {
        if self.failed {
            return None;
        }

        let end = match self.scan_boundary() {
            Boundary::Complete(end) => end,
            Boundary::NeedMore if self.finished && self.cursor < self.buffer.len() => {
                self.buffer.len()
            }
            Boundary::NeedMore => return None,
        };

        let start = self.cursor;
        let parsed = serde_json::from_slice::<Value>(&self.buffer[start..end]);
        self.cursor = end;
        self.scanned = end;
        self.scan = Scan::Idle;

        match parsed {
            Ok(value) => {
                self.decoded += 1;
                Some(Ok(value))
            }
            Err(error) => {
                self.failed = true;
                Some(Err(DecodeError {
                    offset: self.discarded + start as u64,
                    message: error.to_string(),
                }))
            }
        }
    }

    /// Number of values produced so far.
    pub fn decoded_count(&self) -> usize {
        self.decoded
    }

    /// True when no unconsumed, non-whitespace bytes are buffered.
    pub fn is_drained(&self) -> bool {
        self.buffer[self.cursor..]
            .iter()
            .all(|byte| is_json_whitespace(*byte))
    }

    pub fn is_failed(&self) -> bool {
        self.failed
    }

    /// Advance the scanner over bytes it has not seen yet.
    fn scan_boundary(&mut self) -> Boundary {
        while self.scanned < self.buffer.len() {
            let position = self.scanned;
            let byte = self.buffer[position];

            match self.scan {
                Scan::Idle => {
                    if is_json_whitespace(byte) {
                        self.cursor = position + 1;
                    } else {
                        self.cursor = position;
                        self.scan = match byte {
                            b'{' | b'[' => Scan::Container {
                                depth: 1,
                                in_string: false,
                                escaped: false,
                            },
                            b'"' => Scan::String { escaped: false },
                            // A stray closer is malformed on its own.
                            b'}' | b']' => return Boundary::Complete(position + 1),
                            _ => Scan::Scalar,
                        };
                    }
                }
                Scan::Container {
                    depth,
                    in_string: true,
                    escaped,
                } => {
                    self.scan = Scan::Container {
                        depth,
                        in_string: escaped || byte != b'"',
                        escaped: !escaped && byte == b'\\',
                    };
                }
                Scan::Container { depth, .. } => match byte {
                    b'"' => {
                        self.scan = Scan::Container {
                            depth,
                            in_string: true,
                            escaped: false,
                        };
                    }
                    b'{' | b'[' => {
                        self.scan = Scan::Container {
                            depth: depth + 1,
                            in_string: false,
                            escaped: false,
                        };
                    }
                    b'}' | b']' if depth == 1 => return Boundary::Complete(position + 1),
                    b'}' | b']' => {
                        self.scan = Scan::Container {
                            depth: depth - 1,
                            in_string: false,
                            escaped: false,
                        };
                    }
                    _ => {}
                },
                Scan::String { escaped: true } => self.scan = Scan::String { escaped: false },
                Scan::String { escaped: false } => match byte {
                    b'"' => return Boundary::Complete(position + 1),
                    b'\\' => self.scan = Scan::String { escaped: true },
                    _ => {}
                },
                Scan::Scalar => {
                    if is_json_whitespace(byte) || is_structural(byte) {
                        return Boundary::Complete(position);
                    }
                }
            }
            self.scanned = position + 1;
        }

        // A literal is complete as soon as it is spelled out; a number touching
        // the end of the buffer may continue in the next chunk.
        if self.scan == Scan::Scalar
            && matches!(&self.buffer[self.cursor..], b"true" | b"false" | b"null")
        {
            return Boundary::Complete(self.buffer.len());
        }
        Boundary::NeedMore
    }

    fn compact(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.buffer.drain(..self.cursor);
        self.discarded += self.cursor as u64;
        self.scanned -= self.cursor;
        self.cursor = 0;
    }
}

/// Decode a complete, already-buffered input in one shot.
pub fn decode_all(input: &[u8]) -> Result<Vec<Value>, DecodeError> {
    let mut decoder = JsonRecordDecoder::new();
    decoder.feed(input);
    decoder.finish();

    let mut values = Vec::new();
    while let Some(value) = decoder.next_value() {
        values.push(value?);
    }
    Ok(values)
}

fn is_json_whitespace(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | b'\r')
}

fn is_structural(byte: u8) -> bool {
    matches!(byte, b'{' | b'}' | b'[' | b']' | b'"' | b',' | b':')
}
