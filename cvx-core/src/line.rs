//! Line framing for the controller byte stream
//!
//! The controller terminates every reply with CR and/or LF. The splitter
//! accumulates raw bytes and emits complete lines, so the receive loop can
//! feed it arbitrarily sized read chunks without caring where a line ends.

/// Incremental CR/LF line splitter.
///
/// Bytes are decoded as single-byte ASCII. A line is emitted when a CR or
/// LF is encountered and the accumulated buffer is non-empty; delimiter
/// characters are never part of an emitted line, and consecutive or
/// leading delimiters produce no empty lines.
#[derive(Debug, Default)]
pub struct LineSplitter {
    buffer: String,
}

impl LineSplitter {
    /// Create a new line splitter with an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of raw bytes, returning the complete lines it closed.
    ///
    /// Lines are returned in stream order. Any trailing partial line stays
    /// buffered until a later chunk delivers its terminator.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        for &byte in chunk {
            match byte {
                b'\r' | b'\n' => {
                    if !self.buffer.is_empty() {
                        lines.push(std::mem::take(&mut self.buffer));
                    }
                }
                _ => self.buffer.push(byte as char),
            }
        }
        lines
    }
}
