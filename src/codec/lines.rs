//! Newline-delimited ASCII codec
//!
//! Arduino sketches write one reading per `Serial.println()`, so frames are
//! terminated by `\n` with an optional `\r` before it.

use super::{Codec, Frame};
use bytes::BytesMut;

/// Line codec with a bounded partial-line buffer
pub struct LineCodec {
    buffer: BytesMut,
    max_line_length: usize,
    /// Bytes of an oversized line skipped so far (0 = not skipping)
    skipped: usize,
    /// Last skipped byte was '\r'
    skipped_cr: bool,
}

impl LineCodec {
    /// Create a codec accepting lines up to `max_line_length` bytes
    pub fn new(max_line_length: usize) -> Self {
        let max_line_length = max_line_length.max(1);
        Self {
            buffer: BytesMut::with_capacity(max_line_length + 1),
            max_line_length,
            skipped: 0,
            skipped_cr: false,
        }
    }

    /// Bytes of the current partial line
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    fn finish_line(&mut self, on_frame: &mut impl FnMut(Frame)) {
        if self.skipped > 0 {
            // Same length as the normal path: the '\r' is part of the terminator
            let length = self.skipped - usize::from(self.skipped_cr);
            on_frame(Frame::Oversized { length });
            self.skipped = 0;
            self.skipped_cr = false;
            self.buffer.clear();
            return;
        }

        let mut line = self.buffer.split();
        if line.last() == Some(&b'\r') {
            line.truncate(line.len() - 1);
        }
        if line.len() > self.max_line_length {
            on_frame(Frame::Oversized { length: line.len() });
        } else if !line.is_empty() {
            on_frame(Frame::Line(String::from_utf8_lossy(&line).into_owned()));
        }
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new(crate::constants::MAX_LINE_LENGTH)
    }
}

impl Codec for LineCodec {
    fn decode(&mut self, data: &[u8], mut on_frame: impl FnMut(Frame)) {
        for &byte in data {
            if byte == b'\n' {
                self.finish_line(&mut on_frame);
                continue;
            }

            if self.skipped > 0 {
                self.skipped += 1;
                self.skipped_cr = byte == b'\r';
                continue;
            }

            self.buffer.extend_from_slice(&[byte]);

            // One extra byte is allowed for a trailing '\r'
            if self.buffer.len() > self.max_line_length + 1 {
                self.skipped = self.buffer.len();
                self.skipped_cr = byte == b'\r';
                self.buffer.clear();
            }
        }
    }

    fn encode(&self, payload: &[u8], output: &mut Vec<u8>) {
        output.extend_from_slice(payload);
        output.push(b'\n');
    }

    fn reset(&mut self) {
        self.buffer.clear();
        self.skipped = 0;
        self.skipped_cr = false;
    }
}
