//! Codec abstraction for message encoding/decoding
//!
//! Separates framing concerns from the serial worker:
//! - **Codec**: How lines are cut out of the byte stream and written back
//! - **Connector**: How the byte stream is obtained (see `transport`)

pub mod lines;

pub use lines::LineCodec;

/// Decoded frame from a codec
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Complete text line without its terminator
    Line(String),
    /// Line discarded for exceeding the length limit
    Oversized {
        /// Bytes seen before the terminator
        length: usize,
    },
}

/// Codec trait for encoding/decoding messages
///
/// A codec transforms raw bytes into frames (decode)
/// and payloads into bytes for transmission (encode).
pub trait Codec: Send {
    /// Decode incoming bytes
    ///
    /// Calls `on_frame` for each complete frame detected.
    /// May buffer partial data internally.
    fn decode(&mut self, data: &[u8], on_frame: impl FnMut(Frame));

    /// Encode a payload for transmission
    ///
    /// Appends encoded bytes to `output`.
    fn encode(&self, payload: &[u8], output: &mut Vec<u8>);

    /// Drop any partially received frame
    fn reset(&mut self);
}
