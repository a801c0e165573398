//! Messages handed from the serial worker to the consumer

/// Item read from the bridge inbox
///
/// Connection transitions are their own variants, so a device that prints
/// a line looking like a marker is still delivered as `Line`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Port opened successfully
    Connected,
    /// Port closed after an error or a stop request
    Disconnected,
    /// One complete text line, terminator removed
    Line(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_text_is_a_line() {
        let msg = Message::Line("__Connected__".into());
        assert_ne!(msg, Message::Connected);
        assert_ne!(msg, Message::Disconnected);
    }
}
