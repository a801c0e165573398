//! Connector abstraction for byte-level I/O
//!
//! Separates port acquisition from the worker loop:
//! - **Connector**: How a byte stream is opened (serial port, test double...)
//! - **Worker**: What is done with it (framing, queueing, reconnection)
//!
//! The worker calls `connect()` again after every failure, so a connector
//! may re-run device detection on each attempt.

pub mod serial;

pub use serial::{list_ports, PortSummary, SerialConnector};

use crate::error::Result;
use std::io::{Read, Write};

/// Source of bidirectional byte streams
///
/// # Lifecycle
///
/// 1. Worker calls `connect()`
/// 2. Worker reads/writes the port until an error or a stop request
/// 3. Worker drops the port (releasing the hardware handle)
/// 4. On error, the worker waits the reconnect delay and goes back to 1
///
/// Reads should return within a bounded time (read timeout) so the worker
/// can notice stop requests. `TimedOut` and `WouldBlock` errors are treated
/// as "no data yet".
pub trait Connector: Send + 'static {
    /// Port type produced by this connector
    type Port: Read + Write + Send + 'static;

    /// Open a new port
    fn connect(&mut self) -> Result<Self::Port>;

    /// Human-readable target for logs
    fn describe(&self) -> String;
}
