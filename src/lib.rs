//! Paddle Bridge - serial line bridge for a sensor-driven paddle game
//!
//! A worker thread owns the serial port, splits the byte stream into lines
//! and offers them to a bounded inbox. The game polls the inbox once per
//! frame through `SerialController`, which feeds a `MessageListener` such as
//! `PaddleInput`.

pub mod bridge;
pub mod cli;
pub mod codec;
pub mod config;
pub mod constants;
pub mod error;
pub mod game;
pub mod logging;
pub mod transport;

pub use bridge::{BridgeOptions, Message, SerialBridge, State};
pub use error::{BridgeError, Result};
pub use game::{MessageListener, PaddleInput, SerialController};
pub use transport::{Connector, SerialConnector};
