//! Serial bridge
//!
//! A background worker owns the serial port and feeds a bounded inbox;
//! the consumer polls it once per frame without blocking.
//!
//! ```ignore
//! let mut bridge = SerialBridge::start(connector, BridgeOptions::default())?;
//! loop {
//!     while let Some(msg) = bridge.read_message() { ... }
//! }
//! bridge.stop()?; // signal, then join: the port is closed when this returns
//! ```

pub mod message;
pub mod queue;
pub mod stats;
mod worker;

pub use message::Message;
pub use queue::BoundedQueue;
pub use stats::{Stats, StatsSnapshot};

use self::worker::{Shared, Worker};
use crate::config::BridgeConfig;
use crate::constants::{
    MAX_LINE_LENGTH, MAX_UNREAD_MESSAGES, MONITOR_QUEUE_CAPACITY, OUTGOING_QUEUE_CAPACITY,
    RECONNECT_DELAY_MS,
};
use crate::error::{BridgeError, Result};
use crate::transport::Connector;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::warn;

/// Bridge state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Opening the port, or waiting before the next attempt
    Connecting,
    Connected,
    /// Stop requested, worker not joined yet
    Stopping,
    Stopped,
}

/// Worker and queue settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeOptions {
    pub reconnect_delay: Duration,
    pub max_unread_messages: usize,
    pub max_outgoing_messages: usize,
    pub max_line_length: usize,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self {
            reconnect_delay: Duration::from_millis(RECONNECT_DELAY_MS),
            max_unread_messages: MAX_UNREAD_MESSAGES,
            max_outgoing_messages: OUTGOING_QUEUE_CAPACITY,
            max_line_length: MAX_LINE_LENGTH,
        }
    }
}

impl From<&BridgeConfig> for BridgeOptions {
    fn from(config: &BridgeConfig) -> Self {
        Self {
            reconnect_delay: config.reconnect_delay(),
            max_unread_messages: config.max_unread_messages,
            max_outgoing_messages: config.max_outgoing_messages,
            max_line_length: config.max_line_length,
        }
    }
}

impl BridgeOptions {
    /// Options for a consumer that must see every line
    ///
    /// The inbox is raised to at least `MONITOR_QUEUE_CAPACITY` so a burst
    /// arriving between two ticks is kept rather than dropped.
    pub fn for_monitor(config: &BridgeConfig) -> Self {
        Self {
            max_unread_messages: config.max_unread_messages.max(MONITOR_QUEUE_CAPACITY),
            ..Self::from(config)
        }
    }
}

/// Handle to a running serial worker
///
/// Dropping the handle stops and joins the worker.
pub struct SerialBridge {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
    target: String,
}

impl SerialBridge {
    /// Spawn the worker thread for `connector`
    ///
    /// Returns immediately; the first connection attempt happens on the
    /// worker thread and its outcome is reported through `Message`s.
    pub fn start<C: Connector>(connector: C, options: BridgeOptions) -> Result<Self> {
        let target = connector.describe();
        let shared = Arc::new(Shared::new(&options));
        let worker = Worker::new(connector, shared.clone(), &options);

        let handle = thread::Builder::new()
            .name("serial-worker".to_string())
            .spawn(move || worker.run())
            .map_err(|e| BridgeError::ThreadSpawn { source: e })?;

        Ok(Self {
            shared,
            worker: Some(handle),
            target,
        })
    }

    /// Take the oldest unread message, if any (never blocks)
    pub fn read_message(&self) -> Option<Message> {
        self.shared.inbox.pop()
    }

    /// Queue a line for the device (terminator is added)
    ///
    /// Returns false if the outgoing queue is full and the line was dropped.
    pub fn send_line(&self, line: impl Into<String>) -> bool {
        match self.shared.outbox.try_push(line.into()) {
            Ok(()) => true,
            Err(_) => {
                self.shared.stats.add_send_dropped();
                false
            }
        }
    }

    /// Unread messages currently queued
    pub fn pending(&self) -> usize {
        self.shared.inbox.len()
    }

    pub fn state(&self) -> State {
        self.shared.state()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == State::Connected
    }

    pub fn stats(&self) -> &Stats {
        &self.shared.stats
    }

    /// Connector description (port and baud rate)
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Signal the worker to stop, then wait for it to release the port
    ///
    /// Idempotent. Returns `WorkerPanicked` if the worker thread panicked.
    pub fn stop(&mut self) -> Result<()> {
        let Some(handle) = self.worker.take() else {
            return Ok(());
        };

        self.shared.stop.request();
        self.shared.set_state(State::Stopping);

        let joined = handle.join();
        self.shared.set_state(State::Stopped);
        joined.map_err(|_| BridgeError::WorkerPanicked)
    }
}

impl Drop for SerialBridge {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!("Bridge shutdown: {}", e);
        }
    }
}
