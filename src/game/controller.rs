//! Per-frame consumer of bridge messages

use crate::bridge::{BridgeOptions, Message, SerialBridge};
use crate::error::Result;
use crate::transport::Connector;
use tracing::debug;

/// Receiver of bridge events on the frame thread
pub trait MessageListener {
    /// A complete line arrived from the device
    fn on_message_arrived(&mut self, line: &str);

    /// The port was opened (`true`) or closed (`false`)
    fn on_connection_event(&mut self, connected: bool);

    /// Line to send to the device right before the bridge stops
    fn on_tear_down(&mut self) -> Option<String> {
        None
    }
}

/// Bridge plus listener binding
///
/// Call `tick()` once per frame. Each tick consumes at most
/// `messages_per_tick` messages and never blocks.
pub struct SerialController<L: MessageListener> {
    bridge: SerialBridge,
    listener: L,
    messages_per_tick: usize,
}

impl<L: MessageListener> SerialController<L> {
    /// Bind an already running bridge
    pub fn new(bridge: SerialBridge, listener: L, messages_per_tick: usize) -> Self {
        Self {
            bridge,
            listener,
            messages_per_tick: messages_per_tick.max(1),
        }
    }

    /// Start a bridge for `connector` and bind `listener` to it
    pub fn start<C: Connector>(
        connector: C,
        options: BridgeOptions,
        listener: L,
        messages_per_tick: usize,
    ) -> Result<Self> {
        let bridge = SerialBridge::start(connector, options)?;
        Ok(Self::new(bridge, listener, messages_per_tick))
    }

    /// Dispatch pending messages; returns how many were handled
    pub fn tick(&mut self) -> usize {
        let mut handled = 0;
        while handled < self.messages_per_tick {
            let Some(message) = self.bridge.read_message() else {
                break;
            };
            self.dispatch(message);
            handled += 1;
        }
        handled
    }

    fn dispatch(&mut self, message: Message) {
        match message {
            Message::Connected => self.listener.on_connection_event(true),
            Message::Disconnected => self.listener.on_connection_event(false),
            Message::Line(line) => self.listener.on_message_arrived(&line),
        }
    }

    /// Queue a line for the device
    pub fn send_line(&self, line: impl Into<String>) -> bool {
        self.bridge.send_line(line)
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }

    pub fn bridge(&self) -> &SerialBridge {
        &self.bridge
    }

    /// Run the listener's teardown, then stop and join the worker
    pub fn stop(&mut self) -> Result<()> {
        if let Some(line) = self.listener.on_tear_down() {
            debug!("Sending teardown line: {}", line);
            self.bridge.send_line(line);
        }
        self.bridge.stop()
    }
}
