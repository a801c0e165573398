//! Serial worker thread
//!
//! Owns the port exclusively. Loop:
//! 1. `connect()`; on failure wait the reconnect delay and retry
//! 2. push `Connected`, then read/decode/enqueue and write pending lines
//! 3. on I/O error or stop request drop the port and push `Disconnected`
//! 4. on error wait the reconnect delay and go back to 1
//!
//! All waits are interruptible by the stop signal so `join()` returns
//! within one read timeout of a stop request.
//!
//! Each open pushes one `Connected` and one `Disconnected` outside the inbox
//! capacity. An unread inbox therefore grows by at most two sentinels per
//! reconnect cycle, and cycles are at least `MIN_RECONNECT_DELAY_MS` apart.

use super::message::Message;
use super::queue::BoundedQueue;
use super::stats::Stats;
use super::{BridgeOptions, State};
use crate::codec::{Codec, Frame, LineCodec};
use crate::constants::{MIN_RECONNECT_DELAY_MS, SERIAL_BUFFER_SIZE, SERIAL_DISCONNECT_THRESHOLD};
use crate::transport::Connector;
use parking_lot::{Condvar, Mutex, RwLock};
use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

// =============================================================================
// Stop signal
// =============================================================================

/// One-shot stop flag that sleeping threads can wait on
pub(crate) struct StopSignal {
    flag: AtomicBool,
    lock: Mutex<bool>,
    cond: Condvar,
}

impl StopSignal {
    pub(crate) fn new() -> Self {
        Self {
            flag: AtomicBool::new(false),
            lock: Mutex::new(false),
            cond: Condvar::new(),
        }
    }

    pub(crate) fn request(&self) {
        let mut stopped = self.lock.lock();
        *stopped = true;
        self.flag.store(true, Ordering::SeqCst);
        self.cond.notify_all();
    }

    #[inline]
    pub(crate) fn is_requested(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Sleep up to `timeout`; returns true if stop was requested
    pub(crate) fn wait(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut stopped = self.lock.lock();
        while !*stopped {
            if self.cond.wait_until(&mut stopped, deadline).timed_out() {
                break;
            }
        }
        *stopped
    }
}

// =============================================================================
// Shared state
// =============================================================================

/// State shared between the worker and the `SerialBridge` handle
pub(crate) struct Shared {
    pub(crate) inbox: BoundedQueue<Message>,
    pub(crate) outbox: BoundedQueue<String>,
    pub(crate) stats: Stats,
    pub(crate) stop: StopSignal,
    state: RwLock<State>,
}

impl Shared {
    pub(crate) fn new(options: &BridgeOptions) -> Self {
        Self {
            inbox: BoundedQueue::new(options.max_unread_messages),
            outbox: BoundedQueue::new(options.max_outgoing_messages),
            stats: Stats::new(),
            stop: StopSignal::new(),
            state: RwLock::new(State::Connecting),
        }
    }

    pub(crate) fn state(&self) -> State {
        *self.state.read()
    }

    /// Once stop is requested only `Stopping` and `Stopped` are accepted
    pub(crate) fn set_state(&self, next: State) {
        let mut state = self.state.write();
        if *state == State::Stopped {
            return;
        }
        if self.stop.is_requested() && !matches!(next, State::Stopping | State::Stopped) {
            return;
        }
        *state = next;
    }
}

// =============================================================================
// Worker
// =============================================================================

enum PumpExit {
    Stopped,
    Failed(io::Error),
}

pub(crate) struct Worker<C: Connector> {
    connector: C,
    shared: Arc<Shared>,
    codec: LineCodec,
    reconnect_delay: Duration,
}

impl<C: Connector> Worker<C> {
    pub(crate) fn new(connector: C, shared: Arc<Shared>, options: &BridgeOptions) -> Self {
        Self {
            connector,
            shared,
            codec: LineCodec::new(options.max_line_length),
            reconnect_delay: options
                .reconnect_delay
                .max(Duration::from_millis(MIN_RECONNECT_DELAY_MS)),
        }
    }

    pub(crate) fn run(mut self) {
        let target = self.connector.describe();
        info!("Serial worker started: {}", target);

        // Only the first failure of a streak is a warning
        let mut failing = false;

        while !self.shared.stop.is_requested() {
            self.shared.set_state(State::Connecting);

            let port = match self.connector.connect() {
                Ok(port) => port,
                Err(e) => {
                    self.shared.stats.add_connect_failure();
                    if failing {
                        debug!("Connect to {} failed: {}", target, e);
                    } else {
                        warn!(
                            "Connect to {} failed: {}, retrying every {:?}",
                            target, e, self.reconnect_delay
                        );
                        failing = true;
                    }
                    if self.shared.stop.wait(self.reconnect_delay) {
                        break;
                    }
                    continue;
                }
            };

            // Sentinel first: counters and state imply it is queued
            failing = false;
            self.shared.inbox.push_control(Message::Connected);
            self.shared.stats.add_connect();
            self.shared.set_state(State::Connected);
            info!("Connected: {}", target);

            self.codec.reset();
            let exit = self.pump(port);

            self.shared.inbox.push_control(Message::Disconnected);
            self.shared.stats.add_disconnect();

            match exit {
                PumpExit::Stopped => {
                    info!("Disconnected: {}", target);
                    break;
                }
                PumpExit::Failed(e) => {
                    warn!("Connection lost on {}: {}, reconnecting...", target, e);
                    self.shared.set_state(State::Connecting);
                    if self.shared.stop.wait(self.reconnect_delay) {
                        break;
                    }
                }
            }
        }

        self.shared.set_state(State::Stopped);
        info!("Serial worker stopped: {}", target);
    }

    /// Move data until stop or error; the port is dropped on return
    fn pump(&mut self, mut port: C::Port) -> PumpExit {
        let mut buf = [0u8; SERIAL_BUFFER_SIZE];
        let mut encoded = Vec::with_capacity(64);
        let mut zero_reads = 0u32;

        loop {
            if self.shared.stop.is_requested() {
                // Best effort: teardown lines queued right before stop
                if let Err(e) = self.flush_outbox(&mut port, &mut encoded) {
                    debug!("Final write failed: {}", e);
                }
                return PumpExit::Stopped;
            }

            if let Err(e) = self.flush_outbox(&mut port, &mut encoded) {
                return PumpExit::Failed(e);
            }

            match port.read(&mut buf) {
                Ok(0) => {
                    // Zero bytes read - could be normal or port gone
                    zero_reads += 1;
                    if zero_reads > SERIAL_DISCONNECT_THRESHOLD {
                        return PumpExit::Failed(io::Error::new(
                            io::ErrorKind::UnexpectedEof,
                            "port stopped returning data",
                        ));
                    }
                }
                Ok(n) => {
                    zero_reads = 0;
                    self.shared.stats.add_read(n);
                    self.enqueue(&buf[..n]);
                }
                Err(ref e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::TimedOut
                            | io::ErrorKind::WouldBlock
                            | io::ErrorKind::Interrupted
                    ) =>
                {
                    zero_reads = 0;
                }
                Err(e) => return PumpExit::Failed(e),
            }
        }
    }

    /// Write every queued outgoing line
    fn flush_outbox(&mut self, port: &mut C::Port, encoded: &mut Vec<u8>) -> io::Result<()> {
        while let Some(line) = self.shared.outbox.pop() {
            encoded.clear();
            self.codec.encode(line.as_bytes(), encoded);
            port.write_all(encoded)?;
            port.flush()?;
            self.shared.stats.add_written(encoded.len());
            self.shared.stats.add_line_sent();
        }
        Ok(())
    }

    /// Decode bytes into lines and offer them to the inbox
    fn enqueue(&mut self, data: &[u8]) {
        let shared = &self.shared;
        self.codec.decode(data, |frame| match frame {
            Frame::Line(line) => match shared.inbox.try_push(Message::Line(line)) {
                Ok(()) => shared.stats.add_line_received(),
                Err(_) => shared.stats.add_line_dropped(),
            },
            Frame::Oversized { length } => {
                shared.stats.add_line_oversized();
                debug!("Discarded oversized line ({} bytes)", length);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_stop_signal_wait_times_out() {
        let stop = StopSignal::new();
        let start = Instant::now();
        assert!(!stop.wait(Duration::from_millis(30)));
        assert!(start.elapsed() >= Duration::from_millis(30));
        assert!(!stop.is_requested());
    }

    #[test]
    fn test_stop_signal_wakes_waiter() {
        let stop = Arc::new(StopSignal::new());
        let waiter = {
            let stop = stop.clone();
            thread::spawn(move || {
                let start = Instant::now();
                let stopped = stop.wait(Duration::from_secs(10));
                (stopped, start.elapsed())
            })
        };

        thread::sleep(Duration::from_millis(20));
        stop.request();

        let (stopped, elapsed) = waiter.join().unwrap();
        assert!(stopped);
        assert!(elapsed < Duration::from_secs(2));
    }

    #[test]
    fn test_stop_signal_already_requested() {
        let stop = StopSignal::new();
        stop.request();
        assert!(stop.is_requested());
        assert!(stop.wait(Duration::from_secs(10)));
    }

    #[test]
    fn test_reconnect_delay_has_a_floor() {
        struct Unreachable;

        impl Connector for Unreachable {
            type Port = io::Cursor<Vec<u8>>;

            fn connect(&mut self) -> crate::error::Result<Self::Port> {
                Err(crate::error::BridgeError::NoDeviceFound)
            }

            fn describe(&self) -> String {
                "unreachable".to_string()
            }
        }

        let options = BridgeOptions {
            reconnect_delay: Duration::ZERO,
            ..BridgeOptions::default()
        };
        let shared = Arc::new(Shared::new(&options));
        let worker = Worker::new(Unreachable, shared, &options);
        assert_eq!(
            worker.reconnect_delay,
            Duration::from_millis(MIN_RECONNECT_DELAY_MS)
        );
    }

    #[test]
    fn test_state_is_frozen_after_stop() {
        let shared = Shared::new(&BridgeOptions::default());
        shared.set_state(State::Connected);
        shared.stop.request();
        shared.set_state(State::Connecting);
        assert_eq!(shared.state(), State::Connected);
        shared.set_state(State::Stopped);
        shared.set_state(State::Stopping);
        assert_eq!(shared.state(), State::Stopped);
    }
}
