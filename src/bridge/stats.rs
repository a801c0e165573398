//! Traffic statistics for the bridge
//!
//! Thread-safe counters written by the serial worker and read by the
//! consumer. Uses lock-free atomics for all operations.

use crate::constants::RATE_UPDATE_MIN_INTERVAL_SECS;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Bridge counters with line-rate calculation (fully lock-free)
pub struct Stats {
    /// Lines accepted into the inbox
    lines_received: AtomicU64,
    /// Lines rejected because the inbox was full
    lines_dropped: AtomicU64,
    /// Lines discarded for exceeding the length limit
    lines_oversized: AtomicU64,
    /// Lines written to the port
    lines_sent: AtomicU64,
    /// Outgoing lines rejected because the outbox was full
    sends_dropped: AtomicU64,
    /// Total bytes read from the port
    bytes_read: AtomicU64,
    /// Total bytes written to the port
    bytes_written: AtomicU64,
    /// Successful opens
    connects: AtomicU64,
    /// Teardowns after a successful open
    disconnects: AtomicU64,
    /// Failed open attempts
    connect_failures: AtomicU64,
    /// Snapshot of lines_received at last rate calculation
    lines_snapshot: AtomicU64,
    /// Reference instant for time calculations
    start_time: Instant,
    /// Nanoseconds since start_time at last rate calculation
    last_calc_nanos: AtomicU64,
    /// Cached line rate in lines/sec (stored as f64 bits)
    line_rate: AtomicU64,
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub lines_received: u64,
    pub lines_dropped: u64,
    pub lines_oversized: u64,
    pub lines_sent: u64,
    pub sends_dropped: u64,
    pub bytes_read: u64,
    pub bytes_written: u64,
    pub connects: u64,
    pub disconnects: u64,
    pub connect_failures: u64,
}

impl Stats {
    pub fn new() -> Self {
        Self {
            lines_received: AtomicU64::new(0),
            lines_dropped: AtomicU64::new(0),
            lines_oversized: AtomicU64::new(0),
            lines_sent: AtomicU64::new(0),
            sends_dropped: AtomicU64::new(0),
            bytes_read: AtomicU64::new(0),
            bytes_written: AtomicU64::new(0),
            connects: AtomicU64::new(0),
            disconnects: AtomicU64::new(0),
            connect_failures: AtomicU64::new(0),
            lines_snapshot: AtomicU64::new(0),
            start_time: Instant::now(),
            last_calc_nanos: AtomicU64::new(0),
            line_rate: AtomicU64::new(0),
        }
    }

    #[inline]
    pub(crate) fn add_line_received(&self) {
        self.lines_received.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_line_dropped(&self) {
        self.lines_dropped.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_line_oversized(&self) {
        self.lines_oversized.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_line_sent(&self) {
        self.lines_sent.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_send_dropped(&self) {
        self.sends_dropped.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_read(&self, bytes: usize) {
        self.bytes_read.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_written(&self, bytes: usize) {
        self.bytes_written.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_connect(&self) {
        self.connects.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_disconnect(&self) {
        self.disconnects.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_connect_failure(&self) {
        self.connect_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy all counters
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            lines_received: self.lines_received.load(Ordering::Relaxed),
            lines_dropped: self.lines_dropped.load(Ordering::Relaxed),
            lines_oversized: self.lines_oversized.load(Ordering::Relaxed),
            lines_sent: self.lines_sent.load(Ordering::Relaxed),
            sends_dropped: self.sends_dropped.load(Ordering::Relaxed),
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            connects: self.connects.load(Ordering::Relaxed),
            disconnects: self.disconnects.load(Ordering::Relaxed),
            connect_failures: self.connect_failures.load(Ordering::Relaxed),
        }
    }

    /// Update the received-line rate and return it (lines/sec)
    /// Call this periodically from the consumer thread
    pub fn update_line_rate(&self) -> f64 {
        let now_nanos = self.start_time.elapsed().as_nanos() as u64;
        let last_nanos = self.last_calc_nanos.load(Ordering::Relaxed);
        let elapsed = now_nanos.saturating_sub(last_nanos) as f64 / 1_000_000_000.0;

        if elapsed < RATE_UPDATE_MIN_INTERVAL_SECS {
            // Too soon, return cached value
            return f64::from_bits(self.line_rate.load(Ordering::Relaxed));
        }

        // Try to claim the update (avoid duplicate calculations)
        if self
            .last_calc_nanos
            .compare_exchange(last_nanos, now_nanos, Ordering::SeqCst, Ordering::Relaxed)
            .is_err()
        {
            return f64::from_bits(self.line_rate.load(Ordering::Relaxed));
        }

        let now = self.lines_received.load(Ordering::Relaxed);
        let prev = self.lines_snapshot.swap(now, Ordering::Relaxed);
        let rate = now.saturating_sub(prev) as f64 / elapsed;

        self.line_rate.store(rate.to_bits(), Ordering::Relaxed);
        rate
    }
}

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}
