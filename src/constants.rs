//! Application-wide constants
//!
//! Centralized defaults shared by config, bridge and game modules.

// =============================================================================
// Serial
// =============================================================================

/// Default baud rate (Arduino `Serial.begin(9600)`)
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Serial read timeout (milliseconds)
pub const SERIAL_READ_TIMEOUT_MS: u64 = 100;

/// Consecutive zero-byte reads before assuming port disconnected
pub const SERIAL_DISCONNECT_THRESHOLD: u32 = 10;

/// Read buffer size for the worker thread
pub const SERIAL_BUFFER_SIZE: usize = 1024;

/// USB vendor IDs accepted by auto-detection
/// (Arduino, Arduino.org, CH340, FTDI, CP210x)
pub const DEFAULT_DEVICE_VIDS: &[u16] = &[0x2341, 0x2A03, 0x1A86, 0x0403, 0x10C4];

// =============================================================================
// Timing - Reconnection
// =============================================================================

/// Delay between serial reconnection attempts (milliseconds)
pub const RECONNECT_DELAY_MS: u64 = 1000;

/// Shortest reconnection delay the worker will use (milliseconds)
pub const MIN_RECONNECT_DELAY_MS: u64 = 5;

// =============================================================================
// Buffers
// =============================================================================

/// Incoming lines kept unread before new ones are dropped
pub const MAX_UNREAD_MESSAGES: usize = 1;

/// Outgoing lines kept unsent before new ones are dropped
pub const OUTGOING_QUEUE_CAPACITY: usize = 64;

/// Minimum inbox size for `monitor`, which must print every line
pub const MONITOR_QUEUE_CAPACITY: usize = 1024;

/// Longest accepted line, excluding the terminator (bytes)
pub const MAX_LINE_LENGTH: usize = 256;

// =============================================================================
// Game loop
// =============================================================================

/// Frame ticks per second
pub const DEFAULT_TICK_RATE_HZ: u32 = 60;

/// Messages consumed per frame tick
pub const DEFAULT_MESSAGES_PER_TICK: usize = 1;

// =============================================================================
// Paddle
// =============================================================================

/// Hand distance (cm) at which the paddle stays still
pub const PADDLE_NEUTRAL_CM: f32 = 30.0;

/// Distance (cm) from neutral that produces full force
pub const PADDLE_RANGE_CM: f32 = 20.0;

/// Shortest distance the sensor reports reliably (cm)
pub const PADDLE_MIN_VALID_CM: f32 = 2.0;

/// Longest distance the sensor reports reliably (cm)
pub const PADDLE_MAX_VALID_CM: f32 = 400.0;

/// Force applied at full deflection
pub const PADDLE_MAX_FORCE: f32 = 10.0;

// =============================================================================
// Files
// =============================================================================

/// Config file looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "paddle-bridge.toml";

// =============================================================================
// Stats
// =============================================================================

/// Minimum interval between rate updates (seconds)
pub const RATE_UPDATE_MIN_INTERVAL_SECS: f64 = 0.1;

/// Interval between stats reports in the frame loop (seconds)
pub const STATS_REPORT_INTERVAL_SECS: u64 = 10;
