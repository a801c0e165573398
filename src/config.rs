//! Configuration management
//!
//! Config is read from an explicit `--config` path, or from
//! `paddle-bridge.toml` in the working directory when present.
//! Missing sections fall back to defaults from `constants`.

use crate::constants::{
    CONFIG_FILE_NAME, DEFAULT_BAUD_RATE, DEFAULT_DEVICE_VIDS, DEFAULT_MESSAGES_PER_TICK,
    DEFAULT_TICK_RATE_HZ, MAX_LINE_LENGTH, MAX_UNREAD_MESSAGES, MIN_RECONNECT_DELAY_MS,
    OUTGOING_QUEUE_CAPACITY, PADDLE_MAX_FORCE, PADDLE_MAX_VALID_CM, PADDLE_MIN_VALID_CM,
    PADDLE_NEUTRAL_CM, PADDLE_RANGE_CM, RECONNECT_DELAY_MS, SERIAL_READ_TIMEOUT_MS,
};
use crate::error::{BridgeError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub serial: SerialConfig,
    pub bridge: BridgeConfig,
    pub paddle: PaddleConfig,
}

// =============================================================================
// Serial
// =============================================================================

/// Serial device settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Serial port name (empty = auto-detect by USB vendor ID)
    pub port: String,
    /// Baud rate, must match the sketch's `Serial.begin()`
    pub baud_rate: u32,
    /// Read timeout in milliseconds
    pub read_timeout_ms: u64,
    /// USB vendor IDs accepted by auto-detection
    pub device_vids: Vec<u16>,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: String::new(),
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout_ms: SERIAL_READ_TIMEOUT_MS,
            device_vids: DEFAULT_DEVICE_VIDS.to_vec(),
        }
    }
}

impl SerialConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

// =============================================================================
// Bridge
// =============================================================================

/// Worker and queue settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Delay between reconnection attempts in milliseconds
    pub reconnect_delay_ms: u64,
    /// Incoming lines kept unread; newer lines are dropped beyond this
    pub max_unread_messages: usize,
    /// Outgoing lines kept unsent; newer lines are dropped beyond this
    pub max_outgoing_messages: usize,
    /// Longest accepted line in bytes
    pub max_line_length: usize,
    /// Frame ticks per second
    pub tick_rate_hz: u32,
    /// Messages consumed per frame tick
    pub messages_per_tick: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            reconnect_delay_ms: RECONNECT_DELAY_MS,
            max_unread_messages: MAX_UNREAD_MESSAGES,
            max_outgoing_messages: OUTGOING_QUEUE_CAPACITY,
            max_line_length: MAX_LINE_LENGTH,
            tick_rate_hz: DEFAULT_TICK_RATE_HZ,
            messages_per_tick: DEFAULT_MESSAGES_PER_TICK,
        }
    }
}

impl BridgeConfig {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.tick_rate_hz.max(1)))
    }
}

// =============================================================================
// Paddle
// =============================================================================

/// Mapping from sensor distance to paddle force
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaddleConfig {
    pub neutral_cm: f32,
    pub range_cm: f32,
    pub min_valid_cm: f32,
    pub max_valid_cm: f32,
    pub max_force: f32,
}

impl Default for PaddleConfig {
    fn default() -> Self {
        Self {
            neutral_cm: PADDLE_NEUTRAL_CM,
            range_cm: PADDLE_RANGE_CM,
            min_valid_cm: PADDLE_MIN_VALID_CM,
            max_valid_cm: PADDLE_MAX_VALID_CM,
            max_force: PADDLE_MAX_FORCE,
        }
    }
}

// =============================================================================
// Loading
// =============================================================================

impl Config {
    /// Check values that would make the bridge misbehave
    pub fn validate(&self) -> Result<()> {
        if self.serial.baud_rate == 0 {
            return Err(invalid("serial.baud_rate", "must be greater than 0"));
        }
        if self.serial.read_timeout_ms == 0 {
            return Err(invalid("serial.read_timeout_ms", "must be greater than 0"));
        }
        if self.bridge.reconnect_delay_ms < MIN_RECONNECT_DELAY_MS {
            return Err(BridgeError::ConfigValidation {
                field: "bridge.reconnect_delay_ms",
                reason: format!("must be at least {}", MIN_RECONNECT_DELAY_MS),
            });
        }
        if self.bridge.max_unread_messages == 0 {
            return Err(invalid("bridge.max_unread_messages", "must be at least 1"));
        }
        if self.bridge.max_outgoing_messages == 0 {
            return Err(invalid("bridge.max_outgoing_messages", "must be at least 1"));
        }
        if self.bridge.max_line_length == 0 {
            return Err(invalid("bridge.max_line_length", "must be at least 1"));
        }
        if self.bridge.tick_rate_hz == 0 || self.bridge.tick_rate_hz > 1000 {
            return Err(invalid("bridge.tick_rate_hz", "must be within 1..=1000"));
        }
        if self.bridge.messages_per_tick == 0 {
            return Err(invalid("bridge.messages_per_tick", "must be at least 1"));
        }
        if self.paddle.range_cm <= 0.0 {
            return Err(invalid("paddle.range_cm", "must be positive"));
        }
        if self.paddle.min_valid_cm >= self.paddle.max_valid_cm {
            return Err(invalid(
                "paddle.min_valid_cm",
                "must be lower than paddle.max_valid_cm",
            ));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> BridgeError {
    BridgeError::ConfigValidation {
        field,
        reason: reason.to_string(),
    }
}

/// Default config path (working directory)
pub fn default_path() -> PathBuf {
    PathBuf::from(CONFIG_FILE_NAME)
}

/// Load config
///
/// An explicit path must exist. Without one, the default file is used
/// if present, otherwise built-in defaults. Values are not validated here:
/// call `validate()` once command-line overrides are applied.
pub fn load(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(p) => read(p)?,
        None => {
            let p = default_path();
            if p.exists() {
                read(&p)?
            } else {
                debug!("No {} found, using defaults", CONFIG_FILE_NAME);
                Config::default()
            }
        }
    };
    Ok(config)
}

fn read(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path).map_err(|e| BridgeError::ConfigRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    let config = toml::from_str(&content).map_err(|e| BridgeError::ConfigParse {
        path: path.to_path_buf(),
        source: e,
    })?;
    debug!("Loaded config from {}", path.display());
    Ok(config)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = Config::default();

        assert_eq!(config.serial.port, "");
        assert_eq!(config.serial.baud_rate, DEFAULT_BAUD_RATE);
        assert_eq!(config.serial.device_vids, DEFAULT_DEVICE_VIDS.to_vec());
        assert_eq!(config.bridge.reconnect_delay(), Duration::from_millis(RECONNECT_DELAY_MS));
        assert_eq!(config.bridge.max_unread_messages, MAX_UNREAD_MESSAGES);
        assert_eq!(config.paddle.neutral_cm, PADDLE_NEUTRAL_CM);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_empty_file() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_config_partial_section() {
        let toml_str = r#"
[serial]
port = "/dev/ttyACM0"

[bridge]
max_unread_messages = 8
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.serial.port, "/dev/ttyACM0");
        assert_eq!(config.serial.baud_rate, DEFAULT_BAUD_RATE);
        assert_eq!(config.bridge.max_unread_messages, 8);
        assert_eq!(config.bridge.reconnect_delay_ms, RECONNECT_DELAY_MS);
        assert_eq!(config.paddle, PaddleConfig::default());
    }

    #[test]
    fn test_config_serialize_deserialize_roundtrip() {
        let mut config = Config::default();
        config.serial.port = "COM4".into();
        config.paddle.max_force = 3.5;

        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let mut config = Config::default();
        config.bridge.max_unread_messages = 0;
        match config.validate() {
            Err(BridgeError::ConfigValidation { field, .. }) => {
                assert_eq!(field, "bridge.max_unread_messages")
            }
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_zero_read_timeout() {
        let mut config = Config::default();
        config.serial.read_timeout_ms = 0;
        match config.validate() {
            Err(BridgeError::ConfigValidation { field, .. }) => {
                assert_eq!(field, "serial.read_timeout_ms")
            }
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_short_reconnect_delay() {
        let mut config = Config::default();
        config.bridge.reconnect_delay_ms = 0;
        match config.validate() {
            Err(BridgeError::ConfigValidation { field, .. }) => {
                assert_eq!(field, "bridge.reconnect_delay_ms")
            }
            other => panic!("Expected validation error, got {:?}", other),
        }

        config.bridge.reconnect_delay_ms = MIN_RECONNECT_DELAY_MS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_does_not_validate() {
        let path = std::env::temp_dir().join(format!(
            "paddle-bridge-load-{}.toml",
            std::process::id()
        ));
        fs::write(&path, "[serial]\nbaud_rate = 0\n").unwrap();

        let loaded = load(Some(&path));
        let _ = fs::remove_file(&path);

        let config = loaded.unwrap();
        assert_eq!(config.serial.baud_rate, 0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_distance_window() {
        let mut config = Config::default();
        config.paddle.min_valid_cm = 50.0;
        config.paddle.max_valid_cm = 10.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_tick_period() {
        let mut bridge = BridgeConfig::default();
        bridge.tick_rate_hz = 50;
        assert_eq!(bridge.tick_period(), Duration::from_millis(20));
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let err = load(Some(Path::new("/nonexistent/paddle-bridge.toml"))).unwrap_err();
        assert!(matches!(err, BridgeError::ConfigRead { .. }));
    }
}
