//! Centralized error types for the bridge
//!
//! All bridge errors are represented by the `BridgeError` enum.
//! Use `Result<T>` as shorthand for `std::result::Result<T, BridgeError>`.

use std::fmt;
use std::path::PathBuf;

/// All bridge errors
#[derive(Debug)]
pub enum BridgeError {
    // === Transport ===
    /// Failed to open serial port
    SerialOpen {
        port: String,
        source: std::io::Error,
    },
    /// Failed to enumerate serial ports
    SerialEnumerate { source: std::io::Error },

    // === Detection ===
    /// No device found matching configuration
    NoDeviceFound,
    /// Multiple devices found matching configuration
    MultipleDevicesFound { count: usize },

    // === IO ===
    /// Config file could not be read
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Config file is not valid TOML for this schema
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },
    /// Invalid config value
    ConfigValidation { field: &'static str, reason: String },

    // === Runtime ===
    /// Worker thread could not be spawned
    ThreadSpawn { source: std::io::Error },
    /// Worker thread panicked
    WorkerPanicked,
    /// Tokio runtime creation failed
    Runtime { source: std::io::Error },
    /// Signal handler could not be installed
    Signal { source: std::io::Error },
    /// Output serialization failed
    Json { source: serde_json::Error },
}

impl std::error::Error for BridgeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::SerialOpen { source, .. }
            | Self::SerialEnumerate { source }
            | Self::ConfigRead { source, .. }
            | Self::ThreadSpawn { source }
            | Self::Runtime { source }
            | Self::Signal { source } => Some(source),
            Self::ConfigParse { source, .. } => Some(source),
            Self::Json { source } => Some(source),
            _ => None,
        }
    }
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SerialOpen { port, source } => {
                write!(f, "Cannot open serial port {}: {}", port, source)
            }
            Self::SerialEnumerate { source } => {
                write!(f, "Cannot list serial ports: {}", source)
            }
            Self::NoDeviceFound => write!(f, "No device found"),
            Self::MultipleDevicesFound { count } => {
                write!(f, "Multiple devices found ({}), specify a port", count)
            }
            Self::ConfigRead { path, source } => {
                write!(f, "Cannot read config {}: {}", path.display(), source)
            }
            Self::ConfigParse { path, source } => {
                write!(f, "Invalid config {}: {}", path.display(), source)
            }
            Self::ConfigValidation { field, reason } => {
                write!(f, "Invalid {}: {}", field, reason)
            }
            Self::ThreadSpawn { .. } => write!(f, "Failed to spawn serial worker"),
            Self::WorkerPanicked => write!(f, "Serial worker panicked"),
            Self::Runtime { .. } => write!(f, "Failed to create runtime"),
            Self::Signal { .. } => write!(f, "Failed to install signal handler"),
            Self::Json { source } => write!(f, "JSON output failed: {}", source),
        }
    }
}

/// Alias for Result with BridgeError
pub type Result<T> = std::result::Result<T, BridgeError>;
