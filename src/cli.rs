//! Command-line interface definition using clap
//!
//! Provides structured argument parsing with automatic help generation.

use crate::config::{self, Config};
use crate::error::Result;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

// =============================================================================
// CLI Definition
// =============================================================================

/// Serial line bridge for a sensor-driven paddle game
#[derive(Parser, Debug, Default)]
#[command(name = "paddle-bridge")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file (default: ./paddle-bridge.toml if present)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the paddle frame loop against the sensor board (default)
    Run(ConnectArgs),

    /// Print every received line with a timestamp
    Monitor(ConnectArgs),

    /// List available serial ports
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Connection overrides shared by `run` and `monitor`
#[derive(Args, Debug, Default, Clone, PartialEq, Eq)]
pub struct ConnectArgs {
    /// Serial port to use (overrides config, default: auto-detect)
    #[arg(long, value_name = "PORT")]
    pub port: Option<String>,

    /// Baud rate (overrides config)
    #[arg(long, value_name = "BAUD")]
    pub baud: Option<u32>,

    /// Delay between reconnection attempts in milliseconds (overrides config)
    #[arg(long, value_name = "MS")]
    pub reconnect_delay_ms: Option<u64>,
}

impl ConnectArgs {
    /// Apply command-line overrides on top of file config
    pub fn apply(&self, config: &mut Config) {
        if let Some(port) = &self.port {
            config.serial.port = port.clone();
        }
        if let Some(baud) = self.baud {
            config.serial.baud_rate = baud;
        }
        if let Some(delay) = self.reconnect_delay_ms {
            config.bridge.reconnect_delay_ms = delay;
        }
    }
}

/// Load the config file, apply overrides, then validate the result
pub fn resolve_config(path: Option<&Path>, args: &ConnectArgs) -> Result<Config> {
    let mut config = config::load(path)?;
    args.apply(&mut config);
    config.validate()?;
    Ok(config)
}

// =============================================================================
// Tests
// =============================================================================
