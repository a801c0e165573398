//! Paddle Bridge - serial line bridge for a sensor-driven paddle game
//!
//! Usage:
//!   paddle-bridge                 Run the paddle frame loop (auto-detect port)
//!   paddle-bridge run --port COM3 Run against a specific port
//!   paddle-bridge monitor         Print received lines
//!   paddle-bridge list [--json]   List serial ports

use clap::Parser;
use paddle_bridge::bridge::BridgeOptions;
use paddle_bridge::cli::{self, Cli, Command, ConnectArgs};
use paddle_bridge::config::Config;
use paddle_bridge::constants::STATS_REPORT_INTERVAL_SECS;
use paddle_bridge::error::{BridgeError, Result};
use paddle_bridge::game::{run_frame_loop, MessageListener, PaddleInput, SerialController};
use paddle_bridge::logging;
use paddle_bridge::transport::{self, SerialConnector};
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let command = cli
        .command
        .unwrap_or_else(|| Command::Run(ConnectArgs::default()));

    match command {
        Command::List { json } => list_ports(json),
        Command::Run(args) => {
            let config = cli::resolve_config(cli.config.as_deref(), &args)?;
            block_on(run_game(config))
        }
        Command::Monitor(args) => {
            let config = cli::resolve_config(cli.config.as_deref(), &args)?;
            block_on(run_monitor(config))
        }
    }
}

fn block_on<F: std::future::Future<Output = Result<()>>>(future: F) -> Result<()> {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| BridgeError::Runtime { source: e })?;
    rt.block_on(future)
}

// =============================================================================
// Commands
// =============================================================================

fn list_ports(json: bool) -> Result<()> {
    let ports = transport::list_ports()?;

    if json {
        let text =
            serde_json::to_string_pretty(&ports).map_err(|e| BridgeError::Json { source: e })?;
        println!("{}", text);
        return Ok(());
    }

    if ports.is_empty() {
        println!("No serial ports found");
    }
    for port in &ports {
        match (port.vid, port.pid) {
            (Some(vid), Some(pid)) => println!(
                "{:<20} {:<8} {:04x}:{:04x} {}",
                port.name,
                port.kind,
                vid,
                pid,
                port.product.as_deref().unwrap_or("")
            ),
            _ => println!("{:<20} {}", port.name, port.kind),
        }
    }
    Ok(())
}

async fn run_game(config: Config) -> Result<()> {
    let shutdown = install_shutdown_handler()?;
    let connector = SerialConnector::from_config(&config.serial);

    let mut controller = SerialController::start(
        connector,
        BridgeOptions::from(&config.bridge),
        PaddleInput::new(config.paddle.clone()),
        config.bridge.messages_per_tick,
    )?;
    info!(
        "Bridge started: {} ({} Hz)",
        controller.bridge().target(),
        config.bridge.tick_rate_hz
    );

    let mut last_connected = false;
    let mut last_triggered = false;
    let mut last_force = 0.0f32;
    let mut last_report = Instant::now();
    let report_interval = Duration::from_secs(STATS_REPORT_INTERVAL_SECS);

    let frames = run_frame_loop(
        &mut controller,
        config.bridge.tick_period(),
        shutdown,
        |c| {
            let paddle = c.listener();

            if paddle.is_connected() != last_connected {
                last_connected = paddle.is_connected();
                info!(connected = last_connected, "Sensor connection changed");
            }
            if paddle.is_triggered() != last_triggered {
                last_triggered = paddle.is_triggered();
                info!(triggered = last_triggered, "Trigger changed");
            }
            if paddle.movement_force() != last_force {
                last_force = paddle.movement_force();
                debug!(force = last_force, distance = ?paddle.last_distance(), "Paddle force");
            }

            if last_report.elapsed() >= report_interval {
                let stats = c.bridge().stats();
                let rate = stats.update_line_rate();
                let snap = stats.snapshot();
                info!(
                    lines_per_sec = rate,
                    received = snap.lines_received,
                    dropped = snap.lines_dropped,
                    ignored = paddle.ignored_lines(),
                    reconnects = snap.connects.saturating_sub(1),
                    "Bridge stats"
                );
                last_report = Instant::now();
            }
        },
    )
    .await;

    controller.stop()?;
    info!("Stopped after {} frames", frames);
    Ok(())
}

/// Listener that prints each line and connection event
struct LinePrinter;

impl MessageListener for LinePrinter {
    fn on_message_arrived(&mut self, line: &str) {
        println!("{} {}", logging::timestamp(), line);
    }

    fn on_connection_event(&mut self, connected: bool) {
        let event = if connected { "connected" } else { "disconnected" };
        println!("{} -- {} --", logging::timestamp(), event);
    }
}

async fn run_monitor(config: Config) -> Result<()> {
    let shutdown = install_shutdown_handler()?;
    let connector = SerialConnector::from_config(&config.serial);

    // Drain everything each tick
    let mut controller = SerialController::start(
        connector,
        BridgeOptions::for_monitor(&config.bridge),
        LinePrinter,
        usize::MAX,
    )?;
    info!("Monitoring {}", controller.bridge().target());

    run_frame_loop(&mut controller, config.bridge.tick_period(), shutdown, |_| {}).await;

    let snap = controller.bridge().stats().snapshot();
    controller.stop()?;
    info!(
        "Received {} lines ({} dropped, {} oversized)",
        snap.lines_received, snap.lines_dropped, snap.lines_oversized
    );
    Ok(())
}

// =============================================================================
// Shutdown
// =============================================================================

/// Set the returned flag on Ctrl-C (and SIGTERM on unix)
fn install_shutdown_handler() -> Result<Arc<AtomicBool>> {
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm =
            signal(SignalKind::terminate()).map_err(|e| BridgeError::Signal { source: e })?;
        let mut sigint =
            signal(SignalKind::interrupt()).map_err(|e| BridgeError::Signal { source: e })?;

        tokio::spawn(async move {
            tokio::select! {
                _ = sigterm.recv() => {},
                _ = sigint.recv() => {},
            }
            info!("Shutdown requested");
            shutdown_clone.store(true, Ordering::SeqCst);
        });
    }

    #[cfg(not(unix))]
    {
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Shutdown requested");
                shutdown_clone.store(true, Ordering::SeqCst);
            }
        });
    }

    Ok(shutdown)
}
