//! # MCU Link
//!
//! Line bridge between an operator console and an MCU peripheral link.
//!
//! Reads lines from stdin: JSON command descriptors are encoded into frames
//! and printed as hex, hex lines are decoded as bytes received from the
//! device and printed as JSON responses.

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::sleep;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use mcu_link::bridge::Bridge;
use mcu_link::config::Config;

/// Main entry point for the MCU link bridge
///
/// # Control Flow
///
/// 1. Load configuration from the first argument, or use defaults
/// 2. Set up logging to stderr (`RUST_LOG` overrides the configured level)
/// 3. Translate stdin lines until EOF or Ctrl+C
///
/// A line that fails to translate is logged and skipped. When received bytes
/// stop mid-frame for longer than the receive timeout, the partial frame is
/// abandoned and its bytes rescanned; the same happens at end of input.
///
/// # Examples
///
/// ```bash
/// echo '{"type":"led_blink","duration":500}' | mcu-link config/default.toml
/// ```
///
/// Expected output:
/// ```text
/// AA11000201F44DCD
/// ```
#[tokio::main]
async fn main() -> Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(&path)
            .with_context(|| format!("Failed to load configuration from {}", path))?,
        None => Config::default(),
    };

    init_logging(&config.logging.level);

    info!("MCU Link v{} starting...", env!("CARGO_PKG_VERSION"));
    info!(
        "Input format: {:?}, device payload limit: {} bytes",
        config.bridge.input_format, config.protocol.max_payload_size
    );

    let mut bridge = Bridge::new(config);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let idle_timeout = bridge.receive_timeout();

    loop {
        let expire_partial = idle_timeout.is_some() && bridge.awaiting_frame();

        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    info!("End of input");
                    emit(bridge.flush());
                    break;
                };

                emit(bridge.handle_line(&line));
            }

            _ = sleep(idle_timeout.unwrap_or_default()), if expire_partial => {
                emit(bridge.flush());
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    info!(
        "Frames sent: {}, frames received: {}",
        bridge.frames_sent(),
        bridge.frames_received()
    );

    Ok(())
}

/// Print translated lines, or log why there are none
fn emit(outputs: mcu_link::error::Result<Vec<String>>) {
    match outputs {
        Ok(outputs) => {
            for output in outputs {
                println!("{}", output);
            }
        }
        Err(e) => warn!("Skipped line: {}", e),
    }
}

/// Log to stderr so stdout carries only bridge output
fn init_logging(level: &str) {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(build_filter(level))
        .init();
}

fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}
