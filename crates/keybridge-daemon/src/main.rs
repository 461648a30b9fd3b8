//! keybridge daemon
//!
//! Reads key events from a physical keyboard and re-emits them through a
//! virtual uinput keyboard.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal::unix::{signal, SignalKind};
use tracing_subscriber::EnvFilter;

use keybridge_daemon::bridge;
use keybridge_daemon::sink::UinputSink;
use keybridge_daemon::source::KeyboardSource;

#[derive(Parser, Debug)]
#[command(name = "keybridged")]
#[command(about = "Keyboard bridge daemon")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "~/.config/keybridge/config.kdl")]
    config: String,

    /// Input device to read (overrides config)
    #[arg(short, long)]
    device: Option<PathBuf>,

    /// Leave the input device ungrabbed
    #[arg(long)]
    no_grab: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Expand tilde in config path
    let config_path: PathBuf = shellexpand::tilde(&args.config).into_owned().into();

    let config = keybridge_config::parse_config(&config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;

    // Initialize tracing; RUST_LOG takes precedence over the config file
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.global.log_level.as_filter())),
        )
        .init();

    tracing::info!("Loaded configuration from {}", config_path.display());

    let (device, grab) = match (&args.device, &config.input) {
        (Some(device), input) => (device.clone(), input.as_ref().map_or(true, |i| i.grab)),
        (None, Some(input)) => (input.device.clone(), input.grab),
        (None, None) => anyhow::bail!(
            "No input device configured; add `input {{ device \"...\" }}` or pass --device"
        ),
    };
    let grab = grab && !args.no_grab;

    let mut sigterm = signal(SignalKind::terminate())?;

    let sink = UinputSink::acquire(config.output.clone())
        .await
        .context("Failed to create virtual output keyboard")?;

    let mut source = match KeyboardSource::open(&device, grab) {
        Ok(source) => source,
        Err(e) => {
            if let Err(e) = sink.release().await {
                tracing::warn!("{}", e);
            }
            return Err(e.into());
        }
    };

    tracing::info!(
        "keybridge running: '{}' -> '{}'",
        source.name(),
        sink.name()
    );

    let shutdown = async move {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => tracing::info!("Received SIGINT"),
            _ = sigterm.recv() => tracing::info!("Received SIGTERM"),
        }
    };

    let stats = bridge::run(&mut source, &sink, config.global.tick_interval(), shutdown).await?;
    tracing::info!(
        "Forwarded {} event(s), {} failed",
        stats.forwarded,
        stats.failed
    );

    Ok(())
}
