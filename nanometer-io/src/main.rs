//! Nanometer IO - point streaming daemon
//!
//! ## Architecture
//!
//! - **TCP (port 1532)**: one point source at a time answers point requests
//! - **Scheduler**: pulls from the active source and feeds the configured
//!   devices, self-timed or driven by a clock master
//!
//! With no source connected the devices keep receiving the fallback point.

use clap::Parser;
use nanometer_io::config::Config;
use nanometer_io::devices::create_devices;
use nanometer_io::error::{Error, Result};
use nanometer_io::protocol::create_serializer;
use nanometer_io::scheduler::Scheduler;
use nanometer_io::transport::PointServer;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

/// Point streaming daemon for laser projection devices
#[derive(Parser, Debug)]
#[command(name = "nanometer-io", version, about)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "/etc/nanometer.toml")]
    config: PathBuf,

    /// Override the bind address (e.g. 127.0.0.1:1532)
    #[arg(short, long)]
    bind: Option<String>,
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = if args.config.exists() {
        Config::load(&args.config)?
    } else {
        Config::default()
    };
    if let Some(bind) = &args.bind {
        config.network.bind_address = bind.clone();
    }
    Ok(config)
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    // Initialize logger, RUST_LOG takes precedence over the config level
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    log::info!("Nanometer IO v{} starting...", env!("CARGO_PKG_VERSION"));
    if args.config.exists() {
        log::info!("Using config: {}", args.config.display());
    } else {
        log::info!("No config at {}, using defaults", args.config.display());
    }

    // Set up shutdown signal handler
    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        r.store(false, Ordering::Relaxed);
    })
    .map_err(|e| Error::Other(format!("Error setting Ctrl-C handler: {}", e)))?;

    let mut scheduler = Scheduler::new(config.streaming.clone())?;
    for device in create_devices(&config)? {
        scheduler.use_device(device)?;
    }

    let serializer = create_serializer(config.network.wire_format);
    let mut server = PointServer::bind(config.network.bind_address.as_str(), serializer)
        .map_err(|e| {
            Error::Other(format!(
                "Failed to bind to {}: {}",
                config.network.bind_address, e
            ))
        })?;
    scheduler.stream_from(server.session());

    let mode = scheduler.start()?;
    log::info!("Streaming in {:?} mode. Press Ctrl-C to stop.", mode);

    while running.load(Ordering::Relaxed) {
        thread::sleep(Duration::from_millis(100));
    }

    // Shutdown
    log::info!("Shutting down...");
    // Dropping the source first resolves any pull still waiting on it
    server.shutdown();
    scheduler.stop()?;
    log::info!("Nanometer IO stopped");
    Ok(())
}
