//! Nanometer Scene - serves a demo scene to a nanometer daemon
//!
//! Connects to the daemon, then answers every point request with the next
//! points of the selected scene until the daemon goes away or Ctrl-C.
//!
//! ```sh
//! nanometer-scene --scene sphere --server 192.168.1.20:1532
//! ```

use clap::Parser;
use nanometer_io::PointClient;
use nanometer_scene::config::SceneConfig;
use nanometer_scene::error::{Result, SceneError};
use nanometer_scene::scenes::{self, SceneKind};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

/// Point source serving demo scenes
#[derive(Parser, Debug)]
#[command(name = "nanometer-scene", version, about)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "scene.toml")]
    config: PathBuf,

    /// Daemon address, overrides the config
    #[arg(short, long)]
    server: Option<String>,

    /// Scene to serve, overrides the config
    #[arg(long, value_enum)]
    scene: Option<SceneKind>,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nanometer_scene=info,nanometer_io=info".into()),
        )
        .init();

    let args = Args::parse();

    let mut config = if args.config.exists() {
        info!("Loading configuration from {:?}", args.config);
        SceneConfig::load(&args.config)?
    } else {
        info!("Using default configuration");
        SceneConfig::default()
    };
    if let Some(server) = args.server {
        config.connection.server_address = server;
    }
    if let Some(kind) = args.scene {
        config.scene.kind = kind;
    }

    info!("NanometerScene v{}", env!("CARGO_PKG_VERSION"));
    let kind = config.scene.kind;
    let provider = scenes::build(kind, config.blanking)?;

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::Relaxed);
    })
    .map_err(|e| SceneError::Config(format!("Error setting Ctrl-C handler: {}", e)))?;

    info!(
        "Connecting to {} ({:?})",
        config.connection.server_address, config.connection.wire_format
    );
    let mut client = PointClient::connect(
        &config.connection.server_address,
        config.connection.timeout(),
        config.connection.wire_format,
    )?;

    let center_origin = config.connection.center_origin && !kind.is_device_relative();
    if config.connection.center_origin && !center_origin {
        warn!(
            "Scene {} is in device coordinates, center_origin disabled",
            kind.name()
        );
    }
    client.set_center_origin(center_origin);
    client.attach_provider(provider);

    info!("Serving scene {}", kind.name());
    client.run(&running)?;
    info!("Served {} point requests", client.served());
    Ok(())
}
