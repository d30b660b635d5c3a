//! Configuration loading for Nanometer Scene
//!
//! ```toml
//! [connection]
//! server_address = "127.0.0.1:1532"
//! timeout_ms = 5000
//! center_origin = true
//! wire_format = "postcard"
//!
//! [scene]
//! kind = "cube"
//!
//! # Optional, overrides the scene's own blanking
//! [blanking]
//! begin_samples = 30
//! laser_on_samples = 0
//! end_samples = 10
//! laser_off_samples = 2
//! ```

use crate::error::{Result, SceneError};
use crate::geometry::BlankingOptions;
use crate::scenes::SceneKind;
use nanometer_io::WireFormat;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Main configuration structure
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SceneConfig {
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub scene: SceneSettings,
    #[serde(default)]
    pub blanking: Option<BlankingOptions>,
}

/// Network connection settings
#[derive(Clone, Debug, Deserialize)]
pub struct ConnectionConfig {
    /// Daemon address (default: 127.0.0.1:1532)
    #[serde(default = "default_server_address")]
    pub server_address: String,

    /// Connection timeout in milliseconds (default: 5000)
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,

    /// Map scene coordinates from [-1, 1] to [0, 1] before sending
    #[serde(default = "default_center_origin")]
    pub center_origin: bool,

    /// Must match the daemon's wire format
    #[serde(default)]
    pub wire_format: WireFormat,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SceneSettings {
    #[serde(default)]
    pub kind: SceneKind,
}

// Default value functions
fn default_server_address() -> String {
    "127.0.0.1:1532".to_string()
}
fn default_timeout() -> u64 {
    5000
}
fn default_center_origin() -> bool {
    true
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            server_address: default_server_address(),
            timeout_ms: default_timeout(),
            center_origin: default_center_origin(),
            wire_format: WireFormat::default(),
        }
    }
}

impl ConnectionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl SceneConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SceneError::Config(format!("Failed to read config file: {}", e)))?;
        let config: SceneConfig = toml::from_str(&content)?;
        if let Some(blanking) = &config.blanking {
            blanking.validate()?;
        }
        Ok(config)
    }
}
