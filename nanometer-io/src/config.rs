//! Configuration for the Nanometer daemon
//!
//! Loads configuration from a TOML file. Every field has a default, so a
//! partial (or empty) file is valid.
//!
//! ```toml
//! [network]
//! bind_address = "0.0.0.0:1532"
//! wire_format = "postcard"
//!
//! [streaming]
//! points_rate = 30000
//! buffer_threshold = 1000
//! mode = "auto"
//!
//! [[devices]]
//! type = "monitor"
//!
//! [[devices]]
//! type = "mock_dac"
//! batch_size = 500
//!
//! [logging]
//! level = "info"
//! ```

use crate::error::{Error, Result};
use crate::protocol::wire::WireFormat;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Top-level daemon configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub streaming: StreamingConfig,
    #[serde(default = "default_devices")]
    pub devices: Vec<DeviceConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Point server socket settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkConfig {
    /// TCP bind address for point sources
    ///
    /// Examples:
    /// - `0.0.0.0:1532` - Bind to all interfaces on port 1532
    /// - `127.0.0.1:1532` - Localhost only
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Payload encoding, must match the connecting sources
    #[serde(default)]
    pub wire_format: WireFormat,
}

/// How the scheduler drains its buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeSetting {
    /// External clock when a clock master is attached, self-timed otherwise
    #[default]
    Auto,
    /// Local periodic timer pushes frames to every sink
    SelfTimed,
    /// The clock master pulls; fails at start if none is attached
    ExternalClock,
}

/// Scheduler settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StreamingConfig {
    /// Output sample rate in points per second
    #[serde(default = "default_points_rate")]
    pub points_rate: u32,

    /// Points per pull and per pushed frame
    #[serde(default = "default_buffer_threshold")]
    pub buffer_threshold: usize,

    #[serde(default)]
    pub mode: ModeSetting,

    /// Longest a clock-master callback waits for points before padding.
    /// Absent means wait as long as it takes.
    #[serde(default)]
    pub pull_timeout_ms: Option<u64>,
}

/// Output device declaration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeviceConfig {
    /// Throughput monitor (stand-in for a simulator)
    Monitor,
    /// Mirror frames to a UDP listener
    Udp { target: String },
    /// Software clock master pulling fixed-size batches
    MockDac {
        #[serde(default = "default_dac_batch")]
        batch_size: usize,
    },
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Default log level (trace, debug, info, warn, error); RUST_LOG wins
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_bind_address() -> String {
    "0.0.0.0:1532".to_string()
}
fn default_points_rate() -> u32 {
    30_000
}
fn default_buffer_threshold() -> usize {
    1000
}
fn default_dac_batch() -> usize {
    500
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_devices() -> Vec<DeviceConfig> {
    vec![DeviceConfig::Monitor]
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            wire_format: WireFormat::default(),
        }
    }
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            points_rate: default_points_rate(),
            buffer_threshold: default_buffer_threshold(),
            mode: ModeSetting::default(),
            pull_timeout_ms: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl StreamingConfig {
    /// Reject values the scheduler cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.points_rate == 0 {
            return Err(Error::Config("points_rate must be positive".to_string()));
        }
        if self.buffer_threshold == 0 {
            return Err(Error::Config(
                "buffer_threshold must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Period of the self-timed tick: one threshold's worth of samples
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(self.buffer_threshold as f64 / self.points_rate.max(1) as f64)
    }

    pub fn pull_timeout(&self) -> Option<Duration> {
        self.pull_timeout_ms.map(Duration::from_millis)
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.streaming.validate()?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents =
            toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))?;
        fs::write(path, contents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.network.bind_address, "0.0.0.0:1532");
        assert_eq!(config.network.wire_format, WireFormat::Postcard);
        assert_eq!(config.streaming.points_rate, 30_000);
        assert_eq!(config.streaming.buffer_threshold, 1000);
        assert_eq!(config.streaming.mode, ModeSetting::Auto);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.devices, vec![DeviceConfig::Monitor]);
        assert_eq!(config.streaming.pull_timeout(), None);
    }

    #[test]
    fn test_toml_deserialization() {
        let toml_content = r#"
[network]
bind_address = "127.0.0.1:9000"
wire_format = "json"

[streaming]
points_rate = 20000
buffer_threshold = 500
mode = "external_clock"
pull_timeout_ms = 40

[[devices]]
type = "udp"
target = "127.0.0.1:1533"

[[devices]]
type = "mock_dac"

[logging]
level = "debug"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.network.wire_format, WireFormat::Json);
        assert_eq!(config.streaming.mode, ModeSetting::ExternalClock);
        assert_eq!(
            config.streaming.pull_timeout(),
            Some(Duration::from_millis(40))
        );
        assert_eq!(
            config.devices,
            vec![
                DeviceConfig::Udp {
                    target: "127.0.0.1:1533".to_string()
                },
                DeviceConfig::MockDac { batch_size: 500 },
            ]
        );
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_sample_file_parses() {
        let config: Config = toml::from_str(include_str!("../nanometer.toml")).unwrap();
        assert!(config.streaming.validate().is_ok());
        assert_eq!(config.devices, vec![DeviceConfig::Monitor]);
    }

    #[test]
    fn test_tick_interval() {
        let config = StreamingConfig::default();
        let interval = config.tick_interval();
        approx::assert_relative_eq!(interval.as_secs_f64(), 1000.0 / 30_000.0);
    }

    #[test]
    fn test_validate_rejects_zero_threshold() {
        let config = StreamingConfig {
            buffer_threshold: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nanometer.toml");
        let mut config = Config::default();
        config.streaming.points_rate = 12_000;
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.streaming.points_rate, 12_000);
        assert_eq!(loaded.devices, config.devices);
    }
}
