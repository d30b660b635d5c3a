//! Output devices
//!
//! Two kinds, matching the two draining disciplines:
//! - [`PointSink`]s are pushed frames by the scheduler
//! - a [`ClockMaster`] pulls points through a callback on its own clock

pub mod mock_dac;
pub mod monitor;
pub mod udp;

pub use mock_dac::{DacStats, MockDac};
pub use monitor::{MonitorSink, MonitorStats};
pub use udp::UdpSink;

use crate::config::{Config, DeviceConfig};
use crate::core::sink::{ClockMaster, PointSink};
use crate::error::{Error, Result};

/// A configured device, ready to attach to the scheduler
pub enum Device {
    Sink(Box<dyn PointSink>),
    ClockMaster(Box<dyn ClockMaster>),
}

impl Device {
    pub fn name(&self) -> &str {
        match self {
            Device::Sink(sink) => sink.name(),
            Device::ClockMaster(master) => master.name(),
        }
    }
}

/// Create a device from its declaration
pub fn create_device(config: &DeviceConfig) -> Result<Device> {
    match config {
        DeviceConfig::Monitor => Ok(Device::Sink(Box::new(MonitorSink::new()))),
        DeviceConfig::Udp { target } => Ok(Device::Sink(Box::new(UdpSink::new(target)?))),
        DeviceConfig::MockDac { batch_size } => {
            if *batch_size == 0 {
                return Err(Error::Config("mock_dac batch_size must be positive".to_string()));
            }
            Ok(Device::ClockMaster(Box::new(MockDac::new(*batch_size))))
        }
    }
}

/// Create every configured device, failing on more than one clock master
pub fn create_devices(config: &Config) -> Result<Vec<Device>> {
    let devices = config
        .devices
        .iter()
        .map(create_device)
        .collect::<Result<Vec<_>>>()?;

    let masters = devices
        .iter()
        .filter(|d| matches!(d, Device::ClockMaster(_)))
        .count();
    if masters > 1 {
        return Err(Error::Config(format!(
            "{} clock masters configured, at most one is allowed",
            masters
        )));
    }
    Ok(devices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_default_devices() {
        let devices = create_devices(&Config::default()).unwrap();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].name(), "monitor");
    }

    #[test]
    fn test_two_clock_masters_rejected() {
        let config = Config {
            devices: vec![
                DeviceConfig::MockDac { batch_size: 100 },
                DeviceConfig::MockDac { batch_size: 200 },
            ],
            ..Default::default()
        };
        assert!(matches!(create_devices(&config), Err(Error::Config(_))));
    }

    #[test]
    fn test_zero_batch_rejected() {
        let result = create_device(&DeviceConfig::MockDac { batch_size: 0 });
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
