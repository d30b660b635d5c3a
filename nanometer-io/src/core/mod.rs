//! Core abstractions shared across the daemon.
//!
//! - [`types`]: Point, Color and the device-native encoding
//! - [`sink`]: Output device traits to implement for new hardware
//! - [`source`]: Pull contracts on both sides of the wire

pub mod sink;
pub mod source;
pub mod types;
