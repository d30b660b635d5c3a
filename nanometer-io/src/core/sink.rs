//! Output device traits

use crate::core::types::{DevicePoint, Point};
use crate::error::Result;

/// Push-driven output device (simulator, network mirror, recorder)
///
/// The scheduler calls [`PointSink::stream`] with each frame, at whatever
/// cadence the active clock dictates.
pub trait PointSink: Send {
    /// Short identifier for logs
    fn name(&self) -> &str;

    /// Accept a frame of points to be played at `rate` samples per second
    fn stream(&mut self, points: &[Point], rate: u32) -> Result<()>;
}

/// Callback a clock master uses to pull exactly `num` points
pub type PullCallback = Box<dyn FnMut(usize) -> Vec<DevicePoint> + Send>;

/// Output device that owns the timing (e.g. a DAC with its own crystal)
///
/// It cannot be pushed to. Once streaming it calls the registered callback
/// whenever its hardware buffer needs refilling.
pub trait ClockMaster: Send {
    /// Short identifier for logs
    fn name(&self) -> &str;

    /// Begin pulling at `rate` samples per second through `callback`
    fn stream_points(&mut self, rate: u32, callback: PullCallback) -> Result<()>;

    /// Stop pulling. Must be idempotent.
    fn stop(&mut self) -> Result<()>;
}
