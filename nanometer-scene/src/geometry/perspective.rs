//! Perspective projection applied after a group's transforms and blanking

use nanometer_io::Point;

/// Camera distance from the origin, looking down -z
pub const DEFAULT_CAMERA_DISTANCE: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Perspective {
    pub camera_distance: f64,
}

impl Default for Perspective {
    fn default() -> Self {
        Self {
            camera_distance: DEFAULT_CAMERA_DISTANCE,
        }
    }
}

impl Perspective {
    pub fn new(camera_distance: f64) -> Self {
        Self { camera_distance }
    }

    /// Scale x, y by `1 / (C - z)` and drop z
    #[inline]
    pub fn project(&self, point: &Point) -> Point {
        let d = 1.0 / (self.camera_distance - point.z());
        Point {
            x: d * point.x,
            y: d * point.y,
            z: None,
            ..*point
        }
    }
}
