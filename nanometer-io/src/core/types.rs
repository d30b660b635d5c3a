//! Core point types shared by the protocol, scheduler and devices.
//!
//! Key types:
//! - [`Point`]: device-relative colored sample, coordinates and colors in `[0, 1]`
//! - [`Color`]: RGB triple used by shape constructors
//! - [`DevicePoint`]: clock-master native encoding (signed 16-bit position, 16-bit color)

use serde::{Deserialize, Serialize};

/// RGB color, channels conventionally in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0);
    pub const RED: Color = Color::new(1.0, 0.0, 0.0);
    pub const GREEN: Color = Color::new(0.0, 1.0, 0.0);
    pub const BLUE: Color = Color::new(0.0, 0.0, 1.0);

    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// True when every channel is zero (laser off)
    #[inline]
    pub fn is_black(&self) -> bool {
        self.r == 0.0 && self.g == 0.0 && self.b == 0.0
    }
}

/// A single colored sample
///
/// `z` is optional: 2D sources leave it out and it reads as 0. Points are
/// plain values, copied between transform stages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: Option<f64>,
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Point {
    /// Sentinel sent when no point source is connected: center, laser off
    pub const FALLBACK: Point = Point::new(0.5, 0.5, Color::BLACK);

    /// Sentinel used to pad buffer underflows: center, pure red
    pub const PADDING: Point = Point::new(0.5, 0.5, Color::RED);

    /// Create a 2D point
    pub const fn new(x: f64, y: f64, color: Color) -> Self {
        Self {
            x,
            y,
            z: None,
            r: color.r,
            g: color.g,
            b: color.b,
        }
    }

    /// Create a 3D point
    pub const fn with_z(x: f64, y: f64, z: f64, color: Color) -> Self {
        Self {
            x,
            y,
            z: Some(z),
            r: color.r,
            g: color.g,
            b: color.b,
        }
    }

    /// Depth, 0 when absent
    #[inline]
    pub fn z(&self) -> f64 {
        self.z.unwrap_or(0.0)
    }

    #[inline]
    pub fn color(&self) -> Color {
        Color::new(self.r, self.g, self.b)
    }

    /// Same position, different color
    #[inline]
    pub fn recolored(self, color: Color) -> Self {
        Self {
            r: color.r,
            g: color.g,
            b: color.b,
            ..self
        }
    }

    /// Same position, laser off
    #[inline]
    pub fn darkened(self) -> Self {
        self.recolored(Color::BLACK)
    }

    #[inline]
    pub fn is_lit(&self) -> bool {
        !self.color().is_black()
    }
}

/// Clock-master native point: signed 16-bit position, unsigned 16-bit color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevicePoint {
    pub x: i16,
    pub y: i16,
    pub r: u16,
    pub g: u16,
    pub b: u16,
}

/// Map a relative coordinate in `[0, 1]` onto the full signed 16-bit range
#[inline]
pub fn relative_to_position(v: f64) -> i16 {
    let scaled = (v.clamp(0.0, 1.0) * 65535.0).floor() as i32 - 32768;
    scaled as i16
}

/// Map a relative intensity in `[0, 1]` onto the full unsigned 16-bit range
#[inline]
pub fn relative_to_color(v: f64) -> u16 {
    (v.clamp(0.0, 1.0) * 65535.0).floor() as u16
}

impl From<&Point> for DevicePoint {
    fn from(p: &Point) -> Self {
        Self {
            x: relative_to_position(p.x),
            y: relative_to_position(p.y),
            r: relative_to_color(p.r),
            g: relative_to_color(p.g),
            b: relative_to_color(p.b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_z_defaults_to_zero() {
        let p = Point::new(0.1, 0.2, Color::WHITE);
        assert_eq!(p.z, None);
        assert_eq!(p.z(), 0.0);
        assert_eq!(Point::with_z(0.0, 0.0, -1.5, Color::WHITE).z(), -1.5);
    }

    #[test]
    fn test_sentinels_are_distinct() {
        assert_ne!(Point::FALLBACK, Point::PADDING);
        assert!(!Point::FALLBACK.is_lit());
        assert!(Point::PADDING.is_lit());
    }

    #[test]
    fn test_darkened_keeps_position() {
        let p = Point::with_z(0.3, 0.4, 0.5, Color::GREEN).darkened();
        assert_eq!((p.x, p.y, p.z), (0.3, 0.4, Some(0.5)));
        assert!(!p.is_lit());
    }

    #[test]
    fn test_device_point_range() {
        assert_eq!(relative_to_position(0.0), i16::MIN);
        assert_eq!(relative_to_position(1.0), i16::MAX);
        assert_eq!(relative_to_position(2.0), i16::MAX);
        assert_eq!(relative_to_position(-1.0), i16::MIN);
        assert_eq!(relative_to_color(1.0), u16::MAX);
        assert_eq!(relative_to_color(0.0), 0);

        let d = DevicePoint::from(&Point::PADDING);
        assert_eq!(d.r, u16::MAX);
        assert_eq!(d.g, 0);
        assert_eq!(d.x, -1);
    }
}
