//! Affine transform attached to every point group
//!
//! Mutators pre-multiply: `rotate_x(θ)` sets `M ← Rx(θ) · M`, so the most
//! recent call is applied last to the points.

use glam::{DMat4, DVec3};
use nanometer_io::Point;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    matrix: DMat4,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        matrix: DMat4::IDENTITY,
    };

    pub fn from_matrix(matrix: DMat4) -> Self {
        Self { matrix }
    }

    pub fn matrix(&self) -> DMat4 {
        self.matrix
    }

    /// Back to identity
    pub fn reset(&mut self) {
        self.matrix = DMat4::IDENTITY;
    }

    pub fn rotate_x(&mut self, theta: f64) {
        self.matrix = DMat4::from_rotation_x(theta) * self.matrix;
    }

    pub fn rotate_y(&mut self, theta: f64) {
        self.matrix = DMat4::from_rotation_y(theta) * self.matrix;
    }

    pub fn rotate_z(&mut self, theta: f64) {
        self.matrix = DMat4::from_rotation_z(theta) * self.matrix;
    }

    pub fn scale(&mut self, factors: DVec3) {
        self.matrix = DMat4::from_scale(factors) * self.matrix;
    }

    pub fn translate(&mut self, offset: DVec3) {
        self.matrix = DMat4::from_translation(offset) * self.matrix;
    }

    /// `self · child`: the child's local transform runs first
    #[inline]
    pub fn compose(&self, child: &Transform) -> Transform {
        Transform {
            matrix: self.matrix * child.matrix,
        }
    }

    /// Transform position, keep color. The result always carries z.
    #[inline]
    pub fn apply(&self, point: &Point) -> Point {
        let v = self
            .matrix
            .transform_point3(DVec3::new(point.x, point.y, point.z()));
        Point {
            x: v.x,
            y: v.y,
            z: Some(v.z),
            ..*point
        }
    }
}
