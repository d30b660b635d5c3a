//! Two nested wireframe cubes
//!
//! Outer: green, 20 points per edge. Inner: red, 10 points per edge, half
//! size, tilted 45° about X and Y. Both spin together inside a perspective
//! group pushed back to z = -1.

use crate::geometry::{BlankingOptions, PointGroup, make_cube};
use crate::provider::SceneSource;
use glam::DVec3;
use nanometer_io::Color;
use std::f64::consts::FRAC_PI_4;

pub const BLANKING: BlankingOptions = BlankingOptions::new(30, 0, 10, 2);

/// Spin per emitted point about X, Y, Z (radians)
pub const SPIN: DVec3 = DVec3::new(1e-5, 8e-6, 5e-6);

pub fn scene() -> PointGroup {
    let outer = make_cube(20, Color::GREEN, true);
    let mut inner = make_cube(10, Color::RED, true);
    inner.scale(DVec3::splat(0.5));
    inner.rotate_x(FRAC_PI_4);
    inner.rotate_y(FRAC_PI_4);

    let cubes = PointGroup::from_children(vec![outer, inner]);
    let mut root = PointGroup::perspective(vec![cubes]);
    root.translate(DVec3::new(0.0, 0.0, -1.0));
    root
}

pub fn source(blanking: Option<BlankingOptions>) -> SceneSource {
    SceneSource::new(scene(), blanking).with_animation(|root, emitted| {
        if let Some(cubes) = root.children_mut().first_mut() {
            let steps = emitted as f64;
            cubes.rotate_x(SPIN.x * steps);
            cubes.rotate_y(SPIN.y * steps);
            cubes.rotate_z(SPIN.z * steps);
        }
    })
}
