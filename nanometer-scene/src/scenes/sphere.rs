//! Wireframe sphere from 17 stacked circles

use crate::geometry::{BlankingOptions, PointGroup};
use crate::provider::SceneSource;
use glam::DVec3;
use nanometer_io::Color;

pub const BLANKING: BlankingOptions = BlankingOptions::new(20, 0, 8, 0);

pub const SPIN: DVec3 = DVec3::new(2.1e-5, 1.8e-5, 1.1e-5);

const SLICES: u32 = 16;
const POINTS_PER_CIRCLE: u32 = 60;

pub fn scene() -> PointGroup {
    let circles = (0..=SLICES)
        .map(|i| {
            let h = i as f64 / SLICES as f64;
            // Radius of the slice at height (h - 0.5) * 2
            let s = (1.0 - ((h - 0.5) * 2.0).powi(2)).max(0.0).sqrt();
            let mut circle = PointGroup::circle(Color::RED, POINTS_PER_CIRCLE);
            circle.scale(DVec3::splat(s));
            circle.translate(DVec3::new(0.0, 0.0, 2.0 * h - 1.0));
            circle
        })
        .collect();

    let mut root = PointGroup::perspective(vec![PointGroup::from_children(circles)]);
    root.translate(DVec3::new(0.0, 0.0, -1.0));
    root
}

pub fn source(blanking: Option<BlankingOptions>) -> SceneSource {
    SceneSource::new(scene(), blanking).with_animation(|root, emitted| {
        if let Some(sphere) = root.children_mut().first_mut() {
            let steps = emitted as f64;
            sphere.rotate_x(SPIN.x * steps);
            sphere.rotate_y(SPIN.y * steps);
            sphere.rotate_z(SPIN.z * steps);
        }
    })
}
