//! Procedural shapes feeding computed point groups

use crate::geometry::group::PointGroup;
use nanometer_io::{Color, Point};
use std::f64::consts::TAU;

/// Point generator behind a computed group
pub trait Shape: Send + Sync {
    /// Points in the shape's local frame, recomputed on every call
    fn compute_points(&self) -> Box<dyn Iterator<Item = Point> + '_>;
}

/// Fraction `i / n`, with a single point at 0 when `n == 0`
#[inline]
fn fraction(i: u32, n: u32) -> f64 {
    if n == 0 { 0.0 } else { i as f64 / n as f64 }
}

/// Unit circle, `num_points + 1` samples so the outline closes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub color: Color,
    pub num_points: u32,
}

impl Circle {
    pub fn new(color: Color, num_points: u32) -> Self {
        Self { color, num_points }
    }
}

impl Shape for Circle {
    fn compute_points(&self) -> Box<dyn Iterator<Item = Point> + '_> {
        let n = self.num_points;
        let color = self.color;
        Box::new((0..=n).map(move |i| {
            let angle = fraction(i, n) * TAU;
            Point::new(angle.sin(), angle.cos(), color)
        }))
    }
}

/// Straight segment interpolating position and color, `num_points + 1` samples
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    pub start: Point,
    pub end: Point,
    pub num_points: u32,
}

impl Line {
    pub fn new(start: Point, end: Point, num_points: u32) -> Self {
        Self {
            start,
            end,
            num_points,
        }
    }
}

impl Shape for Line {
    fn compute_points(&self) -> Box<dyn Iterator<Item = Point> + '_> {
        let (a, b) = (self.start, self.end);
        let n = self.num_points;
        let has_z = a.z.is_some() || b.z.is_some();
        Box::new((0..=n).map(move |i| {
            let t = fraction(i, n);
            let lerp = |from: f64, to: f64| (1.0 - t) * from + t * to;
            Point {
                x: lerp(a.x, b.x),
                y: lerp(a.y, b.y),
                z: has_z.then(|| lerp(a.z(), b.z())),
                r: lerp(a.r, b.r),
                g: lerp(a.g, b.g),
                b: lerp(a.b, b.b),
            }
        }))
    }
}

/// Corner pairs of the 12 edges of the `[-1, 1]³` cube
const CUBE_EDGES: [([f64; 3], [f64; 3]); 12] = [
    // x
    ([-1.0, -1.0, -1.0], [1.0, -1.0, -1.0]),
    ([-1.0, 1.0, -1.0], [1.0, 1.0, -1.0]),
    ([-1.0, -1.0, 1.0], [1.0, -1.0, 1.0]),
    ([-1.0, 1.0, 1.0], [1.0, 1.0, 1.0]),
    // y
    ([-1.0, -1.0, -1.0], [-1.0, 1.0, -1.0]),
    ([1.0, -1.0, -1.0], [1.0, 1.0, -1.0]),
    ([-1.0, -1.0, 1.0], [-1.0, 1.0, 1.0]),
    ([1.0, -1.0, 1.0], [1.0, 1.0, 1.0]),
    // z
    ([-1.0, -1.0, -1.0], [-1.0, -1.0, 1.0]),
    ([1.0, -1.0, -1.0], [1.0, -1.0, 1.0]),
    ([-1.0, 1.0, -1.0], [-1.0, 1.0, 1.0]),
    ([1.0, 1.0, -1.0], [1.0, 1.0, 1.0]),
];

/// Wireframe cube: a group of 12 line groups
pub fn make_cube(points_per_line: u32, color: Color, blank: bool) -> PointGroup {
    let edges = CUBE_EDGES
        .iter()
        .map(|&([x0, y0, z0], [x1, y1, z1])| {
            PointGroup::computed(Line::new(
                Point::with_z(x0, y0, z0, color),
                Point::with_z(x1, y1, z1, color),
                points_per_line,
            ))
            .with_blank(blank)
        })
        .collect();
    PointGroup::from_children(edges)
}
