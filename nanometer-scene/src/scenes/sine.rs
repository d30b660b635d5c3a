//! Endless six-color sine sweeps in device coordinates
//!
//! Each sweep walks x across `[0.25, 0.75]` in 101 steps. It starts with 20
//! dark holds and ends with 5 lit holds. The wave shape drifts with a phase
//! counter advanced once per emitted point.

use nanometer_io::{Color, GeneratorProvider, Point};
use std::collections::VecDeque;
use std::f64::consts::PI;

const COLORS: [Color; 6] = [
    Color::WHITE,
    Color::RED,
    Color::new(1.0, 1.0, 0.0),
    Color::GREEN,
    Color::new(0.0, 1.0, 1.0),
    Color::BLUE,
];

const SWEEP_STEPS: u32 = 100;
const STEP: f64 = 0.01;
const LEAD_IN: usize = 20;
const TAIL: usize = 5;

pub struct SineSweep {
    phase: u64,
    color: usize,
    step: u32,
    queue: VecDeque<Point>,
}

impl SineSweep {
    pub fn new() -> Self {
        Self {
            phase: 0,
            color: 0,
            step: 0,
            queue: VecDeque::with_capacity(LEAD_IN + 1),
        }
    }

    fn advance(&mut self) {
        let offset = self.color as f64 * 0.1;
        let x = self.step as f64 * STEP;
        let px = x / 2.0 + 0.25;
        let wobble = (x * 8.0 + self.phase as f64 / 10_000.0 + offset).sin() + offset;
        let py = (x * 2.0 * PI).sin() * wobble / 4.0 + 0.5;
        let color = COLORS[self.color];

        if self.step == 0 {
            for _ in 0..LEAD_IN {
                self.queue.push_back(Point::new(px, py, Color::BLACK));
            }
        }
        self.queue.push_back(Point::new(px, py, color));

        if self.step >= SWEEP_STEPS {
            for _ in 0..TAIL {
                self.queue.push_back(Point::new(px, py, color));
            }
            self.step = 0;
            self.color = (self.color + 1) % COLORS.len();
        } else {
            self.step += 1;
        }
    }
}

impl Default for SineSweep {
    fn default() -> Self {
        Self::new()
    }
}

impl Iterator for SineSweep {
    type Item = Point;

    fn next(&mut self) -> Option<Point> {
        if self.queue.is_empty() {
            self.advance();
        }
        let point = self.queue.pop_front()?;
        self.phase += 1;
        Some(point)
    }
}

pub fn provider() -> GeneratorProvider<fn() -> SineSweep, SineSweep> {
    GeneratorProvider::new(SineSweep::new as fn() -> SineSweep)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sweep_layout() {
        let sweep: Vec<Point> = SineSweep::new().take(LEAD_IN + 101 + TAIL + 1).collect();
        assert!(sweep[..LEAD_IN].iter().all(|p| !p.is_lit()));
        let lit = &sweep[LEAD_IN..LEAD_IN + 101 + TAIL];
        assert!(lit.iter().all(|p| p.color() == Color::WHITE));
        // Next sweep starts dark again
        assert!(!sweep[LEAD_IN + 101 + TAIL].is_lit());
    }

    #[test]
    fn test_stays_in_device_range() {
        assert!(SineSweep::new().take(10_000).all(|p| {
            (0.0..=1.0).contains(&p.x) && (0.0..=1.0).contains(&p.y)
        }));
    }
}
