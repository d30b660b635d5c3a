//! Throughput monitor sink
//!
//! Stands in for a simulator: keeps counters and the most recent frame, and
//! logs throughput about once per second.

use crate::core::sink::PointSink;
use crate::core::types::Point;
use crate::error::Result;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

const REPORT_INTERVAL: Duration = Duration::from_secs(1);

/// Counters shared with whoever holds a [`MonitorSink::stats`] handle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonitorStats {
    pub frames: u64,
    pub points: u64,
    pub lit_points: u64,
    pub last_rate: u32,
    pub last_frame: Vec<Point>,
}

pub struct MonitorSink {
    stats: Arc<Mutex<MonitorStats>>,
    window_start: Instant,
    window_points: u64,
    window_lit: u64,
}

impl MonitorSink {
    pub fn new() -> Self {
        Self {
            stats: Arc::new(Mutex::new(MonitorStats::default())),
            window_start: Instant::now(),
            window_points: 0,
            window_lit: 0,
        }
    }

    /// Handle to the live counters
    pub fn stats(&self) -> Arc<Mutex<MonitorStats>> {
        Arc::clone(&self.stats)
    }
}

impl Default for MonitorSink {
    fn default() -> Self {
        Self::new()
    }
}

impl PointSink for MonitorSink {
    fn name(&self) -> &str {
        "monitor"
    }

    fn stream(&mut self, points: &[Point], rate: u32) -> Result<()> {
        let lit = points.iter().filter(|p| p.is_lit()).count() as u64;
        {
            let mut stats = self.stats.lock();
            stats.frames += 1;
            stats.points += points.len() as u64;
            stats.lit_points += lit;
            stats.last_rate = rate;
            stats.last_frame.clear();
            stats.last_frame.extend_from_slice(points);
        }

        self.window_points += points.len() as u64;
        self.window_lit += lit;
        let elapsed = self.window_start.elapsed();
        if elapsed >= REPORT_INTERVAL {
            let pps = self.window_points as f64 / elapsed.as_secs_f64();
            let lit_pct = if self.window_points > 0 {
                100.0 * self.window_lit as f64 / self.window_points as f64
            } else {
                0.0
            };
            log::info!(
                "Monitor: {:.0} pts/s (target {}), {:.1}% lit",
                pps,
                rate,
                lit_pct
            );
            self.window_start = Instant::now();
            self.window_points = 0;
            self.window_lit = 0;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Color;

    #[test]
    fn test_counts_frames_and_lit_points() {
        let mut sink = MonitorSink::new();
        let stats = sink.stats();

        let frame = vec![
            Point::new(0.1, 0.1, Color::BLACK),
            Point::new(0.2, 0.2, Color::GREEN),
            Point::PADDING,
        ];
        sink.stream(&frame, 30_000).unwrap();
        sink.stream(&frame[..1], 30_000).unwrap();

        let stats = stats.lock();
        assert_eq!(stats.frames, 2);
        assert_eq!(stats.points, 4);
        assert_eq!(stats.lit_points, 2);
        assert_eq!(stats.last_rate, 30_000);
        assert_eq!(stats.last_frame, frame[..1].to_vec());
    }
}
