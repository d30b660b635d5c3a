//! Blanking: dark and lit hold points around a visible segment
//!
//! Galvos need time to settle at the first point before the laser turns on,
//! and the laser needs time to turn off before the mirrors move away.
//!
//! ```text
//! begin_samples                        end_samples
//! ├── dark ──┼─ lit ─┤ p0 p1 … pn ├─ lit ─┼── dark ──┤
//!            laser_on_samples             laser_off_samples
//! ```
//!
//! Holds sit at the position of the first/last real point. A stream with
//! no real points gets no holds at all.

use crate::error::{Result, SceneError};
use nanometer_io::Point;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlankingOptions {
    #[serde(default)]
    pub begin_samples: u32,
    #[serde(default)]
    pub laser_on_samples: u32,
    #[serde(default)]
    pub end_samples: u32,
    #[serde(default)]
    pub laser_off_samples: u32,
}

impl BlankingOptions {
    pub const fn new(
        begin_samples: u32,
        laser_on_samples: u32,
        end_samples: u32,
        laser_off_samples: u32,
    ) -> Self {
        Self {
            begin_samples,
            laser_on_samples,
            end_samples,
            laser_off_samples,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.laser_on_samples > self.begin_samples {
            return Err(SceneError::InvalidBlanking(format!(
                "laser_on_samples ({}) exceeds begin_samples ({})",
                self.laser_on_samples, self.begin_samples
            )));
        }
        if self.laser_off_samples > self.end_samples {
            return Err(SceneError::InvalidBlanking(format!(
                "laser_off_samples ({}) exceeds end_samples ({})",
                self.laser_off_samples, self.end_samples
            )));
        }
        Ok(())
    }

    /// Hold `index` of the lead-in before `first`
    #[inline]
    fn begin_hold(&self, first: Point, index: u32) -> Point {
        if index < self.begin_samples.saturating_sub(self.laser_on_samples) {
            first.darkened()
        } else {
            first
        }
    }

    /// Hold `index` of the tail after `last`
    #[inline]
    fn end_hold(&self, last: Point, index: u32) -> Point {
        if index < self.end_samples.saturating_sub(self.laser_off_samples) {
            last
        } else {
            last.darkened()
        }
    }
}

#[derive(Clone, Copy)]
enum Stage {
    Start,
    Begin { first: Point, index: u32 },
    Body,
    End { last: Point, index: u32 },
    Done,
}

/// Iterator adaptor wrapping a whole stream in blanking holds exactly once
pub struct Blanked<I> {
    inner: I,
    options: BlankingOptions,
    stage: Stage,
    last: Option<Point>,
}

impl<I: Iterator<Item = Point>> Blanked<I> {
    pub fn new(inner: I, options: BlankingOptions) -> Self {
        Self {
            inner,
            options,
            stage: Stage::Start,
            last: None,
        }
    }
}

impl<I: Iterator<Item = Point>> Iterator for Blanked<I> {
    type Item = Point;

    fn next(&mut self) -> Option<Point> {
        loop {
            match self.stage {
                Stage::Start => match self.inner.next() {
                    Some(first) => self.stage = Stage::Begin { first, index: 0 },
                    None => {
                        self.stage = Stage::Done;
                        return None;
                    }
                },
                Stage::Begin { first, index } => {
                    if index < self.options.begin_samples {
                        self.stage = Stage::Begin {
                            first,
                            index: index + 1,
                        };
                        return Some(self.options.begin_hold(first, index));
                    }
                    self.stage = Stage::Body;
                    self.last = Some(first);
                    return Some(first);
                }
                Stage::Body => match self.inner.next() {
                    Some(point) => {
                        self.last = Some(point);
                        return Some(point);
                    }
                    None => {
                        self.stage = match self.last {
                            Some(last) => Stage::End { last, index: 0 },
                            None => Stage::Done,
                        };
                    }
                },
                Stage::End { last, index } => {
                    if index < self.options.end_samples {
                        self.stage = Stage::End {
                            last,
                            index: index + 1,
                        };
                        return Some(self.options.end_hold(last, index));
                    }
                    self.stage = Stage::Done;
                }
                Stage::Done => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nanometer_io::Color;

    fn segment() -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0, Color::GREEN),
            Point::new(0.5, 0.0, Color::GREEN),
            Point::new(1.0, 0.0, Color::BLUE),
        ]
    }

    #[test]
    fn test_hold_layout() {
        let opts = BlankingOptions::new(4, 1, 3, 2);
        let out: Vec<Point> = Blanked::new(segment().into_iter(), opts).collect();
        assert_eq!(out.len(), 4 + 3 + 3);

        let first = segment()[0];
        let last = segment()[2];
        assert_eq!(
            &out[..4],
            &[first.darkened(), first.darkened(), first.darkened(), first]
        );
        assert_eq!(&out[4..7], segment().as_slice());
        assert_eq!(&out[7..], &[last, last.darkened(), last.darkened()]);
    }

    #[test]
    fn test_empty_stream_gets_no_holds() {
        let opts = BlankingOptions::new(10, 2, 10, 2);
        assert_eq!(Blanked::new(std::iter::empty(), opts).count(), 0);
    }

    #[test]
    fn test_single_point_anchors_both_ends() {
        let p = Point::new(0.2, 0.8, Color::RED);
        let opts = BlankingOptions::new(2, 0, 2, 0);
        let out: Vec<Point> = Blanked::new(std::iter::once(p), opts).collect();
        assert_eq!(out, vec![p.darkened(), p.darkened(), p, p, p]);
    }

    #[test]
    fn test_validate() {
        assert!(BlankingOptions::new(30, 0, 10, 2).validate().is_ok());
        assert!(matches!(
            BlankingOptions::new(1, 2, 0, 0).validate(),
            Err(SceneError::InvalidBlanking(_))
        ));
        assert!(matches!(
            BlankingOptions::new(0, 0, 1, 2).validate(),
            Err(SceneError::InvalidBlanking(_))
        ));
    }
}
