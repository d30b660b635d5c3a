//! Scene-backed point provider
//!
//! Serves points from a rendered frame of a [`PointGroup`] tree. When the
//! frame runs out, the animation step is applied (scaled by how many points
//! the frame held) and the next frame is rendered. A request therefore
//! always gets its full count, wrapping across frames.

use crate::geometry::{BlankingOptions, PointGroup};
use nanometer_io::{Error as IoError, Point, PointProvider};
use tracing::{debug, trace};

/// Per-frame mutation of the scene tree; the second argument is the number
/// of points the previous frame emitted
pub type Animation = Box<dyn FnMut(&mut PointGroup, usize) + Send>;

pub struct SceneSource {
    root: PointGroup,
    blanking: Option<BlankingOptions>,
    animation: Option<Animation>,
    frame: Vec<Point>,
    cursor: usize,
    frames_rendered: u64,
}

impl SceneSource {
    pub fn new(root: PointGroup, blanking: Option<BlankingOptions>) -> Self {
        Self {
            root,
            blanking,
            animation: None,
            frame: Vec::new(),
            cursor: 0,
            frames_rendered: 0,
        }
    }

    pub fn with_animation(
        mut self,
        animation: impl FnMut(&mut PointGroup, usize) + Send + 'static,
    ) -> Self {
        self.animation = Some(Box::new(animation));
        self
    }

    pub fn root(&self) -> &PointGroup {
        &self.root
    }

    pub fn blanking(&self) -> Option<BlankingOptions> {
        self.blanking
    }

    /// Frames rendered so far
    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// Points in the current frame
    pub fn frame_len(&self) -> usize {
        self.frame.len()
    }

    fn render(&mut self) {
        if self.frames_rendered > 0
            && let Some(animate) = self.animation.as_mut()
        {
            animate(&mut self.root, self.frame.len());
        }
        self.frame.clear();
        self.frame.extend(self.root.points(self.blanking));
        self.cursor = 0;
        self.frames_rendered += 1;
        trace!(
            "Rendered frame {} ({} points)",
            self.frames_rendered,
            self.frame.len()
        );
    }
}

impl PointProvider for SceneSource {
    fn get_points(&mut self, num: usize) -> nanometer_io::Result<Vec<Point>> {
        let mut points = Vec::with_capacity(num);
        while points.len() < num {
            if self.cursor >= self.frame.len() {
                self.render();
                if self.frame.is_empty() {
                    debug!("Scene produced no points");
                    return Err(IoError::SourceExhausted);
                }
            }
            let take = (num - points.len()).min(self.frame.len() - self.cursor);
            points.extend_from_slice(&self.frame[self.cursor..self.cursor + take]);
            self.cursor += take;
        }
        Ok(points)
    }
}
