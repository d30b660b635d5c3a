//! Hierarchical point groups
//!
//! A group is a flat point list, a list of child groups, or a procedural
//! shape. Every group owns a [`Transform`] and a `blank` flag; a group may
//! also project its output through a [`Perspective`].
//!
//! Point production is lazy and read-only. The pipeline for one group:
//!
//! ```text
//! content ──► accum = parent · local ──► blanking (if blank) ──► perspective
//! ```
//!
//! Children recurse with `accum` as their parent transform. Blanking wraps
//! the group's whole concatenated output once, independent of whatever the
//! children did.

use crate::geometry::blanking::{Blanked, BlankingOptions};
use crate::geometry::perspective::Perspective;
use crate::geometry::shapes::{Circle, Line, Shape};
use crate::geometry::transform::Transform;
use glam::DVec3;
use nanometer_io::{Color, Point};

/// Lazily produced point stream borrowing the group tree
pub type PointIter<'a> = Box<dyn Iterator<Item = Point> + 'a>;

pub enum GroupContent {
    Points(Vec<Point>),
    Children(Vec<PointGroup>),
    Computed(Box<dyn Shape>),
}

pub struct PointGroup {
    content: GroupContent,
    transform: Transform,
    blank: bool,
    projection: Option<Perspective>,
}

impl PointGroup {
    fn with_content(content: GroupContent, blank: bool) -> Self {
        Self {
            content,
            transform: Transform::IDENTITY,
            blank,
            projection: None,
        }
    }

    /// Leaf group over literal points
    pub fn from_points(points: Vec<Point>) -> Self {
        Self::with_content(GroupContent::Points(points), false)
    }

    /// Interior group over child groups
    pub fn from_children(children: Vec<PointGroup>) -> Self {
        Self::with_content(GroupContent::Children(children), false)
    }

    /// Procedural group
    pub fn computed(shape: impl Shape + 'static) -> Self {
        Self::with_content(GroupContent::Computed(Box::new(shape)), false)
    }

    /// Circle group, blanked by default
    pub fn circle(color: Color, num_points: u32) -> Self {
        Self::computed(Circle::new(color, num_points)).with_blank(true)
    }

    /// Line group, blanked by default
    pub fn line(start: Point, end: Point, num_points: u32) -> Self {
        Self::computed(Line::new(start, end, num_points)).with_blank(true)
    }

    /// Group projecting its children with the default camera
    pub fn perspective(children: Vec<PointGroup>) -> Self {
        Self::from_children(children).with_projection(Perspective::default())
    }

    pub fn with_blank(mut self, blank: bool) -> Self {
        self.blank = blank;
        self
    }

    pub fn with_projection(mut self, projection: Perspective) -> Self {
        self.projection = Some(projection);
        self
    }

    pub fn content(&self) -> &GroupContent {
        &self.content
    }

    pub fn is_blank(&self) -> bool {
        self.blank
    }

    pub fn set_blank(&mut self, blank: bool) {
        self.blank = blank;
    }

    pub fn projection(&self) -> Option<Perspective> {
        self.projection
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }

    pub fn reset(&mut self) {
        self.transform.reset();
    }

    pub fn rotate_x(&mut self, theta: f64) {
        self.transform.rotate_x(theta);
    }

    pub fn rotate_y(&mut self, theta: f64) {
        self.transform.rotate_y(theta);
    }

    pub fn rotate_z(&mut self, theta: f64) {
        self.transform.rotate_z(theta);
    }

    pub fn scale(&mut self, factors: DVec3) {
        self.transform.scale(factors);
    }

    pub fn translate(&mut self, offset: DVec3) {
        self.transform.translate(offset);
    }

    /// Append a child. Returns the child back if this is not a child list.
    pub fn push(&mut self, child: PointGroup) -> Result<(), PointGroup> {
        match &mut self.content {
            GroupContent::Children(children) => {
                children.push(child);
                Ok(())
            }
            _ => Err(child),
        }
    }

    /// Child groups, empty for leaves
    pub fn children(&self) -> &[PointGroup] {
        match &self.content {
            GroupContent::Children(children) => children,
            _ => &[],
        }
    }

    pub fn children_mut(&mut self) -> &mut [PointGroup] {
        match &mut self.content {
            GroupContent::Children(children) => children,
            _ => &mut [],
        }
    }

    /// Points of the whole tree, from the identity transform
    pub fn points(&self, blanking: Option<BlankingOptions>) -> PointIter<'_> {
        self.points_with(blanking, &Transform::IDENTITY)
    }

    /// Points of the tree under `parent`
    pub fn points_with(
        &self,
        blanking: Option<BlankingOptions>,
        parent: &Transform,
    ) -> PointIter<'_> {
        let accum = parent.compose(&self.transform);

        let raw: PointIter<'_> = match &self.content {
            GroupContent::Points(points) => {
                Box::new(points.iter().map(move |p| accum.apply(p)))
            }
            GroupContent::Children(children) => Box::new(
                children
                    .iter()
                    .flat_map(move |child| child.points_with(blanking, &accum)),
            ),
            GroupContent::Computed(shape) => {
                Box::new(shape.compute_points().map(move |p| accum.apply(&p)))
            }
        };

        let blanked: PointIter<'_> = match blanking {
            Some(options) if self.blank => Box::new(Blanked::new(raw, options)),
            _ => raw,
        };

        match self.projection {
            Some(projection) => Box::new(blanked.map(move |p| projection.project(&p))),
            None => blanked,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_only_into_child_lists() {
        let mut parent = PointGroup::from_children(Vec::new());
        assert!(parent.push(PointGroup::from_points(Vec::new())).is_ok());
        assert_eq!(parent.children().len(), 1);

        let mut leaf = PointGroup::from_points(vec![Point::FALLBACK]);
        assert!(leaf.push(PointGroup::from_children(Vec::new())).is_err());
        assert!(leaf.children_mut().is_empty());
    }

    #[test]
    fn test_convenience_shapes_are_blanked() {
        assert!(PointGroup::circle(Color::RED, 10).is_blank());
        assert!(PointGroup::line(Point::FALLBACK, Point::FALLBACK, 1).is_blank());
        assert!(!PointGroup::from_points(Vec::new()).is_blank());
    }

    #[test]
    fn test_blank_flag_ignored_without_options() {
        let group = PointGroup::circle(Color::RED, 3);
        assert_eq!(group.points(None).count(), 4);
        let opts = BlankingOptions::new(2, 1, 2, 1);
        assert_eq!(group.points(Some(opts)).count(), 8);
    }
}
