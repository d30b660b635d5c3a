//! Geometry engine: transformable point group trees producing point streams

pub mod blanking;
pub mod group;
pub mod perspective;
pub mod shapes;
pub mod transform;

pub use blanking::{Blanked, BlankingOptions};
pub use group::{GroupContent, PointGroup, PointIter};
pub use perspective::{DEFAULT_CAMERA_DISTANCE, Perspective};
pub use shapes::{Circle, Line, Shape, make_cube};
pub use transform::Transform;
