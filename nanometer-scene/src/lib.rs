//! Nanometer Scene - geometry engine and point source for Nanometer
//!
//! Builds scenes as trees of transformable [`PointGroup`]s and serves
//! their points to a nanometer daemon through the pull protocol.
//!
//! ## Modules
//!
//! - [`geometry`]: transforms, blanking, perspective, shapes and groups
//! - [`provider`]: adapts a scene tree to the client's point provider
//! - [`scenes`]: ready-made demo scenes

pub mod config;
pub mod error;
pub mod geometry;
pub mod provider;
pub mod scenes;

pub use config::SceneConfig;
pub use error::{Result, SceneError};
pub use geometry::{BlankingOptions, Circle, Line, Perspective, PointGroup, Transform, make_cube};
pub use provider::SceneSource;
pub use scenes::SceneKind;
