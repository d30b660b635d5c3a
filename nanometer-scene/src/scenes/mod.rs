//! Demo scenes
//!
//! | Scene | Content | Coordinates |
//! |-------|---------|-------------|
//! | cube | Two nested wireframe cubes in perspective, spinning | Scene `[-1, 1]` |
//! | sphere | 17 stacked circles in perspective, spinning | Scene `[-1, 1]` |
//! | sine | Endless six-color sine sweeps | Device `[0, 1]` |

pub mod cube;
pub mod sine;
pub mod sphere;

use crate::error::Result;
use crate::geometry::BlankingOptions;
use nanometer_io::PointProvider;
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum SceneKind {
    #[default]
    Cube,
    Sphere,
    Sine,
}

impl SceneKind {
    pub fn name(&self) -> &'static str {
        match self {
            SceneKind::Cube => "cube",
            SceneKind::Sphere => "sphere",
            SceneKind::Sine => "sine",
        }
    }

    /// Blanking the scene was tuned for
    pub fn default_blanking(&self) -> Option<BlankingOptions> {
        match self {
            SceneKind::Cube => Some(cube::BLANKING),
            SceneKind::Sphere => Some(sphere::BLANKING),
            SceneKind::Sine => None,
        }
    }

    /// Whether points are already in device `[0, 1]` space
    pub fn is_device_relative(&self) -> bool {
        matches!(self, SceneKind::Sine)
    }
}

/// Build a provider for `kind`. `blanking` overrides the scene default.
pub fn build(
    kind: SceneKind,
    blanking: Option<BlankingOptions>,
) -> Result<Box<dyn PointProvider>> {
    let blanking = blanking.or(kind.default_blanking());
    if let Some(options) = &blanking {
        options.validate()?;
    }

    Ok(match kind {
        SceneKind::Cube => Box::new(cube::source(blanking)),
        SceneKind::Sphere => Box::new(sphere::source(blanking)),
        SceneKind::Sine => Box::new(sine::provider()),
    })
}
