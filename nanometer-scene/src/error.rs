//! Error types for Nanometer Scene

use thiserror::Error;

/// Nanometer Scene error type
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid blanking: {0}")]
    InvalidBlanking(String),

    #[error("Transport error: {0}")]
    Transport(#[from] nanometer_io::Error),
}

impl From<toml::de::Error> for SceneError {
    fn from(e: toml::de::Error) -> Self {
        SceneError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SceneError>;
