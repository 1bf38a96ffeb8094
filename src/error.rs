//! Error type shared by configuration loading, mesh assembly and export.

use thiserror::Error;

/// Errors returned by the plant generator.
#[derive(Debug, Error)]
pub enum PlantError {
    /// Reading or writing a file failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration file could not be parsed or serialized.
    #[error("config error: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// The mesh assembler needed a sprite from a pool that has none.
    #[error("sprite pool '{0}' is empty")]
    EmptySpritePool(&'static str),

    /// Writing a preview image failed.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, PlantError>;
