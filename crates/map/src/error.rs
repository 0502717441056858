//! Error types for map rendering

use mosaic_colormap::ColormapError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MapError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Colormap error: {0}")]
    Colormap(#[from] ColormapError),

    #[error("PNG encoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid option: {name} = {value} ({reason})")]
    InvalidOption {
        name: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("Invalid bounds: {0}")]
    InvalidBounds(String),

    #[error("RGBA buffer holds {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, MapError>;
