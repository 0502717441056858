//! Error types for legend reading and color lookup

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading a legend or resolving class colors
#[derive(Error, Debug)]
pub enum ColormapError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid hex color '{value}': {reason}")]
    InvalidHex { value: String, reason: String },

    #[error("Legend row {row}: {source}")]
    Row {
        row: usize,
        #[source]
        source: Box<ColormapError>,
    },

    #[error("Invalid class ID '{0}': expected an integer")]
    InvalidClassId(String),

    #[error("Legend is missing the '{0}' column")]
    MissingColumn(&'static str),

    #[error("Legend has no entries")]
    EmptyLegend,

    #[error("Unsupported legend format: {}", .0.display())]
    UnsupportedLegendFormat(PathBuf),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    #[error("Delimited text error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Classes without a legend color: {0:?}")]
    UnmappedClass(Vec<i32>),

    #[error("Class {0} does not fit an 8-bit lookup table")]
    ClassOutOfRange(i32),
}

impl ColormapError {
    /// Attach the 1-based legend row a failure came from
    pub(crate) fn at_row(self, row: usize) -> Self {
        ColormapError::Row {
            row,
            source: Box::new(self),
        }
    }
}

impl From<calamine::Error> for ColormapError {
    fn from(e: calamine::Error) -> Self {
        ColormapError::Spreadsheet(e.to_string())
    }
}

/// Result type alias for colormap operations
pub type Result<T> = std::result::Result<T, ColormapError>;
