//! # Mosaic Core
//!
//! Core types and I/O for the Mosaic landscape toolkit.
//!
//! This crate provides:
//! - `Raster<T>`: Generic georeferenced raster grid
//! - `GeoTransform`: Affine transformation for georeferencing
//! - `CRS`: Coordinate Reference System handling
//! - `Neighborhood`: Cell connectivity rules used for patch labelling
//! - Native GeoTIFF reading and writing

pub mod crs;
pub mod error;
pub mod io;
pub mod raster;

pub use crs::CRS;
pub use error::{Error, Result};
pub use raster::{GeoTransform, Neighborhood, Raster, RasterElement};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::crs::CRS;
    pub use crate::error::{Error, Result};
    pub use crate::io::{read_geotiff, write_geotiff};
    pub use crate::raster::{GeoTransform, Neighborhood, Raster, RasterElement};
}
