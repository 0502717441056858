//! # Mosaic Colormap
//!
//! Class-ID colormaps built from a legend, and class raster rendering.
//!
//! A [`Legend`] is read from a spreadsheet or delimited text file with
//! `Class_ID` and `Color` columns. [`ClassColorTable`] turns it into a sparse
//! class ID → [`Rgba`] lookup, and [`classes_to_rgba`] shades a class raster
//! into an RGBA pixel buffer. Classes missing from the legend are resolved by
//! an explicit [`UnmappedPolicy`].
//!
//! ## Usage
//!
//! ```ignore
//! use mosaic_colormap::{classes_to_rgba, ClassColorTable, Legend, UnmappedPolicy};
//!
//! let legend = Legend::from_path("color_data.xlsx")?;
//! let table = ClassColorTable::from_legend(&legend, UnmappedPolicy::Transparent);
//! let rgba = classes_to_rgba(&raster, &table)?;
//! ```

mod color;
mod error;
mod legend;
mod render;
mod table;

pub use color::{Rgb, Rgba};
pub use error::{ColormapError, Result};
pub use legend::{Legend, LegendEntry};
pub use render::classes_to_rgba;
pub use table::{ClassColorTable, UnmappedPolicy};
