//! # Mosaic Map
//!
//! Interactive web maps of class rasters:
//! - `MapBounds`: raster extent in latitude/longitude
//! - `ImageOverlay`: colorized class grid as an inline PNG
//! - `OverlayMap`: self-contained Leaflet HTML document with legend

mod bounds;
mod error;
mod html;
mod overlay;

pub use bounds::{mercator_to_lon_lat, MapBounds};
pub use error::{MapError, Result};
pub use html::{class_overlay_map, legend_items, LegendItem, OverlayMap};
pub use overlay::{encode_png, ImageOverlay, OverlayOptions};
