//! # Mosaic Landscape
//!
//! Landscape ecology metrics for categorical (class) rasters:
//! - **Patches**: connected-component labelling under 4- or 8-connectivity
//! - **Class metrics**: area, density, edge, shape and isolation per class
//! - **Landscape metrics**: Shannon/Simpson diversity and evenness
//! - **Export**: tab-separated class metric tables

mod class_metrics;
mod diversity;
mod export;
mod maybe_rayon;
mod patches;
mod proximity;

pub use class_metrics::{
    class_metrics, class_metrics_from_patches, ClassMetrics, ClassMetricsParams, M2_PER_HA,
};
pub use diversity::{landscape_metrics, LandscapeMetrics};
pub use export::{write_class_metrics, write_class_metrics_file};
pub use patches::{Patch, PatchMap};

use mosaic_core::raster::{Raster, RasterElement};
use mosaic_core::Result;

/// Class and landscape metrics from a single patch labelling
#[derive(Debug, Clone)]
pub struct LandscapeReport {
    pub classes: Vec<ClassMetrics>,
    pub landscape: LandscapeMetrics,
}

/// Label patches once and compute both class and landscape metrics.
pub fn analyze<T: RasterElement>(raster: &Raster<T>, params: &ClassMetricsParams) -> Result<LandscapeReport> {
    let patches = PatchMap::label(raster, params.nodata, params.neighborhood)?;
    let classes = class_metrics_from_patches(&patches, params)?;
    let landscape = landscape_metrics(&patches);
    Ok(LandscapeReport { classes, landscape })
}
