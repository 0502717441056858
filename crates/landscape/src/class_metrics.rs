//! Class-level landscape metrics
//!
//! One row of metrics per class of a categorical raster, in the spirit of
//! FRAGSTATS class metrics. Areas are reported in hectares, assuming map
//! units are meters; lengths are in map units.

use mosaic_core::raster::{Neighborhood, Raster, RasterElement};
use mosaic_core::{Error, Result};
use serde::Serialize;

use crate::maybe_rayon::par_map;
use crate::proximity::nearest_neighbor_distances;
use crate::patches::{Patch, PatchMap};

/// Square meters per hectare
pub const M2_PER_HA: f64 = 10_000.0;

/// Parameters for class metric computation
#[derive(Debug, Clone)]
pub struct ClassMetricsParams {
    /// Extra class value to exclude, on top of the raster's own no-data value
    pub nodata: Option<i32>,
    /// Connectivity rule defining patches
    pub neighborhood: Neighborhood,
    /// Count sides facing no-data or the raster border in `total_edge`
    pub count_boundary: bool,
}

impl Default for ClassMetricsParams {
    fn default() -> Self {
        Self {
            nodata: None,
            neighborhood: Neighborhood::Queen,
            count_boundary: false,
        }
    }
}

/// Metrics for one class.
///
/// Field order is the column order of the exported table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub class_val: i32,
    /// Class area (ha)
    pub total_area: f64,
    /// Percentage of the landscape covered by the class
    pub proportion_of_landscape: f64,
    pub number_of_patches: usize,
    /// Patches per 100 ha of landscape
    pub patch_density: f64,
    /// Percentage of the landscape covered by the largest patch
    pub largest_patch_index: f64,
    /// Edge length (map units)
    pub total_edge: f64,
    /// Edge length per hectare of landscape
    pub edge_density: f64,
    pub landscape_shape_index: f64,
    /// Sum of squared patch areas over landscape area (ha)
    pub effective_mesh_size: f64,
    pub area_mn: f64,
    pub area_am: f64,
    pub area_md: f64,
    pub area_ra: f64,
    pub area_sd: f64,
    pub area_cv: f64,
    pub perimeter_mn: f64,
    pub perimeter_area_ratio_mn: f64,
    pub shape_index_mn: f64,
    pub fractal_dimension_mn: f64,
    pub euclidean_nearest_neighbor_mn: f64,
}

/// Compute class metrics for every class of a raster, sorted by class ID.
///
/// # Arguments
/// * `raster` - Categorical raster; non-integral values are treated as no-data
/// * `params` - No-data override, connectivity and edge counting
pub fn class_metrics<T: RasterElement>(
    raster: &Raster<T>,
    params: &ClassMetricsParams,
) -> Result<Vec<ClassMetrics>> {
    let patches = PatchMap::label(raster, params.nodata, params.neighborhood)?;
    class_metrics_from_patches(&patches, params)
}

/// Compute class metrics from an existing patch labelling.
pub fn class_metrics_from_patches(
    patches: &PatchMap,
    params: &ClassMetricsParams,
) -> Result<Vec<ClassMetrics>> {
    if patches.valid_cells() == 0 {
        return Err(Error::NoValidCells);
    }
    if patches.cell_area() <= 0.0 {
        return Err(Error::InvalidParameter {
            name: "cell_area",
            value: patches.cell_area().to_string(),
            reason: "raster transform has zero cell area".into(),
        });
    }

    let count_boundary = params.count_boundary;
    let metrics = par_map(patches.classes(), |class| {
        let of_class: Vec<&Patch> = patches.patches_of(class).collect();
        compute_class(class, &of_class, patches, count_boundary)
    });
    Ok(metrics)
}

fn compute_class(
    class: i32,
    patches: &[&Patch],
    map: &PatchMap,
    count_boundary: bool,
) -> ClassMetrics {
    let cell_area = map.cell_area();
    let landscape_m2 = map.landscape_area();
    let landscape_ha = landscape_m2 / M2_PER_HA;

    let areas_m2: Vec<f64> = patches.iter().map(|p| p.area(cell_area)).collect();
    let areas_ha: Vec<f64> = areas_m2.iter().map(|a| a / M2_PER_HA).collect();
    let perimeters: Vec<f64> = patches.iter().map(|p| p.perimeter).collect();

    let class_m2: f64 = areas_m2.iter().sum();
    let largest_m2 = areas_m2.iter().copied().fold(0.0, f64::max);

    let total_edge: f64 = if count_boundary {
        perimeters.iter().sum()
    } else {
        patches.iter().map(|p| p.class_edge).sum()
    };
    let all_edges: f64 = perimeters.iter().sum();

    let area_stats = Distribution::of(&areas_ha);
    let area_am = areas_ha.iter().map(|a| a * a).sum::<f64>() / areas_ha.iter().sum::<f64>();

    let para: Vec<f64> = perimeters
        .iter()
        .zip(&areas_m2)
        .map(|(p, a)| p / a)
        .collect();
    let shape: Vec<f64> = perimeters
        .iter()
        .zip(&areas_m2)
        .map(|(p, a)| 0.25 * p / a.sqrt())
        .collect();
    // ln(area) = 0 for a 1 m² patch, where the index is undefined
    let frac: Vec<f64> = perimeters
        .iter()
        .zip(&areas_m2)
        .filter(|(_, a)| a.ln().abs() > f64::EPSILON)
        .map(|(p, a)| 2.0 * (0.25 * p).ln() / a.ln())
        .collect();

    ClassMetrics {
        class_val: class,
        total_area: class_m2 / M2_PER_HA,
        proportion_of_landscape: 100.0 * class_m2 / landscape_m2,
        number_of_patches: patches.len(),
        patch_density: 100.0 * patches.len() as f64 / landscape_ha,
        largest_patch_index: 100.0 * largest_m2 / landscape_m2,
        total_edge,
        edge_density: total_edge / landscape_ha,
        landscape_shape_index: 0.25 * all_edges / class_m2.sqrt(),
        effective_mesh_size: areas_m2.iter().map(|a| a * a).sum::<f64>() / landscape_m2 / M2_PER_HA,
        area_mn: area_stats.mean,
        area_am,
        area_md: area_stats.median,
        area_ra: area_stats.range,
        area_sd: area_stats.sd,
        area_cv: area_stats.cv,
        perimeter_mn: mean(&perimeters),
        perimeter_area_ratio_mn: mean(&para),
        shape_index_mn: mean(&shape),
        fractal_dimension_mn: mean(&frac),
        euclidean_nearest_neighbor_mn: mean(&nearest_neighbor_distances(patches)),
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Summary of a patch-level distribution
struct Distribution {
    mean: f64,
    median: f64,
    range: f64,
    /// Population standard deviation
    sd: f64,
    /// Coefficient of variation, percent
    cv: f64,
}

impl Distribution {
    fn of(values: &[f64]) -> Self {
        let mean = mean(values);
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let n = sorted.len();
        let median = match n {
            0 => f64::NAN,
            _ if n % 2 == 1 => sorted[n / 2],
            _ => (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0,
        };
        let range = match (sorted.first(), sorted.last()) {
            (Some(lo), Some(hi)) => hi - lo,
            _ => f64::NAN,
        };
        let sd = (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64).sqrt();

        Self {
            mean,
            median,
            range,
            sd,
            cv: 100.0 * sd / mean,
        }
    }
}
