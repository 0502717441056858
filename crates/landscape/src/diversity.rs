//! Landscape-level composition indices
//!
//! Computed from the proportion of the landscape covered by each class:
//! - **Shannon Diversity**: `H' = -sum(pi * ln(pi))`
//! - **Simpson Diversity**: `1 - sum(pi^2)`
//! - **Shannon Evenness**: `H' / ln(m)` for `m` classes

use serde::Serialize;

use crate::class_metrics::M2_PER_HA;
use crate::patches::PatchMap;

/// Whole-landscape summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LandscapeMetrics {
    /// Area of all valid cells (ha)
    pub total_area: f64,
    pub number_of_classes: usize,
    pub number_of_patches: usize,
    pub shannon_diversity_index: f64,
    pub simpson_diversity_index: f64,
    /// NaN when fewer than two classes are present
    pub shannon_evenness_index: f64,
}

/// Compute landscape-level indices from a patch labelling.
pub fn landscape_metrics(patches: &PatchMap) -> LandscapeMetrics {
    let total = patches.valid_cells() as f64;
    let classes = patches.classes();

    let proportions: Vec<f64> = classes
        .iter()
        .map(|&class| patches.patches_of(class).map(|p| p.cells).sum::<usize>() as f64 / total)
        .collect();

    let mut shannon = 0.0;
    let mut simpson_d = 0.0;
    for &pi in &proportions {
        if pi > 0.0 {
            shannon -= pi * pi.ln();
        }
        simpson_d += pi * pi;
    }

    let m = classes.len();
    let evenness = if m > 1 {
        shannon / (m as f64).ln()
    } else {
        f64::NAN
    };

    LandscapeMetrics {
        total_area: patches.landscape_area() / M2_PER_HA,
        number_of_classes: m,
        number_of_patches: patches.patches().len(),
        shannon_diversity_index: shannon,
        simpson_diversity_index: 1.0 - simpson_d,
        shannon_evenness_index: evenness,
    }
}
