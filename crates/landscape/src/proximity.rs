//! Nearest-neighbor distances between patches of one class
//!
//! Perimeter cell centers of every patch go into a single R-tree tagged
//! with their patch index. Each patch then queries outward from its own
//! perimeter cells and stops at the first center owned by another patch.

use rstar::primitives::GeomWithData;
use rstar::RTree;

use crate::patches::Patch;

/// Perimeter cell center tagged with the index of its patch
type EdgeCell = GeomWithData<[f64; 2], usize>;

/// Distance from each patch to the closest other patch in `patches`.
///
/// Returns an empty vector when there are fewer than two patches.
pub(crate) fn nearest_neighbor_distances(patches: &[&Patch]) -> Vec<f64> {
    if patches.len() < 2 {
        return Vec::new();
    }

    let cells: Vec<EdgeCell> = patches
        .iter()
        .enumerate()
        .flat_map(|(id, patch)| {
            patch
                .edge_centers()
                .iter()
                .map(move |&(x, y)| EdgeCell::new([x, y], id))
        })
        .collect();
    let tree = RTree::bulk_load(cells);

    patches
        .iter()
        .enumerate()
        .map(|(id, patch)| nearest_other(&tree, patch, id))
        .collect()
}

fn nearest_other(tree: &RTree<EdgeCell>, patch: &Patch, id: usize) -> f64 {
    // squared distance
    let mut best = f64::INFINITY;
    for &(x, y) in patch.edge_centers() {
        for (cell, d2) in tree.nearest_neighbor_iter_with_distance_2(&[x, y]) {
            if d2 >= best {
                break;
            }
            if cell.data != id {
                best = d2;
                break;
            }
        }
    }
    best.sqrt()
}
