//! Patch labelling for class rasters
//!
//! A patch is a maximal group of same-class cells connected under a
//! [`Neighborhood`] rule. Perimeters are always measured along cell sides,
//! whichever rule is used for connectivity.

use ndarray::Array2;
use mosaic_core::raster::{Neighborhood, Raster, RasterElement};
use mosaic_core::{Error, Result};

/// A contiguous group of same-class cells
#[derive(Debug, Clone)]
pub struct Patch {
    /// Class ID shared by every cell
    pub class: i32,
    /// Number of cells
    pub cells: usize,
    /// Length of every cell side facing a cell outside the patch, including
    /// no-data and the raster border (map units)
    pub perimeter: f64,
    /// Length of cell sides shared with a cell of another valid class (map units)
    pub class_edge: f64,
    /// Geographic centers of the cells lying on the perimeter
    edge_centers: Vec<(f64, f64)>,
}

impl Patch {
    /// Patch area in squared map units
    pub fn area(&self, cell_area: f64) -> f64 {
        self.cells as f64 * cell_area
    }

    /// Geographic centers of the cells lying on the perimeter
    pub(crate) fn edge_centers(&self) -> &[(f64, f64)] {
        &self.edge_centers
    }

    /// Smallest center-to-center distance between cells of two patches
    pub fn distance_to(&self, other: &Patch) -> f64 {
        let mut best = f64::INFINITY;
        for &(x0, y0) in &self.edge_centers {
            for &(x1, y1) in &other.edge_centers {
                let d2 = (x1 - x0).powi(2) + (y1 - y0).powi(2);
                if d2 < best {
                    best = d2;
                }
            }
        }
        best.sqrt()
    }
}

/// Patch labels for a whole raster
#[derive(Debug, Clone)]
pub struct PatchMap {
    /// 0 for cells outside any patch, otherwise index into `patches` plus one
    labels: Array2<u32>,
    patches: Vec<Patch>,
    cell_area: f64,
    valid_cells: usize,
}

impl PatchMap {
    /// Label every patch of `raster`.
    ///
    /// Cells are skipped when they are the raster's no-data value, when
    /// their class equals `nodata`, or when the value is not an integral
    /// class ID.
    pub fn label<T: RasterElement>(
        raster: &Raster<T>,
        nodata: Option<i32>,
        neighborhood: Neighborhood,
    ) -> Result<Self> {
        let (rows, cols) = raster.shape();
        if rows == 0 || cols == 0 {
            return Err(Error::InvalidDimensions {
                width: cols,
                height: rows,
            });
        }

        let classes = class_grid(raster, nodata);
        let gt = raster.transform();
        // Top/bottom sides span one pixel width, left/right sides one pixel height.
        let side_x = gt.pixel_width.abs();
        let side_y = gt.pixel_height.abs();

        let mut labels = Array2::<u32>::zeros((rows, cols));
        let mut patches: Vec<Patch> = Vec::new();
        let mut stack = Vec::new();
        let mut valid_cells = 0usize;

        for row in 0..rows {
            for col in 0..cols {
                let Some(class) = classes[(row, col)] else {
                    continue;
                };
                valid_cells += 1;
                if labels[(row, col)] != 0 {
                    continue;
                }

                let label = patches.len() as u32 + 1;
                let mut patch = Patch {
                    class,
                    cells: 0,
                    perimeter: 0.0,
                    class_edge: 0.0,
                    edge_centers: Vec::new(),
                };

                labels[(row, col)] = label;
                stack.push((row, col));

                while let Some((r, c)) = stack.pop() {
                    patch.cells += 1;

                    let mut on_perimeter = false;
                    for &(dr, dc) in Neighborhood::edge_offsets() {
                        let side = if dr == 0 { side_y } else { side_x };
                        match neighbor(&classes, r, c, dr, dc) {
                            Some(Some(other)) if other == class => {}
                            Some(Some(_)) => {
                                patch.perimeter += side;
                                patch.class_edge += side;
                                on_perimeter = true;
                            }
                            // no-data or outside the raster
                            _ => {
                                patch.perimeter += side;
                                on_perimeter = true;
                            }
                        }
                    }
                    if on_perimeter {
                        patch.edge_centers.push(raster.pixel_to_geo(c, r));
                    }

                    for (nr, nc) in neighborhood.neighbors(r, c, rows, cols) {
                        if labels[(nr, nc)] == 0 && classes[(nr, nc)] == Some(class) {
                            labels[(nr, nc)] = label;
                            stack.push((nr, nc));
                        }
                    }
                }

                patches.push(patch);
            }
        }

        Ok(Self {
            labels,
            patches,
            cell_area: raster.cell_area(),
            valid_cells,
        })
    }

    /// All patches, in order of their first (row-major) cell
    pub fn patches(&self) -> &[Patch] {
        &self.patches
    }

    /// Patches of one class
    pub fn patches_of(&self, class: i32) -> impl Iterator<Item = &Patch> + '_ {
        self.patches.iter().filter(move |p| p.class == class)
    }

    /// Patch containing cell (row, col), if any
    pub fn patch_at(&self, row: usize, col: usize) -> Option<&Patch> {
        match self.labels.get((row, col)) {
            Some(&label) if label > 0 => self.patches.get(label as usize - 1),
            _ => None,
        }
    }

    /// Distinct classes, ascending
    pub fn classes(&self) -> Vec<i32> {
        let mut classes: Vec<i32> = self.patches.iter().map(|p| p.class).collect();
        classes.sort_unstable();
        classes.dedup();
        classes
    }

    /// Area of one cell in squared map units
    pub fn cell_area(&self) -> f64 {
        self.cell_area
    }

    /// Number of cells belonging to some patch
    pub fn valid_cells(&self) -> usize {
        self.valid_cells
    }

    /// Area of all valid cells in squared map units
    pub fn landscape_area(&self) -> f64 {
        self.valid_cells as f64 * self.cell_area
    }
}

fn class_grid<T: RasterElement>(raster: &Raster<T>, nodata: Option<i32>) -> Array2<Option<i32>> {
    let raster_nodata = raster.nodata();
    raster.data().mapv(|v| {
        if v.is_nodata(raster_nodata) {
            return None;
        }
        v.to_class().filter(|&c| Some(c) != nodata)
    })
}

/// `None` outside the grid, `Some(None)` for no-data, `Some(Some(class))` otherwise
fn neighbor(
    classes: &Array2<Option<i32>>,
    row: usize,
    col: usize,
    dr: isize,
    dc: isize,
) -> Option<Option<i32>> {
    let nr = row.checked_add_signed(dr)?;
    let nc = col.checked_add_signed(dc)?;
    classes.get((nr, nc)).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mosaic_core::GeoTransform;

    fn raster(data: Vec<i32>, rows: usize, cols: usize) -> Raster<i32> {
        let mut r = Raster::from_vec(data, rows, cols).unwrap();
        r.set_transform(GeoTransform::new(0.0, rows as f64, 1.0, -1.0));
        r
    }

    #[test]
    fn diagonal_cells_join_only_with_queen() {
        #[rustfmt::skip]
        let r = raster(vec![
            1, 2,
            2, 1,
        ], 2, 2);

        let rook = PatchMap::label(&r, None, Neighborhood::Rook).unwrap();
        assert_eq!(rook.patches().len(), 4);

        let queen = PatchMap::label(&r, None, Neighborhood::Queen).unwrap();
        assert_eq!(queen.patches().len(), 2);
        assert_eq!(queen.patches_of(1).next().unwrap().cells, 2);
    }

    #[test]
    fn perimeter_and_class_edge() {
        #[rustfmt::skip]
        let r = raster(vec![
            1, 1, 2,
            1, 1, 2,
            0, 0, 2,
        ], 3, 3);

        let map = PatchMap::label(&r, Some(0), Neighborhood::Queen).unwrap();
        assert_eq!(map.valid_cells(), 7);
        assert_relative_eq!(map.landscape_area(), 7.0);

        let p1 = map.patch_at(0, 0).unwrap();
        assert_eq!(p1.class, 1);
        assert_eq!(p1.cells, 4);
        assert_relative_eq!(p1.perimeter, 8.0);
        // shares two sides with class 2; the rest is border or nodata
        assert_relative_eq!(p1.class_edge, 2.0);

        let p2 = map.patch_at(2, 2).unwrap();
        assert_eq!(p2.cells, 3);
        assert_relative_eq!(p2.perimeter, 8.0);
        assert_relative_eq!(p2.class_edge, 2.0);

        assert!(map.patch_at(2, 0).is_none());
        assert_eq!(map.classes(), vec![1, 2]);
    }

    #[test]
    fn rectangular_cells_measure_sides() {
        let mut r = Raster::filled(1, 1, 5);
        r.set_transform(GeoTransform::new(0.0, 0.0, 10.0, -20.0));
        let map = PatchMap::label(&r, None, Neighborhood::Queen).unwrap();

        let p = &map.patches()[0];
        assert_relative_eq!(p.perimeter, 60.0);
        assert_relative_eq!(p.area(map.cell_area()), 200.0);
    }

    #[test]
    fn distance_between_patches() {
        #[rustfmt::skip]
        let r = raster(vec![
            1, 0, 0, 1,
        ], 1, 4);
        let map = PatchMap::label(&r, Some(0), Neighborhood::Queen).unwrap();
        let ps: Vec<_> = map.patches_of(1).collect();
        assert_eq!(ps.len(), 2);
        assert_relative_eq!(ps[0].distance_to(ps[1]), 3.0);
    }

    #[test]
    fn empty_raster_rejected() {
        let r: Raster<i32> = Raster::new(0, 0);
        assert!(PatchMap::label(&r, None, Neighborhood::Queen).is_err());
    }
}
