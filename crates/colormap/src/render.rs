//! Class raster to RGBA rendering.

use std::collections::BTreeSet;

use mosaic_core::raster::{Raster, RasterElement};

use crate::color::Rgba;
use crate::error::{ColormapError, Result};
use crate::table::ClassColorTable;

/// Convert a class raster to an RGBA pixel buffer.
///
/// Returns a `Vec<u8>` of length `rows * cols * 4` in row-major order.
///
/// No-data cells, and cells whose value is not an integral class ID, are
/// transparent. Other cells take their class color through the table's
/// unmapped policy; under [`UnmappedPolicy::Error`](crate::UnmappedPolicy::Error)
/// the error lists every unmapped class found in the raster.
pub fn classes_to_rgba<T: RasterElement>(raster: &Raster<T>, table: &ClassColorTable) -> Result<Vec<u8>> {
    let nodata = raster.nodata();
    let mut rgba = vec![0u8; raster.len() * 4];
    let mut unmapped = BTreeSet::new();

    for (val, px) in raster.data().iter().zip(rgba.chunks_exact_mut(4)) {
        if val.is_nodata(nodata) {
            px.copy_from_slice(&Rgba::TRANSPARENT.to_array());
            continue;
        }

        let Some(class) = val.to_class() else {
            px.copy_from_slice(&Rgba::TRANSPARENT.to_array());
            continue;
        };

        match table.lookup(class) {
            Ok(color) => px.copy_from_slice(&color.to_array()),
            Err(_) => {
                unmapped.insert(class);
            }
        }
    }

    if !unmapped.is_empty() {
        return Err(ColormapError::UnmappedClass(unmapped.into_iter().collect()));
    }

    Ok(rgba)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::UnmappedPolicy;
    use mosaic_core::raster::Raster;

    fn pixel(rgba: &[u8], i: usize) -> [u8; 4] {
        [rgba[i * 4], rgba[i * 4 + 1], rgba[i * 4 + 2], rgba[i * 4 + 3]]
    }

    #[test]
    fn red_green_with_nodata_zero() {
        let mut r = Raster::from_vec(vec![1, 2, 0, 2], 2, 2).unwrap();
        r.set_nodata(Some(0));
        let table = ClassColorTable::from_hex_pairs([(1, "#FF0000"), (2, "#00FF00")], UnmappedPolicy::Error)
            .unwrap();

        let rgba = classes_to_rgba(&r, &table).unwrap();

        assert_eq!(rgba.len(), 16);
        assert_eq!(pixel(&rgba, 0), [255, 0, 0, 255]);
        assert_eq!(pixel(&rgba, 1), [0, 255, 0, 255]);
        // nodata is transparent even under the error policy
        assert_eq!(pixel(&rgba, 2), [0, 0, 0, 0]);
        assert_eq!(pixel(&rgba, 3), [0, 255, 0, 255]);
    }

    #[test]
    fn unmapped_class_without_nodata_is_transparent() {
        let r = Raster::from_vec(vec![0, 1], 1, 2).unwrap();
        let table = ClassColorTable::from_hex_pairs([(1, "#FF0000")], UnmappedPolicy::Transparent).unwrap();

        let rgba = classes_to_rgba(&r, &table).unwrap();
        assert_eq!(pixel(&rgba, 0), [0, 0, 0, 0]);
        assert_eq!(pixel(&rgba, 1), [255, 0, 0, 255]);
    }

    #[test]
    fn error_policy_lists_all_unmapped() {
        let r = Raster::from_vec(vec![7, 1, 3, 7], 2, 2).unwrap();
        let table = ClassColorTable::from_hex_pairs([(1, "#FF0000")], UnmappedPolicy::Error).unwrap();

        match classes_to_rgba(&r, &table) {
            Err(ColormapError::UnmappedClass(classes)) => assert_eq!(classes, vec![3, 7]),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn float_raster_classes() {
        let mut r = Raster::from_vec(vec![1.0f32, 1.5, f32::NAN], 1, 3).unwrap();
        r.set_nodata(Some(f32::NAN));
        let table = ClassColorTable::from_hex_pairs([(1, "#0000FF")], UnmappedPolicy::Error).unwrap();

        let rgba = classes_to_rgba(&r, &table).unwrap();
        assert_eq!(pixel(&rgba, 0), [0, 0, 255, 255]);
        assert_eq!(pixel(&rgba, 1), [0, 0, 0, 0]);
        assert_eq!(pixel(&rgba, 2), [0, 0, 0, 0]);
    }
}
