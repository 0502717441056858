//! End-to-end: GeoTIFF + legend file -> metrics table and HTML map

use std::io::Write;

use mosaic_colormap::{ClassColorTable, Legend, UnmappedPolicy};
use mosaic_core::io::{read_class_raster, write_geotiff};
use mosaic_core::{GeoTransform, Raster, CRS};
use mosaic_landscape::{class_metrics, write_class_metrics_file, ClassMetricsParams};
use mosaic_map::{class_overlay_map, MapBounds, OverlayOptions};

fn write_inputs(dir: &std::path::Path) -> (std::path::PathBuf, std::path::PathBuf) {
    let mut raster = Raster::from_vec(vec![1i32, 2, 0], 1, 3).unwrap();
    raster.set_transform(GeoTransform::new(-70.5, -33.0, 0.25, -0.25));
    raster.set_crs(Some(CRS::wgs84()));
    raster.set_nodata(Some(0));

    let tif = dir.join("classes.tif");
    write_geotiff(&raster, &tif).unwrap();

    let legend = dir.join("legend.csv");
    let mut f = std::fs::File::create(&legend).unwrap();
    writeln!(f, "Class_ID,Color").unwrap();
    writeln!(f, "1,#FF0000").unwrap();
    writeln!(f, "2,#00FF00").unwrap();

    (tif, legend)
}

#[test]
fn raster_to_metrics_and_map() {
    let dir = tempfile::tempdir().unwrap();
    let (tif, legend_path) = write_inputs(dir.path());

    let raster = read_class_raster(&tif, None).unwrap();
    assert_eq!(raster.shape(), (1, 3));
    assert_eq!(raster.nodata(), Some(0.0));

    // Metrics
    let metrics = class_metrics(&raster, &ClassMetricsParams::default()).unwrap();
    assert_eq!(metrics.iter().map(|m| m.class_val).collect::<Vec<_>>(), vec![1, 2]);
    let tsv = dir.path().join("metrics.tsv");
    write_class_metrics_file(&metrics, &tsv).unwrap();
    let text = std::fs::read_to_string(&tsv).unwrap();
    assert_eq!(text.lines().count(), 3);
    assert!(text.lines().next().unwrap().starts_with("class_val\t"));

    // Colormap
    let legend = Legend::from_path(&legend_path).unwrap();
    let table = ClassColorTable::from_legend(&legend, UnmappedPolicy::Transparent);
    assert!(table.check_coverage(raster.class_counts().into_keys()).is_empty());

    // Map
    let map = class_overlay_map(&raster, &table, &OverlayOptions::default()).unwrap();
    let overlay = &map.overlays()[0];
    assert_eq!(overlay.bounds(), MapBounds::new(-33.25, -70.5, -33.0, -69.75).unwrap());
    assert_eq!(map.center(), (-33.125, -70.125));

    let img = image::load_from_memory(overlay.png()).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (3, 1));
    assert_eq!(img.get_pixel(0, 0).0, [255, 0, 0, 255]);
    assert_eq!(img.get_pixel(1, 0).0, [0, 255, 0, 255]);
    assert_eq!(img.get_pixel(2, 0).0[3], 0);

    let html_path = dir.path().join("map.html");
    map.save(&html_path).unwrap();
    let html = std::fs::read_to_string(&html_path).unwrap();
    assert!(html.contains("data:image/png;base64,"));
    assert!(html.contains("\"label\":\"1\""));
}

#[test]
fn unmapped_class_policies() {
    let dir = tempfile::tempdir().unwrap();
    let (tif, _) = write_inputs(dir.path());
    let raster = read_class_raster(&tif, None).unwrap();

    let strict = ClassColorTable::from_hex_pairs([(1, "#FF0000")], UnmappedPolicy::Error).unwrap();
    assert!(class_overlay_map(&raster, &strict, &OverlayOptions::default()).is_err());

    let gray = ClassColorTable::from_hex_pairs([(1, "#FF0000")], "#808080".parse().unwrap()).unwrap();
    let map = class_overlay_map(&raster, &gray, &OverlayOptions::default()).unwrap();
    let img = image::load_from_memory(map.overlays()[0].png()).unwrap().to_rgba8();
    assert_eq!(img.get_pixel(1, 0).0, [128, 128, 128, 255]);
    assert_eq!(img.get_pixel(2, 0).0[3], 0);
}

#[test]
fn web_mercator_raster_is_placed_in_degrees() {
    let mut raster = Raster::from_vec(vec![1i32, 1, 1, 1], 2, 2).unwrap();
    raster.set_transform(GeoTransform::new(0.0, 0.0, 1000.0, -1000.0));
    raster.set_crs(Some(CRS::web_mercator()));

    let table = ClassColorTable::from_hex_pairs([(1, "#0000FF")], UnmappedPolicy::Transparent).unwrap();
    let map = class_overlay_map(&raster, &table, &OverlayOptions::default()).unwrap();
    let b = map.overlays()[0].bounds();
    assert!(b.north.abs() < 1e-12);
    assert!((b.east - 0.017_966).abs() < 1e-5);
    assert!((b.south + 0.017_966).abs() < 1e-5);
}
