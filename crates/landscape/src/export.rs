//! Tab-separated export of class metrics

use std::io::Write;
use std::path::Path;

use mosaic_core::Result;

use crate::class_metrics::ClassMetrics;

/// Write one header row and one row per class, tab separated.
pub fn write_class_metrics<W: Write>(metrics: &[ClassMetrics], writer: W) -> Result<()> {
    let mut out = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .from_writer(writer);

    for row in metrics {
        out.serialize(row).map_err(std::io::Error::from)?;
    }
    out.flush()?;
    Ok(())
}

/// Write class metrics to a file, replacing it if it exists.
pub fn write_class_metrics_file<P: AsRef<Path>>(metrics: &[ClassMetrics], path: P) -> Result<()> {
    let file = std::fs::File::create(path.as_ref())?;
    write_class_metrics(metrics, std::io::BufWriter::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class_metrics::{class_metrics, ClassMetricsParams};
    use mosaic_core::raster::Raster;

    #[test]
    fn header_and_rows() {
        let r = Raster::from_vec(vec![1, 1, 2, 2], 2, 2).unwrap();
        let metrics = class_metrics(&r, &ClassMetricsParams::default()).unwrap();

        let mut buf = Vec::new();
        write_class_metrics(&metrics, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        let header: Vec<&str> = lines[0].split('\t').collect();
        assert_eq!(header[0], "class_val");
        assert_eq!(header[1], "total_area");
        assert_eq!(*header.last().unwrap(), "euclidean_nearest_neighbor_mn");
        assert!(lines[1].starts_with("1\t"));
        assert!(lines[2].starts_with("2\t"));
        assert_eq!(lines[1].split('\t').count(), header.len());
    }

    #[test]
    fn writes_file() {
        let r = Raster::filled(2, 2, 3);
        let metrics = class_metrics(&r, &ClassMetricsParams::default()).unwrap();

        let tmp = tempfile::NamedTempFile::with_suffix(".tsv").unwrap();
        write_class_metrics_file(&metrics, tmp.path()).unwrap();
        let text = std::fs::read_to_string(tmp.path()).unwrap();
        assert!(text.lines().nth(1).unwrap().starts_with("3\t"));
    }
}
