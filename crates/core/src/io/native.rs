//! Native GeoTIFF reading/writing
//!
//! Uses the `tiff` crate for TIFF I/O and understands the handful of GeoTIFF
//! tags a classified raster needs: pixel scale, tiepoint, the EPSG code from
//! the GeoKey directory and GDAL's no-data tag.

use crate::crs::{CRS, EPSG_WGS84};
use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Raster, RasterElement};
use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor, Read, Seek, Write};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::Gray32Float;
use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;
use tiff::ColorType;

const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const GEO_KEY_DIRECTORY: u16 = 34735;
const GDAL_NODATA: u16 = 42113;

const GT_MODEL_TYPE_KEY: u16 = 1024;
const GT_RASTER_TYPE_KEY: u16 = 1025;
const GEOGRAPHIC_TYPE_KEY: u16 = 2048;
const PROJECTED_CS_TYPE_KEY: u16 = 3072;

/// GeoKey value meaning "user-defined", i.e. not an EPSG code
const USER_DEFINED: u16 = 32767;

fn tag(code: u16) -> Tag {
    Tag::from_u16_exhaustive(code)
}

/// Read the first band of a GeoTIFF file into a Raster
///
/// Samples that cannot be represented in `T` become `T::default_nodata()`.
/// Integer `T` truncates fractional samples and drops a NaN no-data tag;
/// use [`read_class_raster`] for class rasters of unknown sample type.
pub fn read_geotiff<T, P>(path: P) -> Result<Raster<T>>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = File::open(path.as_ref())?;
    decode_geotiff(BufReader::new(file))
}

/// No-data class used when neither the caller nor the file provides one
pub const DEFAULT_CLASS_NODATA: f64 = 0.0;

/// Read a class raster with its no-data value settled
///
/// Samples are kept as `f64` so NaN and fractional cells reach the no-data
/// and class checks unchanged instead of being cast into a valid class ID.
/// The no-data value is `nodata` when given, else the file's GDAL_NODATA
/// tag, else [`DEFAULT_CLASS_NODATA`].
pub fn read_class_raster<P: AsRef<Path>>(path: P, nodata: Option<f64>) -> Result<Raster<f64>> {
    let mut raster: Raster<f64> = read_geotiff(path)?;
    let resolved = nodata.or(raster.nodata()).unwrap_or(DEFAULT_CLASS_NODATA);
    raster.set_nodata(Some(resolved));
    Ok(raster)
}

/// Read a GeoTIFF from an in-memory buffer into a Raster
pub fn read_geotiff_from_buffer<T>(data: &[u8]) -> Result<Raster<T>>
where
    T: RasterElement,
{
    decode_geotiff(Cursor::new(data))
}

fn cast_all<S, T>(buf: Vec<S>) -> Vec<T>
where
    S: num_traits::NumCast + Copy,
    T: RasterElement,
{
    buf.into_iter()
        .map(|v| num_traits::cast(v).unwrap_or(T::default_nodata()))
        .collect()
}

/// Internal: decode a GeoTIFF from any `Read + Seek` source
fn decode_geotiff<T, R>(reader: R) -> Result<Raster<T>>
where
    T: RasterElement,
    R: Read + Seek,
{
    let mut decoder = Decoder::new(reader)?;

    match decoder.colortype()? {
        ColorType::Gray(_) => {}
        other => {
            return Err(Error::UnsupportedDataType(format!(
                "expected a single-band raster, found {:?}",
                other
            )))
        }
    }

    let (width, height) = decoder.dimensions()?;
    let rows = height as usize;
    let cols = width as usize;

    let data: Vec<T> = match decoder.read_image()? {
        DecodingResult::F32(buf) => cast_all(buf),
        DecodingResult::F64(buf) => cast_all(buf),
        DecodingResult::U8(buf) => cast_all(buf),
        DecodingResult::U16(buf) => cast_all(buf),
        DecodingResult::U32(buf) => cast_all(buf),
        DecodingResult::U64(buf) => cast_all(buf),
        DecodingResult::I8(buf) => cast_all(buf),
        DecodingResult::I16(buf) => cast_all(buf),
        DecodingResult::I32(buf) => cast_all(buf),
        DecodingResult::I64(buf) => cast_all(buf),
        #[allow(unreachable_patterns)]
        _ => {
            return Err(Error::UnsupportedDataType(
                "Unsupported TIFF pixel format".to_string(),
            ))
        }
    };

    let mut raster = Raster::from_vec(data, rows, cols)?;

    if let Some(transform) = read_geotransform(&mut decoder) {
        raster.set_transform(transform);
    }
    raster.set_crs(read_crs(&mut decoder));
    raster.set_nodata(read_nodata(&mut decoder));

    Ok(raster)
}

/// GeoTransform from ModelPixelScaleTag + ModelTiepointTag, if both are present
fn read_geotransform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<GeoTransform> {
    let scale = decoder.get_tag_f64_vec(tag(MODEL_PIXEL_SCALE)).ok()?;
    let tiepoint = decoder.get_tag_f64_vec(tag(MODEL_TIEPOINT)).ok()?;

    if scale.len() < 2 || tiepoint.len() < 6 {
        return None;
    }

    // tiepoint: [I, J, K, X, Y, Z], scale: [ScaleX, ScaleY, ScaleZ]
    let origin_x = tiepoint[3] - tiepoint[0] * scale[0];
    let origin_y = tiepoint[4] + tiepoint[1] * scale[1];

    Some(GeoTransform::new(origin_x, origin_y, scale[0], -scale[1]))
}

/// EPSG code from the GeoKey directory (projected CS first, then geographic)
fn read_crs<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<CRS> {
    let keys = decoder.get_tag_u16_vec(tag(GEO_KEY_DIRECTORY)).ok()?;
    let entries = parse_geokeys(&keys);

    [PROJECTED_CS_TYPE_KEY, GEOGRAPHIC_TYPE_KEY]
        .iter()
        .find_map(|key| {
            entries
                .iter()
                .find(|(id, _)| id == key)
                .map(|&(_, value)| value)
        })
        .filter(|&code| code != 0 && code != USER_DEFINED)
        .map(|code| CRS::from_epsg(code as u32))
}

/// Inline (key, value) pairs of a GeoKeyDirectoryTag payload
fn parse_geokeys(keys: &[u16]) -> Vec<(u16, u16)> {
    if keys.len() < 4 {
        return Vec::new();
    }
    let count = keys[3] as usize;

    keys[4..]
        .chunks_exact(4)
        .take(count)
        // location 0 means the value is stored inline
        .filter(|entry| entry[1] == 0)
        .map(|entry| (entry[0], entry[3]))
        .collect()
}

fn read_nodata<T, R>(decoder: &mut Decoder<R>) -> Option<T>
where
    T: RasterElement,
    R: Read + Seek,
{
    let text = decoder.get_tag_ascii_string(tag(GDAL_NODATA)).ok()?;
    let value: f64 = text.trim_matches(char::from(0)).trim().parse().ok()?;
    num_traits::cast(value)
}

/// Write a Raster to a GeoTIFF file
///
/// Samples are stored as 32-bit float, so integer class IDs round-trip
/// exactly while their magnitude stays below 2^24.
pub fn write_geotiff<T, P>(raster: &Raster<T>, path: P) -> Result<()>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    encode_geotiff(raster, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Write a Raster to an in-memory GeoTIFF buffer
pub fn write_geotiff_to_buffer<T>(raster: &Raster<T>) -> Result<Vec<u8>>
where
    T: RasterElement,
{
    let mut buf = Vec::new();
    encode_geotiff(raster, Cursor::new(&mut buf))?;
    Ok(buf)
}

/// Internal: encode a Raster as GeoTIFF into any `Write + Seek` sink
fn encode_geotiff<T, W>(raster: &Raster<T>, writer: W) -> Result<()>
where
    T: RasterElement,
    W: Write + Seek,
{
    let mut encoder = TiffEncoder::new(writer)?;
    let (rows, cols) = raster.shape();

    let data: Vec<f32> = raster
        .data()
        .iter()
        .map(|&v| num_traits::cast(v).unwrap_or(f32::NAN))
        .collect();

    let mut image = encoder.new_image::<Gray32Float>(cols as u32, rows as u32)?;

    let gt = raster.transform();
    let scale = [gt.pixel_width, gt.pixel_height.abs(), 0.0];
    image
        .encoder()
        .write_tag(tag(MODEL_PIXEL_SCALE), &scale[..])?;

    let tiepoint = [0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0];
    image
        .encoder()
        .write_tag(tag(MODEL_TIEPOINT), &tiepoint[..])?;

    let geokeys = build_geokeys(raster.crs());
    image
        .encoder()
        .write_tag(tag(GEO_KEY_DIRECTORY), &geokeys[..])?;

    if let Some(nodata) = raster.nodata() {
        let text = nodata.to_string();
        image
            .encoder()
            .write_tag(tag(GDAL_NODATA), text.as_str())?;
    }

    image.write_data(&data)?;

    Ok(())
}

/// GeoKeyDirectoryTag payload: model type, raster type and, when known, the EPSG code
fn build_geokeys(crs: Option<&CRS>) -> Vec<u16> {
    let epsg = crs
        .and_then(|c| c.epsg())
        .and_then(|code| u16::try_from(code).ok());
    let geographic = epsg == Some(EPSG_WGS84 as u16);

    // 1 = projected, 2 = geographic
    let model_type = if geographic { 2 } else { 1 };
    let mut entries = vec![
        (GT_MODEL_TYPE_KEY, model_type),
        // RasterPixelIsArea
        (GT_RASTER_TYPE_KEY, 1),
    ];
    if let Some(code) = epsg {
        let key = if geographic {
            GEOGRAPHIC_TYPE_KEY
        } else {
            PROJECTED_CS_TYPE_KEY
        };
        entries.push((key, code));
    }

    let mut keys = vec![1, 1, 0, entries.len() as u16];
    for (id, value) in entries {
        keys.extend_from_slice(&[id, 0, 1, value]);
    }
    keys
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn class_raster() -> Raster<i32> {
        let mut r = Raster::from_vec(vec![0, 1, 1, 2, 2, 0], 2, 3).unwrap();
        r.set_transform(GeoTransform::new(500_000.0, 4_000_000.0, 30.0, -30.0));
        r.set_crs(Some(CRS::from_epsg(32719)));
        r.set_nodata(Some(0));
        r
    }

    #[test]
    fn test_buffer_roundtrip_keeps_metadata() {
        let raster = class_raster();
        let buf = write_geotiff_to_buffer(&raster).unwrap();
        let loaded: Raster<i32> = read_geotiff_from_buffer(&buf).unwrap();

        assert_eq!(loaded.shape(), (2, 3));
        assert_eq!(loaded.data(), raster.data());
        assert_eq!(loaded.nodata(), Some(0));
        assert_eq!(loaded.crs().and_then(|c| c.epsg()), Some(32719));

        let gt = loaded.transform();
        assert_relative_eq!(gt.origin_x, 500_000.0);
        assert_relative_eq!(gt.origin_y, 4_000_000.0);
        assert_relative_eq!(gt.pixel_width, 30.0);
        assert_relative_eq!(gt.pixel_height, -30.0);
    }

    #[test]
    fn test_file_roundtrip_geographic() {
        let mut raster = class_raster();
        raster.set_crs(Some(CRS::wgs84()));
        raster.set_nodata(None);

        let tmp = tempfile::NamedTempFile::with_suffix(".tif").unwrap();
        write_geotiff(&raster, tmp.path()).unwrap();

        let loaded: Raster<i32> = read_geotiff(tmp.path()).unwrap();
        assert_eq!(loaded.data(), raster.data());
        assert_eq!(loaded.nodata(), None);
        assert!(loaded.crs().is_some_and(|c| c.is_wgs84()));
    }

    #[test]
    fn test_parse_geokeys_skips_referenced_values() {
        let keys = [1, 1, 0, 3, 1024, 0, 1, 1, 1026, 34737, 10, 0, 3072, 0, 1, 32719];
        assert_eq!(parse_geokeys(&keys), vec![(1024, 1), (3072, 32719)]);
        assert!(parse_geokeys(&[1, 1]).is_empty());
    }

    fn float_classes() -> Raster<f32> {
        let mut r = Raster::from_vec(vec![1.0, 1.5, f32::NAN, 2.0], 2, 2).unwrap();
        r.set_transform(GeoTransform::new(0.0, 2.0, 1.0, -1.0));
        r.set_nodata(Some(f32::NAN));
        r
    }

    #[test]
    fn test_class_raster_keeps_float_samples() {
        let tmp = tempfile::NamedTempFile::with_suffix(".tif").unwrap();
        write_geotiff(&float_classes(), tmp.path()).unwrap();

        let loaded = read_class_raster(tmp.path(), None).unwrap();
        assert!(loaded.nodata().is_some_and(|v| v.is_nan()));
        assert_relative_eq!(loaded.get(0, 1).unwrap(), 1.5);

        // NaN is no-data and 1.5 is not a class
        let counts: Vec<_> = loaded.class_counts().into_iter().collect();
        assert_eq!(counts, vec![(1, 1), (2, 1)]);
        assert_eq!(loaded.class_summary().valid_count, 2);
    }

    #[test]
    fn test_class_raster_nodata_resolution() {
        let mut raster = class_raster();
        let tmp = tempfile::NamedTempFile::with_suffix(".tif").unwrap();
        write_geotiff(&raster, tmp.path()).unwrap();

        let from_file = read_class_raster(tmp.path(), None).unwrap();
        assert_eq!(from_file.nodata(), Some(0.0));

        let overridden = read_class_raster(tmp.path(), Some(2.0)).unwrap();
        assert_eq!(overridden.nodata(), Some(2.0));
        let counts: Vec<_> = overridden.class_counts().into_iter().collect();
        assert_eq!(counts, vec![(0, 2), (1, 2)]);

        raster.set_nodata(None);
        write_geotiff(&raster, tmp.path()).unwrap();
        let fallback = read_class_raster(tmp.path(), None).unwrap();
        assert_eq!(fallback.nodata(), Some(DEFAULT_CLASS_NODATA));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = read_geotiff::<i32, _>("/nonexistent/classes.tif").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
