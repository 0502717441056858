//! Raster element trait for generic cell values

use num_traits::{NumCast, Zero};
use std::fmt::{Debug, Display};

/// Trait for types that can be stored in a raster cell.
///
/// Class rasters are read as `f64` so no-data and class checks see the
/// stored samples; the reader and writer stay generic over every TIFF
/// sample type.
pub trait RasterElement:
    Copy + Clone + Debug + Display + PartialOrd + PartialEq + NumCast + Zero + Send + Sync + 'static
{
    /// Value substituted for samples that cannot be represented in this type
    fn default_nodata() -> Self;

    /// Check if this value represents no-data
    fn is_nodata(&self, nodata: Option<Self>) -> bool;

    /// Convert self to f64
    fn to_f64(self) -> Option<f64> {
        NumCast::from(self)
    }

    /// Interpret the cell as a class ID.
    ///
    /// Returns `None` for values with a fractional part or outside `i32`.
    fn to_class(self) -> Option<i32> {
        let v = self.to_f64()?;
        if v.fract() != 0.0 {
            return None;
        }
        NumCast::from(v)
    }
}

macro_rules! impl_raster_element_int {
    ($($t:ty),*) => {$(
        impl RasterElement for $t {
            fn default_nodata() -> Self {
                <$t>::MIN
            }

            fn is_nodata(&self, nodata: Option<Self>) -> bool {
                nodata.is_some_and(|nd| *self == nd)
            }

            fn to_class(self) -> Option<i32> {
                NumCast::from(self)
            }
        }
    )*};
}

macro_rules! impl_raster_element_float {
    ($($t:ty),*) => {$(
        impl RasterElement for $t {
            fn default_nodata() -> Self {
                <$t>::NAN
            }

            fn is_nodata(&self, nodata: Option<Self>) -> bool {
                if self.is_nan() {
                    return true;
                }
                match nodata {
                    Some(nd) => (self - nd).abs() < <$t>::EPSILON * 100.0,
                    None => false,
                }
            }
        }
    )*};
}

impl_raster_element_int!(i8, i16, i32, i64, u8, u16, u32, u64);
impl_raster_element_float!(f32, f64);
