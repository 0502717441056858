//! Geographic extent of a raster for map display
//!
//! Leaflet positions image overlays in latitude/longitude. Rasters in
//! EPSG:3857 are converted with the inverse spherical Mercator; all other
//! rasters are assumed to already carry geographic coordinates.

use mosaic_core::raster::{Raster, RasterElement};
use serde::Serialize;

use crate::error::{MapError, Result};

/// Spherical Mercator radius (m)
const EARTH_RADIUS: f64 = 6_378_137.0;

/// Latitude/longitude box in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MapBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl MapBounds {
    pub fn new(south: f64, west: f64, north: f64, east: f64) -> Result<Self> {
        let bounds = Self { south, west, north, east };
        bounds.validate()?;
        Ok(bounds)
    }

    /// Extent of a raster, reprojected to degrees when it is in Web Mercator.
    pub fn from_raster<T: RasterElement>(raster: &Raster<T>) -> Result<Self> {
        let (min_x, min_y, max_x, max_y) = raster.bounds();
        let web_mercator = raster.crs().is_some_and(|crs| crs.is_web_mercator());

        if web_mercator {
            let (west, south) = mercator_to_lon_lat(min_x, min_y);
            let (east, north) = mercator_to_lon_lat(max_x, max_y);
            Self::new(south, west, north, east)
        } else {
            Self::new(min_y, min_x, max_y, max_x)
        }
    }

    /// Midpoint as `(lat, lon)`
    pub fn center(&self) -> (f64, f64) {
        ((self.south + self.north) / 2.0, (self.west + self.east) / 2.0)
    }

    /// Leaflet `LatLngBounds` literal: `[[south, west], [north, east]]`
    pub fn corners(&self) -> [[f64; 2]; 2] {
        [[self.south, self.west], [self.north, self.east]]
    }

    fn validate(&self) -> Result<()> {
        let values = [self.south, self.west, self.north, self.east];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(MapError::InvalidBounds(format!("non-finite extent {:?}", values)));
        }
        if self.south > self.north || self.west > self.east {
            return Err(MapError::InvalidBounds(format!(
                "south/west must not exceed north/east: {:?}",
                values
            )));
        }
        Ok(())
    }
}

/// Inverse spherical Mercator: metres to `(lon, lat)` degrees
pub fn mercator_to_lon_lat(x: f64, y: f64) -> (f64, f64) {
    let lon = (x / EARTH_RADIUS).to_degrees();
    let lat = (2.0 * (y / EARTH_RADIUS).exp().atan() - std::f64::consts::FRAC_PI_2).to_degrees();
    (lon, lat)
}
