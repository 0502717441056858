//! Raster image overlays: colorized class grid encoded as an inline PNG

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use mosaic_colormap::{classes_to_rgba, ClassColorTable};
use mosaic_core::raster::{Raster, RasterElement};

use crate::bounds::MapBounds;
use crate::error::{MapError, Result};

/// Display options for a class overlay map
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayOptions {
    /// Overlay opacity in `[0, 1]`
    pub opacity: f64,
    /// Initial zoom level in `[0, 22]`
    pub zoom: u8,
    /// Name shown in the layer control
    pub name: String,
    /// Add a class legend control
    pub show_legend: bool,
    /// Add a base/overlay layer switcher
    pub layer_control: bool,
}

impl Default for OverlayOptions {
    fn default() -> Self {
        Self {
            opacity: 0.6,
            zoom: 10,
            name: "Classes".to_string(),
            show_legend: true,
            layer_control: true,
        }
    }
}

impl OverlayOptions {
    pub const MAX_ZOOM: u8 = 22;

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(MapError::InvalidOption {
                name: "opacity",
                value: self.opacity.to_string(),
                reason: "must be between 0 and 1",
            });
        }
        if self.zoom > Self::MAX_ZOOM {
            return Err(MapError::InvalidOption {
                name: "zoom",
                value: self.zoom.to_string(),
                reason: "must be between 0 and 22",
            });
        }
        Ok(())
    }
}

/// A georeferenced PNG drawn over the base map
#[derive(Debug, Clone)]
pub struct ImageOverlay {
    name: String,
    bounds: MapBounds,
    opacity: f64,
    width: u32,
    height: u32,
    png: Vec<u8>,
}

impl ImageOverlay {
    /// Encode a row-major RGBA8 buffer as an overlay image.
    pub fn from_rgba(
        name: impl Into<String>,
        bounds: MapBounds,
        rgba: &[u8],
        width: u32,
        height: u32,
        opacity: f64,
    ) -> Result<Self> {
        let png = encode_png(rgba, width, height)?;
        Ok(Self {
            name: name.into(),
            bounds,
            opacity,
            width,
            height,
            png,
        })
    }

    /// Colorize a class raster with `table` and wrap it as an overlay.
    pub fn from_classes<T: RasterElement>(
        raster: &Raster<T>,
        table: &ClassColorTable,
        options: &OverlayOptions,
    ) -> Result<Self> {
        let bounds = MapBounds::from_raster(raster)?;
        let rgba = classes_to_rgba(raster, table)?;
        let (width, height) = dimensions(raster)?;
        Self::from_rgba(options.name.clone(), bounds, &rgba, width, height, options.opacity)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bounds(&self) -> MapBounds {
        self.bounds
    }

    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Encoded PNG bytes
    pub fn png(&self) -> &[u8] {
        &self.png
    }

    /// `data:image/png;base64,...` URI embedding the image
    pub fn data_uri(&self) -> String {
        format!("data:image/png;base64,{}", STANDARD.encode(&self.png))
    }
}

/// Encode an RGBA8 buffer as PNG.
pub fn encode_png(rgba: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let expected = width as usize * height as usize * 4;
    if rgba.len() != expected {
        return Err(MapError::BufferSize {
            expected,
            actual: rgba.len(),
        });
    }

    let mut png = Vec::new();
    PngEncoder::new(&mut png).write_image(rgba, width, height, ExtendedColorType::Rgba8)?;
    Ok(png)
}

fn dimensions<T: RasterElement>(raster: &Raster<T>) -> Result<(u32, u32)> {
    let (rows, cols) = raster.shape();
    let to_u32 = |v: usize, name: &'static str| {
        u32::try_from(v).map_err(|_| MapError::InvalidOption {
            name,
            value: v.to_string(),
            reason: "raster too large for a PNG overlay",
        })
    };
    Ok((to_u32(cols, "width")?, to_u32(rows, "height")?))
}
