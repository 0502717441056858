//! Self-contained Leaflet HTML documents
//!
//! Overlay images are inlined as data URIs; only Leaflet itself and the
//! base tiles are fetched at view time.

use std::path::Path;

use mosaic_colormap::ClassColorTable;
use mosaic_core::raster::{Raster, RasterElement};
use serde::Serialize;

use crate::error::Result;
use crate::overlay::{ImageOverlay, OverlayOptions};

const LEAFLET_CSS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.css";
const LEAFLET_JS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.js";
const OSM_TILES: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";
const OSM_ATTRIBUTION: &str =
    "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors";

/// One legend row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendItem {
    pub label: String,
    /// CSS color, e.g. `#FF0000`
    pub color: String,
}

/// Interactive map: base tiles, image overlays, optional legend
#[derive(Debug, Clone)]
pub struct OverlayMap {
    center: (f64, f64),
    zoom: u8,
    title: String,
    overlays: Vec<ImageOverlay>,
    legend: Vec<LegendItem>,
    layer_control: bool,
}

#[derive(Serialize)]
struct OverlayJs<'a> {
    name: &'a str,
    url: String,
    bounds: [[f64; 2]; 2],
    opacity: f64,
}

#[derive(Serialize)]
struct MapJs<'a> {
    center: [f64; 2],
    zoom: u8,
    tiles: &'static str,
    attribution: &'static str,
    overlays: Vec<OverlayJs<'a>>,
    legend: &'a [LegendItem],
    layer_control: bool,
}

impl OverlayMap {
    /// Empty map centred on `center` (`lat, lon`).
    pub fn new(center: (f64, f64), zoom: u8) -> Self {
        Self {
            center,
            zoom,
            title: "Mosaic map".to_string(),
            overlays: Vec::new(),
            legend: Vec::new(),
            layer_control: true,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_layer_control(mut self, enabled: bool) -> Self {
        self.layer_control = enabled;
        self
    }

    pub fn add_overlay(&mut self, overlay: ImageOverlay) {
        self.overlays.push(overlay);
    }

    pub fn set_legend(&mut self, legend: Vec<LegendItem>) {
        self.legend = legend;
    }

    pub fn center(&self) -> (f64, f64) {
        self.center
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn overlays(&self) -> &[ImageOverlay] {
        &self.overlays
    }

    pub fn legend(&self) -> &[LegendItem] {
        &self.legend
    }

    /// Render the complete HTML document.
    pub fn to_html(&self) -> Result<String> {
        let config = MapJs {
            center: [self.center.0, self.center.1],
            zoom: self.zoom,
            tiles: OSM_TILES,
            attribution: OSM_ATTRIBUTION,
            overlays: self
                .overlays
                .iter()
                .map(|o| OverlayJs {
                    name: o.name(),
                    url: o.data_uri(),
                    bounds: o.bounds().corners(),
                    opacity: o.opacity(),
                })
                .collect(),
            legend: &self.legend,
            layer_control: self.layer_control,
        };
        let json = script_safe(&serde_json::to_string(&config)?);

        Ok(TEMPLATE
            .replace("__TITLE__", &escape_html(&self.title))
            .replace("__LEAFLET_CSS__", LEAFLET_CSS)
            .replace("__LEAFLET_JS__", LEAFLET_JS)
            .replace("__CONFIG__", &json))
    }

    /// Write the HTML document to `path`, replacing any existing file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_html()?)?;
        Ok(())
    }
}

/// Build a single-overlay map for a class raster.
///
/// The map is centred on the raster extent; the legend lists the mapped
/// classes that occur in the raster.
pub fn class_overlay_map<T: RasterElement>(
    raster: &Raster<T>,
    table: &ClassColorTable,
    options: &OverlayOptions,
) -> Result<OverlayMap> {
    options.validate()?;

    let overlay = ImageOverlay::from_classes(raster, table, options)?;
    let mut map = OverlayMap::new(overlay.bounds().center(), options.zoom)
        .with_title(options.name.clone())
        .with_layer_control(options.layer_control);

    if options.show_legend {
        map.set_legend(legend_items(raster, table));
    }
    map.add_overlay(overlay);
    Ok(map)
}

/// Legend rows for classes present in `raster` that `table` colors.
pub fn legend_items<T: RasterElement>(raster: &Raster<T>, table: &ClassColorTable) -> Vec<LegendItem> {
    raster
        .class_counts()
        .keys()
        .filter_map(|&class| {
            table.get(class).map(|color| LegendItem {
                label: class.to_string(),
                color: color.rgb().to_string(),
            })
        })
        .collect()
}

/// Prevent `</script>` inside string values from closing the script element.
fn script_safe(json: &str) -> String {
    json.replace("</", "<\\/")
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>__TITLE__</title>
<link rel="stylesheet" href="__LEAFLET_CSS__">
<script src="__LEAFLET_JS__"></script>
<style>
  html, body { height: 100%; margin: 0; padding: 0; }
  #map { position: absolute; top: 0; bottom: 0; left: 0; right: 0; }
  .leaflet-image-layer { image-rendering: pixelated; image-rendering: crisp-edges; }
  .mosaic-legend { background: rgba(255, 255, 255, 0.9); padding: 6px 8px; border-radius: 4px;
    font: 12px/16px sans-serif; box-shadow: 0 0 4px rgba(0, 0, 0, 0.3); }
  .mosaic-legend-row { display: flex; align-items: center; margin: 2px 0; }
  .mosaic-legend-swatch { width: 14px; height: 14px; margin-right: 6px; border: 1px solid #555; }
</style>
</head>
<body>
<div id="map"></div>
<script>
(function () {
  var config = __CONFIG__;
  var map = L.map('map').setView(config.center, config.zoom);
  var base = L.tileLayer(config.tiles, { maxZoom: 19, attribution: config.attribution }).addTo(map);

  var overlays = {};
  config.overlays.forEach(function (o) {
    overlays[o.name] = L.imageOverlay(o.url, o.bounds, { opacity: o.opacity }).addTo(map);
  });

  if (config.layer_control) {
    L.control.layers({ 'OpenStreetMap': base }, overlays).addTo(map);
  }

  if (config.legend.length > 0) {
    var legend = L.control({ position: 'bottomright' });
    legend.onAdd = function () {
      var div = L.DomUtil.create('div', 'mosaic-legend');
      config.legend.forEach(function (item) {
        var row = L.DomUtil.create('div', 'mosaic-legend-row', div);
        var swatch = L.DomUtil.create('span', 'mosaic-legend-swatch', row);
        swatch.style.background = item.color;
        var label = L.DomUtil.create('span', '', row);
        label.textContent = item.label;
      });
      return div;
    };
    legend.addTo(map);
  }
})();
</script>
</body>
</html>
"#;
