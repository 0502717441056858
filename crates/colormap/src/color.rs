//! RGB/RGBA colors and hex notation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ColormapError;

/// RGB color as (r, g, b) with values in 0..=255.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Fully opaque RGBA with the same channels.
    pub const fn opaque(self) -> Rgba {
        Rgba::new(self.r, self.g, self.b, 255)
    }
}

/// RGBA color with values in 0..=255.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Transparent black (used for nodata).
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);

    pub const fn rgb(self) -> Rgb {
        Rgb::new(self.r, self.g, self.b)
    }

    pub const fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Channels scaled to the unit interval.
    pub fn to_unit(self) -> [f32; 4] {
        self.to_array().map(|c| c as f32 / 255.0)
    }
}

impl From<Rgb> for Rgba {
    fn from(c: Rgb) -> Self {
        c.opaque()
    }
}

fn invalid(value: &str, reason: impl Into<String>) -> ColormapError {
    ColormapError::InvalidHex {
        value: value.to_string(),
        reason: reason.into(),
    }
}

/// Split `#RRGGBB[AA]` into bytes. The leading `#` is optional.
fn parse_hex_bytes(value: &str, allow_alpha: bool) -> Result<Vec<u8>, ColormapError> {
    let trimmed = value.trim();
    let hex = trimmed.strip_prefix('#').unwrap_or(trimmed);

    let expected = if allow_alpha { "6 or 8" } else { "6" };
    if !hex.is_ascii() {
        return Err(invalid(value, "non-ASCII characters"));
    }
    if hex.len() != 6 && !(allow_alpha && hex.len() == 8) {
        return Err(invalid(
            value,
            format!("expected {} hex digits, found {}", expected, hex.len()),
        ));
    }

    (0..hex.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|_| invalid(value, format!("'{}' is not a hex byte", &hex[i..i + 2])))
        })
        .collect()
}

impl FromStr for Rgb {
    type Err = ColormapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let b = parse_hex_bytes(s, false)?;
        Ok(Rgb::new(b[0], b[1], b[2]))
    }
}

impl FromStr for Rgba {
    type Err = ColormapError;

    /// `#RRGGBB` (opaque) or `#RRGGBBAA`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let b = parse_hex_bytes(s, true)?;
        let a = b.get(3).copied().unwrap_or(255);
        Ok(Rgba::new(b[0], b[1], b[2], a))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
    }
}
