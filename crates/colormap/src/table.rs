//! Sparse class ID → color lookup.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::color::{Rgb, Rgba};
use crate::error::{ColormapError, Result};
use crate::legend::Legend;

/// What a class without a legend entry renders as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnmappedPolicy {
    /// Fully transparent, so the base map shows through.
    #[default]
    Transparent,
    /// Looking the class up fails with [`ColormapError::UnmappedClass`].
    Error,
    /// A designated "unknown" color.
    Color(Rgba),
}

impl UnmappedPolicy {
    /// Color used for unmapped classes, `None` when they are an error.
    pub fn fallback(&self) -> Option<Rgba> {
        match self {
            UnmappedPolicy::Transparent => Some(Rgba::TRANSPARENT),
            UnmappedPolicy::Error => None,
            UnmappedPolicy::Color(c) => Some(*c),
        }
    }
}

impl FromStr for UnmappedPolicy {
    type Err = ColormapError;

    /// `transparent`, `error`, or a `#RRGGBB[AA]` color.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "transparent" | "none" => Ok(UnmappedPolicy::Transparent),
            "error" | "fail" => Ok(UnmappedPolicy::Error),
            _ => Ok(UnmappedPolicy::Color(s.parse()?)),
        }
    }
}

impl fmt::Display for UnmappedPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnmappedPolicy::Transparent => write!(f, "transparent"),
            UnmappedPolicy::Error => write!(f, "error"),
            UnmappedPolicy::Color(c) => write!(f, "{}", c),
        }
    }
}

/// Colors for each legend class, plus the policy for everything else.
///
/// Legend colors are always fully opaque. Class IDs may be any `i32`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassColorTable {
    colors: BTreeMap<i32, Rgba>,
    policy: UnmappedPolicy,
}

impl ClassColorTable {
    /// An empty table.
    pub fn new(policy: UnmappedPolicy) -> Self {
        Self {
            colors: BTreeMap::new(),
            policy,
        }
    }

    /// Table with one opaque entry per legend class.
    pub fn from_legend(legend: &Legend, policy: UnmappedPolicy) -> Self {
        let mut table = Self::new(policy);
        for entry in legend.iter() {
            table.insert(entry.class_id, entry.color);
        }
        table
    }

    /// Table from raw `(class ID, hex color)` pairs.
    ///
    /// Fails on the first malformed color.
    pub fn from_hex_pairs<I, S>(pairs: I, policy: UnmappedPolicy) -> Result<Self>
    where
        I: IntoIterator<Item = (i32, S)>,
        S: AsRef<str>,
    {
        let mut table = Self::new(policy);
        for (class_id, hex) in pairs {
            table.insert(class_id, hex.as_ref().parse::<Rgb>()?);
        }
        Ok(table)
    }

    /// Set the color of a class (alpha 255).
    pub fn insert(&mut self, class_id: i32, color: Rgb) {
        self.colors.insert(class_id, color.opaque());
    }

    pub fn policy(&self) -> UnmappedPolicy {
        self.policy
    }

    /// Color of a legend class, ignoring the policy.
    pub fn get(&self, class_id: i32) -> Option<Rgba> {
        self.colors.get(&class_id).copied()
    }

    /// Color a class renders as, applying the policy to unmapped classes.
    pub fn lookup(&self, class_id: i32) -> Result<Rgba> {
        self.get(class_id)
            .or_else(|| self.policy.fallback())
            .ok_or_else(|| ColormapError::UnmappedClass(vec![class_id]))
    }

    /// Mapped classes in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (i32, Rgba)> + '_ {
        self.colors.iter().map(|(&k, &v)| (k, v))
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Mapped classes with channels scaled to [0, 1].
    pub fn normalized(&self) -> Vec<(i32, [f32; 4])> {
        self.iter().map(|(k, c)| (k, c.to_unit())).collect()
    }

    /// Classes from `classes` that have no legend color, sorted and deduplicated.
    pub fn check_coverage<I>(&self, classes: I) -> Vec<i32>
    where
        I: IntoIterator<Item = i32>,
    {
        let mut missing: Vec<i32> = classes
            .into_iter()
            .filter(|c| !self.colors.contains_key(c))
            .collect();
        missing.sort_unstable();
        missing.dedup();
        missing
    }

    /// Dense 256-row table for 8-bit class rasters.
    ///
    /// Unmapped rows hold the policy's fallback color; under
    /// [`UnmappedPolicy::Error`] they are transparent, since the error can
    /// only be raised per lookup. Mapped classes outside `0..=255` are
    /// rejected.
    pub fn to_lut256(&self) -> Result<[Rgba; 256]> {
        let fill = self.policy.fallback().unwrap_or(Rgba::TRANSPARENT);
        let mut lut = [fill; 256];
        for (class_id, color) in self.iter() {
            let idx = u8::try_from(class_id).map_err(|_| ColormapError::ClassOutOfRange(class_id))?;
            lut[idx as usize] = color;
        }
        Ok(lut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use crate::legend::LegendEntry;

    fn red_green() -> ClassColorTable {
        ClassColorTable::from_hex_pairs([(1, "#FF0000"), (2, "#00FF00")], UnmappedPolicy::Transparent)
            .unwrap()
    }

    #[test]
    fn legend_classes_are_opaque() {
        let table = red_green();
        assert_eq!(table.lookup(1).unwrap(), Rgba::new(255, 0, 0, 255));
        assert_eq!(table.lookup(2).unwrap(), Rgba::new(0, 255, 0, 255));
    }

    #[test]
    fn unmapped_transparent_by_default() {
        let table = red_green();
        assert_eq!(table.policy(), UnmappedPolicy::Transparent);
        assert_eq!(table.get(0), None);
        assert_eq!(table.lookup(0).unwrap(), Rgba::TRANSPARENT);
    }

    #[test]
    fn unmapped_error_policy() {
        let table = ClassColorTable::from_hex_pairs([(1, "#FF0000")], UnmappedPolicy::Error).unwrap();
        match table.lookup(9) {
            Err(ColormapError::UnmappedClass(classes)) => assert_eq!(classes, vec![9]),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unmapped_designated_color() {
        let unknown = Rgba::new(255, 0, 255, 128);
        let table = ClassColorTable::from_hex_pairs([(1, "#FF0000")], UnmappedPolicy::Color(unknown)).unwrap();
        assert_eq!(table.lookup(42).unwrap(), unknown);
    }

    #[test]
    fn sparse_ids_beyond_eight_bits() {
        let table = ClassColorTable::from_hex_pairs([(-5, "#010101"), (70_000, "#020202")], UnmappedPolicy::Transparent)
            .unwrap();
        assert_eq!(table.lookup(70_000).unwrap(), Rgba::new(2, 2, 2, 255));
        assert_eq!(table.lookup(-5).unwrap(), Rgba::new(1, 1, 1, 255));
        assert!(matches!(table.to_lut256(), Err(ColormapError::ClassOutOfRange(-5))));
    }

    #[test]
    fn malformed_hex_fails_build() {
        let err = ClassColorTable::from_hex_pairs([(1, "#FF00")], UnmappedPolicy::Transparent).unwrap_err();
        assert!(matches!(err, ColormapError::InvalidHex { .. }));
    }

    #[test]
    fn lut_rows_follow_policy() {
        let lut = red_green().to_lut256().unwrap();
        assert_eq!(lut[1], Rgba::new(255, 0, 0, 255));
        assert_eq!(lut[2], Rgba::new(0, 255, 0, 255));
        assert_eq!(lut[0], Rgba::TRANSPARENT);
        assert_eq!(lut[255], Rgba::TRANSPARENT);
    }

    #[test]
    fn lut_under_error_policy_leaves_unmapped_transparent() {
        let table = ClassColorTable::from_hex_pairs([(3, "#0000FF")], UnmappedPolicy::Error).unwrap();
        let lut = table.to_lut256().unwrap();
        assert_eq!(lut[3], Rgba::new(0, 0, 255, 255));
        assert!(lut.iter().enumerate().all(|(i, &c)| i == 3 || c == Rgba::TRANSPARENT));
        assert!(matches!(table.lookup(4), Err(ColormapError::UnmappedClass(_))));
    }

    #[test]
    fn normalized_entries() {
        let norm = red_green().normalized();
        let expected = [(1, [1.0, 0.0, 0.0, 1.0]), (2, [0.0, 1.0, 0.0, 1.0])];
        assert_eq!(norm.len(), expected.len());
        for ((id, unit), (want_id, want)) in norm.iter().zip(expected) {
            assert_eq!(*id, want_id);
            for (got, want) in unit.iter().zip(want) {
                assert_relative_eq!(*got, want);
            }
        }
    }

    #[test]
    fn coverage_lists_missing_classes() {
        let table = red_green();
        assert_eq!(table.check_coverage([0, 1, 2, 3, 3, 0]), vec![0, 3]);
        assert!(table.check_coverage([1, 2]).is_empty());
    }

    #[test]
    fn from_legend_matches_entries() {
        let legend = Legend::from_entries([
            LegendEntry { class_id: 3, color: Rgb::new(10, 20, 30) },
            LegendEntry { class_id: 1, color: Rgb::new(40, 50, 60) },
        ]);
        let table = ClassColorTable::from_legend(&legend, UnmappedPolicy::Error);
        assert_eq!(table.len(), 2);
        for entry in legend.iter() {
            let c = table.lookup(entry.class_id).unwrap();
            assert_eq!(c.rgb(), entry.color);
            assert_eq!(c.a, 255);
        }
    }

    #[test]
    fn policy_parsing() {
        assert_eq!("transparent".parse::<UnmappedPolicy>().unwrap(), UnmappedPolicy::Transparent);
        assert_eq!("ERROR".parse::<UnmappedPolicy>().unwrap(), UnmappedPolicy::Error);
        assert_eq!(
            "#808080".parse::<UnmappedPolicy>().unwrap(),
            UnmappedPolicy::Color(Rgba::new(128, 128, 128, 255))
        );
        assert!("purple".parse::<UnmappedPolicy>().is_err());
    }
}
