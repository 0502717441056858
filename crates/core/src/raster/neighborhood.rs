//! Cell connectivity rules

use std::fmt;
use std::str::FromStr;

/// Which neighbors of a cell count as adjacent when grouping cells into patches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Neighborhood {
    /// 4 neighbors sharing an edge
    Rook,
    /// 8 neighbors sharing an edge or a corner
    #[default]
    Queen,
}

/// Edge-sharing neighbors, in (row, col) offsets
const ROOK_OFFSETS: [(isize, isize); 4] = [(-1, 0), (0, -1), (0, 1), (1, 0)];

const QUEEN_OFFSETS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

impl Neighborhood {
    /// Relative positions of adjacent cells, center excluded
    pub fn offsets(&self) -> &'static [(isize, isize)] {
        match self {
            Neighborhood::Rook => &ROOK_OFFSETS,
            Neighborhood::Queen => &QUEEN_OFFSETS,
        }
    }

    /// Offsets of the four edge-sharing neighbors, regardless of rule.
    ///
    /// Perimeters and edges are always measured along cell sides.
    pub fn edge_offsets() -> &'static [(isize, isize)] {
        &ROOK_OFFSETS
    }

    /// Number of neighbors (4 or 8)
    pub fn count(&self) -> usize {
        self.offsets().len()
    }

    /// Neighbors of (row, col) that fall inside a `rows` x `cols` grid
    pub fn neighbors(
        &self,
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    ) -> impl Iterator<Item = (usize, usize)> {
        self.offsets().iter().filter_map(move |&(dr, dc)| {
            let nr = row as isize + dr;
            let nc = col as isize + dc;
            if nr >= 0 && nc >= 0 && (nr as usize) < rows && (nc as usize) < cols {
                Some((nr as usize, nc as usize))
            } else {
                None
            }
        })
    }
}

impl FromStr for Neighborhood {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "4" | "rook" | "von-neumann" => Ok(Neighborhood::Rook),
            "8" | "queen" | "moore" => Ok(Neighborhood::Queen),
            other => Err(format!(
                "unknown connectivity '{}', use 4 (rook) or 8 (queen)",
                other
            )),
        }
    }
}

impl fmt::Display for Neighborhood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Neighborhood::Rook => write!(f, "4-connected"),
            Neighborhood::Queen => write!(f, "8-connected"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets_exclude_center() {
        for nb in [Neighborhood::Rook, Neighborhood::Queen] {
            assert!(!nb.offsets().contains(&(0, 0)));
        }
        assert_eq!(Neighborhood::Rook.count(), 4);
        assert_eq!(Neighborhood::Queen.count(), 8);
    }

    #[test]
    fn test_neighbors_clipped_at_corner() {
        let n: Vec<_> = Neighborhood::Queen.neighbors(0, 0, 3, 3).collect();
        assert_eq!(n, vec![(0, 1), (1, 0), (1, 1)]);

        let n: Vec<_> = Neighborhood::Rook.neighbors(2, 2, 3, 3).collect();
        assert_eq!(n, vec![(1, 2), (2, 1)]);
    }

    #[test]
    fn test_parse() {
        assert_eq!("4".parse::<Neighborhood>().unwrap(), Neighborhood::Rook);
        assert_eq!("Queen".parse::<Neighborhood>().unwrap(), Neighborhood::Queen);
        assert!("6".parse::<Neighborhood>().is_err());
    }
}
