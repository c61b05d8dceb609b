//! Axial hex coordinates, neighbor enumeration, distance, and the
//! world-space conversions used by placement input.
//!
//! The grid uses the pointy-top axial layout. A coordinate is the pair
//! `(q, r)`; the third cube component is derived as `s = -q - r` and is
//! never stored.
//!
//! # Direction contract
//!
//! [`HexCoord::neighbors`] returns the six neighbors in a fixed order that
//! callers index into. The mapping is published as [`HexDirection`]:
//!
//! | Index | Direction | Offset `(dq, dr)` |
//! |-------|-----------|-------------------|
//! | 0 | East | `(+1, 0)` |
//! | 1 | North-east | `(+1, -1)` |
//! | 2 | North-west | `(0, -1)` |
//! | 3 | West | `(-1, 0)` |
//! | 4 | South-west | `(-1, +1)` |
//! | 5 | South-east | `(0, +1)` |

use serde::{Deserialize, Serialize};

/// `sqrt(3)`, the horizontal spacing factor of the pointy-top layout.
const SQRT_3: f64 = 1.732_050_807_568_877_2;

/// The six neighbor directions in their published index order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HexDirection {
    /// Index 0, offset `(+1, 0)`.
    East,
    /// Index 1, offset `(+1, -1)`.
    NorthEast,
    /// Index 2, offset `(0, -1)`.
    NorthWest,
    /// Index 3, offset `(-1, 0)`.
    West,
    /// Index 4, offset `(-1, +1)`.
    SouthWest,
    /// Index 5, offset `(0, +1)`.
    SouthEast,
}

impl HexDirection {
    /// All directions in index order.
    pub const ALL: [Self; 6] = [
        Self::East,
        Self::NorthEast,
        Self::NorthWest,
        Self::West,
        Self::SouthWest,
        Self::SouthEast,
    ];

    /// The stable index of this direction (0..6).
    pub const fn index(self) -> usize {
        match self {
            Self::East => 0,
            Self::NorthEast => 1,
            Self::NorthWest => 2,
            Self::West => 3,
            Self::SouthWest => 4,
            Self::SouthEast => 5,
        }
    }

    /// Look up a direction by its index. Returns `None` for `index >= 6`.
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::East),
            1 => Some(Self::NorthEast),
            2 => Some(Self::NorthWest),
            3 => Some(Self::West),
            4 => Some(Self::SouthWest),
            5 => Some(Self::SouthEast),
            _ => None,
        }
    }

    /// The axial offset `(dq, dr)` of this direction.
    pub const fn offset(self) -> HexCoord {
        match self {
            Self::East => HexCoord::new(1, 0),
            Self::NorthEast => HexCoord::new(1, -1),
            Self::NorthWest => HexCoord::new(0, -1),
            Self::West => HexCoord::new(-1, 0),
            Self::SouthWest => HexCoord::new(-1, 1),
            Self::SouthEast => HexCoord::new(0, 1),
        }
    }

    /// The direction pointing the opposite way.
    pub const fn opposite(self) -> Self {
        match self {
            Self::East => Self::West,
            Self::NorthEast => Self::SouthWest,
            Self::NorthWest => Self::SouthEast,
            Self::West => Self::East,
            Self::SouthWest => Self::NorthEast,
            Self::SouthEast => Self::NorthWest,
        }
    }
}

/// An axial hex-grid address.
///
/// Equality, hashing, and ordering use `(q, r)`. The derived ordering is
/// ascending `q`, then ascending `r`, which is the order used wherever the
/// simulation needs a deterministic walk over cells.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct HexCoord {
    /// Axial column.
    pub q: i32,
    /// Axial row.
    pub r: i32,
}

impl HexCoord {
    /// The settlement origin `(0, 0)`.
    pub const ORIGIN: Self = Self::new(0, 0);

    /// Create a coordinate from its axial components.
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// The derived third cube component, `s = -q - r`.
    pub const fn s(self) -> i32 {
        self.q.saturating_neg().saturating_sub(self.r)
    }

    /// The neighbor in a single direction.
    pub const fn neighbor(self, direction: HexDirection) -> Self {
        let offset = direction.offset();
        Self::new(
            self.q.saturating_add(offset.q),
            self.r.saturating_add(offset.r),
        )
    }

    /// All six neighbors, indexed by [`HexDirection::index`].
    pub const fn neighbors(self) -> [Self; 6] {
        [
            self.neighbor(HexDirection::East),
            self.neighbor(HexDirection::NorthEast),
            self.neighbor(HexDirection::NorthWest),
            self.neighbor(HexDirection::West),
            self.neighbor(HexDirection::SouthWest),
            self.neighbor(HexDirection::SouthEast),
        ]
    }

    /// Whether `other` is one of the six neighbors of `self`.
    pub fn is_adjacent(self, other: Self) -> bool {
        self.distance(other) == 1
    }

    /// Hex distance: `(|dq| + |dr| + |ds|) / 2`.
    pub fn distance(self, other: Self) -> u32 {
        let dq = self.q.abs_diff(other.q);
        let dr = self.r.abs_diff(other.r);
        let ds = self.s().abs_diff(other.s());
        dq.saturating_add(dr).saturating_add(ds).checked_div(2).unwrap_or(0)
    }

    /// Every coordinate within `radius` steps of `self`, including `self`.
    ///
    /// Ordered by ascending `q`, then ascending `r`. A radius of `n` yields
    /// `1 + 3n(n + 1)` coordinates.
    pub fn within_radius(self, radius: u32) -> Vec<Self> {
        let n = i32::try_from(radius).unwrap_or(i32::MAX);
        let mut cells = Vec::new();
        for dq in n.saturating_neg()..=n {
            let low = n.saturating_neg().max(dq.saturating_neg().saturating_sub(n));
            let high = n.min(dq.saturating_neg().saturating_add(n));
            for dr in low..=high {
                cells.push(Self::new(
                    self.q.saturating_add(dq),
                    self.r.saturating_add(dr),
                ));
            }
        }
        cells
    }

    /// Centre of this cell in world space `(x, z)` for cells of the given
    /// size (centre-to-corner distance).
    pub fn to_world(self, cell_size: f64) -> (f64, f64) {
        let q = f64::from(self.q);
        let r = f64::from(self.r);
        let x = cell_size * SQRT_3 * (q + r / 2.0);
        let z = cell_size * 1.5 * r;
        (x, z)
    }

    /// The cell containing the world-space point `(x, z)`.
    ///
    /// Converts to fractional cube coordinates and applies [`cube_round`].
    pub fn from_world(x: f64, z: f64, cell_size: f64) -> Self {
        let fq = (SQRT_3 / 3.0 * x - z / 3.0) / cell_size;
        let fr = (2.0 / 3.0 * z) / cell_size;
        cube_round(fq, fr, -fq - fr)
    }
}

impl core::fmt::Display for HexCoord {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {})", self.q, self.r)
    }
}

/// Round fractional cube coordinates to the nearest hex.
///
/// Each component is rounded independently (half away from zero). The
/// component with the largest rounding error is then recomputed from the
/// other two so the result still satisfies `q + r + s == 0`.
#[allow(clippy::cast_possible_truncation)] // Inputs are rounded cell indices well inside i32.
pub fn cube_round(fq: f64, fr: f64, fs: f64) -> HexCoord {
    let mut q = fq.round();
    let mut r = fr.round();
    let s = fs.round();

    let dq = (q - fq).abs();
    let dr = (r - fr).abs();
    let ds = (s - fs).abs();

    if dq > dr && dq > ds {
        q = -r - s;
    } else if dr > ds {
        r = -q - s;
    }

    HexCoord::new(q as i32, r as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neighbor_order_is_stable() {
        let n = HexCoord::ORIGIN.neighbors();
        assert_eq!(n[0], HexCoord::new(1, 0));
        assert_eq!(n[1], HexCoord::new(1, -1));
        assert_eq!(n[2], HexCoord::new(0, -1));
        assert_eq!(n[3], HexCoord::new(-1, 0));
        assert_eq!(n[4], HexCoord::new(-1, 1));
        assert_eq!(n[5], HexCoord::new(0, 1));
    }

    #[test]
    fn direction_index_roundtrip() {
        for (i, dir) in HexDirection::ALL.iter().enumerate() {
            assert_eq!(dir.index(), i);
            assert_eq!(HexDirection::from_index(i), Some(*dir));
            let back = HexCoord::ORIGIN.neighbor(*dir).neighbor(dir.opposite());
            assert_eq!(back, HexCoord::ORIGIN);
        }
        assert_eq!(HexDirection::from_index(6), None);
    }

    #[test]
    fn cube_components_sum_to_zero() {
        let c = HexCoord::new(3, -7);
        assert_eq!(c.q + c.r + c.s(), 0);
    }

    #[test]
    fn distance_examples() {
        let a = HexCoord::new(0, 0);
        assert_eq!(a.distance(a), 0);
        assert_eq!(a.distance(HexCoord::new(1, 0)), 1);
        assert_eq!(a.distance(HexCoord::new(2, -1)), 2);
        assert_eq!(a.distance(HexCoord::new(3, -3)), 3);
        assert_eq!(HexCoord::new(-2, 1).distance(HexCoord::new(1, 1)), 3);
        assert!(a.is_adjacent(HexCoord::new(0, 1)));
        assert!(!a.is_adjacent(HexCoord::new(1, 1)));
    }

    #[test]
    fn within_radius_counts() {
        assert_eq!(HexCoord::ORIGIN.within_radius(0).len(), 1);
        assert_eq!(HexCoord::ORIGIN.within_radius(1).len(), 7);
        assert_eq!(HexCoord::ORIGIN.within_radius(3).len(), 37);
        let centre = HexCoord::new(4, -2);
        for c in centre.within_radius(2) {
            assert!(centre.distance(c) <= 2);
        }
    }

    #[test]
    fn world_roundtrip_for_many_sizes() {
        for size in [0.25, 1.0, 1.7, 10.0] {
            for c in HexCoord::ORIGIN.within_radius(6) {
                let (x, z) = c.to_world(size);
                assert_eq!(HexCoord::from_world(x, z, size), c, "size {size} cell {c}");
            }
        }
    }

    #[test]
    fn from_world_picks_nearest_cell() {
        // Slightly east of the origin stays at the origin.
        assert_eq!(HexCoord::from_world(0.4, 0.0, 1.0), HexCoord::ORIGIN);
        // Just past the midpoint toward the east neighbor (centre at sqrt 3).
        assert_eq!(HexCoord::from_world(0.9, 0.0, 1.0), HexCoord::new(1, 0));
        // Straight down one row lands in the south-east neighbor.
        let (x, z) = HexCoord::new(0, 1).to_world(1.0);
        assert_eq!(HexCoord::from_world(x + 0.1, z - 0.1, 1.0), HexCoord::new(0, 1));
    }

    #[test]
    fn cube_round_corrects_largest_error() {
        // q has the largest error and is recomputed from r and s.
        assert_eq!(cube_round(0.4, 0.3, -0.7), HexCoord::new(1, 0));
        // r has the largest error and is recomputed from q and s.
        assert_eq!(cube_round(0.3, 0.4, -0.7), HexCoord::new(0, 1));
        // s has the largest error: q and r are kept as rounded.
        assert_eq!(cube_round(0.2, 0.2, -0.4), HexCoord::new(0, 0));
    }

    #[test]
    fn serde_roundtrip() {
        let c = HexCoord::new(-3, 5);
        let json = serde_json::to_string(&c).ok();
        let back: Option<HexCoord> = json.as_deref().and_then(|j| serde_json::from_str(j).ok());
        assert_eq!(back, Some(c));
    }
}
