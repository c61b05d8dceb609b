//! Road connectivity: breadth-first search from the settlement origin
//! through road-tagged owned cells.
//!
//! # Traversal rule
//!
//! The origin is always a member and is always expanded, whether or not it
//! carries the road tag. Every owned neighbor of an expanded cell becomes a
//! member when first reached, but only road-tagged members are expanded
//! further. The resulting set is therefore the road network plus the owned
//! cells that border it.
//!
//! The set is derived state. It is recomputed after every grid mutation
//! and never persisted.
//!
//! The two helper queries, [`adjacent_tile_count_with_tag`] and
//! [`buildings_within_radius`], are uncached linear scans meant to be
//! called at most once per building per production tick.

use std::collections::{BTreeSet, VecDeque};

use hexstead_types::HexCoord;

use crate::catalog::Catalog;
use crate::grid::{Grid, OwnedCell};

/// Run the connectivity search over `grid`.
///
/// `is_road` decides which members are expanded further.
pub fn recompute<F>(grid: &Grid, is_road: F, origin: HexCoord) -> BTreeSet<HexCoord>
where
    F: Fn(&OwnedCell) -> bool,
{
    let mut visited = BTreeSet::new();
    let mut queue = VecDeque::new();
    visited.insert(origin);
    queue.push_back(origin);

    while let Some(current) = queue.pop_front() {
        for neighbor in current.neighbors() {
            let Some(cell) = grid.cell(neighbor) else {
                continue;
            };
            if visited.insert(neighbor) && is_road(cell) {
                queue.push_back(neighbor);
            }
        }
    }

    visited
}

/// The last computed road-connectivity set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoadNetwork {
    /// Root of the search.
    origin: HexCoord,
    /// Members from the last recompute.
    members: BTreeSet<HexCoord>,
}

impl RoadNetwork {
    /// A network containing only `origin`.
    pub fn new(origin: HexCoord) -> Self {
        Self {
            origin,
            members: BTreeSet::from([origin]),
        }
    }

    /// Recompute membership from `grid`, expanding through cells whose
    /// style carries the road tag in `catalog`.
    pub fn recompute(&mut self, grid: &Grid, catalog: &Catalog) {
        self.members = recompute(
            grid,
            |cell| catalog.resolve_style(cell.style.as_str()).is_road(),
            self.origin,
        );
        tracing::debug!(members = self.members.len(), "Road network recomputed");
    }

    /// The search root.
    pub const fn origin(&self) -> HexCoord {
        self.origin
    }

    /// Whether `coord` is a member of the last computed set.
    pub fn contains(&self, coord: HexCoord) -> bool {
        self.members.contains(&coord)
    }

    /// Whether a building at `coord` counts as road-connected: `coord` is
    /// the origin or borders a member of the last computed set.
    pub fn is_connected(&self, coord: HexCoord) -> bool {
        coord == self.origin
            || coord
                .neighbors()
                .iter()
                .any(|neighbor| self.members.contains(neighbor))
    }

    /// Members in ascending `(q, r)` order.
    pub fn members(&self) -> impl Iterator<Item = HexCoord> + '_ {
        self.members.iter().copied()
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the set is empty. Never true after construction.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Number of owned neighbors of `coord` whose style carries `tag`.
pub fn adjacent_tile_count_with_tag(
    grid: &Grid,
    catalog: &Catalog,
    coord: HexCoord,
    tag: &str,
) -> u32 {
    let count = coord
        .neighbors()
        .iter()
        .filter_map(|neighbor| grid.cell(*neighbor))
        .filter(|cell| catalog.resolve_style(cell.style.as_str()).has_tag(tag))
        .count();
    u32::try_from(count).unwrap_or(u32::MAX)
}

/// Number of buildings built from `definition` within `radius` steps of
/// `coord`, excluding any building on `coord` itself.
pub fn buildings_within_radius(grid: &Grid, coord: HexCoord, definition: &str, radius: u32) -> u32 {
    let count = grid
        .buildings()
        .filter(|(at, building)| {
            *at != coord && building.definition.as_str() == definition && coord.distance(*at) <= radius
        })
        .count();
    u32::try_from(count).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use hexstead_types::{BuildingDefId, StyleId, TileCategory, TileStyle};

    use super::*;
    use crate::grid::Building;

    fn style(id: &str, tags: &[&str]) -> TileStyle {
        TileStyle {
            id: StyleId::new(id),
            name: id.to_owned(),
            category: TileCategory::Gameplay,
            cost: hexstead_types::Cost::default(),
            unlock_tier: 1,
            required_buildings: Vec::new(),
            tags: tags.iter().map(|t| (*t).to_owned()).collect(),
            investment_points: 0,
        }
    }

    #[allow(clippy::unwrap_used)]
    fn catalog() -> Catalog {
        Catalog::from_parts(
            &StyleId::new("grass"),
            vec![
                style("grass", &[]),
                style("road", &["road"]),
                style("forest", &["forest"]),
            ],
            Vec::new(),
            Vec::new(),
        )
        .unwrap()
    }

    fn grid_with(cells: &[(HexCoord, &str)]) -> Grid {
        let mut grid = Grid::new();
        for (coord, style) in cells {
            let _ = grid.claim(*coord, StyleId::new(*style));
        }
        grid
    }

    #[test]
    fn origin_always_included() {
        let grid = Grid::new();
        let set = recompute(&grid, |_| true, HexCoord::ORIGIN);
        assert_eq!(set, BTreeSet::from([HexCoord::ORIGIN]));
    }

    #[test]
    fn non_road_origin_is_still_expanded() {
        let grid = grid_with(&[
            (HexCoord::ORIGIN, "grass"),
            (HexCoord::new(1, 0), "grass"),
            (HexCoord::new(-1, 0), "road"),
        ]);
        let mut network = RoadNetwork::new(HexCoord::ORIGIN);
        network.recompute(&grid, &catalog());
        assert!(network.contains(HexCoord::new(1, 0)));
        assert!(network.contains(HexCoord::new(-1, 0)));
        assert_eq!(network.len(), 3);
    }

    #[test]
    fn only_roads_propagate() {
        // origin -> road(1,0) -> road(2,0) -> grass(3,0) -> grass(4,0)
        let grid = grid_with(&[
            (HexCoord::ORIGIN, "grass"),
            (HexCoord::new(1, 0), "road"),
            (HexCoord::new(2, 0), "road"),
            (HexCoord::new(3, 0), "grass"),
            (HexCoord::new(4, 0), "grass"),
        ]);
        let mut network = RoadNetwork::new(HexCoord::ORIGIN);
        network.recompute(&grid, &catalog());
        assert!(network.contains(HexCoord::new(3, 0)));
        assert!(!network.contains(HexCoord::new(4, 0)));
        assert!(network.is_connected(HexCoord::new(4, 0)));
        assert!(!network.is_connected(HexCoord::new(5, 0)));
    }

    #[test]
    fn unowned_cells_are_never_members() {
        let grid = grid_with(&[(HexCoord::ORIGIN, "road")]);
        let set = recompute(&grid, |_| true, HexCoord::ORIGIN);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn removing_a_road_disconnects_after_recompute() {
        let mut grid = grid_with(&[
            (HexCoord::ORIGIN, "grass"),
            (HexCoord::new(1, 0), "road"),
            (HexCoord::new(2, 0), "road"),
            (HexCoord::new(3, 0), "grass"),
        ]);
        let catalog = catalog();
        let mut network = RoadNetwork::new(HexCoord::ORIGIN);
        network.recompute(&grid, &catalog);
        assert!(network.is_connected(HexCoord::new(4, 0)));

        let _ = grid.release(HexCoord::new(1, 0));
        network.recompute(&grid, &catalog);
        assert!(!network.contains(HexCoord::new(2, 0)));
        assert!(!network.is_connected(HexCoord::new(4, 0)));
    }

    #[test]
    fn counts_adjacent_tags() {
        let grid = grid_with(&[
            (HexCoord::ORIGIN, "grass"),
            (HexCoord::new(1, 0), "forest"),
            (HexCoord::new(0, 1), "forest"),
            (HexCoord::new(-1, 0), "road"),
            (HexCoord::new(5, 5), "forest"),
        ]);
        let catalog = catalog();
        assert_eq!(adjacent_tile_count_with_tag(&grid, &catalog, HexCoord::ORIGIN, "forest"), 2);
        assert_eq!(adjacent_tile_count_with_tag(&grid, &catalog, HexCoord::ORIGIN, "road"), 1);
        assert_eq!(adjacent_tile_count_with_tag(&grid, &catalog, HexCoord::ORIGIN, "water"), 0);
    }

    #[test]
    fn counts_buildings_in_radius() {
        let coords = [HexCoord::ORIGIN, HexCoord::new(1, 0), HexCoord::new(2, 0), HexCoord::new(4, 0)];
        let mut grid = grid_with(&coords.map(|c| (c, "grass")));
        for c in coords {
            let _ = grid.place_building(c, Building::new(BuildingDefId::new("lantern"), true, false));
        }
        assert_eq!(buildings_within_radius(&grid, HexCoord::ORIGIN, "lantern", 2), 2);
        assert_eq!(buildings_within_radius(&grid, HexCoord::ORIGIN, "lantern", 4), 3);
        assert_eq!(buildings_within_radius(&grid, HexCoord::ORIGIN, "quarry", 4), 0);
    }
}
