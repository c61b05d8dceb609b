//! Owned cells, catalog, road connectivity, capacity tiers, and production
//! modules for the Hexstead simulation.
//!
//! This crate models the physical settlement: the coordinate-keyed arena of
//! owned cells and the buildings standing on them, the read-only catalog
//! those cells and buildings refer to, the road network derived from them,
//! and the growth state machines that turn buildings into resources.
//!
//! # Modules
//!
//! - [`capacity`] -- Pure tier-to-cap lookups (tiles, production buildings,
//!   active slots).
//! - [`catalog`] -- [`Catalog`] of tile styles, building definitions, and
//!   the tier table, with fallback resolution.
//! - [`connectivity`] -- Road-network BFS from the origin and the uncached
//!   adjacency helpers used for growth bonuses.
//! - [`error`] -- Error types for world operations.
//! - [`grid`] -- [`Grid`] arena of [`OwnedCell`]s and [`Building`]s.
//! - [`production`] -- The [`ProductionModule`] trait and the multi-plot,
//!   capture, and strata modules.
//! - [`starting_catalog`] -- Built-in catalog used when none is configured.
//!
//! [`Catalog`]: catalog::Catalog
//! [`Grid`]: grid::Grid
//! [`OwnedCell`]: grid::OwnedCell
//! [`Building`]: grid::Building
//! [`ProductionModule`]: production::ProductionModule

pub mod capacity;
pub mod catalog;
pub mod connectivity;
pub mod error;
pub mod grid;
pub mod production;
pub mod starting_catalog;

// Re-export primary types at crate root.
pub use capacity::{TierCaps, active_slot_cap, building_cap, caps, tile_cap};
pub use catalog::Catalog;
pub use connectivity::{RoadNetwork, adjacent_tile_count_with_tag, buildings_within_radius};
pub use error::WorldError;
pub use grid::{Building, Grid, MAX_TILE_TIER, OwnedCell};
pub use production::{
    ActionOutcome, ModuleAction, ProductionModule, TickContext, TickOutput, create_module,
};
pub use starting_catalog::starting_catalog;
