//! Shared type definitions for the Hexstead settlement simulation.
//!
//! This crate is the single source of truth for the value types that flow
//! between the ledger, world, and core crates.
//!
//! # Modules
//!
//! - [`hex`] -- Axial coordinates, neighbor order, distance, and world-space
//!   conversion with cube rounding
//! - [`ids`] -- String newtypes for styles, building definitions, resources
//! - [`enums`] -- Edit modes, tile categories, building kinds, capture focus
//! - [`structs`] -- Catalog entries, production profiles, tier table rows

pub mod enums;
pub mod hex;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{BuildingKind, CaptureFocus, EditMode, TileCategory};
pub use hex::{HexCoord, HexDirection, cube_round};
pub use ids::{BuildingDefId, ResourceId, StyleId};
pub use structs::{
    BuildingDefinition, CaptureProfile, Cost, GrowthBonus, MultiPlotProfile, ProductionProfile,
    ROAD_TAG, ResourceCost, StrataProfile, Stratum, TierDefinition, TileStyle,
};
