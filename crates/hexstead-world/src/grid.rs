//! The owned-cell arena: coordinate-keyed cells, each optionally holding
//! one building.
//!
//! A building is a value stored in its cell, not a separate entity. Moving
//! or removing it is a map operation. A cell cannot be released while it
//! holds a building, so removing a cell never silently destroys one.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use hexstead_types::{BuildingDefId, HexCoord, StyleId};

use crate::error::WorldError;

/// Highest tile tier an owned cell can reach.
pub const MAX_TILE_TIER: u8 = 2;

/// A placed building instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Building {
    /// Catalog definition this instance was built from.
    pub definition: BuildingDefId,
    /// Whether the building is producing. Dormant buildings skip ticks.
    pub active: bool,
    /// Whether being active occupies an active slot.
    pub consumes_slot: bool,
    /// Upgrade level, at least 1.
    pub level: u32,
    /// Seconds until the building works again after a relocation.
    pub relocation_cooldown: Decimal,
}

impl Building {
    /// A fresh level-1 building with no cooldown.
    pub const fn new(definition: BuildingDefId, active: bool, consumes_slot: bool) -> Self {
        Self {
            definition,
            active,
            consumes_slot,
            level: 1,
            relocation_cooldown: Decimal::ZERO,
        }
    }

    /// Whether this building is active and occupies a slot.
    pub const fn uses_slot(&self) -> bool {
        self.active && self.consumes_slot
    }

    /// Whether the building may do work this tick.
    pub fn can_work(&self) -> bool {
        self.active && self.relocation_cooldown <= Decimal::ZERO
    }
}

/// An owned grid cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedCell {
    /// Painted tile style.
    pub style: StyleId,
    /// Tile tier, `0..=MAX_TILE_TIER`.
    pub tier: u8,
    /// The building standing on this cell, if any.
    pub building: Option<Building>,
}

impl OwnedCell {
    /// A freshly claimed tier-0 cell with no building.
    pub const fn new(style: StyleId) -> Self {
        Self {
            style,
            tier: 0,
            building: None,
        }
    }
}

/// All cells the settlement owns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grid {
    /// Cells by coordinate.
    cells: BTreeMap<HexCoord, OwnedCell>,
}

impl Grid {
    /// Create an empty grid.
    pub const fn new() -> Self {
        Self {
            cells: BTreeMap::new(),
        }
    }

    // -------------------------------------------------------------------
    // Cells
    // -------------------------------------------------------------------

    /// Number of owned cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether no cell is owned.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Whether `coord` is owned.
    pub fn is_owned(&self, coord: HexCoord) -> bool {
        self.cells.contains_key(&coord)
    }

    /// The cell at `coord`.
    pub fn cell(&self, coord: HexCoord) -> Option<&OwnedCell> {
        self.cells.get(&coord)
    }

    /// Mutable access to the cell at `coord`.
    pub fn cell_mut(&mut self, coord: HexCoord) -> Option<&mut OwnedCell> {
        self.cells.get_mut(&coord)
    }

    /// Iterate over cells in ascending `(q, r)` order.
    pub fn cells(&self) -> impl Iterator<Item = (HexCoord, &OwnedCell)> {
        self.cells.iter().map(|(coord, cell)| (*coord, cell))
    }

    /// Whether any of the six neighbors of `coord` is owned.
    pub fn has_owned_neighbor(&self, coord: HexCoord) -> bool {
        coord.neighbors().iter().any(|n| self.is_owned(*n))
    }

    /// Take ownership of `coord` with the given style.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::CellAlreadyOwned`] if `coord` is owned.
    pub fn claim(&mut self, coord: HexCoord, style: StyleId) -> Result<&mut OwnedCell, WorldError> {
        if self.cells.contains_key(&coord) {
            return Err(WorldError::CellAlreadyOwned(coord));
        }
        Ok(self.cells.entry(coord).or_insert_with(|| OwnedCell::new(style)))
    }

    /// Give up ownership of `coord`, returning the cell.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::CellNotOwned`] if `coord` is not owned, or
    /// [`WorldError::CellOccupied`] if a building stands on it.
    pub fn release(&mut self, coord: HexCoord) -> Result<OwnedCell, WorldError> {
        let cell = self.cells.get(&coord).ok_or(WorldError::CellNotOwned(coord))?;
        if cell.building.is_some() {
            return Err(WorldError::CellOccupied(coord));
        }
        self.cells.remove(&coord).ok_or(WorldError::CellNotOwned(coord))
    }

    /// Remove every cell and building.
    pub fn clear(&mut self) {
        self.cells.clear();
    }

    // -------------------------------------------------------------------
    // Buildings
    // -------------------------------------------------------------------

    /// The building at `coord`.
    pub fn building(&self, coord: HexCoord) -> Option<&Building> {
        self.cells.get(&coord).and_then(|cell| cell.building.as_ref())
    }

    /// Mutable access to the building at `coord`.
    pub fn building_mut(&mut self, coord: HexCoord) -> Option<&mut Building> {
        self.cells
            .get_mut(&coord)
            .and_then(|cell| cell.building.as_mut())
    }

    /// Iterate over buildings in ascending `(q, r)` order.
    pub fn buildings(&self) -> impl Iterator<Item = (HexCoord, &Building)> {
        self.cells
            .iter()
            .filter_map(|(coord, cell)| cell.building.as_ref().map(|b| (*coord, b)))
    }

    /// Mutable iteration over buildings in ascending `(q, r)` order.
    pub fn buildings_mut(&mut self) -> impl Iterator<Item = (HexCoord, &mut Building)> {
        self.cells
            .iter_mut()
            .filter_map(|(coord, cell)| cell.building.as_mut().map(|b| (*coord, b)))
    }

    /// Number of buildings.
    pub fn building_count(&self) -> usize {
        self.buildings().count()
    }

    /// Number of active buildings that occupy a slot.
    pub fn used_slots(&self) -> usize {
        self.buildings().filter(|(_, b)| b.uses_slot()).count()
    }

    /// Put `building` on the owned, empty cell at `coord`.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::CellNotOwned`] or [`WorldError::CellOccupied`].
    pub fn place_building(&mut self, coord: HexCoord, building: Building) -> Result<(), WorldError> {
        let cell = self
            .cells
            .get_mut(&coord)
            .ok_or(WorldError::CellNotOwned(coord))?;
        if cell.building.is_some() {
            return Err(WorldError::CellOccupied(coord));
        }
        cell.building = Some(building);
        Ok(())
    }

    /// Take the building off the cell at `coord`.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::NoBuilding`] if there is none.
    pub fn remove_building(&mut self, coord: HexCoord) -> Result<Building, WorldError> {
        self.cells
            .get_mut(&coord)
            .and_then(|cell| cell.building.take())
            .ok_or(WorldError::NoBuilding(coord))
    }

    /// Move the building at `from` onto the owned, empty cell at `to`.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::NoBuilding`] if `from` is empty, or the errors
    /// of [`Grid::place_building`] for `to`. On error nothing moves.
    pub fn move_building(&mut self, from: HexCoord, to: HexCoord) -> Result<(), WorldError> {
        if self.building(from).is_none() {
            return Err(WorldError::NoBuilding(from));
        }
        match self.cells.get(&to) {
            None => return Err(WorldError::CellNotOwned(to)),
            Some(cell) if cell.building.is_some() => return Err(WorldError::CellOccupied(to)),
            Some(_) => {}
        }
        let building = self.remove_building(from)?;
        self.place_building(to, building)
    }
}
