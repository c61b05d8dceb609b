//! Placement and validation: edit mode, selection, and the tile and
//! building operations a player performs on the grid.
//!
//! Every operation validates fully before touching anything, in this
//! precedence:
//!
//! 1. Target state (owned, occupied, has a building).
//! 2. Lock (settlement tier, prerequisites placed this session, blueprint).
//! 3. Budget (tile budget, production-building cap; a full slot cap makes
//!    the new building dormant rather than failing).
//! 4. Adjacency (new tiles must touch the settlement).
//! 5. Cost (checked, then committed).
//!
//! Only then is the grid mutated, after which the settlement re-derives
//! its budget, road network, and active slots. A rejection is returned to
//! the caller and also queued as a toast.
//!
//! # Repaint regimes
//!
//! | Old | New | Charge |
//! |-----|-----|--------|
//! | cosmetic | cosmetic | free |
//! | cosmetic | gameplay | new paint cost |
//! | gameplay | cosmetic | refund of the tile's cumulative investment share |
//! | gameplay | gameplay | demolition share of the old paint + new paint cost |

use hexstead_ledger::{credit_equivalent, percent_of};
use hexstead_types::{
    BuildingDefId, BuildingKind, EditMode, HexCoord, ResourceCost, StyleId, TileCategory,
};
use hexstead_world::MAX_TILE_TIER;

use crate::error::Rejection;
use crate::events::Notification;
use crate::settlement::{Settlement, instantiate};

/// What the next placement click uses. At most one item is selected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    /// Nothing selected.
    #[default]
    None,
    /// A tile style.
    Style(StyleId),
    /// A building definition.
    Building(BuildingDefId),
}

// ---------------------------------------------------------------------------
// Mode and selection
// ---------------------------------------------------------------------------

impl Settlement {
    /// Switch edit mode. The selection is kept.
    pub fn set_mode(&mut self, mode: EditMode) {
        tracing::debug!(from = ?self.mode, to = ?mode, "Edit mode changed");
        self.mode = mode;
    }

    /// Select a tile style, clearing any building selection.
    ///
    /// Switches to [`EditMode::Roads`] for road styles and
    /// [`EditMode::Tiles`] otherwise, unless the current mode is Delete or
    /// `TileUpgrade`.
    pub fn select_style(&mut self, style: &str) -> Result<(), Rejection> {
        let result = self
            .catalog
            .style(style)
            .map(|s| (s.id.clone(), s.is_road()))
            .ok_or_else(|| Rejection::UnknownStyle(StyleId::new(style)));
        let (id, is_road) = self.surface(result)?;
        self.selection = Selection::Style(id);
        if !self.mode.is_sticky() {
            self.mode = if is_road { EditMode::Roads } else { EditMode::Tiles };
        }
        Ok(())
    }

    /// Select a building definition, clearing any style selection.
    ///
    /// Switches to [`EditMode::Buildings`] unless the current mode is
    /// Delete or `TileUpgrade`.
    pub fn select_building(&mut self, building: &str) -> Result<(), Rejection> {
        let result = self
            .catalog
            .building(building)
            .map(|d| d.id.clone())
            .ok_or_else(|| Rejection::UnknownBuilding(BuildingDefId::new(building)));
        let id = self.surface(result)?;
        self.selection = Selection::Building(id);
        if !self.mode.is_sticky() {
            self.mode = EditMode::Buildings;
        }
        Ok(())
    }

    /// Drop the current selection.
    pub fn clear_selection(&mut self) {
        self.selection = Selection::None;
    }

    /// The cell under the world-space point `(x, z)`, for the configured
    /// cell size.
    pub fn coord_at(&self, x: f64, z: f64) -> HexCoord {
        HexCoord::from_world(x, z, self.config.world.cell_size)
    }

    /// Centre of the cell at `coord` in world space `(x, z)`.
    pub fn world_position(&self, coord: HexCoord) -> (f64, f64) {
        coord.to_world(self.config.world.cell_size)
    }

    /// Perform the current mode's action at the cell under the world-space
    /// point `(x, z)`.
    pub fn apply_at_world(&mut self, x: f64, z: f64) -> Result<(), Rejection> {
        self.apply_at(self.coord_at(x, z))
    }

    /// Perform the current mode's action at `coord`.
    ///
    /// - Tiles / Roads: claim the cell with the selected style, or repaint it
    ///   if owned. Roads mode accepts road styles only.
    /// - Buildings: place the selected building.
    /// - `TileUpgrade`: raise the tile's tier.
    /// - Delete: remove the building on the cell, or the cell when empty.
    pub fn apply_at(&mut self, coord: HexCoord) -> Result<(), Rejection> {
        let result = self.try_apply_at(coord);
        self.surface(result)
    }

    fn try_apply_at(&mut self, coord: HexCoord) -> Result<(), Rejection> {
        match self.mode {
            EditMode::Tiles | EditMode::Roads => {
                let Selection::Style(style) = &self.selection else {
                    return Err(Rejection::NothingSelected);
                };
                let style = style.clone();
                if self.mode == EditMode::Roads
                    && !self.catalog.style(style.as_str()).is_some_and(|s| s.is_road())
                {
                    return Err(Rejection::NotARoad(style));
                }
                if self.grid.is_owned(coord) {
                    self.try_repaint_tile(coord, style.as_str())
                } else {
                    self.try_place_tile(coord, style.as_str())
                }
            }
            EditMode::Buildings => {
                let Selection::Building(building) = &self.selection else {
                    return Err(Rejection::NothingSelected);
                };
                let building = building.clone();
                self.try_place_building(coord, building.as_str())
            }
            EditMode::TileUpgrade => self.try_upgrade_tile(coord),
            EditMode::Delete => {
                if self.grid.building(coord).is_some() {
                    self.try_remove_building(coord)
                } else {
                    self.try_remove_tile(coord)
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tiles
// ---------------------------------------------------------------------------

impl Settlement {
    /// Claim the unowned cell at `coord` painted with `style`.
    pub fn place_tile(&mut self, coord: HexCoord, style: &str) -> Result<(), Rejection> {
        let result = self.try_place_tile(coord, style);
        self.surface(result)
    }

    fn try_place_tile(&mut self, coord: HexCoord, style: &str) -> Result<(), Rejection> {
        if self.grid.is_owned(coord) {
            return Err(Rejection::CellOwned(coord));
        }
        let style = self
            .catalog
            .style(style)
            .cloned()
            .ok_or_else(|| Rejection::UnknownStyle(StyleId::new(style)))?;
        self.check_style_unlocked(&style)?;

        if self.tiles_left == 0 {
            return Err(Rejection::NoTilesLeft {
                tier: self.tier,
                cap: self.caps().tiles,
            });
        }
        if self.config.world.enforce_adjacency
            && !self.grid.is_empty()
            && !self.grid.has_owned_neighbor(coord)
        {
            return Err(Rejection::NotAdjacent(coord));
        }

        self.pay(u64::from(style.cost.credits), &style.cost.resources)?;
        self.grid.claim(coord, style.id.clone())?;
        self.earn_investment(style.investment_points);
        self.refresh();

        tracing::info!(
            %coord,
            style = %style.id,
            tiles_left = self.tiles_left,
            credits = self.wallet.credits(),
            "Tile placed"
        );
        Ok(())
    }

    /// Paint the owned cell at `coord` with a different style.
    pub fn repaint_tile(&mut self, coord: HexCoord, style: &str) -> Result<(), Rejection> {
        let result = self.try_repaint_tile(coord, style);
        self.surface(result)
    }

    fn try_repaint_tile(&mut self, coord: HexCoord, style: &str) -> Result<(), Rejection> {
        let cell = self.grid.cell(coord).ok_or(Rejection::CellNotOwned(coord))?;
        let old = self.catalog.resolve_style(cell.style.as_str()).clone();
        let new = self
            .catalog
            .style(style)
            .cloned()
            .ok_or_else(|| Rejection::UnknownStyle(StyleId::new(style)))?;
        if cell.style == new.id {
            return Err(Rejection::SameStyle(new.id));
        }
        self.check_style_unlocked(&new)?;

        let economy = &self.config.economy;
        let new_paint = u64::from(new.cost.credits);
        let (credits, refund) = match (old.category, new.category) {
            (TileCategory::Cosmetic, TileCategory::Cosmetic) => (0, 0),
            (TileCategory::Cosmetic, TileCategory::Gameplay) => (new_paint, 0),
            (TileCategory::Gameplay, TileCategory::Cosmetic) => {
                (0, self.refund_share(self.cell_investment(coord)))
            }
            (TileCategory::Gameplay, TileCategory::Gameplay) => {
                let old_value = credit_equivalent(&old.cost, economy.credits_per_unit);
                let fee = percent_of(old_value, economy.demolition_percent);
                (fee.saturating_add(new_paint), 0)
            }
        };
        let pays_paint = new.category == TileCategory::Gameplay;
        let resources: &[ResourceCost] = if pays_paint { &new.cost.resources } else { &[] };

        self.pay(credits, resources)?;
        if let Some(cell) = self.grid.cell_mut(coord) {
            cell.style = new.id.clone();
            if !pays_paint {
                cell.tier = 0;
            }
        }
        self.credit(refund);
        if pays_paint {
            self.earn_investment(new.investment_points);
        }
        self.refresh();

        tracing::info!(
            %coord,
            from = %old.id,
            to = %new.id,
            charged = credits,
            refunded = refund,
            "Tile repainted"
        );
        Ok(())
    }

    /// Raise the tier of the gameplay tile at `coord` by one.
    pub fn upgrade_tile(&mut self, coord: HexCoord) -> Result<(), Rejection> {
        let result = self.try_upgrade_tile(coord);
        self.surface(result)
    }

    fn try_upgrade_tile(&mut self, coord: HexCoord) -> Result<(), Rejection> {
        let cell = self.grid.cell(coord).ok_or(Rejection::CellNotOwned(coord))?;
        let current = cell.tier;
        if self.catalog.resolve_style(cell.style.as_str()).category != TileCategory::Gameplay {
            return Err(Rejection::CosmeticTile(coord));
        }
        if current >= MAX_TILE_TIER {
            return Err(Rejection::TileMaxTier(current));
        }
        let target = current.saturating_add(1);
        let step = self
            .config
            .tile_upgrade(target)
            .cloned()
            .ok_or(Rejection::TileMaxTier(current))?;
        if self.tier < step.required_settlement_tier {
            return Err(Rejection::TileTierLocked {
                tier: target,
                required: step.required_settlement_tier,
            });
        }

        self.pay(u64::from(step.cost.credits), &step.cost.resources)?;
        if let Some(cell) = self.grid.cell_mut(coord) {
            cell.tier = target;
        }
        self.earn_investment(step.investment_points);

        tracing::info!(%coord, tier = target, "Tile upgraded");
        Ok(())
    }

    /// Give up the empty cell at `coord`, refunding part of a gameplay
    /// tile's cumulative investment.
    pub fn remove_tile(&mut self, coord: HexCoord) -> Result<(), Rejection> {
        let result = self.try_remove_tile(coord);
        self.surface(result)
    }

    fn try_remove_tile(&mut self, coord: HexCoord) -> Result<(), Rejection> {
        if coord == self.network.origin() {
            return Err(Rejection::OriginProtected);
        }
        let cell = self.grid.cell(coord).ok_or(Rejection::CellNotOwned(coord))?;
        if cell.building.is_some() {
            return Err(Rejection::CellOccupied(coord));
        }

        let refund = self.refund_share(self.cell_investment(coord));
        let released = self.grid.release(coord)?;
        self.credit(refund);
        self.refresh();

        tracing::info!(
            %coord,
            style = %released.style,
            refunded = refund,
            tiles_left = self.tiles_left,
            "Tile removed"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Buildings
// ---------------------------------------------------------------------------

impl Settlement {
    /// Place `building` on the owned, empty cell at `coord`.
    ///
    /// A building that would start active but finds every active slot in
    /// use is placed dormant, with a warning toast.
    pub fn place_building(&mut self, coord: HexCoord, building: &str) -> Result<(), Rejection> {
        let result = self.try_place_building(coord, building);
        self.surface(result)
    }

    fn try_place_building(&mut self, coord: HexCoord, building: &str) -> Result<(), Rejection> {
        let cell = self.grid.cell(coord).ok_or(Rejection::CellNotOwned(coord))?;
        if cell.building.is_some() {
            return Err(Rejection::CellOccupied(coord));
        }
        let definition = self
            .catalog
            .building(building)
            .cloned()
            .ok_or_else(|| Rejection::UnknownBuilding(BuildingDefId::new(building)))?;
        if definition.kind == BuildingKind::TownHall {
            return Err(Rejection::UniqueBuilding(definition.id));
        }
        self.check_building_unlocked(&definition)?;

        let caps = self.caps();
        if definition.kind == BuildingKind::Production
            && self.production_building_count() >= caps.buildings
        {
            return Err(Rejection::BuildingCapReached { cap: caps.buildings });
        }
        let dormant = definition.default_active
            && definition.consumes_slot
            && self.used_slots() >= caps.active_slots;
        let active = definition.default_active && !dormant;

        self.pay(u64::from(definition.cost.credits), &definition.cost.resources)?;
        let (instance, module) = instantiate(&definition, active);
        self.grid.place_building(coord, instance)?;
        if let Some(module) = module {
            self.scheduler.register(coord, module);
        }
        self.placed.insert(definition.id.clone());
        self.earn_investment(definition.investment_points);
        if dormant {
            tracing::warn!(%coord, building = %definition.id, "No free active slot, placed dormant");
            self.outbox.push(Notification::warning(format!(
                "{} placed dormant: all {} active slots are in use",
                definition.name, caps.active_slots
            )));
        }
        self.refresh();

        tracing::info!(
            %coord,
            building = %definition.id,
            active,
            credits = self.wallet.credits(),
            "Building placed"
        );
        Ok(())
    }

    /// Remove the building at `coord`, refunding part of its investment.
    /// The Town Hall cannot be removed.
    pub fn remove_building(&mut self, coord: HexCoord) -> Result<(), Rejection> {
        let result = self.try_remove_building(coord);
        self.surface(result)
    }

    fn try_remove_building(&mut self, coord: HexCoord) -> Result<(), Rejection> {
        let building = self.grid.building(coord).ok_or(Rejection::NoBuilding(coord))?;
        let is_town_hall = self
            .catalog
            .building(building.definition.as_str())
            .is_some_and(|d| d.kind == BuildingKind::TownHall);
        if is_town_hall || coord == self.network.origin() {
            return Err(Rejection::TownHallProtected);
        }

        let refund = self.refund_share(self.building_investment(coord));
        let removed = self.grid.remove_building(coord)?;
        self.scheduler.unregister(coord);
        self.credit(refund);
        self.refresh();

        tracing::info!(
            %coord,
            building = %removed.definition,
            refunded = refund,
            "Building removed"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SettlementConfig;
    use crate::events::NotificationKind;
    use crate::providers::BlueprintSet;
    use crate::settlement::SettlementBuilder;

    const EAST: HexCoord = HexCoord::new(1, 0);
    const WEST: HexCoord = HexCoord::new(-1, 0);

    #[allow(clippy::unwrap_used)]
    fn settlement() -> Settlement {
        SettlementBuilder::new(SettlementConfig::default()).build().unwrap()
    }

    #[allow(clippy::unwrap_used)]
    fn with_tiles(coords: &[HexCoord]) -> Settlement {
        let mut s = settlement();
        for coord in coords {
            s.place_tile(*coord, "grass").unwrap();
        }
        s
    }

    // -- Tiles --------------------------------------------------------------

    #[test]
    fn placing_a_tile_charges_and_spends_budget() {
        let mut s = settlement();
        assert!(s.place_tile(EAST, "forest").is_ok());
        assert_eq!(s.credits(), 460);
        assert_eq!(s.tiles_left(), 35);
        assert_eq!(s.investment_points(), 4);
        assert_eq!(s.grid().cell(EAST).map(|c| c.style.as_str()), Some("forest"));
    }

    #[test]
    fn owned_cell_rejects_placement_and_toasts() {
        let mut s = with_tiles(&[EAST]);
        let credits = s.credits();
        assert!(matches!(s.place_tile(EAST, "forest"), Err(Rejection::CellOwned(_))));
        assert_eq!(s.credits(), credits);
        let toasts = s.drain_notifications();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts.first().map(|n| n.kind), Some(NotificationKind::Rejected));
    }

    #[test]
    fn tiles_must_touch_the_settlement() {
        let mut s = settlement();
        assert!(matches!(
            s.place_tile(HexCoord::new(3, 0), "grass"),
            Err(Rejection::NotAdjacent(_))
        ));
        assert_eq!(s.grid().len(), 1);

        let mut config = SettlementConfig::default();
        config.world.enforce_adjacency = false;
        let built = SettlementBuilder::new(config).build();
        assert!(built.is_ok());
        let Ok(mut loose) = built else { return };
        assert!(loose.place_tile(HexCoord::new(3, 0), "grass").is_ok());
    }

    #[test]
    fn locked_styles_are_rejected() {
        let mut s = settlement();
        assert!(matches!(
            s.place_tile(EAST, "stone_ground"),
            Err(Rejection::TierLocked { required: 2, .. })
        ));
        assert!(matches!(
            s.place_tile(EAST, "flower_bed"),
            Err(Rejection::MissingPrerequisite { .. })
        ));
        assert!(matches!(s.place_tile(EAST, "lava"), Err(Rejection::UnknownStyle(_))));
    }

    #[test]
    fn unaffordable_tile_changes_nothing() {
        let mut config = SettlementConfig::default();
        config.economy.starting_credits = 30;
        let built = SettlementBuilder::new(config).build();
        assert!(built.is_ok());
        let Ok(mut s) = built else { return };
        let result = s.place_tile(EAST, "forest");
        assert_eq!(
            result.err().map(|r| r.to_string()),
            Some(String::from("Not enough credits (30/40)"))
        );
        assert_eq!(s.credits(), 30);
        assert_eq!(s.tiles_left(), 36);
        assert!(!s.grid().is_owned(EAST));
    }

    #[test]
    fn repaint_cosmetic_to_cosmetic_is_free() {
        let mut s = with_tiles(&[EAST]);
        let credits = s.credits();
        assert!(s.repaint_tile(EAST, "meadow").is_ok());
        assert_eq!(s.credits(), credits);
        assert!(matches!(s.repaint_tile(EAST, "meadow"), Err(Rejection::SameStyle(_))));
    }

    #[test]
    fn repaint_cosmetic_to_gameplay_pays_paint() {
        let mut s = with_tiles(&[EAST]);
        let credits = s.credits();
        assert!(s.repaint_tile(EAST, "forest").is_ok());
        assert_eq!(s.credits(), credits.saturating_sub(40));
    }

    #[test]
    fn repaint_gameplay_to_cosmetic_refunds_share() {
        let mut s = settlement();
        assert!(s.place_tile(EAST, "forest").is_ok());
        let credits = s.credits();
        assert!(s.repaint_tile(EAST, "grass").is_ok());
        assert_eq!(s.credits(), credits.saturating_add(12));
    }

    #[test]
    fn repaint_gameplay_to_gameplay_charges_demolition_fee() {
        let mut s = settlement();
        assert!(s.place_tile(EAST, "forest").is_ok());
        let credits = s.credits();
        assert!(s.repaint_tile(EAST, "farmland").is_ok());
        assert_eq!(credits.saturating_sub(s.credits()), 32);
    }

    #[test]
    fn cosmetic_repaint_refunds_tier_investment_and_resets_tier() {
        let mut s = settlement();
        s.tier = 2;
        assert!(s.place_tile(EAST, "forest").is_ok());
        assert!(s.upgrade_tile(EAST).is_ok());
        assert_eq!(s.cell_investment(EAST), 65);
        let credits = s.credits();
        assert!(s.repaint_tile(EAST, "meadow").is_ok());
        // 30% of 65 is 19.5, rounded half away from zero.
        assert_eq!(s.credits(), credits.saturating_add(20));
        assert_eq!(s.grid().cell(EAST).map(|c| c.tier), Some(0));
    }

    #[test]
    fn tile_upgrades_are_gated() {
        let mut s = with_tiles(&[WEST]);
        assert!(matches!(s.upgrade_tile(WEST), Err(Rejection::CosmeticTile(_))));
        assert!(matches!(s.upgrade_tile(EAST), Err(Rejection::CellNotOwned(_))));

        assert!(s.place_tile(EAST, "forest").is_ok());
        assert!(matches!(
            s.upgrade_tile(EAST),
            Err(Rejection::TileTierLocked { tier: 1, required: 2 })
        ));

        s.tier = 2;
        assert!(s.upgrade_tile(EAST).is_ok());
        assert!(matches!(
            s.upgrade_tile(EAST),
            Err(Rejection::TileTierLocked { tier: 2, required: 4 })
        ));

        s.tier = 4;
        assert_eq!(s.wallet.deposit(&"stone".into(), 10), 10);
        assert!(s.upgrade_tile(EAST).is_ok());
        assert_eq!(s.grid().cell(EAST).map(|c| c.tier), Some(2));
        assert!(matches!(s.upgrade_tile(EAST), Err(Rejection::TileMaxTier(2))));
        // 40 paint + 25 + (60 + 10 stone at 5 each)
        assert_eq!(s.cell_investment(EAST), 175);
    }

    #[test]
    fn removing_tiles() {
        let mut s = settlement();
        assert!(matches!(s.remove_tile(HexCoord::ORIGIN), Err(Rejection::OriginProtected)));
        assert!(matches!(s.remove_tile(EAST), Err(Rejection::CellNotOwned(_))));

        assert!(s.place_tile(EAST, "forest").is_ok());
        assert!(s.place_tile(WEST, "grass").is_ok());
        let credits = s.credits();
        assert!(s.remove_tile(EAST).is_ok());
        assert!(s.remove_tile(WEST).is_ok());
        assert_eq!(s.credits(), credits.saturating_add(12));
        assert_eq!(s.tiles_left(), 36);
    }

    #[test]
    fn occupied_tiles_cannot_be_removed() {
        let mut s = with_tiles(&[EAST]);
        assert!(s.place_building(EAST, "lantern").is_ok());
        assert!(matches!(s.remove_tile(EAST), Err(Rejection::CellOccupied(_))));
    }

    #[test]
    fn removing_a_road_disconnects() {
        let mut s = settlement();
        assert!(s.place_tile(EAST, "dirt_road").is_ok());
        assert!(s.place_tile(HexCoord::new(2, 0), "grass").is_ok());
        assert!(s.network().contains(HexCoord::new(2, 0)));
        assert!(s.network().is_connected(HexCoord::new(3, 0)));

        assert!(s.repaint_tile(EAST, "grass").is_ok());
        assert!(!s.network().contains(HexCoord::new(2, 0)));
        assert!(!s.network().is_connected(HexCoord::new(3, 0)));
    }

    // -- Buildings ----------------------------------------------------------

    #[test]
    fn building_target_checks() {
        let mut s = with_tiles(&[EAST]);
        assert!(matches!(s.place_building(WEST, "forester"), Err(Rejection::CellNotOwned(_))));
        assert!(matches!(
            s.place_building(HexCoord::ORIGIN, "forester"),
            Err(Rejection::CellOccupied(_))
        ));
        assert!(matches!(s.place_building(EAST, "castle"), Err(Rejection::UnknownBuilding(_))));
        assert!(matches!(
            s.place_building(EAST, "town_hall"),
            Err(Rejection::UniqueBuilding(_))
        ));
        assert!(matches!(
            s.place_building(EAST, "hunter_lodge"),
            Err(Rejection::MissingPrerequisite { .. })
        ));
        assert!(matches!(
            s.place_building(EAST, "quarry"),
            Err(Rejection::TierLocked { required: 2, .. })
        ));
    }

    #[test]
    fn blueprints_gate_all_but_core_kinds() {
        let built = SettlementBuilder::new(SettlementConfig::default())
            .blueprints(BlueprintSet::default())
            .build();
        assert!(built.is_ok());
        let Ok(mut s) = built else { return };
        assert!(s.place_tile(EAST, "grass").is_ok());
        assert!(matches!(
            s.place_building(EAST, "forester"),
            Err(Rejection::BlueprintLocked { .. })
        ));
        assert_eq!(s.wallet.deposit(&"wood".into(), 10), 10);
        assert!(s.place_building(EAST, "warehouse").is_ok());
    }

    #[test]
    fn placing_a_producer_registers_its_module() {
        let mut s = with_tiles(&[EAST]);
        assert!(s.place_building(EAST, "forester").is_ok());
        assert_eq!(s.credits(), 460);
        assert_eq!(s.module(EAST).map(|m| m.name()), Some("multi_plot"));
        assert!(s.has_placed("forester"));
        assert_eq!(s.used_slots(), 1);
        assert_eq!(s.investment_points(), 8);
    }

    #[test]
    fn full_slots_place_dormant_and_cap_rejects() {
        let coords = [EAST, WEST, HexCoord::new(0, 1), HexCoord::new(0, -1)];
        let mut s = with_tiles(&coords);
        for coord in coords.iter().take(3) {
            assert!(s.place_building(*coord, "forester").is_ok());
        }
        assert_eq!(s.used_slots(), 2);
        assert_eq!(s.grid().building(HexCoord::new(0, 1)).map(|b| b.active), Some(false));
        assert!(s
            .drain_notifications()
            .iter()
            .any(|n| n.kind == NotificationKind::Warning));

        assert!(matches!(
            s.place_building(HexCoord::new(0, -1), "forester"),
            Err(Rejection::BuildingCapReached { cap: 3 })
        ));
        assert!(s.place_building(HexCoord::new(0, -1), "lantern").is_ok());
    }

    #[test]
    fn removing_buildings() {
        let mut s = with_tiles(&[EAST]);
        assert!(matches!(
            s.remove_building(HexCoord::ORIGIN),
            Err(Rejection::TownHallProtected)
        ));
        assert!(matches!(s.remove_building(EAST), Err(Rejection::NoBuilding(_))));

        assert!(s.place_building(EAST, "forester").is_ok());
        let credits = s.credits();
        assert!(s.remove_building(EAST).is_ok());
        assert_eq!(s.credits(), credits.saturating_add(12));
        assert!(s.module(EAST).is_none());
        assert!(s.grid().building(EAST).is_none());
        // Placed once this session stays recorded.
        assert!(s.has_placed("forester"));
    }

    // -- World space --------------------------------------------------------

    #[test]
    fn world_points_map_to_cells_at_configured_size() {
        let mut config = SettlementConfig::default();
        config.world.cell_size = 2.0;
        let built = SettlementBuilder::new(config).build();
        assert!(built.is_ok());
        let Ok(s) = built else { return };

        let (x, z) = s.world_position(HexCoord::new(-1, 2));
        assert!(x.abs() < 1e-9);
        assert!((z - 6.0).abs() < 1e-9);
        assert_eq!(s.coord_at(0.0, 6.0), HexCoord::new(-1, 2));
        // Half a cell size off centre still lands in the same cell.
        assert_eq!(s.coord_at(0.9, 5.2), HexCoord::new(-1, 2));

        for coord in [EAST, WEST, HexCoord::new(3, -2)] {
            let (x, z) = s.world_position(coord);
            assert_eq!(s.coord_at(x, z), coord);
        }
    }

    #[test]
    fn clicking_a_world_point_claims_the_cell_under_it() {
        let mut s = settlement();
        assert!(s.select_style("grass").is_ok());
        let (x, z) = s.world_position(EAST);
        assert!(s.apply_at_world(x + 0.2, z - 0.1).is_ok());
        assert!(s.grid().is_owned(EAST));
    }

    // -- Mode dispatch ------------------------------------------------------

    #[test]
    fn selection_switches_mode_unless_sticky() {
        let mut s = settlement();
        assert!(s.select_building("forester").is_ok());
        assert_eq!(s.mode(), EditMode::Buildings);
        assert!(s.select_style("dirt_road").is_ok());
        assert_eq!(s.mode(), EditMode::Roads);
        assert_eq!(s.selection(), &Selection::Style(StyleId::new("dirt_road")));

        s.set_mode(EditMode::Delete);
        assert!(s.select_style("forest").is_ok());
        assert_eq!(s.mode(), EditMode::Delete);
        assert!(s.select_style("nope").is_err());
        assert_eq!(s.selection(), &Selection::Style(StyleId::new("forest")));
    }

    #[test]
    fn apply_at_dispatches_by_mode() {
        let mut s = settlement();
        assert!(matches!(s.apply_at(EAST), Err(Rejection::NothingSelected)));

        assert!(s.select_style("grass").is_ok());
        assert!(s.apply_at(EAST).is_ok());
        assert!(s.select_style("forest").is_ok());
        assert!(s.apply_at(EAST).is_ok());
        assert_eq!(s.grid().cell(EAST).map(|c| c.style.as_str()), Some("forest"));

        assert!(s.select_building("lantern").is_ok());
        assert!(s.apply_at(EAST).is_ok());

        s.set_mode(EditMode::Delete);
        assert!(s.apply_at(EAST).is_ok());
        assert!(s.grid().building(EAST).is_none());
        assert!(s.apply_at(EAST).is_ok());
        assert!(!s.grid().is_owned(EAST));
    }

    #[test]
    fn roads_mode_only_paints_roads() {
        let mut s = settlement();
        assert!(s.select_style("forest").is_ok());
        s.set_mode(EditMode::Roads);
        assert!(matches!(s.apply_at(EAST), Err(Rejection::NotARoad(_))));
        assert_eq!(s.drain_notifications().len(), 1);
    }
}
