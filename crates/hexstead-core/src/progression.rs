//! Settlement progression and building management: tier advancement,
//! relocation, activation, level and warehouse upgrades, and module
//! actions.

use hexstead_types::{BuildingKind, HexCoord, ResourceCost};
use hexstead_world::{ActionOutcome, ModuleAction, capacity};

use crate::error::Rejection;
use crate::events::Notification;
use crate::settlement::Settlement;

// ---------------------------------------------------------------------------
// Settlement tier
// ---------------------------------------------------------------------------

impl Settlement {
    /// Advance to the next settlement tier.
    ///
    /// Needs the tier table's investment points, the highest unlocked world,
    /// and the milestone resource, which is consumed. Grants the tier's
    /// credit reward. Returns the new tier.
    pub fn advance_tier(&mut self) -> Result<u32, Rejection> {
        let result = self.try_advance_tier();
        self.surface(result)
    }

    fn try_advance_tier(&mut self) -> Result<u32, Rejection> {
        if self.tier >= capacity::MAX_TIER {
            return Err(Rejection::MaxTier);
        }
        let next = self.tier.saturating_add(1);
        let row = self.catalog.tier(next).cloned().ok_or(Rejection::MaxTier)?;
        if self.investment_points < row.required_investment {
            return Err(Rejection::NotEnoughInvestment {
                required: row.required_investment,
                available: self.investment_points,
            });
        }
        let world = self.highest_unlocked_world();
        if world < row.required_world {
            return Err(Rejection::WorldLocked {
                required: row.required_world,
                available: world,
            });
        }

        let milestone: Vec<ResourceCost> = row.milestone.into_iter().collect();
        self.pay(0, &milestone)?;
        self.tier = next;
        self.sync_town_hall_level();
        self.credit(u64::from(row.credit_reward));
        self.refresh();
        self.outbox
            .push(Notification::milestone(format!("Settlement reached tier {next}")));

        tracing::info!(
            tier = next,
            reward = row.credit_reward,
            tiles_left = self.tiles_left,
            "Settlement tier advanced"
        );
        Ok(next)
    }

    /// Keep the origin Town Hall's level equal to the settlement tier.
    pub(crate) fn sync_town_hall_level(&mut self) {
        let tier = self.tier;
        if let Some(town_hall) = self.grid.building_mut(self.network.origin()) {
            town_hall.level = tier;
        }
    }
}

// ---------------------------------------------------------------------------
// Buildings
// ---------------------------------------------------------------------------

impl Settlement {
    /// Move the building at `from` to the owned, empty cell at `to`.
    ///
    /// The building idles for the configured cooldown afterwards and cannot
    /// move again until it elapses.
    pub fn relocate_building(&mut self, from: HexCoord, to: HexCoord) -> Result<(), Rejection> {
        let result = self.try_relocate_building(from, to);
        self.surface(result)
    }

    fn try_relocate_building(&mut self, from: HexCoord, to: HexCoord) -> Result<(), Rejection> {
        let building = self.grid.building(from).ok_or(Rejection::NoBuilding(from))?;
        let is_town_hall = self
            .catalog
            .building(building.definition.as_str())
            .is_some_and(|d| d.kind == BuildingKind::TownHall);
        if is_town_hall || from == self.network.origin() {
            return Err(Rejection::TownHallProtected);
        }
        if building.relocation_cooldown > rust_decimal::Decimal::ZERO {
            return Err(Rejection::RelocationCooldown {
                remaining: building.relocation_cooldown,
            });
        }
        let target = self.grid.cell(to).ok_or(Rejection::CellNotOwned(to))?;
        if target.building.is_some() {
            return Err(Rejection::CellOccupied(to));
        }

        self.grid.move_building(from, to)?;
        let cooldown = self.config.buildings.relocation_cooldown_seconds;
        if let Some(moved) = self.grid.building_mut(to) {
            moved.relocation_cooldown = cooldown;
        }
        self.scheduler.relocate(from, to);
        self.refresh();

        tracing::info!(%from, %to, %cooldown, "Building relocated");
        Ok(())
    }

    /// Activate or deactivate the building at `coord`.
    ///
    /// Activating a slot-consuming building needs a free active slot.
    pub fn set_building_active(&mut self, coord: HexCoord, active: bool) -> Result<(), Rejection> {
        let result = self.try_set_building_active(coord, active);
        self.surface(result)
    }

    fn try_set_building_active(&mut self, coord: HexCoord, active: bool) -> Result<(), Rejection> {
        let building = self.grid.building(coord).ok_or(Rejection::NoBuilding(coord))?;
        if building.active == active {
            return Ok(());
        }
        if active && building.consumes_slot {
            let used = self.used_slots();
            let cap = self.caps().active_slots;
            if used >= cap {
                return Err(Rejection::NoFreeSlot { used, cap });
            }
        }
        if let Some(building) = self.grid.building_mut(coord) {
            building.active = active;
        }
        tracing::info!(%coord, active, "Building activation changed");
        Ok(())
    }

    /// Raise the building at `coord` one level.
    ///
    /// Upgrading from level `l` costs `l` times the placement cost. Returns
    /// the new level.
    pub fn upgrade_building(&mut self, coord: HexCoord) -> Result<u32, Rejection> {
        let result = self.try_upgrade_building(coord);
        self.surface(result)
    }

    fn try_upgrade_building(&mut self, coord: HexCoord) -> Result<u32, Rejection> {
        let building = self.grid.building(coord).ok_or(Rejection::NoBuilding(coord))?;
        let level = building.level;
        let definition = self
            .catalog
            .building(building.definition.as_str())
            .cloned()
            .ok_or_else(|| Rejection::UnknownBuilding(building.definition.clone()))?;
        if definition.kind == BuildingKind::TownHall {
            return Err(Rejection::NotUpgradable(definition.id));
        }
        if level >= self.config.buildings.max_level {
            return Err(Rejection::BuildingMaxLevel { level });
        }

        let credits = u64::from(definition.cost.credits).saturating_mul(u64::from(level));
        let resources: Vec<ResourceCost> = definition
            .cost
            .resources
            .iter()
            .map(|line| ResourceCost::new(line.resource.clone(), line.amount.saturating_mul(level)))
            .collect();
        self.pay(credits, &resources)?;

        let new_level = level.saturating_add(1);
        if let Some(building) = self.grid.building_mut(coord) {
            building.level = new_level;
        }
        self.earn_investment(definition.investment_points);

        tracing::info!(%coord, building = %definition.id, level = new_level, "Building upgraded");
        Ok(new_level)
    }

    /// Raise the warehouse one level. Returns the new level.
    pub fn upgrade_warehouse(&mut self) -> Result<u32, Rejection> {
        let result = self.try_upgrade_warehouse();
        self.surface(result)
    }

    fn try_upgrade_warehouse(&mut self) -> Result<u32, Rejection> {
        let warehouse = self.wallet.warehouse();
        let level = warehouse.level();
        if level >= warehouse.max_level() {
            return Err(Rejection::WarehouseMaxLevel { level });
        }
        let cost = usize::try_from(level.saturating_sub(1))
            .ok()
            .and_then(|index| self.config.economy.warehouse_upgrade_costs.get(index))
            .cloned()
            .ok_or(Rejection::WarehouseMaxLevel { level })?;

        self.pay(u64::from(cost.credits), &cost.resources)?;
        let new_level = self.wallet.warehouse_mut().upgrade()?;

        tracing::info!(
            level = new_level,
            capacity = self.wallet.warehouse().capacity(),
            "Warehouse upgraded"
        );
        Ok(new_level)
    }

    /// Send a player action to the production module of the building at
    /// `coord`. Strata crossed by a dig are announced as milestones.
    pub fn perform_action(
        &mut self,
        coord: HexCoord,
        action: ModuleAction,
    ) -> Result<ActionOutcome, Rejection> {
        let result = self.try_perform_action(coord, action);
        self.surface(result)
    }

    fn try_perform_action(
        &mut self,
        coord: HexCoord,
        action: ModuleAction,
    ) -> Result<ActionOutcome, Rejection> {
        if self.grid.building(coord).is_none() {
            return Err(Rejection::NoBuilding(coord));
        }
        let module = self
            .scheduler
            .module_mut(coord)
            .ok_or(Rejection::NoModule(coord))?;
        let outcome = module.perform(action)?;

        if let ActionOutcome::Dug { unlocked, .. } = &outcome {
            for label in unlocked {
                self.outbox
                    .push(Notification::milestone(format!("Unlocked {label}")));
            }
        }
        tracing::info!(%coord, action = action.name(), outcome = ?outcome, "Module action performed");
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use hexstead_types::CaptureFocus;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::config::SettlementConfig;
    use crate::events::NotificationKind;
    use crate::providers::{FixedWorld, ProgressTally};
    use crate::settlement::SettlementBuilder;

    const EAST: HexCoord = HexCoord::new(1, 0);
    const WEST: HexCoord = HexCoord::new(-1, 0);
    const SOUTH: HexCoord = HexCoord::new(0, 1);

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

    // -- Tier ---------------------------------------------------------------

    #[test]
    fn tier_needs_investment() {
        let mut s = settlement();
        assert!(matches!(
            s.advance_tier(),
            Err(Rejection::NotEnoughInvestment { required: 20, available: 0 })
        ));
        assert_eq!(s.tier(), 1);
    }

    #[test]
    fn advancing_raises_caps_and_pays_reward() {
        let tally = ProgressTally::new();
        let built = SettlementBuilder::new(SettlementConfig::default())
            .sink(tally.clone())
            .build();
        assert!(built.is_ok());
        let Ok(mut s) = built else { return };
        for coord in HexCoord::ORIGIN.neighbors().iter().take(5) {
            assert!(s.place_tile(*coord, "forest").is_ok());
        }
        assert_eq!(s.investment_points(), 20);
        let credits = s.credits();

        assert_eq!(s.advance_tier().ok(), Some(2));
        assert_eq!(s.tiles_left(), 61 - 6);
        assert_eq!(s.credits(), credits.saturating_add(50));
        assert_eq!(tally.credits(), 50);
        assert_eq!(s.grid().building(HexCoord::ORIGIN).map(|b| b.level), Some(2));
        assert!(s
            .drain_notifications()
            .iter()
            .any(|n| n.kind == NotificationKind::Milestone));
    }

    #[test]
    fn milestone_resource_is_required_and_consumed() {
        let mut s = settlement();
        s.tier = 2;
        s.investment_points = 50;
        assert!(matches!(s.advance_tier(), Err(Rejection::Unaffordable(_))));
        assert_eq!(s.tier(), 2);

        assert_eq!(s.wallet.deposit(&"wood".into(), 35), 35);
        assert_eq!(s.advance_tier().ok(), Some(3));
        assert_eq!(s.wallet().warehouse().amount("wood"), 5);
    }

    #[test]
    fn world_progression_gates_tiers() {
        let mut s = settlement();
        s.tier = 3;
        s.investment_points = 100;
        assert_eq!(s.wallet.deposit(&"stone".into(), 40), 40);
        assert!(matches!(
            s.advance_tier(),
            Err(Rejection::WorldLocked { required: 2, available: 1 })
        ));

        let built = SettlementBuilder::new(SettlementConfig::default())
            .world_progression(FixedWorld(2))
            .build();
        assert!(built.is_ok());
        let Ok(mut s) = built else { return };
        s.tier = 3;
        s.investment_points = 100;
        assert_eq!(s.wallet.deposit(&"stone".into(), 40), 40);
        assert_eq!(s.advance_tier().ok(), Some(4));
    }

    #[test]
    fn top_tier_cannot_advance() {
        let mut s = settlement();
        s.tier = 10;
        s.investment_points = u64::MAX;
        assert!(matches!(s.advance_tier(), Err(Rejection::MaxTier)));
    }

    // -- Relocation ---------------------------------------------------------

    #[test]
    fn relocation_moves_module_and_starts_cooldown() {
        let mut s = with_tiles(&[EAST, WEST]);
        assert!(s.place_building(EAST, "forester").is_ok());
        assert!(s.relocate_building(EAST, WEST).is_ok());
        assert!(s.grid().building(EAST).is_none());
        assert_eq!(
            s.grid().building(WEST).map(|b| b.relocation_cooldown),
            Some(Decimal::from(30))
        );
        assert!(s.module(WEST).is_some());
        assert!(s.module(EAST).is_none());

        assert!(matches!(
            s.relocate_building(WEST, EAST),
            Err(Rejection::RelocationCooldown { .. })
        ));
        s.advance_frame(dec!(30));
        assert!(s.relocate_building(WEST, EAST).is_ok());
    }

    #[test]
    fn relocation_target_checks() {
        let mut s = with_tiles(&[EAST, WEST]);
        assert!(s.place_building(EAST, "lantern").is_ok());
        assert!(s.place_building(WEST, "lantern").is_ok());
        assert!(matches!(
            s.relocate_building(HexCoord::ORIGIN, SOUTH),
            Err(Rejection::TownHallProtected)
        ));
        assert!(matches!(s.relocate_building(EAST, SOUTH), Err(Rejection::CellNotOwned(_))));
        assert!(matches!(s.relocate_building(EAST, WEST), Err(Rejection::CellOccupied(_))));
        assert!(matches!(s.relocate_building(SOUTH, EAST), Err(Rejection::NoBuilding(_))));
    }

    // -- Activation ---------------------------------------------------------

    #[test]
    fn activation_respects_slot_cap() {
        let mut s = with_tiles(&[EAST, WEST, SOUTH]);
        for coord in [EAST, WEST, SOUTH] {
            assert!(s.place_building(coord, "forester").is_ok());
        }
        assert!(matches!(
            s.set_building_active(SOUTH, true),
            Err(Rejection::NoFreeSlot { used: 2, cap: 2 })
        ));
        assert!(s.set_building_active(EAST, false).is_ok());
        assert!(s.set_building_active(SOUTH, true).is_ok());
        assert_eq!(s.used_slots(), 2);
        assert!(s.set_building_active(SOUTH, true).is_ok());
    }

    // -- Upgrades -----------------------------------------------------------

    #[test]
    fn building_levels_cost_multiples() {
        let mut s = with_tiles(&[EAST]);
        assert!(s.place_building(EAST, "forester").is_ok());
        let credits = s.credits();
        assert_eq!(s.upgrade_building(EAST).ok(), Some(2));
        assert_eq!(s.upgrade_building(EAST).ok(), Some(3));
        assert_eq!(credits.saturating_sub(s.credits()), 40 + 80);
        assert!(matches!(
            s.upgrade_building(EAST),
            Err(Rejection::BuildingMaxLevel { level: 3 })
        ));
        assert_eq!(s.building_investment(EAST), 160);
        assert!(matches!(
            s.upgrade_building(HexCoord::ORIGIN),
            Err(Rejection::NotUpgradable(_))
        ));
    }

    #[test]
    fn warehouse_upgrade_raises_capacity() {
        let mut s = settlement();
        assert!(matches!(s.upgrade_warehouse(), Err(Rejection::Unaffordable(_))));
        assert_eq!(s.wallet.deposit(&"wood".into(), 20), 20);
        assert_eq!(s.upgrade_warehouse().ok(), Some(2));
        assert_eq!(s.wallet().warehouse().capacity(), 200);
        assert_eq!(s.wallet().warehouse().amount("wood"), 0);
        assert_eq!(s.credits(), 400);
    }

    #[test]
    fn warehouse_stops_at_last_level() {
        let mut config = SettlementConfig::default();
        config.economy.warehouse_capacities = vec![100, 200];
        let built = SettlementBuilder::new(config).build();
        assert!(built.is_ok());
        let Ok(mut s) = built else { return };
        assert_eq!(s.wallet.deposit(&"wood".into(), 20), 20);
        assert_eq!(s.upgrade_warehouse().ok(), Some(2));
        assert!(matches!(
            s.upgrade_warehouse(),
            Err(Rejection::WarehouseMaxLevel { level: 2 })
        ));
    }

    // -- Module actions -----------------------------------------------------

    #[test]
    fn actions_reach_the_module() {
        let mut s = with_tiles(&[EAST, WEST]);
        assert!(s.place_building(EAST, "forester").is_ok());
        assert!(s.place_building(WEST, "lantern").is_ok());
        s.drain_notifications();

        assert!(matches!(
            s.perform_action(EAST, ModuleAction::Plant),
            Err(Rejection::World { .. })
        ));
        assert!(matches!(
            s.perform_action(EAST, ModuleAction::SetFocus(CaptureFocus::FavorPrimary)),
            Err(Rejection::World { .. })
        ));
        assert!(matches!(
            s.perform_action(WEST, ModuleAction::Dig),
            Err(Rejection::NoModule(_))
        ));
        assert!(matches!(
            s.perform_action(SOUTH, ModuleAction::Dig),
            Err(Rejection::NoBuilding(_))
        ));
        assert_eq!(s.drain_notifications().len(), 4);
    }

    #[test]
    fn digging_announces_strata() {
        let mut s = with_tiles(&[EAST]);
        s.tier = 2;
        assert_eq!(s.wallet.deposit(&"wood".into(), 15), 15);
        assert!(s.place_building(EAST, "quarry").is_ok());

        for _ in 0..3 {
            assert!(s.perform_action(EAST, ModuleAction::Dig).is_ok());
        }
        let toasts = s.drain_notifications();
        assert_eq!(
            toasts
                .iter()
                .filter(|n| n.kind == NotificationKind::Milestone)
                .map(|n| n.message.as_str())
                .collect::<Vec<_>>(),
            vec!["Unlocked Iron seam"]
        );
        assert!(matches!(
            s.perform_action(EAST, ModuleAction::Dig),
            Err(Rejection::World { .. })
        ));
    }
}
