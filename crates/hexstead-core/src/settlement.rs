//! The settlement aggregate and its builder.
//!
//! [`Settlement`] exclusively owns the grid, the wallet, the road network,
//! and the production scheduler. Nothing outside it mutates them; player
//! operations live in [`placement`](crate::placement) and
//! [`progression`](crate::progression), the production cadence in
//! [`tick`](crate::tick), and snapshots in
//! [`persistence`](crate::persistence). Every operation that changes the
//! grid ends with [`Settlement::refresh`], which re-derives the tile budget,
//! recomputes road connectivity, and enforces the active-slot cap.

use std::collections::BTreeSet;

use hexstead_ledger::{Wallet, Warehouse, credit_equivalent, percent_of};
use hexstead_types::{
    BuildingDefId, BuildingDefinition, BuildingKind, EditMode, HexCoord, ResourceCost,
    TileCategory, TileStyle,
};
use hexstead_world::starting_catalog::TOWN_HALL;
use hexstead_world::{
    Building, Catalog, Grid, ProductionModule, RoadNetwork, TierCaps, WorldError, capacity,
    create_module, starting_catalog,
};

use crate::config::SettlementConfig;
use crate::error::Rejection;
use crate::events::{Notification, Outbox};
use crate::placement::Selection;
use crate::providers::{AllBlueprints, BlueprintUnlocks, NullSink, ProgressSink, WorldProgression};
use crate::scheduler::ProductionScheduler;

/// The complete simulation state of one settlement.
pub struct Settlement {
    /// Loaded configuration.
    pub(crate) config: SettlementConfig,
    /// Read-only catalog.
    pub(crate) catalog: Catalog,
    /// Owned cells and their buildings.
    pub(crate) grid: Grid,
    /// Credits and warehouse.
    pub(crate) wallet: Wallet,
    /// Road connectivity from the origin, recomputed on every grid change.
    pub(crate) network: RoadNetwork,
    /// Production modules in registration order.
    pub(crate) scheduler: ProductionScheduler,
    /// Settlement tier, `1..=10`.
    pub(crate) tier: u32,
    /// Tiles that can still be claimed at this tier.
    pub(crate) tiles_left: u32,
    /// Investment points accumulated toward the next tier.
    pub(crate) investment_points: u64,
    /// Production ticks run since construction or load.
    pub(crate) ticks: u64,
    /// Current edit mode.
    pub(crate) mode: EditMode,
    /// Current selection.
    pub(crate) selection: Selection,
    /// Buildings placed at least once this session.
    pub(crate) placed: BTreeSet<BuildingDefId>,
    /// Undelivered toasts.
    pub(crate) outbox: Outbox,
    /// Blueprint unlock provider.
    pub(crate) blueprints: Box<dyn BlueprintUnlocks>,
    /// World progression provider, if any.
    pub(crate) world: Option<Box<dyn WorldProgression>>,
    /// Progress sink.
    pub(crate) sink: Box<dyn ProgressSink>,
}

impl core::fmt::Debug for Settlement {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Settlement")
            .field("tier", &self.tier)
            .field("tiles_left", &self.tiles_left)
            .field("owned", &self.grid.len())
            .field("buildings", &self.grid.building_count())
            .field("credits", &self.wallet.credits())
            .field("investment_points", &self.investment_points)
            .field("mode", &self.mode)
            .field("selection", &self.selection)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Wires a [`Settlement`] to its catalog and external collaborators.
///
/// Defaults: the catalog at `world.catalog_path` or the built-in starting
/// catalog, every blueprint unlocked, no world provider (world 1), and a
/// sink that discards reports.
pub struct SettlementBuilder {
    config: SettlementConfig,
    catalog: Option<Catalog>,
    blueprints: Box<dyn BlueprintUnlocks>,
    world: Option<Box<dyn WorldProgression>>,
    sink: Box<dyn ProgressSink>,
}

impl SettlementBuilder {
    /// Start a builder from `config`.
    pub fn new(config: SettlementConfig) -> Self {
        Self {
            config,
            catalog: None,
            blueprints: Box::new(AllBlueprints),
            world: None,
            sink: Box::new(NullSink),
        }
    }

    /// Use `catalog` instead of loading one.
    #[must_use]
    pub fn catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Use `provider` for blueprint checks.
    #[must_use]
    pub fn blueprints(mut self, provider: impl BlueprintUnlocks + 'static) -> Self {
        self.blueprints = Box::new(provider);
        self
    }

    /// Use `provider` for the highest unlocked world.
    #[must_use]
    pub fn world_progression(mut self, provider: impl WorldProgression + 'static) -> Self {
        self.world = Some(Box::new(provider));
        self
    }

    /// Report progress to `sink`.
    #[must_use]
    pub fn sink(mut self, sink: impl ProgressSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// Build a fresh tier-1 settlement: the origin cell painted with the
    /// default style and holding the Town Hall.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError`] if the catalog cannot be loaded or has no
    /// Town-Hall-kind building.
    pub fn build(self) -> Result<Settlement, WorldError> {
        let catalog = match self.catalog {
            Some(catalog) => catalog,
            None => match &self.config.world.catalog_path {
                Some(path) => Catalog::from_file(path)?,
                None => starting_catalog()?,
            },
        };

        let (grid, scheduler) = fresh_grid(&catalog)?;
        let economy = &self.config.economy;
        let wallet = Wallet::new(
            economy.starting_credits,
            Warehouse::new(
                economy.starting_warehouse_level,
                economy.warehouse_capacities.clone(),
            ),
        );
        let placed = grid.buildings().map(|(_, b)| b.definition.clone()).collect();

        let mut settlement = Settlement {
            config: self.config,
            catalog,
            grid,
            wallet,
            network: RoadNetwork::new(HexCoord::ORIGIN),
            scheduler,
            tier: capacity::MIN_TIER,
            tiles_left: 0,
            investment_points: 0,
            ticks: 0,
            mode: EditMode::default(),
            selection: Selection::None,
            placed,
            outbox: Outbox::new(),
            blueprints: self.blueprints,
            world: self.world,
            sink: self.sink,
        };
        settlement.refresh();

        tracing::info!(
            tier = settlement.tier,
            tiles_left = settlement.tiles_left,
            credits = settlement.wallet.credits(),
            "Fresh settlement created"
        );
        Ok(settlement)
    }
}

/// The origin cell with its Town Hall, and the scheduler for it.
pub(crate) fn fresh_grid(catalog: &Catalog) -> Result<(Grid, ProductionScheduler), WorldError> {
    let town_hall = catalog
        .town_hall()
        .ok_or_else(|| WorldError::UnknownBuilding(BuildingDefId::new(TOWN_HALL)))?;
    let mut grid = Grid::new();
    let mut scheduler = ProductionScheduler::new();
    grid.claim(HexCoord::ORIGIN, catalog.default_style().id.clone())?;
    let (building, module) = instantiate(town_hall, town_hall.default_active);
    grid.place_building(HexCoord::ORIGIN, building)?;
    if let Some(module) = module {
        scheduler.register(HexCoord::ORIGIN, module);
    }
    Ok((grid, scheduler))
}

/// A fresh building for `definition` and its module, if it produces.
pub(crate) fn instantiate(
    definition: &BuildingDefinition,
    active: bool,
) -> (Building, Option<Box<dyn ProductionModule>>) {
    let building = Building::new(definition.id.clone(), active, definition.consumes_slot);
    let module = definition.production.as_ref().map(create_module);
    (building, module)
}

// ---------------------------------------------------------------------------
// Read access
// ---------------------------------------------------------------------------

impl Settlement {
    /// Loaded configuration.
    pub const fn config(&self) -> &SettlementConfig {
        &self.config
    }

    /// The catalog in use.
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Owned cells and buildings.
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Credits and warehouse.
    pub const fn wallet(&self) -> &Wallet {
        &self.wallet
    }

    /// Credits in the wallet.
    pub const fn credits(&self) -> u64 {
        self.wallet.credits()
    }

    /// The last computed road network.
    pub const fn network(&self) -> &RoadNetwork {
        &self.network
    }

    /// The production scheduler.
    pub const fn scheduler(&self) -> &ProductionScheduler {
        &self.scheduler
    }

    /// The production module of the building at `coord`.
    pub fn module(&self, coord: HexCoord) -> Option<&dyn ProductionModule> {
        self.scheduler.module(coord)
    }

    /// Current settlement tier.
    pub const fn tier(&self) -> u32 {
        self.tier
    }

    /// Caps at the current tier.
    pub fn caps(&self) -> TierCaps {
        capacity::caps(self.tier)
    }

    /// Tiles that can still be claimed at this tier.
    pub const fn tiles_left(&self) -> u32 {
        self.tiles_left
    }

    /// Investment points accumulated.
    pub const fn investment_points(&self) -> u64 {
        self.investment_points
    }

    /// Production ticks run.
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Current edit mode.
    pub const fn mode(&self) -> EditMode {
        self.mode
    }

    /// Current selection.
    pub const fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Whether `definition` has been placed at least once this session.
    pub fn has_placed(&self, definition: &str) -> bool {
        self.placed.contains(definition)
    }

    /// Active buildings occupying a slot.
    pub fn used_slots(&self) -> u32 {
        u32::try_from(self.grid.used_slots()).unwrap_or(u32::MAX)
    }

    /// Buildings of the production kind, counted against the building cap.
    pub fn production_building_count(&self) -> u32 {
        let count = self
            .grid
            .buildings()
            .filter(|(_, b)| {
                self.catalog
                    .building(b.definition.as_str())
                    .is_some_and(|d| d.kind == BuildingKind::Production)
            })
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    /// Highest unlocked world, 1 when no provider is wired.
    pub fn highest_unlocked_world(&self) -> u32 {
        self.world
            .as_ref()
            .map_or(1, |provider| provider.highest_unlocked_world())
    }

    /// Undelivered notifications, oldest first.
    pub const fn notifications(&self) -> &Outbox {
        &self.outbox
    }

    /// Remove and return every undelivered notification.
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        self.outbox.drain()
    }

    /// Credit-equivalent value sunk into the tile at `coord`: the paint
    /// cost plus every tier upgrade up to its current tier. Cosmetic tiles
    /// and unowned cells are worth 0.
    pub fn cell_investment(&self, coord: HexCoord) -> u64 {
        let Some(cell) = self.grid.cell(coord) else {
            return 0;
        };
        let style = self.catalog.resolve_style(cell.style.as_str());
        if style.category != TileCategory::Gameplay {
            return 0;
        }
        let rate = self.config.economy.credits_per_unit;
        self.config
            .tile_upgrades
            .iter()
            .filter(|step| step.tier <= cell.tier)
            .map(|step| credit_equivalent(&step.cost, rate))
            .fold(credit_equivalent(&style.cost, rate), u64::saturating_add)
    }

    /// Credit-equivalent value sunk into the building at `coord`: its
    /// placement cost plus every level upgrade paid so far.
    pub fn building_investment(&self, coord: HexCoord) -> u64 {
        let Some(building) = self.grid.building(coord) else {
            return 0;
        };
        let Some(definition) = self.catalog.building(building.definition.as_str()) else {
            return 0;
        };
        let base = credit_equivalent(&definition.cost, self.config.economy.credits_per_unit);
        // Upgrading from level l costs l times the base.
        let upgrades: u64 = (1..building.level).map(u64::from).fold(0, u64::saturating_add);
        base.saturating_mul(upgrades.saturating_add(1))
    }

    /// Share of `value` returned on removal.
    pub(crate) fn refund_share(&self, value: u64) -> u64 {
        percent_of(value, self.config.economy.refund_percent)
    }
}

// ---------------------------------------------------------------------------
// Internal mutation helpers
// ---------------------------------------------------------------------------

impl Settlement {
    /// Push a rejection toast for a failed operation and pass the result on.
    pub(crate) fn surface<T>(&mut self, result: Result<T, Rejection>) -> Result<T, Rejection> {
        if let Err(rejection) = &result {
            tracing::debug!(reason = %rejection, "Player operation rejected");
            self.outbox.push(Notification::rejected(rejection.to_string()));
        }
        result
    }

    /// Re-derive the tile budget, recompute road connectivity, and enforce
    /// the active-slot cap.
    pub(crate) fn refresh(&mut self) {
        let owned = u32::try_from(self.grid.len()).unwrap_or(u32::MAX);
        self.tiles_left = capacity::tile_cap(self.tier).saturating_sub(owned);
        self.network.recompute(&self.grid, &self.catalog);
        self.enforce_active_slots();
    }

    /// Deactivate slot-consuming buildings until the active-slot cap holds.
    ///
    /// Excess buildings are deactivated in ascending `(q, r)` order, so the
    /// result depends only on the set of buildings. Returns how many were
    /// deactivated.
    pub fn enforce_active_slots(&mut self) -> usize {
        let cap = usize::try_from(capacity::active_slot_cap(self.tier)).unwrap_or(usize::MAX);
        let mut excess = self.grid.used_slots().saturating_sub(cap);
        if excess == 0 {
            return 0;
        }

        let mut deactivated = 0usize;
        for (coord, building) in self.grid.buildings_mut() {
            if excess == 0 {
                break;
            }
            if building.uses_slot() {
                building.active = false;
                excess = excess.saturating_sub(1);
                deactivated = deactivated.saturating_add(1);
                tracing::debug!(%coord, building = %building.definition, "Deactivated over slot cap");
            }
        }
        tracing::warn!(
            tier = self.tier,
            cap,
            deactivated,
            "Active slots over cap, deactivated excess buildings"
        );
        deactivated
    }

    /// Check and deduct a cost in one step.
    pub(crate) fn pay(&mut self, credits: u64, resources: &[ResourceCost]) -> Result<(), Rejection> {
        self.wallet.can_afford(credits, resources).into_result()?;
        self.wallet.commit(credits, resources)?;
        Ok(())
    }

    /// Return credits to the wallet and report them.
    pub(crate) fn credit(&mut self, amount: u64) {
        if amount == 0 {
            return;
        }
        self.wallet.refund(amount);
        self.sink.add_credits(amount);
    }

    /// Accumulate investment points and report them.
    pub(crate) fn earn_investment(&mut self, points: u32) {
        if points == 0 {
            return;
        }
        let points = u64::from(points);
        self.investment_points = self.investment_points.saturating_add(points);
        self.sink.add_investment_points(points);
    }

    /// Tier, session-prerequisite, and blueprint gates for a building.
    pub(crate) fn check_building_unlocked(
        &self,
        definition: &BuildingDefinition,
    ) -> Result<(), Rejection> {
        self.check_unlock(&definition.name, definition.unlock_tier, &definition.required_buildings)?;
        if !definition.kind.always_unlocked()
            && !self.blueprints.is_blueprint_unlocked(&definition.id)
        {
            return Err(Rejection::BlueprintLocked {
                name: definition.name.clone(),
            });
        }
        Ok(())
    }

    /// Tier and session-prerequisite gates for a tile style.
    pub(crate) fn check_style_unlocked(&self, style: &TileStyle) -> Result<(), Rejection> {
        self.check_unlock(&style.name, style.unlock_tier, &style.required_buildings)
    }

    fn check_unlock(
        &self,
        name: &str,
        unlock_tier: u32,
        required: &[BuildingDefId],
    ) -> Result<(), Rejection> {
        if self.tier < unlock_tier {
            return Err(Rejection::TierLocked {
                name: name.to_owned(),
                required: unlock_tier,
            });
        }
        if let Some(missing) = required.iter().find(|id| !self.placed.contains(*id)) {
            return Err(Rejection::MissingPrerequisite {
                name: name.to_owned(),
                requirement: missing.clone(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{FixedWorld, ProgressTally};

    #[allow(clippy::unwrap_used)]
    fn settlement() -> Settlement {
        SettlementBuilder::new(SettlementConfig::default()).build().unwrap()
    }

    #[test]
    fn fresh_settlement_has_origin_town_hall() {
        let s = settlement();
        assert_eq!(s.tier(), 1);
        assert_eq!(s.grid().len(), 1);
        assert_eq!(s.tiles_left(), 36);
        assert_eq!(s.credits(), 500);
        assert_eq!(
            s.grid().building(HexCoord::ORIGIN).map(|b| b.definition.as_str()),
            Some(TOWN_HALL)
        );
        assert!(s.has_placed(TOWN_HALL));
        assert!(s.network().contains(HexCoord::ORIGIN));
        assert_eq!(s.used_slots(), 0);
        assert!(s.scheduler().is_empty());
    }

    #[test]
    fn catalog_without_town_hall_fails() {
        let catalog = Catalog::from_yaml("default_style: grass\nstyles:\n  - id: grass\n");
        assert!(catalog.is_ok());
        let Ok(catalog) = catalog else { return };
        let result = SettlementBuilder::new(SettlementConfig::default())
            .catalog(catalog)
            .build();
        assert!(matches!(result, Err(WorldError::UnknownBuilding(_))));
    }

    #[test]
    fn world_defaults_to_one_without_provider() {
        let s = settlement();
        assert_eq!(s.highest_unlocked_world(), 1);

        let wired = SettlementBuilder::new(SettlementConfig::default())
            .world_progression(FixedWorld(4))
            .build();
        assert_eq!(wired.map(|s| s.highest_unlocked_world()).ok(), Some(4));
    }

    #[test]
    fn investment_and_credits_reach_the_sink() {
        let tally = ProgressTally::new();
        let built = SettlementBuilder::new(SettlementConfig::default())
            .sink(tally.clone())
            .build();
        assert!(built.is_ok());
        let Ok(mut s) = built else { return };
        s.earn_investment(7);
        s.credit(12);
        s.credit(0);
        assert_eq!(s.investment_points(), 7);
        assert_eq!(tally.investment_points(), 7);
        assert_eq!(tally.credits(), 12);
        assert_eq!(s.credits(), 512);
    }

    #[test]
    fn slot_enforcement_deactivates_in_coordinate_order() {
        let mut s = settlement();
        let coords = [HexCoord::new(1, 0), HexCoord::new(-1, 1), HexCoord::new(0, -1)];
        for coord in coords {
            assert!(s.grid.claim(coord, "grass".into()).is_ok());
            assert!(s
                .grid
                .place_building(coord, Building::new("forester".into(), true, true))
                .is_ok());
        }
        // Tier 1 allows two active slots; three are in use.
        assert_eq!(s.enforce_active_slots(), 1);
        assert_eq!(s.used_slots(), 2);
        assert_eq!(s.grid.building(HexCoord::new(-1, 1)).map(|b| b.active), Some(false));
        assert_eq!(s.grid.building(HexCoord::new(0, -1)).map(|b| b.active), Some(true));
        assert_eq!(s.grid.building(HexCoord::new(1, 0)).map(|b| b.active), Some(true));
        assert_eq!(s.enforce_active_slots(), 0);
    }
}
