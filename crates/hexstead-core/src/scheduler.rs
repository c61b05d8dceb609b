//! Production scheduler.
//!
//! Holds nothing but the registered production modules, keyed by the
//! coordinate of the building they drive. On each production tick every
//! module runs once, synchronously, in registration order. That order is an
//! implementation detail: modules read only their own building and the
//! shared, immutable grid, so no module can observe another's tick.
//!
//! Cooldowns and energy pools advance per real-time frame through
//! [`ProductionScheduler::advance_frame`], not per tick.

use rust_decimal::Decimal;

use hexstead_types::HexCoord;
use hexstead_world::{Catalog, Grid, ProductionModule, RoadNetwork, TickContext, TickOutput};

/// Outputs of one scheduler pass.
#[derive(Debug, Default)]
pub struct ScheduledTick {
    /// Output of every module that ran, in registration order.
    pub outputs: Vec<(HexCoord, TickOutput)>,
    /// Coordinates whose module failed this tick.
    pub failed: Vec<HexCoord>,
}

/// A module bound to the building at `coord`.
#[derive(Debug)]
struct Registration {
    coord: HexCoord,
    module: Box<dyn ProductionModule>,
}

/// Ordered list of production modules.
#[derive(Debug, Default)]
pub struct ProductionScheduler {
    modules: Vec<Registration>,
}

impl ProductionScheduler {
    /// Create an empty scheduler.
    pub const fn new() -> Self {
        Self {
            modules: Vec::new(),
        }
    }

    /// Append `module` for the building at `coord`, replacing any module
    /// already registered there.
    pub fn register(&mut self, coord: HexCoord, module: Box<dyn ProductionModule>) {
        if self.unregister(coord).is_some() {
            tracing::warn!(%coord, "Replacing production module already registered at coordinate");
        }
        self.modules.push(Registration { coord, module });
    }

    /// Remove and return the module at `coord`.
    pub fn unregister(&mut self, coord: HexCoord) -> Option<Box<dyn ProductionModule>> {
        let index = self.modules.iter().position(|r| r.coord == coord)?;
        Some(self.modules.remove(index).module)
    }

    /// Rebind the module at `from` to `to`, keeping its place in the order.
    pub fn relocate(&mut self, from: HexCoord, to: HexCoord) -> bool {
        match self.modules.iter_mut().find(|r| r.coord == from) {
            Some(registration) => {
                registration.coord = to;
                true
            }
            None => false,
        }
    }

    /// The module at `coord`.
    pub fn module(&self, coord: HexCoord) -> Option<&dyn ProductionModule> {
        self.modules
            .iter()
            .find(|r| r.coord == coord)
            .map(|r| r.module.as_ref())
    }

    /// Mutable access to the module at `coord`.
    pub fn module_mut(&mut self, coord: HexCoord) -> Option<&mut (dyn ProductionModule + 'static)> {
        self.modules
            .iter_mut()
            .find(|r| r.coord == coord)
            .map(|r| r.module.as_mut())
    }

    /// Registered coordinates in registration order.
    pub fn coords(&self) -> impl Iterator<Item = HexCoord> + '_ {
        self.modules.iter().map(|r| r.coord)
    }

    /// Number of registered modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether no module is registered.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Run one production tick over every module.
    ///
    /// Outputs come back with their coordinate, idle outputs included, in
    /// registration order. A module whose building has vanished from the
    /// grid is skipped. A module that fails is logged and listed in
    /// [`ScheduledTick::failed`]; the rest of the tick still runs.
    pub fn tick(&mut self, grid: &Grid, catalog: &Catalog, network: &RoadNetwork) -> ScheduledTick {
        let mut result = ScheduledTick {
            outputs: Vec::with_capacity(self.modules.len()),
            failed: Vec::new(),
        };
        for registration in &mut self.modules {
            let Some(building) = grid.building(registration.coord) else {
                tracing::warn!(
                    coord = %registration.coord,
                    module = registration.module.name(),
                    "Registered module has no building, skipping"
                );
                continue;
            };
            let ctx = TickContext {
                coord: registration.coord,
                building,
                grid,
                catalog,
                road_connected: network.is_connected(registration.coord),
            };
            match registration.module.on_tick(&ctx) {
                Ok(output) => result.outputs.push((registration.coord, output)),
                Err(e) => {
                    tracing::warn!(
                        coord = %registration.coord,
                        module = registration.module.name(),
                        error = %e,
                        "Production module failed, skipping this tick"
                    );
                    result.failed.push(registration.coord);
                }
            }
        }
        result
    }

    /// Advance every module's real-time state by `dt` seconds.
    pub fn advance_frame(&mut self, dt: Decimal) {
        for registration in &mut self.modules {
            registration.module.advance_frame(dt);
        }
    }

    /// Drop every module.
    pub fn clear(&mut self) {
        self.modules.clear();
    }
}

#[cfg(test)]
mod tests {
    use hexstead_types::{CaptureProfile, ProductionProfile, ResourceCost, StyleId};
    use hexstead_world::{Building, WorldError, create_module, starting_catalog};
    use rust_decimal_macros::dec;

    use super::*;

    fn capture() -> ProductionProfile {
        ProductionProfile::Capture(CaptureProfile {
            base_rate: dec!(0.5),
            bonuses: Vec::new(),
            road_bonus: Decimal::ZERO,
            primary: ResourceCost::new("meat", 2),
            secondary: ResourceCost::new("hides", 1),
        })
    }

    /// Module whose growth always overflows.
    #[derive(Debug)]
    struct Overflowing;

    impl ProductionModule for Overflowing {
        fn name(&self) -> &'static str {
            "overflowing"
        }

        fn on_tick(&mut self, _ctx: &TickContext<'_>) -> Result<TickOutput, WorldError> {
            Err(WorldError::ArithmeticOverflow)
        }

        fn serialized_state(&self) -> Result<String, WorldError> {
            Ok(String::new())
        }

        fn load_serialized_state(&mut self, _blob: &str) -> Result<(), WorldError> {
            Ok(())
        }
    }

    #[allow(clippy::unwrap_used)]
    fn world() -> (Grid, Catalog) {
        let catalog = starting_catalog().unwrap();
        let mut grid = Grid::new();
        for coord in [HexCoord::ORIGIN, HexCoord::new(1, 0), HexCoord::new(-1, 0)] {
            grid.claim(coord, StyleId::new("grass")).unwrap();
        }
        for coord in [HexCoord::new(1, 0), HexCoord::new(-1, 0)] {
            grid.place_building(coord, Building::new("hunter_lodge".into(), true, true))
                .unwrap();
        }
        (grid, catalog)
    }

    #[test]
    fn ticks_in_registration_order() {
        let (grid, catalog) = world();
        let network = RoadNetwork::new(HexCoord::ORIGIN);
        let mut scheduler = ProductionScheduler::new();
        scheduler.register(HexCoord::new(1, 0), create_module(&capture()));
        scheduler.register(HexCoord::new(-1, 0), create_module(&capture()));

        let first = scheduler.tick(&grid, &catalog, &network).outputs;
        let order: Vec<HexCoord> = first.iter().map(|(c, _)| *c).collect();
        assert_eq!(order, vec![HexCoord::new(1, 0), HexCoord::new(-1, 0)]);
        assert!(first.iter().all(|(_, out)| out.is_idle()));

        let second = scheduler.tick(&grid, &catalog, &network).outputs;
        assert!(second.iter().all(|(_, out)| out.cycles == 1));
    }

    #[test]
    fn skips_modules_without_building() {
        let (grid, catalog) = world();
        let network = RoadNetwork::new(HexCoord::ORIGIN);
        let mut scheduler = ProductionScheduler::new();
        scheduler.register(HexCoord::new(5, 5), create_module(&capture()));
        let ticked = scheduler.tick(&grid, &catalog, &network);
        assert!(ticked.outputs.is_empty());
        assert!(ticked.failed.is_empty());
    }

    #[test]
    fn relocate_keeps_order_and_register_replaces() {
        let mut scheduler = ProductionScheduler::new();
        scheduler.register(HexCoord::new(1, 0), create_module(&capture()));
        scheduler.register(HexCoord::new(2, 0), create_module(&capture()));
        assert!(scheduler.relocate(HexCoord::new(1, 0), HexCoord::new(0, 1)));
        assert!(!scheduler.relocate(HexCoord::new(9, 9), HexCoord::new(0, 2)));
        assert_eq!(
            scheduler.coords().collect::<Vec<_>>(),
            vec![HexCoord::new(0, 1), HexCoord::new(2, 0)]
        );

        scheduler.register(HexCoord::new(0, 1), create_module(&capture()));
        assert_eq!(scheduler.len(), 2);
        assert!(scheduler.unregister(HexCoord::new(2, 0)).is_some());
        assert!(scheduler.module(HexCoord::new(2, 0)).is_none());
    }

    #[test]
    fn failing_module_does_not_cost_others_their_output() {
        let (grid, catalog) = world();
        let network = RoadNetwork::new(HexCoord::ORIGIN);
        let mut scheduler = ProductionScheduler::new();
        scheduler.register(HexCoord::new(1, 0), create_module(&capture()));
        scheduler.register(HexCoord::new(-1, 0), Box::new(Overflowing));

        let _ = scheduler.tick(&grid, &catalog, &network);
        let second = scheduler.tick(&grid, &catalog, &network);
        assert_eq!(second.failed, vec![HexCoord::new(-1, 0)]);
        assert_eq!(second.outputs.len(), 1);
        assert_eq!(
            second.outputs.first().map(|(c, out)| (*c, out.cycles)),
            Some((HexCoord::new(1, 0), 1))
        );
    }
}
