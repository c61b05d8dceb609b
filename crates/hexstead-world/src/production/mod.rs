//! Building production modules.
//!
//! Every producing building owns one [`ProductionModule`]. The scheduler
//! calls [`ProductionModule::on_tick`] once per production tick with a
//! read-only [`TickContext`]; the module returns the resources it produced
//! and the caller deposits them. Modules never touch the wallet or the grid
//! themselves.
//!
//! # Contract
//!
//! - A module does no work unless its building is active and its
//!   relocation cooldown has run out ([`Building::can_work`]).
//! - Modules must not depend on the order in which the scheduler visits
//!   them.
//! - Continuous quantities (energy) advance in
//!   [`ProductionModule::advance_frame`], driven once per real-time frame,
//!   not per tick.
//! - [`ProductionModule::serialized_state`] returns an opaque JSON blob
//!   that [`ProductionModule::load_serialized_state`] accepts back. An
//!   empty blob leaves the module at its defaults.
//!
//! # Modules
//!
//! - [`multi_plot`] -- independent growth plots (forestry, herbalist)
//! - [`capture`] -- one meter with a focus-controlled output split
//! - [`strata`] -- manually dug depth that unlocks extra outputs

pub mod capture;
pub mod multi_plot;
pub mod strata;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use serde::de::DeserializeOwned;

use hexstead_types::{CaptureFocus, GrowthBonus, HexCoord, ProductionProfile, ResourceCost};

use crate::catalog::Catalog;
use crate::connectivity::adjacent_tile_count_with_tag;
use crate::error::WorldError;
use crate::grid::{Building, Grid};

pub use capture::CaptureModule;
pub use multi_plot::MultiPlotModule;
pub use strata::StrataModule;

/// Read-only view of the world handed to a module each tick.
#[derive(Debug, Clone, Copy)]
pub struct TickContext<'a> {
    /// Cell the building stands on.
    pub coord: HexCoord,
    /// The building itself.
    pub building: &'a Building,
    /// All owned cells, for adjacency queries.
    pub grid: &'a Grid,
    /// Catalog, for resolving neighbor tags.
    pub catalog: &'a Catalog,
    /// Whether the building borders the road network.
    pub road_connected: bool,
}

/// Resources a module produced in one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickOutput {
    /// Produced resource lines. May repeat a resource.
    pub produced: Vec<ResourceCost>,
    /// Growth cycles completed this tick (harvests, captures).
    pub cycles: u32,
}

impl TickOutput {
    /// Output of a tick in which nothing happened.
    pub const fn idle() -> Self {
        Self {
            produced: Vec::new(),
            cycles: 0,
        }
    }

    /// Whether nothing was produced.
    pub fn is_idle(&self) -> bool {
        self.produced.iter().all(|line| line.amount == 0)
    }
}

/// A player-triggered module action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleAction {
    /// Plant the first empty plot.
    Plant,
    /// Change the capture output split.
    SetFocus(CaptureFocus),
    /// Spend energy to dig one increment deeper.
    Dig,
}

impl ModuleAction {
    /// Short action name for errors and logs.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Plant => "plant",
            Self::SetFocus(_) => "set_focus",
            Self::Dig => "dig",
        }
    }
}

/// Result of a successful [`ModuleAction`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// A plot was planted.
    Planted {
        /// Index of the planted plot.
        plot: usize,
    },
    /// The focus changed.
    FocusSet(CaptureFocus),
    /// A dig completed.
    Dug {
        /// Depth after the dig.
        depth: Decimal,
        /// Labels of strata crossed by this dig. Each appears at most once
        /// over the life of the module.
        unlocked: Vec<String>,
    },
}

/// Per-building growth state machine.
pub trait ProductionModule: core::fmt::Debug + Send {
    /// Short module name (`multi_plot`, `capture`, `strata`).
    fn name(&self) -> &'static str;

    /// Advance one production tick.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::ArithmeticOverflow`] if growth overflows.
    fn on_tick(&mut self, ctx: &TickContext<'_>) -> Result<TickOutput, WorldError>;

    /// Advance continuous real-time quantities by `dt` seconds.
    fn advance_frame(&mut self, _dt: Decimal) {}

    /// Encode the module's mutable state as an opaque blob.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidModuleState`] if encoding fails.
    fn serialized_state(&self) -> Result<String, WorldError>;

    /// Restore state from a blob produced by
    /// [`ProductionModule::serialized_state`]. An empty blob is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidModuleState`] if the blob does not
    /// decode. The module keeps its previous state in that case.
    fn load_serialized_state(&mut self, blob: &str) -> Result<(), WorldError>;

    /// Apply a player action.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UnsupportedAction`] unless the module handles
    /// `action`, or the module-specific rejection.
    fn perform(&mut self, action: ModuleAction) -> Result<ActionOutcome, WorldError> {
        Err(WorldError::UnsupportedAction {
            module: self.name(),
            action: action.name(),
        })
    }
}

/// Build the module for a production profile.
pub fn create_module(profile: &ProductionProfile) -> Box<dyn ProductionModule> {
    match profile {
        ProductionProfile::MultiPlot(p) => Box::new(MultiPlotModule::new(p.clone())),
        ProductionProfile::Capture(p) => Box::new(CaptureModule::new(p.clone())),
        ProductionProfile::Strata(p) => Box::new(StrataModule::new(p.clone())),
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Progress added per tick: `base + sum(adjacent tag count * per_tile)`,
/// plus `road_bonus` when the building is road-connected.
pub fn growth_rate(
    ctx: &TickContext<'_>,
    base: Decimal,
    bonuses: &[GrowthBonus],
    road_bonus: Decimal,
) -> Result<Decimal, WorldError> {
    let mut rate = base;
    for bonus in bonuses {
        let count = adjacent_tile_count_with_tag(ctx.grid, ctx.catalog, ctx.coord, &bonus.tag);
        let add = Decimal::from(count)
            .checked_mul(bonus.per_tile)
            .ok_or(WorldError::ArithmeticOverflow)?;
        rate = rate.checked_add(add).ok_or(WorldError::ArithmeticOverflow)?;
    }
    if ctx.road_connected {
        rate = rate
            .checked_add(road_bonus)
            .ok_or(WorldError::ArithmeticOverflow)?;
    }
    Ok(rate)
}

/// `amount * factor`, rounded half away from zero, floored at 0.
pub fn scale_amount(amount: u32, factor: Decimal) -> u32 {
    Decimal::from(amount)
        .checked_mul(factor)
        .map(|v| v.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|v| v.max(Decimal::ZERO).to_u32())
        .unwrap_or(u32::MAX)
}

pub(crate) fn encode_state<T: Serialize>(module: &'static str, state: &T) -> Result<String, WorldError> {
    serde_json::to_string(state).map_err(|e| WorldError::InvalidModuleState {
        module,
        reason: e.to_string(),
    })
}

pub(crate) fn decode_state<T: DeserializeOwned>(
    module: &'static str,
    blob: &str,
) -> Result<Option<T>, WorldError> {
    if blob.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(blob)
        .map(Some)
        .map_err(|e| WorldError::InvalidModuleState {
            module,
            reason: e.to_string(),
        })
}


#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn scale_rounds_half_away_from_zero() {
        assert_eq!(scale_amount(3, dec!(1.5)), 5);
        assert_eq!(scale_amount(3, dec!(0.5)), 2);
        assert_eq!(scale_amount(4, dec!(0.5)), 2);
        assert_eq!(scale_amount(1, dec!(0.4)), 0);
        assert_eq!(scale_amount(7, Decimal::ONE), 7);
    }

    #[test]
    fn growth_rate_adds_adjacency_and_road_bonus() {
        let grid = test_support::grid("forester", 2);
        let catalog = test_support::catalog();
        let building = Building::new("forester".into(), true, true);
        let mut ctx = TickContext {
            coord: HexCoord::ORIGIN,
            building: &building,
            grid: &grid,
            catalog: &catalog,
            road_connected: false,
        };
        let bonuses = [GrowthBonus {
            tag: String::from("forest"),
            per_tile: dec!(0.02),
        }];
        assert_eq!(growth_rate(&ctx, dec!(0.1), &bonuses, dec!(0.05)).ok(), Some(dec!(0.14)));
        ctx.road_connected = true;
        assert_eq!(growth_rate(&ctx, dec!(0.1), &bonuses, dec!(0.05)).ok(), Some(dec!(0.19)));
    }

    #[test]
    fn empty_blob_decodes_to_none() {
        let decoded: Result<Option<Vec<u32>>, WorldError> = decode_state("test", "  ");
        assert!(matches!(decoded, Ok(None)));
        let bad: Result<Option<Vec<u32>>, WorldError> = decode_state("test", "{nope");
        assert!(matches!(bad, Err(WorldError::InvalidModuleState { .. })));
    }
}
