//! Production tick and real-time frame advancement.
//!
//! The settlement runs on two decoupled cadences driven from outside:
//!
//! 1. **Frame** ([`Settlement::advance_frame`]) -- continuous quantities
//!    move by the elapsed seconds: relocation cooldowns count down and
//!    strata energy pools refill.
//!
//! 2. **Production tick** ([`Settlement::tick`]) -- the scheduler runs every
//!    module once; each output line is scaled by its building's level and
//!    deposited into the warehouse. Units that do not fit are dropped.
//!
//! Neither cadence touches the grid layout, so connectivity and slots need
//! no recompute afterwards.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use tracing::{debug, info};

use hexstead_types::{HexCoord, ResourceId};
use hexstead_world::production::scale_amount;

use crate::settlement::Settlement;

/// What one production tick produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// Tick number, starting at 1.
    pub tick: u64,
    /// Harvests and captures completed this tick.
    pub cycles: u32,
    /// Units actually stored, per resource.
    pub deposited: BTreeMap<ResourceId, u32>,
    /// Units produced but dropped because the warehouse was full.
    pub dropped: u64,
    /// Buildings whose module failed and produced nothing this tick.
    pub failed: Vec<HexCoord>,
}

impl Settlement {
    /// Run one production tick.
    ///
    /// A module that fails loses only its own output; every other module's
    /// output is still deposited.
    pub fn tick(&mut self) -> TickSummary {
        let scheduled = self
            .scheduler
            .tick(&self.grid, &self.catalog, &self.network);
        self.ticks = self.ticks.saturating_add(1);

        let mut summary = TickSummary {
            tick: self.ticks,
            failed: scheduled.failed,
            ..TickSummary::default()
        };
        for (coord, output) in scheduled.outputs {
            summary.cycles = summary.cycles.saturating_add(output.cycles);
            if output.produced.is_empty() {
                continue;
            }
            let factor = self.output_factor(coord);
            for line in output.produced {
                let amount = scale_amount(line.amount, factor);
                let added = self.wallet.deposit(&line.resource, amount);
                summary.dropped = summary
                    .dropped
                    .saturating_add(u64::from(amount.saturating_sub(added)));
                if added > 0 {
                    let entry = summary.deposited.entry(line.resource).or_insert(0);
                    *entry = entry.saturating_add(added);
                }
            }
        }

        if summary.cycles > 0 || !summary.deposited.is_empty() {
            info!(
                tick = summary.tick,
                cycles = summary.cycles,
                deposited = ?summary.deposited,
                dropped = summary.dropped,
                failed = summary.failed.len(),
                "Production tick"
            );
        } else {
            debug!(tick = summary.tick, "Production tick idle");
        }
        summary
    }

    /// Output multiplier for the building at `coord`:
    /// `1 + (level - 1) * bonus%`.
    pub fn output_factor(&self, coord: HexCoord) -> Decimal {
        let level = self.grid.building(coord).map_or(1, |b| b.level);
        let bonus_percent = u64::from(level.saturating_sub(1))
            .saturating_mul(u64::from(self.config.buildings.output_bonus_percent_per_level));
        let bonus = i64::try_from(bonus_percent).map_or(Decimal::ZERO, |p| Decimal::new(p, 2));
        Decimal::ONE.checked_add(bonus).unwrap_or(Decimal::ONE)
    }

    /// Advance real-time quantities by `dt` seconds.
    pub fn advance_frame(&mut self, dt: Decimal) {
        if dt <= Decimal::ZERO {
            return;
        }
        for (coord, building) in self.grid.buildings_mut() {
            if building.relocation_cooldown <= Decimal::ZERO {
                continue;
            }
            building.relocation_cooldown = building
                .relocation_cooldown
                .checked_sub(dt)
                .unwrap_or(Decimal::ZERO)
                .max(Decimal::ZERO);
            if building.relocation_cooldown == Decimal::ZERO {
                debug!(%coord, building = %building.definition, "Relocation finished");
            }
        }
        self.scheduler.advance_frame(dt);
    }
}
