//! Depth-gated unlocking: quarry.
//!
//! Depth only grows through the dig action, never per tick. Each dig costs
//! a fixed amount of energy from a pool that refills in real time (see
//! [`ProductionModule::advance_frame`]). Every published stratum whose
//! depth has been reached adds its output to the per-tick passive yield.
//! Crossing a threshold is reported once, in the dig's outcome.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use hexstead_types::{StrataProfile, Stratum};

use super::{
    ActionOutcome, ModuleAction, ProductionModule, TickContext, TickOutput, decode_state,
    encode_state,
};
use crate::error::WorldError;

const NAME: &str = "strata";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct DigState {
    depth: Decimal,
    energy: Decimal,
}

/// Module for [`StrataProfile`] buildings.
#[derive(Debug, Clone)]
pub struct StrataModule {
    profile: StrataProfile,
    state: DigState,
}

impl StrataModule {
    /// A module at depth 0 with a full energy pool.
    pub const fn new(profile: StrataProfile) -> Self {
        let energy = profile.max_energy;
        Self {
            profile,
            state: DigState {
                depth: Decimal::ZERO,
                energy,
            },
        }
    }

    /// Current depth.
    pub const fn depth(&self) -> Decimal {
        self.state.depth
    }

    /// Energy in the pool.
    pub const fn energy(&self) -> Decimal {
        self.state.energy
    }

    /// Strata reached so far, in profile order.
    pub fn unlocked(&self) -> impl Iterator<Item = &Stratum> {
        let depth = self.state.depth;
        self.profile.strata.iter().filter(move |s| depth >= s.depth)
    }

    fn dig(&mut self) -> Result<ActionOutcome, WorldError> {
        let cost = self.profile.dig_energy_cost;
        if self.state.energy < cost {
            return Err(WorldError::NotEnoughEnergy {
                required: cost,
                available: self.state.energy,
            });
        }

        let before = self.state.depth;
        let after = before
            .checked_add(self.profile.dig_increment)
            .ok_or(WorldError::ArithmeticOverflow)?;
        self.state.energy = self
            .state
            .energy
            .checked_sub(cost)
            .ok_or(WorldError::ArithmeticOverflow)?;
        self.state.depth = after;

        let unlocked: Vec<String> = self
            .profile
            .strata
            .iter()
            .filter(|s| before < s.depth && after >= s.depth)
            .map(|s| {
                if s.label.is_empty() {
                    s.output.resource.to_string()
                } else {
                    s.label.clone()
                }
            })
            .collect();

        for label in &unlocked {
            tracing::info!(depth = %after, stratum = %label, "Stratum unlocked");
        }
        Ok(ActionOutcome::Dug {
            depth: after,
            unlocked,
        })
    }
}

impl ProductionModule for StrataModule {
    fn name(&self) -> &'static str {
        NAME
    }

    fn on_tick(&mut self, ctx: &TickContext<'_>) -> Result<TickOutput, WorldError> {
        if !ctx.building.can_work() {
            return Ok(TickOutput::idle());
        }

        let mut produced = self.profile.passive_output.clone();
        produced.extend(self.unlocked().map(|s| s.output.clone()));
        Ok(TickOutput {
            produced,
            cycles: 0,
        })
    }

    fn advance_frame(&mut self, dt: Decimal) {
        if dt <= Decimal::ZERO {
            return;
        }
        let regen = self
            .profile
            .energy_regen_per_second
            .checked_mul(dt)
            .unwrap_or(self.profile.max_energy);
        self.state.energy = self
            .state
            .energy
            .checked_add(regen)
            .unwrap_or(self.profile.max_energy)
            .min(self.profile.max_energy);
    }

    fn serialized_state(&self) -> Result<String, WorldError> {
        encode_state(NAME, &self.state)
    }

    fn load_serialized_state(&mut self, blob: &str) -> Result<(), WorldError> {
        if let Some(state) = decode_state::<DigState>(NAME, blob)? {
            self.state = DigState {
                depth: state.depth.max(Decimal::ZERO),
                energy: state.energy.clamp(Decimal::ZERO, self.profile.max_energy),
            };
        }
        Ok(())
    }

    fn perform(&mut self, action: ModuleAction) -> Result<ActionOutcome, WorldError> {
        match action {
            ModuleAction::Dig => self.dig(),
            other => Err(WorldError::UnsupportedAction {
                module: NAME,
                action: other.name(),
            }),
        }
    }
}
