//! Single-meter capture: hunter lodge.
//!
//! One progress meter grows by the same additive rule as a plot. When it
//! reaches 1 it resets to 0 and emits the primary and secondary outputs,
//! each scaled by the current focus:
//!
//! | Focus | Primary | Secondary |
//! |-------|---------|-----------|
//! | Balanced | 1.0 | 1.0 |
//! | `FavorPrimary` | 1.5 | 0.5 |
//! | `FavorSecondary` | 0.5 | 1.5 |
//!
//! Scaled amounts round half away from zero.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use hexstead_types::{CaptureFocus, CaptureProfile, ResourceCost};

use super::{
    ActionOutcome, ModuleAction, ProductionModule, TickContext, TickOutput, decode_state,
    encode_state, growth_rate, scale_amount,
};
use crate::error::WorldError;

const NAME: &str = "capture";

/// Multipliers `(primary, secondary)` for a focus setting.
pub const fn focus_multipliers(focus: CaptureFocus) -> (Decimal, Decimal) {
    let one = Decimal::ONE;
    let high = Decimal::from_parts(15, 0, 0, false, 1);
    let low = Decimal::from_parts(5, 0, 0, false, 1);
    match focus {
        CaptureFocus::Balanced => (one, one),
        CaptureFocus::FavorPrimary => (high, low),
        CaptureFocus::FavorSecondary => (low, high),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct MeterState {
    progress: Decimal,
    #[serde(default)]
    focus: CaptureFocus,
}

/// Module for [`CaptureProfile`] buildings.
#[derive(Debug, Clone)]
pub struct CaptureModule {
    profile: CaptureProfile,
    state: MeterState,
}

impl CaptureModule {
    /// A module with an empty meter and balanced focus.
    pub const fn new(profile: CaptureProfile) -> Self {
        Self {
            profile,
            state: MeterState {
                progress: Decimal::ZERO,
                focus: CaptureFocus::Balanced,
            },
        }
    }

    /// Current meter value in `[0, 1)`.
    pub const fn progress(&self) -> Decimal {
        self.state.progress
    }

    /// Current output split.
    pub const fn focus(&self) -> CaptureFocus {
        self.state.focus
    }

    fn capture_bundle(&self) -> Vec<ResourceCost> {
        let (primary, secondary) = focus_multipliers(self.state.focus);
        vec![
            ResourceCost::new(
                self.profile.primary.resource.clone(),
                scale_amount(self.profile.primary.amount, primary),
            ),
            ResourceCost::new(
                self.profile.secondary.resource.clone(),
                scale_amount(self.profile.secondary.amount, secondary),
            ),
        ]
    }
}

impl ProductionModule for CaptureModule {
    fn name(&self) -> &'static str {
        NAME
    }

    fn on_tick(&mut self, ctx: &TickContext<'_>) -> Result<TickOutput, WorldError> {
        if !ctx.building.can_work() {
            return Ok(TickOutput::idle());
        }

        let rate = growth_rate(
            ctx,
            self.profile.base_rate,
            &self.profile.bonuses,
            self.profile.road_bonus,
        )?;
        self.state.progress = self
            .state
            .progress
            .checked_add(rate)
            .ok_or(WorldError::ArithmeticOverflow)?;

        if self.state.progress < Decimal::ONE {
            return Ok(TickOutput::idle());
        }

        self.state.progress = Decimal::ZERO;
        let produced = self.capture_bundle();
        tracing::debug!(
            coord = %ctx.coord,
            focus = ?self.state.focus,
            "Capture completed"
        );
        Ok(TickOutput {
            produced,
            cycles: 1,
        })
    }

    fn serialized_state(&self) -> Result<String, WorldError> {
        encode_state(NAME, &self.state)
    }

    fn load_serialized_state(&mut self, blob: &str) -> Result<(), WorldError> {
        if let Some(state) = decode_state::<MeterState>(NAME, blob)? {
            self.state = state;
        }
        Ok(())
    }

    fn perform(&mut self, action: ModuleAction) -> Result<ActionOutcome, WorldError> {
        match action {
            ModuleAction::SetFocus(focus) => {
                self.state.focus = focus;
                Ok(ActionOutcome::FocusSet(focus))
            }
            other => Err(WorldError::UnsupportedAction {
                module: NAME,
                action: other.name(),
            }),
        }
    }
}
