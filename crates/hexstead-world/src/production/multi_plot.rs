//! Multi-plot growth: forestry, herbalist.
//!
//! The building has a fixed number of plots. Each planted plot carries a
//! progress value in `[0, 1)`. Every working tick adds the growth rate to
//! every planted plot; a plot reaching 1 is harvested for the profile's
//! bundle and then either restarts at 0 (auto-replant) or becomes empty
//! until the player plants it again.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use hexstead_types::MultiPlotProfile;

use super::{
    ActionOutcome, ModuleAction, ProductionModule, TickContext, TickOutput, decode_state,
    encode_state, growth_rate,
};
use crate::error::WorldError;

const NAME: &str = "multi_plot";

/// Serialized plot progress. `None` is an empty plot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct PlotState {
    plots: Vec<Option<Decimal>>,
}

/// Module for [`MultiPlotProfile`] buildings.
#[derive(Debug, Clone)]
pub struct MultiPlotModule {
    profile: MultiPlotProfile,
    plots: Vec<Option<Decimal>>,
}

impl MultiPlotModule {
    /// A module with every plot freshly planted.
    pub fn new(profile: MultiPlotProfile) -> Self {
        let count = usize::try_from(profile.plots).unwrap_or(0);
        Self {
            profile,
            plots: vec![Some(Decimal::ZERO); count],
        }
    }

    /// Progress of each plot; `None` for empty plots.
    pub fn plots(&self) -> &[Option<Decimal>] {
        &self.plots
    }
}

impl ProductionModule for MultiPlotModule {
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

        let mut output = TickOutput::idle();
        for plot in &mut self.plots {
            let Some(progress) = plot.as_mut() else {
                continue;
            };
            *progress = progress
                .checked_add(rate)
                .ok_or(WorldError::ArithmeticOverflow)?;
            if *progress >= Decimal::ONE {
                output.produced.extend(self.profile.harvest.iter().cloned());
                output.cycles = output.cycles.saturating_add(1);
                *plot = self.profile.auto_replant.then_some(Decimal::ZERO);
            }
        }

        if output.cycles > 0 {
            tracing::debug!(
                coord = %ctx.coord,
                harvested = output.cycles,
                "Plots harvested"
            );
        }
        Ok(output)
    }

    fn serialized_state(&self) -> Result<String, WorldError> {
        encode_state(
            NAME,
            &PlotState {
                plots: self.plots.clone(),
            },
        )
    }

    fn load_serialized_state(&mut self, blob: &str) -> Result<(), WorldError> {
        let Some(state) = decode_state::<PlotState>(NAME, blob)? else {
            return Ok(());
        };
        let count = usize::try_from(self.profile.plots).unwrap_or(0);
        let mut plots: Vec<Option<Decimal>> = state
            .plots
            .into_iter()
            .map(|plot| plot.map(|progress| progress.clamp(Decimal::ZERO, Decimal::ONE)))
            .collect();
        plots.resize(count, Some(Decimal::ZERO));
        self.plots = plots;
        Ok(())
    }

    fn perform(&mut self, action: ModuleAction) -> Result<ActionOutcome, WorldError> {
        match action {
            ModuleAction::Plant => {
                let (index, plot) = self
                    .plots
                    .iter_mut()
                    .enumerate()
                    .find(|(_, plot)| plot.is_none())
                    .ok_or(WorldError::NoEmptyPlot)?;
                *plot = Some(Decimal::ZERO);
                Ok(ActionOutcome::Planted { plot: index })
            }
            other => Err(WorldError::UnsupportedAction {
                module: NAME,
                action: other.name(),
            }),
        }
    }
}
