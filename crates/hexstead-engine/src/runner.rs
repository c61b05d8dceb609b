//! Session loop with frame and production-tick cadences.
//!
//! [`run_session`] drives a [`Settlement`] from two `tokio` intervals on a
//! single task: frames advance cooldowns and energy, ticks run production.
//! Notifications are drained after every tick and written to the log,
//! which is the headless stand-in for toasts. The loop ends when the tick
//! limit is reached or the shutdown future completes.

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use rust_decimal::Decimal;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};

use hexstead_core::config::TimingConfig;
use hexstead_core::{NotificationKind, Settlement, TickSummary};

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEndReason {
    /// The configured tick limit was reached.
    MaxTicksReached,
    /// The shutdown signal fired.
    Shutdown,
}

/// Result of a session.
#[derive(Debug)]
pub struct SessionResult {
    /// Why the session ended.
    pub end_reason: SessionEndReason,
    /// Summary of the last tick, if any tick ran.
    pub final_summary: Option<TickSummary>,
    /// Ticks run this session.
    pub total_ticks: u64,
    /// Autosaves written this session.
    pub autosaves: u64,
}

/// Run frames and ticks until the tick limit or `shutdown`.
///
/// Autosaves go to `save_path` every `timing.autosave_every_ticks` ticks.
/// A failed autosave is logged and the session continues.
pub async fn run_session<F>(
    settlement: &mut Settlement,
    timing: &TimingConfig,
    save_path: Option<&Path>,
    shutdown: F,
) -> SessionResult
where
    F: Future<Output = ()>,
{
    let mut frames = interval(Duration::from_millis(timing.frame_interval_ms.max(1)));
    frames.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut ticks = interval(Duration::from_millis(timing.tick_interval_ms.max(1)));
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // Both intervals fire immediately once; the first real tick waits a period.
    frames.tick().await;
    ticks.tick().await;

    let frame_dt = frame_seconds(timing.frame_interval_ms);
    let mut result = SessionResult {
        end_reason: SessionEndReason::Shutdown,
        final_summary: None,
        total_ticks: 0,
        autosaves: 0,
    };
    tokio::pin!(shutdown);

    info!(
        tick_interval_ms = timing.tick_interval_ms,
        frame_interval_ms = timing.frame_interval_ms,
        max_ticks = timing.max_ticks,
        autosave_every_ticks = timing.autosave_every_ticks,
        "Session starting"
    );

    loop {
        tokio::select! {
            biased;

            () = &mut shutdown => {
                info!("Shutdown requested");
                result.end_reason = SessionEndReason::Shutdown;
                return result;
            }

            _ = frames.tick() => {
                settlement.advance_frame(frame_dt);
            }

            _ = ticks.tick() => {
                let summary = settlement.tick();
                result.total_ticks = result.total_ticks.saturating_add(1);
                publish_notifications(settlement);

                if let Some(path) = save_path
                    && autosave_due(timing, result.total_ticks)
                {
                    match settlement.save_to_file(path) {
                        Ok(()) => result.autosaves = result.autosaves.saturating_add(1),
                        Err(e) => warn!(error = %e, path = %path.display(), "Autosave failed"),
                    }
                }

                let limit_reached = timing.max_ticks > 0 && result.total_ticks >= timing.max_ticks;
                result.final_summary = Some(summary);
                if limit_reached {
                    info!(
                        total_ticks = result.total_ticks,
                        max_ticks = timing.max_ticks,
                        "Tick limit reached"
                    );
                    result.end_reason = SessionEndReason::MaxTicksReached;
                    return result;
                }
            }
        }
    }
}

/// Log the end of a session.
pub fn log_session_end(result: &SessionResult, settlement: &Settlement) {
    info!(
        reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        autosaves = result.autosaves,
        tier = settlement.tier(),
        credits = settlement.credits(),
        tiles = settlement.grid().len(),
        "Session ended"
    );
    if result.final_summary.is_none() {
        warn!("Session ended with no ticks executed");
    }
}

fn autosave_due(timing: &TimingConfig, total_ticks: u64) -> bool {
    total_ticks
        .checked_rem(timing.autosave_every_ticks)
        .is_some_and(|rem| rem == 0)
}

fn frame_seconds(frame_interval_ms: u64) -> Decimal {
    i64::try_from(frame_interval_ms).map_or(Decimal::ZERO, |ms| Decimal::new(ms, 3))
}

fn publish_notifications(settlement: &mut Settlement) {
    for notification in settlement.drain_notifications() {
        match notification.kind {
            NotificationKind::Milestone => info!(message = %notification.message, "Milestone"),
            NotificationKind::Warning => warn!(message = %notification.message, "Warning"),
            NotificationKind::Rejected => debug!(message = %notification.message, "Rejected"),
        }
    }
}
