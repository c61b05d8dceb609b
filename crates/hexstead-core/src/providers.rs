//! External collaborator traits and stock implementations.
//!
//! The settlement consults three collaborators it does not own:
//!
//! - [`BlueprintUnlocks`] -- whether a building's blueprint is discovered.
//!   Town-Hall and Warehouse kinds bypass it.
//! - [`WorldProgression`] -- the highest unlocked world, consulted only when
//!   advancing the settlement tier. A settlement built without one behaves
//!   as if world 1 is unlocked.
//! - [`ProgressSink`] -- fire-and-forget reports of investment points and
//!   credits earned.
//!
//! All three are injected through
//! [`SettlementBuilder`](crate::settlement::SettlementBuilder).

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use hexstead_types::BuildingDefId;

/// Source of blueprint unlock state.
pub trait BlueprintUnlocks: Send {
    /// Whether the blueprint for `building` has been discovered.
    fn is_blueprint_unlocked(&self, building: &BuildingDefId) -> bool;
}

/// Source of world-map progression.
pub trait WorldProgression: Send {
    /// Highest world number the player has unlocked, starting at 1.
    fn highest_unlocked_world(&self) -> u32;
}

/// Receiver of progress reports. Return values are never consumed.
pub trait ProgressSink: Send {
    /// Investment points were earned.
    fn add_investment_points(&mut self, points: u64);

    /// Credits were earned (refunds, tier rewards).
    fn add_credits(&mut self, credits: u64);
}

// ---------------------------------------------------------------------------
// Stock implementations
// ---------------------------------------------------------------------------

/// Every blueprint is unlocked.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllBlueprints;

impl BlueprintUnlocks for AllBlueprints {
    fn is_blueprint_unlocked(&self, _building: &BuildingDefId) -> bool {
        true
    }
}

/// A fixed set of unlocked blueprints.
#[derive(Debug, Clone, Default)]
pub struct BlueprintSet {
    unlocked: BTreeSet<BuildingDefId>,
}

impl BlueprintSet {
    /// A set unlocking exactly `ids`.
    pub fn new<I, T>(ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<BuildingDefId>,
    {
        Self {
            unlocked: ids.into_iter().map(Into::into).collect(),
        }
    }
}

impl BlueprintUnlocks for BlueprintSet {
    fn is_blueprint_unlocked(&self, building: &BuildingDefId) -> bool {
        self.unlocked.contains(building)
    }
}

/// A world progression pinned to one value.
#[derive(Debug, Clone, Copy)]
pub struct FixedWorld(pub u32);

impl WorldProgression for FixedWorld {
    fn highest_unlocked_world(&self) -> u32 {
        self.0
    }
}

/// A sink that discards every report.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn add_investment_points(&mut self, _points: u64) {}

    fn add_credits(&mut self, _credits: u64) {}
}

/// A sink that keeps running totals readable from a cloned handle.
///
/// Clones share the same counters, so a caller can hand one clone to the
/// settlement and read totals from another.
#[derive(Debug, Clone, Default)]
pub struct ProgressTally {
    investment_points: Arc<AtomicU64>,
    credits: Arc<AtomicU64>,
}

impl ProgressTally {
    /// Create a tally at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Investment points reported so far.
    pub fn investment_points(&self) -> u64 {
        self.investment_points.load(Ordering::Relaxed)
    }

    /// Credits reported so far.
    pub fn credits(&self) -> u64 {
        self.credits.load(Ordering::Relaxed)
    }
}

fn saturating_add(counter: &AtomicU64, amount: u64) {
    let _ = counter.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
        Some(current.saturating_add(amount))
    });
}

impl ProgressSink for ProgressTally {
    fn add_investment_points(&mut self, points: u64) {
        saturating_add(&self.investment_points, points);
    }

    fn add_credits(&mut self, credits: u64) {
        saturating_add(&self.credits, credits);
    }
}
