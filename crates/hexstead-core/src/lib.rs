//! Placement engine, production scheduling, tick cycle, and save codec for
//! the Hexstead simulation.
//!
//! This crate owns the [`Settlement`] aggregate: every player operation
//! validates against the catalog, tier caps, and wallet before mutating,
//! and either succeeds completely or returns a [`Rejection`] that is also
//! queued as a toast on the notification outbox.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `hexstead-config.yaml` into
//!   strongly-typed structs.
//! - [`error`] -- [`Rejection`], the reason a player operation was refused.
//! - [`events`] -- Notification outbox drained by the presentation layer.
//! - [`persistence`] -- Versioned JSON save documents, migration chain, and
//!   atomic file writes.
//! - [`placement`] -- Edit modes, selection, and tile/building placement,
//!   repaint, upgrade, and removal.
//! - [`progression`] -- Tier advancement, relocation, activation, level and
//!   warehouse upgrades, and module actions.
//! - [`providers`] -- Blueprint, world-progression, and progress-sink seams
//!   with stock implementations.
//! - [`scheduler`] -- [`ProductionScheduler`] owning one module per
//!   producing building.
//! - [`settlement`] -- The [`Settlement`] aggregate and its builder.
//! - [`tick`] -- Production tick and real-time frame advancement.
//!
//! [`ProductionScheduler`]: scheduler::ProductionScheduler

pub mod config;
pub mod error;
pub mod events;
pub mod persistence;
pub mod placement;
pub mod progression;
pub mod providers;
pub mod scheduler;
pub mod settlement;
pub mod tick;

pub use config::{ConfigError, SettlementConfig};
pub use error::Rejection;
pub use events::{Notification, NotificationKind, Outbox};
pub use persistence::{CURRENT_SAVE_VERSION, MigrationReport, PersistenceError, SaveSnapshot};
pub use placement::Selection;
pub use providers::{
    AllBlueprints, BlueprintSet, BlueprintUnlocks, FixedWorld, NullSink, ProgressSink,
    ProgressTally, WorldProgression,
};
pub use settlement::{Settlement, SettlementBuilder};
pub use tick::TickSummary;
