//! Versioned JSON save codec.
//!
//! A [`SaveSnapshot`] is the camelCase JSON document written to disk. Older
//! documents are upgraded by a chain of [`MigrationStep`]s before they are
//! applied; each step bumps the version by one and strips the fields that
//! version could not have recorded. Documents from a newer build are
//! rejected.
//!
//! Loading rebuilds the grid, wallet, and production modules into locals
//! first and swaps them in only when everything succeeded, so a failed load
//! leaves the live settlement untouched. Derived state (tile budget, road
//! connectivity, active slots) is recomputed rather than trusted.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use hexstead_ledger::{Wallet, Warehouse};
use hexstead_types::{BuildingDefId, BuildingKind, HexCoord, ResourceId, StyleId, TileCategory};
use hexstead_world::starting_catalog::TOWN_HALL;
use hexstead_world::{Grid, MAX_TILE_TIER, WorldError, capacity};

use crate::scheduler::ProductionScheduler;
use crate::settlement::{Settlement, instantiate};

/// Save format version written by this build.
pub const CURRENT_SAVE_VERSION: u32 = 3;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur when saving or loading.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    /// The document is not valid save JSON.
    #[error("malformed save: {source}")]
    Json {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },

    /// The document was written by a newer build.
    #[error("save version {found} is newer than the supported version {supported}")]
    UnsupportedVersion {
        /// Version found in the document.
        found: u32,
        /// Highest version this build reads.
        supported: u32,
    },

    /// Reading or writing the save file failed.
    #[error("save file I/O failed: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Rebuilding the world from the document failed.
    #[error("failed to rebuild settlement: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// The persisted settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveSnapshot {
    /// Format version. Documents without one are treated as version 0.
    #[serde(default)]
    pub save_version: u32,
    /// Tile budget at save time. Informational; re-derived on load.
    #[serde(default)]
    pub tiles_left: u32,
    /// Credit balance.
    #[serde(default)]
    pub credits: u64,
    /// Settlement tier.
    #[serde(default = "default_level")]
    pub town_hall_level: u32,
    /// Warehouse level.
    #[serde(default = "default_level")]
    pub warehouse_level: u32,
    /// Stored resources.
    #[serde(default)]
    pub warehouse: Vec<SavedStack>,
    /// Owned cells.
    #[serde(default)]
    pub tiles: Vec<SavedTile>,
    /// Placed buildings.
    #[serde(default)]
    pub buildings: Vec<SavedBuilding>,
    /// Accumulated investment points.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub investment_points: Option<u64>,
    /// When the document was written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

/// One warehouse stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedStack {
    /// Resource id.
    pub id: ResourceId,
    /// Units stored.
    pub amount: u32,
}

/// One owned cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedTile {
    /// Axial column.
    pub q: i32,
    /// Axial row.
    pub r: i32,
    /// Painted style id.
    pub style_name: StyleId,
    /// Tile tier.
    #[serde(default)]
    pub tier: u8,
}

/// One placed building.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedBuilding {
    /// Axial column.
    pub q: i32,
    /// Axial row.
    pub r: i32,
    /// Building definition id.
    pub building_name: BuildingDefId,
    /// Activation flag (version 2 and later).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    /// Upgrade level (version 2 and later).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    /// Opaque production-module state (version 3 and later).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

const fn default_level() -> u32 {
    1
}

// ---------------------------------------------------------------------------
// Migration
// ---------------------------------------------------------------------------

/// One version bump in the migration chain.
pub struct MigrationStep {
    /// Version this step upgrades from.
    pub from_version: u32,
    /// What changed in the next version.
    pub description: &'static str,
    /// Adjusts the document. The version bump is applied by [`migrate`].
    pub migrate_fn: fn(&mut SaveSnapshot),
}

/// What a migration did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    /// Version of the document as read.
    pub original_version: u32,
    /// Version after migration.
    pub final_version: u32,
    /// Number of steps applied.
    pub steps_applied: u32,
    /// Description of each applied step, in order.
    pub step_descriptions: Vec<&'static str>,
}

/// The full chain, one step per version transition.
pub fn migration_steps() -> Vec<MigrationStep> {
    vec![
        MigrationStep {
            from_version: 0,
            description: "Legacy unversioned save -> v1 baseline",
            migrate_fn: |_save| {},
        },
        MigrationStep {
            from_version: 1,
            description: "Add building activation and level",
            migrate_fn: |save| {
                for building in &mut save.buildings {
                    building.is_active = None;
                    building.level = None;
                    building.state = None;
                }
            },
        },
        MigrationStep {
            from_version: 2,
            description: "Add production module state",
            migrate_fn: |save| {
                for building in &mut save.buildings {
                    building.state = None;
                }
            },
        },
    ]
}

/// Upgrade `snapshot` in place to [`CURRENT_SAVE_VERSION`].
///
/// # Errors
///
/// Returns [`PersistenceError::UnsupportedVersion`] for documents newer than
/// this build.
pub fn migrate(snapshot: &mut SaveSnapshot) -> Result<MigrationReport, PersistenceError> {
    let original_version = snapshot.save_version;
    if original_version > CURRENT_SAVE_VERSION {
        return Err(PersistenceError::UnsupportedVersion {
            found: original_version,
            supported: CURRENT_SAVE_VERSION,
        });
    }

    let mut step_descriptions = Vec::new();
    for step in migration_steps() {
        if step.from_version == snapshot.save_version {
            (step.migrate_fn)(snapshot);
            snapshot.save_version = snapshot.save_version.saturating_add(1);
            step_descriptions.push(step.description);
            debug!(
                from = step.from_version,
                to = snapshot.save_version,
                step = step.description,
                "Applied save migration"
            );
        }
    }

    Ok(MigrationReport {
        original_version,
        final_version: snapshot.save_version,
        steps_applied: u32::try_from(step_descriptions.len()).unwrap_or(u32::MAX),
        step_descriptions,
    })
}

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

/// Write `data` to `path` through a temporary sibling file and a rename, so
/// a crash mid-write never truncates the existing save.
pub fn write_atomic(path: &Path, data: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = Path::new(&tmp_name);

    let mut file = File::create(tmp_path)?;
    file.write_all(data)?;
    file.sync_all()?;
    fs::rename(tmp_path, path)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Save
// ---------------------------------------------------------------------------

impl Settlement {
    /// Capture the settlement as a current-version document.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::World`] if a module cannot encode its
    /// state.
    pub fn save_snapshot(&self) -> Result<SaveSnapshot, PersistenceError> {
        let tiles = self
            .grid
            .cells()
            .map(|(coord, cell)| SavedTile {
                q: coord.q,
                r: coord.r,
                style_name: cell.style.clone(),
                tier: cell.tier,
            })
            .collect();

        let buildings = self
            .grid
            .buildings()
            .map(|(coord, building)| {
                let state = self
                    .scheduler
                    .module(coord)
                    .map(|module| module.serialized_state())
                    .transpose()?;
                Ok(SavedBuilding {
                    q: coord.q,
                    r: coord.r,
                    building_name: building.definition.clone(),
                    is_active: Some(building.active),
                    level: Some(building.level),
                    state,
                })
            })
            .collect::<Result<Vec<_>, WorldError>>()?;

        let warehouse = self
            .wallet
            .warehouse()
            .stacks()
            .map(|(id, amount)| SavedStack {
                id: id.clone(),
                amount,
            })
            .collect();

        Ok(SaveSnapshot {
            save_version: CURRENT_SAVE_VERSION,
            tiles_left: self.tiles_left,
            credits: self.wallet.credits(),
            town_hall_level: self.tier,
            warehouse_level: self.wallet.warehouse().level(),
            warehouse,
            tiles,
            buildings,
            investment_points: Some(self.investment_points),
            saved_at: Some(Utc::now()),
        })
    }

    /// Serialize the settlement as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, PersistenceError> {
        Ok(serde_json::to_string_pretty(&self.save_snapshot()?)?)
    }

    /// Write the settlement to `path` atomically.
    pub fn save_to_file(&self, path: &Path) -> Result<(), PersistenceError> {
        let json = self.to_json()?;
        write_atomic(path, json.as_bytes())?;
        info!(
            path = %path.display(),
            tiles = self.grid.len(),
            buildings = self.grid.building_count(),
            "Settlement saved"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

impl Settlement {
    /// Replace the live settlement with the contents of a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if the document is malformed or too
    /// new. The live settlement is unchanged in that case.
    pub fn load_json(&mut self, json: &str) -> Result<MigrationReport, PersistenceError> {
        let snapshot: SaveSnapshot = serde_json::from_str(json)?;
        self.load_snapshot(snapshot)
    }

    /// Replace the live settlement with the save file at `path`.
    pub fn load_from_file(&mut self, path: &Path) -> Result<MigrationReport, PersistenceError> {
        let json = fs::read_to_string(path)?;
        let report = self.load_json(&json)?;
        info!(
            path = %path.display(),
            version = report.original_version,
            migrations = report.steps_applied,
            "Settlement loaded"
        );
        Ok(report)
    }

    /// Replace the live settlement with `snapshot`.
    ///
    /// Unknown styles load as the default style, unknown buildings are
    /// dropped, and a missing origin cell or Town Hall is restored. Cells
    /// beyond the tier's tile cap are dropped in document order.
    pub fn load_snapshot(
        &mut self,
        mut snapshot: SaveSnapshot,
    ) -> Result<MigrationReport, PersistenceError> {
        let report = migrate(&mut snapshot)?;
        let tier = capacity::clamp_tier(snapshot.town_hall_level);
        let grid = self.rebuild_grid(&snapshot, tier)?;
        let (grid, scheduler) = self.rebuild_buildings(&snapshot, grid)?;

        let economy = &self.config.economy;
        let mut wallet = Wallet::new(
            snapshot.credits,
            Warehouse::new(snapshot.warehouse_level, economy.warehouse_capacities.clone()),
        );
        for stack in snapshot.warehouse {
            wallet.warehouse_mut().restore(stack.id, stack.amount);
        }

        self.placed = grid.buildings().map(|(_, b)| b.definition.clone()).collect();
        self.grid = grid;
        self.scheduler = scheduler;
        self.wallet = wallet;
        self.tier = tier;
        self.investment_points = snapshot.investment_points.unwrap_or(0);
        self.ticks = 0;
        self.sync_town_hall_level();
        self.refresh();

        if self.tiles_left != snapshot.tiles_left {
            debug!(
                saved = snapshot.tiles_left,
                derived = self.tiles_left,
                "Re-derived tile budget differs from save"
            );
        }
        info!(
            tier = self.tier,
            tiles = self.grid.len(),
            buildings = self.grid.building_count(),
            credits = self.wallet.credits(),
            "Settlement state restored"
        );
        Ok(report)
    }

    fn rebuild_grid(&self, snapshot: &SaveSnapshot, tier: u32) -> Result<Grid, WorldError> {
        let origin = self.network.origin();
        let cap = usize::try_from(capacity::tile_cap(tier)).unwrap_or(usize::MAX);
        let mut grid = Grid::new();

        let saved_origin = snapshot
            .tiles
            .iter()
            .find(|t| HexCoord::new(t.q, t.r) == origin);
        if saved_origin.is_none() {
            warn!(%origin, "Save has no origin tile, restoring it");
        }
        let ordered = saved_origin.into_iter().chain(
            snapshot
                .tiles
                .iter()
                .filter(|t| HexCoord::new(t.q, t.r) != origin),
        );
        if saved_origin.is_none() {
            grid.claim(origin, self.catalog.default_style().id.clone())?;
        }

        let mut dropped = 0usize;
        for tile in ordered {
            let coord = HexCoord::new(tile.q, tile.r);
            if grid.is_owned(coord) {
                warn!(%coord, "Duplicate tile in save, ignoring");
                continue;
            }
            if grid.len() >= cap {
                dropped = dropped.saturating_add(1);
                continue;
            }
            if self.catalog.style(tile.style_name.as_str()).is_none() {
                warn!(
                    %coord,
                    style = %tile.style_name,
                    fallback = %self.catalog.default_style().id,
                    "Unknown tile style in save, using default"
                );
            }
            let style = self.catalog.resolve_style(tile.style_name.as_str());
            let tile_tier = if style.category == TileCategory::Gameplay {
                tile.tier.min(MAX_TILE_TIER)
            } else {
                0
            };
            grid.claim(coord, style.id.clone())?.tier = tile_tier;
        }
        if dropped > 0 {
            warn!(tier, dropped, "Save exceeds the tile cap, dropped extra tiles");
        }
        Ok(grid)
    }

    fn rebuild_buildings(
        &self,
        snapshot: &SaveSnapshot,
        mut grid: Grid,
    ) -> Result<(Grid, ProductionScheduler), WorldError> {
        let origin = self.network.origin();
        let max_level = self.config.buildings.max_level.max(1);
        let mut scheduler = ProductionScheduler::new();

        for saved in &snapshot.buildings {
            let coord = HexCoord::new(saved.q, saved.r);
            let Some(definition) = self.catalog.resolve_building(saved.building_name.as_str())
            else {
                warn!(%coord, building = %saved.building_name, "Dropping unknown building from save");
                continue;
            };
            if !grid.is_owned(coord) || grid.building(coord).is_some() {
                warn!(%coord, building = %saved.building_name, "Dropping building without a free owned cell");
                continue;
            }
            if (definition.kind == BuildingKind::TownHall) != (coord == origin) {
                warn!(%coord, building = %saved.building_name, "Dropping building misplaced around the origin");
                continue;
            }

            let active = saved.is_active.unwrap_or(definition.default_active);
            let (mut building, module) = instantiate(definition, active);
            building.level = saved.level.unwrap_or(1).clamp(1, max_level);
            grid.place_building(coord, building)?;

            if let Some(mut module) = module {
                if let Some(blob) = saved.state.as_deref()
                    && let Err(e) = module.load_serialized_state(blob)
                {
                    warn!(%coord, error = %e, "Unreadable module state, using defaults");
                }
                scheduler.register(coord, module);
            }
        }

        if grid.building(origin).is_none() {
            let town_hall = self
                .catalog
                .town_hall()
                .ok_or_else(|| WorldError::UnknownBuilding(BuildingDefId::new(TOWN_HALL)))?;
            warn!(%origin, "Save has no Town Hall, restoring it");
            let (building, module) = instantiate(town_hall, town_hall.default_active);
            grid.place_building(origin, building)?;
            if let Some(module) = module {
                scheduler.register(origin, module);
            }
        }
        Ok((grid, scheduler))
    }
}
