//! Configuration loading and typed config structures for the Hexstead
//! simulation.
//!
//! The canonical configuration lives in `hexstead-config.yaml` at the
//! project root. This module defines strongly-typed structs that mirror the
//! YAML structure, and provides a loader that reads the file. Every field
//! has a default, so an empty file (or no file) yields a playable settlement.
//!
//! Decimal values are best written as quoted strings (`"30"`, `"0.5"`) so
//! they are read exactly.

use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::Deserialize;

use hexstead_types::Cost;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level settlement configuration.
///
/// Mirrors the structure of `hexstead-config.yaml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SettlementConfig {
    /// Grid geometry and placement rules.
    #[serde(default)]
    pub world: WorldConfig,

    /// Wallet, warehouse, and refund parameters.
    #[serde(default)]
    pub economy: EconomyConfig,

    /// Tile-tier upgrade table, one row per target tier.
    #[serde(default = "default_tile_upgrades")]
    pub tile_upgrades: Vec<TileUpgradeStep>,

    /// Building level and relocation parameters.
    #[serde(default)]
    pub buildings: BuildingConfig,

    /// Frame and production-tick cadences for the engine binary.
    #[serde(default)]
    pub timing: TimingConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Save file settings.
    #[serde(default)]
    pub save: SaveConfig,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            world: WorldConfig::default(),
            economy: EconomyConfig::default(),
            tile_upgrades: default_tile_upgrades(),
            buildings: BuildingConfig::default(),
            timing: TimingConfig::default(),
            logging: LoggingConfig::default(),
            save: SaveConfig::default(),
        }
    }
}

impl SettlementConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_yml::from_str(&contents)?;
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        Ok(config)
    }

    /// The upgrade row that raises a tile *to* `tier`.
    pub fn tile_upgrade(&self, tier: u8) -> Option<&TileUpgradeStep> {
        self.tile_upgrades.iter().find(|step| step.tier == tier)
    }
}

/// Grid geometry and placement rules.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorldConfig {
    /// Cell size in world units, measured from a cell's centre to one of
    /// its corners.
    #[serde(default = "default_cell_size")]
    pub cell_size: f64,

    /// Whether new tiles must touch an owned cell.
    #[serde(default = "default_true")]
    pub enforce_adjacency: bool,

    /// Catalog YAML file. The built-in starting catalog is used when unset.
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            cell_size: default_cell_size(),
            enforce_adjacency: true,
            catalog_path: None,
        }
    }
}

/// Wallet, warehouse, and refund parameters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EconomyConfig {
    /// Credits in a fresh settlement's wallet.
    #[serde(default = "default_starting_credits")]
    pub starting_credits: u64,

    /// Warehouse level of a fresh settlement.
    #[serde(default = "default_starting_warehouse_level")]
    pub starting_warehouse_level: u32,

    /// Per-resource stack capacity by warehouse level (index 0 is level 1).
    #[serde(default = "default_warehouse_capacities")]
    pub warehouse_capacities: Vec<u32>,

    /// Cost of each warehouse upgrade (index 0 raises level 1 to 2).
    #[serde(default = "default_warehouse_upgrade_costs")]
    pub warehouse_upgrade_costs: Vec<Cost>,

    /// Share of cumulative tile or building investment returned on removal
    /// or on repainting a gameplay tile cosmetic.
    #[serde(default = "default_refund_percent")]
    pub refund_percent: u32,

    /// Share of the old tile's value charged when repainting one gameplay
    /// style over another.
    #[serde(default = "default_demolition_percent")]
    pub demolition_percent: u32,

    /// Credits each warehouse unit is worth when valuing a cost.
    #[serde(default = "default_credits_per_unit")]
    pub credits_per_unit: u32,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            starting_credits: default_starting_credits(),
            starting_warehouse_level: default_starting_warehouse_level(),
            warehouse_capacities: default_warehouse_capacities(),
            warehouse_upgrade_costs: default_warehouse_upgrade_costs(),
            refund_percent: default_refund_percent(),
            demolition_percent: default_demolition_percent(),
            credits_per_unit: default_credits_per_unit(),
        }
    }
}

/// One row of the tile-tier upgrade table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TileUpgradeStep {
    /// Tile tier this row upgrades *to*.
    pub tier: u8,

    /// Minimum settlement tier for this upgrade.
    #[serde(default = "default_one")]
    pub required_settlement_tier: u32,

    /// Price of this step alone. Cumulative investment is the sum of every
    /// step up to the tile's current tier.
    #[serde(default)]
    pub cost: Cost,

    /// Investment points reported when the upgrade completes.
    #[serde(default)]
    pub investment_points: u32,
}

/// Building level and relocation parameters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BuildingConfig {
    /// Highest level a building can be upgraded to.
    #[serde(default = "default_max_building_level")]
    pub max_level: u32,

    /// Extra output per level above 1, as a percentage of base output.
    #[serde(default = "default_output_bonus_percent")]
    pub output_bonus_percent_per_level: u32,

    /// Seconds a relocated building stays idle.
    #[serde(default = "default_relocation_cooldown_seconds")]
    pub relocation_cooldown_seconds: Decimal,
}

impl Default for BuildingConfig {
    fn default() -> Self {
        Self {
            max_level: default_max_building_level(),
            output_bonus_percent_per_level: default_output_bonus_percent(),
            relocation_cooldown_seconds: default_relocation_cooldown_seconds(),
        }
    }
}

/// Engine cadences.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TimingConfig {
    /// Real-time milliseconds per production tick.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Real-time milliseconds per frame (cooldowns, energy regeneration).
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,

    /// Stop after this many production ticks. `0` runs until interrupted.
    #[serde(default)]
    pub max_ticks: u64,

    /// Write the save file every this many ticks. `0` saves only on exit.
    #[serde(default = "default_autosave_every_ticks")]
    pub autosave_every_ticks: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            frame_interval_ms: default_frame_interval_ms(),
            max_ticks: 0,
            autosave_every_ticks: default_autosave_every_ticks(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default log level filter, overridden by `RUST_LOG`.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Save file settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SaveConfig {
    /// Path of the JSON save file.
    #[serde(default = "default_save_path")]
    pub path: PathBuf,
}

impl Default for SaveConfig {
    fn default() -> Self {
        Self {
            path: default_save_path(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

const fn default_cell_size() -> f64 {
    1.0
}

const fn default_true() -> bool {
    true
}

const fn default_one() -> u32 {
    1
}

const fn default_starting_credits() -> u64 {
    500
}

const fn default_starting_warehouse_level() -> u32 {
    1
}

fn default_warehouse_capacities() -> Vec<u32> {
    vec![100, 200, 400, 800, 1600]
}

fn default_warehouse_upgrade_costs() -> Vec<Cost> {
    vec![
        Cost::credits(100).with_resource("wood", 20),
        Cost::credits(250).with_resource("stone", 40),
        Cost::credits(500).with_resource("iron", 10),
        Cost::credits(1000).with_resource("crystal", 10),
    ]
}

const fn default_refund_percent() -> u32 {
    30
}

const fn default_demolition_percent() -> u32 {
    30
}

const fn default_credits_per_unit() -> u32 {
    hexstead_ledger::valuation::DEFAULT_CREDITS_PER_UNIT
}

fn default_tile_upgrades() -> Vec<TileUpgradeStep> {
    vec![
        TileUpgradeStep {
            tier: 1,
            required_settlement_tier: 2,
            cost: Cost::credits(25),
            investment_points: 3,
        },
        TileUpgradeStep {
            tier: 2,
            required_settlement_tier: 4,
            cost: Cost::credits(60).with_resource("stone", 10),
            investment_points: 8,
        },
    ]
}

const fn default_max_building_level() -> u32 {
    3
}

const fn default_output_bonus_percent() -> u32 {
    50
}

fn default_relocation_cooldown_seconds() -> Decimal {
    Decimal::from(30)
}

const fn default_tick_interval_ms() -> u64 {
    1000
}

const fn default_frame_interval_ms() -> u64 {
    100
}

const fn default_autosave_every_ticks() -> u64 {
    60
}

fn default_log_level() -> String {
    "info".to_owned()
}

fn default_save_path() -> PathBuf {
    PathBuf::from("hexstead-save.json")
}
