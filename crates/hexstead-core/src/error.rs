//! Player-facing rejections.
//!
//! Every player operation on a [`Settlement`](crate::settlement::Settlement)
//! returns `Result<_, Rejection>`. A rejection never leaves a partial
//! mutation behind; its `Display` form is the toast shown to the player
//! and is also pushed onto the notification outbox.

use rust_decimal::Decimal;

use hexstead_ledger::{LedgerError, Shortfall};
use hexstead_types::{BuildingDefId, HexCoord, StyleId};
use hexstead_world::WorldError;

/// Why a player operation was refused.
#[derive(Debug, thiserror::Error)]
pub enum Rejection {
    /// Tile placement on a cell the settlement already owns.
    #[error("That tile is already part of the settlement")]
    CellOwned(HexCoord),

    /// The target cell is not owned.
    #[error("You need to own that tile first")]
    CellNotOwned(HexCoord),

    /// The target cell already holds a building.
    #[error("There is already a building there")]
    CellOccupied(HexCoord),

    /// The target cell holds no building.
    #[error("There is no building there")]
    NoBuilding(HexCoord),

    /// The current mode needs a selection and none is made.
    #[error("Select something to place first")]
    NothingSelected,

    /// The selected style is not in the catalog.
    #[error("Unknown tile style '{0}'")]
    UnknownStyle(StyleId),

    /// The selected building is not in the catalog.
    #[error("Unknown building '{0}'")]
    UnknownBuilding(BuildingDefId),

    /// The item unlocks at a higher settlement tier.
    #[error("{name} unlocks at settlement tier {required}")]
    TierLocked {
        /// Display name of the item.
        name: String,
        /// Tier the item needs.
        required: u32,
    },

    /// A prerequisite building has not been placed this session.
    #[error("{name} requires a {requirement} to be built first")]
    MissingPrerequisite {
        /// Display name of the item.
        name: String,
        /// The building that must be placed first.
        requirement: BuildingDefId,
    },

    /// The external blueprint provider has not unlocked the building.
    #[error("{name} blueprint has not been discovered yet")]
    BlueprintLocked {
        /// Display name of the building.
        name: String,
    },

    /// The tile budget for the current tier is spent.
    #[error("No tiles left at tier {tier} ({cap} maximum)")]
    NoTilesLeft {
        /// Current settlement tier.
        tier: u32,
        /// Tile cap at that tier.
        cap: u32,
    },

    /// The production-building cap for the current tier is reached.
    #[error("Production building limit reached ({cap} at this tier)")]
    BuildingCapReached {
        /// Production-building cap at the current tier.
        cap: u32,
    },

    /// Activating the building would exceed the active-slot cap.
    #[error("All active slots are in use ({used}/{cap})")]
    NoFreeSlot {
        /// Slots in use.
        used: u32,
        /// Slot cap at the current tier.
        cap: u32,
    },

    /// New tiles must touch the settlement.
    #[error("New tiles must touch the settlement")]
    NotAdjacent(HexCoord),

    /// Roads mode accepts road styles only.
    #[error("Only road tiles can be placed in road mode")]
    NotARoad(StyleId),

    /// The tile already carries the selected style.
    #[error("That tile is already painted with this style")]
    SameStyle(StyleId),

    /// The wallet cannot cover the cost.
    #[error("{0}")]
    Unaffordable(#[from] Shortfall),

    /// The origin Town Hall is permanent.
    #[error("The Town Hall cannot be removed or moved")]
    TownHallProtected,

    /// Only one building of this kind may exist.
    #[error("There can only be one {0}")]
    UniqueBuilding(BuildingDefId),

    /// The origin tile is permanent.
    #[error("The settlement's first tile cannot be removed")]
    OriginProtected,

    /// Only gameplay tiles take tier upgrades.
    #[error("Decorative tiles cannot be upgraded")]
    CosmeticTile(HexCoord),

    /// The tile is at its highest tier.
    #[error("Tile is already at the highest tier ({0})")]
    TileMaxTier(u8),

    /// The tile upgrade needs a higher settlement tier.
    #[error("Tile tier {tier} requires settlement tier {required}")]
    TileTierLocked {
        /// Tile tier being upgraded to.
        tier: u8,
        /// Settlement tier it needs.
        required: u32,
    },

    /// The settlement is at its highest tier.
    #[error("The settlement is already at its highest tier")]
    MaxTier,

    /// Not enough investment points to advance.
    #[error("Need {required} investment points to advance ({available}/{required})")]
    NotEnoughInvestment {
        /// Points the next tier needs.
        required: u64,
        /// Points accumulated.
        available: u64,
    },

    /// The next tier needs a further world to be unlocked.
    #[error("Unlock world {required} to advance (highest unlocked: {available})")]
    WorldLocked {
        /// World the next tier needs.
        required: u32,
        /// Highest unlocked world.
        available: u32,
    },

    /// The building is still settling in after a move.
    #[error("The building is still moving in ({remaining}s left)")]
    RelocationCooldown {
        /// Seconds of cooldown left.
        remaining: Decimal,
    },

    /// The building cannot be upgraded further.
    #[error("Building is already at the highest level ({level})")]
    BuildingMaxLevel {
        /// Current level.
        level: u32,
    },

    /// The Town Hall levels with the settlement tier, not directly.
    #[error("The Town Hall grows with the settlement tier")]
    NotUpgradable(BuildingDefId),

    /// The warehouse cannot be upgraded further.
    #[error("Warehouse is already at the highest level ({level})")]
    WarehouseMaxLevel {
        /// Current warehouse level.
        level: u32,
    },

    /// The building has no production module to act on.
    #[error("That building has nothing to work on")]
    NoModule(HexCoord),

    /// A world operation refused or failed (module actions, overflow).
    #[error("{source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },

    /// A ledger mutation failed after validation passed.
    #[error("{source}")]
    Ledger {
        /// The underlying ledger error.
        #[from]
        source: LedgerError,
    },
}
