//! Error types for the `hexstead-world` crate.
//!
//! All fallible operations in this crate return [`WorldError`] through the
//! standard [`Result`] type.

use hexstead_types::{BuildingDefId, HexCoord, StyleId};
use rust_decimal::Decimal;

/// Errors that can occur during grid, catalog, or module operations.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// A tile style id was not found in the catalog.
    #[error("unknown tile style: {0}")]
    UnknownStyle(StyleId),

    /// A building definition id was not found in the catalog.
    #[error("unknown building definition: {0}")]
    UnknownBuilding(BuildingDefId),

    /// The cell is already owned.
    #[error("cell {0} is already owned")]
    CellAlreadyOwned(HexCoord),

    /// The cell is not owned.
    #[error("cell {0} is not owned")]
    CellNotOwned(HexCoord),

    /// The cell already holds a building.
    #[error("cell {0} already has a building")]
    CellOccupied(HexCoord),

    /// The cell holds no building.
    #[error("cell {0} has no building")]
    NoBuilding(HexCoord),

    /// A module state blob could not be decoded.
    #[error("invalid {module} state: {reason}")]
    InvalidModuleState {
        /// Name of the module that rejected the blob.
        module: &'static str,
        /// Decoder message.
        reason: String,
    },

    /// The module does not support the requested action.
    #[error("{module} does not support {action}")]
    UnsupportedAction {
        /// Name of the module.
        module: &'static str,
        /// The rejected action.
        action: &'static str,
    },

    /// Every plot of a multi-plot building is already planted.
    #[error("no empty plot to plant")]
    NoEmptyPlot,

    /// The energy pool cannot pay for a dig.
    #[error("not enough energy: need {required}, have {available}")]
    NotEnoughEnergy {
        /// Energy a dig costs.
        required: Decimal,
        /// Energy in the pool.
        available: Decimal,
    },

    /// The catalog is missing its default tile style.
    #[error("default tile style {0} is not in the catalog")]
    MissingDefaultStyle(StyleId),

    /// Failed to read a catalog file.
    #[error("failed to read catalog file: {0}")]
    CatalogIo(#[from] std::io::Error),

    /// Failed to parse catalog YAML.
    #[error("failed to parse catalog YAML: {0}")]
    CatalogYaml(#[from] serde_yml::Error),

    /// Arithmetic overflow during a checked operation.
    #[error("arithmetic overflow in world calculation")]
    ArithmeticOverflow,
}
