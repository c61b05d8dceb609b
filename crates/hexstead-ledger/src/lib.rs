//! Credits wallet and bounded warehouse for the Hexstead simulation.
//!
//! Every credit and warehouse unit a settlement spends or earns passes
//! through this crate. The wallet never goes negative and the warehouse
//! never holds more than its level allows. The ledger never panics; it
//! returns errors.
//!
//! # Architecture
//!
//! - [`wallet`] -- The [`Wallet`]: credits plus a [`Warehouse`], with the
//!   two-phase afford/commit protocol.
//! - [`warehouse`] -- The [`Warehouse`]: per-resource stacks capped by a
//!   level-dependent capacity.
//! - [`valuation`] -- Credit-equivalent pricing and percentage shares used
//!   for refunds and demolition fees.
//!
//! # Two-phase spending
//!
//! Validation and mutation are separate calls. Callers check
//! [`Wallet::can_afford`] first, surface the [`Shortfall`] to the player on
//! failure, and only then call [`Wallet::commit`]. `commit` re-verifies and
//! refuses without touching any balance, so a failed commit never leaves a
//! partial deduction behind.
//!
//! # Usage
//!
//! ```
//! use hexstead_ledger::{Affordability, Wallet, Warehouse};
//! use hexstead_types::ResourceCost;
//!
//! let mut wallet = Wallet::new(100, Warehouse::new(1, vec![100, 200]));
//! wallet.deposit(&"wood".into(), 10);
//!
//! let costs = [ResourceCost::new("wood", 4)];
//! assert_eq!(wallet.can_afford(30, &costs), Affordability::Affordable);
//! assert!(wallet.commit(30, &costs).is_ok());
//! assert_eq!(wallet.credits(), 70);
//! assert_eq!(wallet.warehouse().amount("wood"), 6);
//! ```

pub mod valuation;
pub mod wallet;
pub mod warehouse;

// Re-export primary types at crate root.
pub use valuation::{credit_equivalent, percent_of};
pub use wallet::Wallet;
pub use warehouse::Warehouse;

use hexstead_types::ResourceId;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur when mutating a wallet or warehouse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// Not enough credits for the requested deduction.
    #[error("insufficient credits: need {required}, have {available}")]
    InsufficientCredits {
        /// Credits the operation needs.
        required: u64,
        /// Credits in the wallet.
        available: u64,
    },

    /// Not enough of a warehouse resource for the requested deduction.
    #[error("insufficient {resource}: need {required}, have {available}")]
    InsufficientResource {
        /// The resource that ran short.
        resource: ResourceId,
        /// Units the operation needs.
        required: u64,
        /// Units in the warehouse.
        available: u32,
    },

    /// The warehouse is already at its highest configured level.
    #[error("warehouse is already at maximum level {level}")]
    WarehouseMaxLevel {
        /// The current (maximum) level.
        level: u32,
    },

    /// An arithmetic operation overflowed.
    #[error("arithmetic overflow: {context}")]
    ArithmeticOverflow {
        /// Description of the operation that overflowed.
        context: String,
    },
}

impl From<Shortfall> for LedgerError {
    fn from(shortfall: Shortfall) -> Self {
        match shortfall {
            Shortfall::Credits {
                required,
                available,
            } => Self::InsufficientCredits {
                required,
                available,
            },
            Shortfall::Resource {
                resource,
                required,
                available,
            } => Self::InsufficientResource {
                resource,
                required,
                available,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Affordability
// ---------------------------------------------------------------------------

/// The first pool found short during an affordability check.
///
/// Credits are checked before any resource line, then lines in listed
/// order. The `Display` form is the player-facing message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Shortfall {
    /// The wallet lacks credits.
    #[error("Not enough credits ({available}/{required})")]
    Credits {
        /// Credits the cost needs.
        required: u64,
        /// Credits in the wallet.
        available: u64,
    },
    /// The warehouse lacks a resource.
    #[error("Not enough {resource} ({available}/{required})")]
    Resource {
        /// The first resource found short.
        resource: ResourceId,
        /// Total units of this resource the cost needs.
        required: u64,
        /// Units in the warehouse.
        available: u32,
    },
}

/// Outcome of [`Wallet::can_afford`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Affordability {
    /// Every pool covers the cost.
    Affordable,
    /// At least one pool is short; carries the first one found.
    Insufficient(Shortfall),
}

impl Affordability {
    /// Whether the cost can be paid.
    pub const fn is_affordable(&self) -> bool {
        matches!(self, Self::Affordable)
    }

    /// Convert into a `Result` for `?` propagation.
    ///
    /// # Errors
    ///
    /// Returns the [`Shortfall`] when the cost cannot be paid.
    pub fn into_result(self) -> Result<(), Shortfall> {
        match self {
            Self::Affordable => Ok(()),
            Self::Insufficient(shortfall) => Err(shortfall),
        }
    }
}
