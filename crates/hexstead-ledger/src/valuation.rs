//! Credit-equivalent pricing.
//!
//! Refunds and demolition fees are computed against a single scalar: the
//! credits of a cost plus every resource unit priced at a flat
//! credits-per-unit rate. The rate is configuration, not a law of the
//! economy.

use hexstead_types::Cost;

/// Default credits charged per warehouse unit when valuing a cost.
pub const DEFAULT_CREDITS_PER_UNIT: u32 = 5;

/// Value of `cost` in credits, pricing each resource unit at
/// `credits_per_unit`.
pub fn credit_equivalent(cost: &Cost, credits_per_unit: u32) -> u64 {
    cost.resources
        .iter()
        .map(|line| u64::from(line.amount).saturating_mul(u64::from(credits_per_unit)))
        .fold(u64::from(cost.credits), u64::saturating_add)
}

/// `percent`% of `value`, rounded half away from zero.
///
/// `percent_of(40, 30) == 12`, `percent_of(5, 30) == 2` (1.5 rounds up).
pub fn percent_of(value: u64, percent: u32) -> u64 {
    value
        .saturating_mul(u64::from(percent))
        .saturating_add(50)
        .checked_div(100)
        .unwrap_or(0)
}
