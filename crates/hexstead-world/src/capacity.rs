//! Settlement tier capacity tables.
//!
//! Pure lookups from a settlement tier to its caps. The tier is clamped to
//! `[MIN_TIER, MAX_TIER]` before lookup, so every input has an answer and
//! validation can call these freely.
//!
//! | Tier | Tiles | Production buildings | Active slots |
//! |------|-------|----------------------|--------------|
//! | 1 | 37 | 3 | 2 |
//! | 2 | 61 | 5 | 3 |
//! | 3 | 91 | 7 | 4 |
//! | 4 | 127 | 9 | 5 |
//! | 5 | 169 | 12 | 6 |
//! | 6 | 217 | 15 | 8 |
//! | 7 | 271 | 18 | 10 |
//! | 8 | 331 | 22 | 12 |
//! | 9 | 397 | 26 | 14 |
//! | 10 | 469 | 30 | 16 |
//!
//! Tile caps are hexagonal areas: tier `t` holds a hexagon of radius
//! `t + 2`, i.e. `1 + 3(t + 2)(t + 3)` cells.

/// Lowest settlement tier.
pub const MIN_TIER: u32 = 1;

/// Highest settlement tier.
pub const MAX_TIER: u32 = 10;

const TILE_CAPS: [u32; 10] = [37, 61, 91, 127, 169, 217, 271, 331, 397, 469];
const BUILDING_CAPS: [u32; 10] = [3, 5, 7, 9, 12, 15, 18, 22, 26, 30];
const ACTIVE_SLOT_CAPS: [u32; 10] = [2, 3, 4, 5, 6, 8, 10, 12, 14, 16];

/// All three caps for one tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierCaps {
    /// Maximum owned cells.
    pub tiles: u32,
    /// Maximum production-kind buildings.
    pub buildings: u32,
    /// Maximum active slot-consuming buildings.
    pub active_slots: u32,
}

/// Clamp `tier` into `[MIN_TIER, MAX_TIER]`.
pub const fn clamp_tier(tier: u32) -> u32 {
    if tier < MIN_TIER {
        MIN_TIER
    } else if tier > MAX_TIER {
        MAX_TIER
    } else {
        tier
    }
}

fn lookup(table: &[u32; 10], tier: u32) -> u32 {
    usize::try_from(clamp_tier(tier).saturating_sub(MIN_TIER))
        .ok()
        .and_then(|index| table.get(index))
        .copied()
        .unwrap_or(0)
}

/// Owned-cell cap at `tier`.
pub fn tile_cap(tier: u32) -> u32 {
    lookup(&TILE_CAPS, tier)
}

/// Production-building cap at `tier`.
pub fn building_cap(tier: u32) -> u32 {
    lookup(&BUILDING_CAPS, tier)
}

/// Active-slot cap at `tier`.
pub fn active_slot_cap(tier: u32) -> u32 {
    lookup(&ACTIVE_SLOT_CAPS, tier)
}

/// Every cap at `tier`.
pub fn caps(tier: u32) -> TierCaps {
    TierCaps {
        tiles: tile_cap(tier),
        buildings: building_cap(tier),
        active_slots: active_slot_cap(tier),
    }
}
