//! Catalog entry structs: tile styles, building definitions, production
//! profiles, and the settlement tier table.
//!
//! These are immutable data loaded from the external catalog. Nothing in
//! here mutates at runtime; the world crate resolves identifiers against a
//! catalog built from these values.

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::enums::{BuildingKind, TileCategory};
use crate::ids::{BuildingDefId, ResourceId, StyleId};

/// Tag carried by tile styles that conduct road connectivity.
pub const ROAD_TAG: &str = "road";

// ---------------------------------------------------------------------------
// Costs
// ---------------------------------------------------------------------------

/// A quantity of a single warehouse resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceCost {
    /// The resource.
    pub resource: ResourceId,
    /// Units of the resource.
    pub amount: u32,
}

impl ResourceCost {
    /// Create a resource line.
    pub fn new(resource: impl Into<ResourceId>, amount: u32) -> Self {
        Self {
            resource: resource.into(),
            amount,
        }
    }
}

/// Full price of an action: credits plus zero or more resource lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cost {
    /// Scalar currency.
    #[serde(default)]
    pub credits: u32,
    /// Warehouse lines, checked in listed order.
    #[serde(default)]
    pub resources: Vec<ResourceCost>,
}

impl Cost {
    /// A credits-only cost.
    pub const fn credits(credits: u32) -> Self {
        Self {
            credits,
            resources: Vec::new(),
        }
    }

    /// Add a resource line.
    #[must_use]
    pub fn with_resource(mut self, resource: impl Into<ResourceId>, amount: u32) -> Self {
        self.resources.push(ResourceCost::new(resource, amount));
        self
    }

    /// Whether nothing at all is charged.
    pub fn is_free(&self) -> bool {
        self.credits == 0 && self.resources.iter().all(|line| line.amount == 0)
    }
}

// ---------------------------------------------------------------------------
// Tile styles
// ---------------------------------------------------------------------------

/// A paintable tile style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileStyle {
    /// Stable identifier, also written to save files.
    pub id: StyleId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Cosmetic or gameplay-affecting.
    #[serde(default)]
    pub category: TileCategory,
    /// Paint cost.
    #[serde(default)]
    pub cost: Cost,
    /// Minimum settlement tier.
    #[serde(default = "default_unlock_tier")]
    pub unlock_tier: u32,
    /// Buildings that must have been placed this session first.
    #[serde(default)]
    pub required_buildings: Vec<BuildingDefId>,
    /// Free-form tags (`road`, `forest`, ...), read by adjacency bonuses.
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Investment points reported to the progress sink when painted.
    #[serde(default)]
    pub investment_points: u32,
}

impl TileStyle {
    /// Whether the style carries `tag`.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Whether the style conducts road connectivity.
    pub fn is_road(&self) -> bool {
        self.has_tag(ROAD_TAG)
    }
}

// ---------------------------------------------------------------------------
// Buildings
// ---------------------------------------------------------------------------

/// A placeable building definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingDefinition {
    /// Stable identifier, also written to save files.
    pub id: BuildingDefId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Broad role.
    #[serde(default)]
    pub kind: BuildingKind,
    /// Placement cost.
    #[serde(default)]
    pub cost: Cost,
    /// Minimum settlement tier.
    #[serde(default = "default_unlock_tier")]
    pub unlock_tier: u32,
    /// Buildings that must have been placed this session first.
    #[serde(default)]
    pub required_buildings: Vec<BuildingDefId>,
    /// Free-form tags.
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Whether a freshly placed instance starts active.
    #[serde(default)]
    pub default_active: bool,
    /// Whether being active occupies one of the tier's active slots.
    #[serde(default)]
    pub consumes_slot: bool,
    /// Investment points reported to the progress sink when placed.
    #[serde(default)]
    pub investment_points: u32,
    /// Growth behaviour, if this building produces anything.
    #[serde(default)]
    pub production: Option<ProductionProfile>,
}

// ---------------------------------------------------------------------------
// Production profiles
// ---------------------------------------------------------------------------

/// Per-tick growth bonus for each adjacent owned tile carrying `tag`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrowthBonus {
    /// Tile tag that earns the bonus.
    pub tag: String,
    /// Progress added per matching adjacent tile per tick.
    pub per_tile: Decimal,
}

/// Growth pattern of a production building.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProductionProfile {
    /// Several independent plots (forestry, herbalist).
    MultiPlot(MultiPlotProfile),
    /// One meter with a focus-controlled two-way split (hunter lodge).
    Capture(CaptureProfile),
    /// Manually dug depth unlocking extra outputs (quarry).
    Strata(StrataProfile),
}

/// Parameters of a multi-plot growth building.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiPlotProfile {
    /// Number of plots.
    pub plots: u32,
    /// Progress added to every occupied plot each tick.
    pub base_rate: Decimal,
    /// Adjacency bonuses.
    #[serde(default)]
    pub bonuses: Vec<GrowthBonus>,
    /// Extra progress per tick while road-connected.
    #[serde(default)]
    pub road_bonus: Decimal,
    /// Bundle emitted by each harvested plot.
    pub harvest: Vec<ResourceCost>,
    /// Whether a harvested plot restarts at zero or becomes empty.
    #[serde(default)]
    pub auto_replant: bool,
}

/// Parameters of a single-meter capture building.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureProfile {
    /// Progress added each tick.
    pub base_rate: Decimal,
    /// Adjacency bonuses.
    #[serde(default)]
    pub bonuses: Vec<GrowthBonus>,
    /// Extra progress per tick while road-connected.
    #[serde(default)]
    pub road_bonus: Decimal,
    /// Primary output at balanced focus.
    pub primary: ResourceCost,
    /// Secondary output at balanced focus.
    pub secondary: ResourceCost,
}

/// A depth threshold that unlocks an extra passive output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stratum {
    /// Depth at which the stratum opens.
    pub depth: Decimal,
    /// Display label used in the one-time notification.
    #[serde(default)]
    pub label: String,
    /// Output added to every tick once unlocked.
    pub output: ResourceCost,
}

/// Parameters of a depth-gated building.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrataProfile {
    /// Depth gained per dig action.
    pub dig_increment: Decimal,
    /// Energy spent per dig action.
    pub dig_energy_cost: Decimal,
    /// Energy pool ceiling.
    pub max_energy: Decimal,
    /// Energy regained per real-time second.
    pub energy_regen_per_second: Decimal,
    /// Output every tick regardless of depth.
    #[serde(default)]
    pub passive_output: Vec<ResourceCost>,
    /// Thresholds in ascending depth order.
    #[serde(default)]
    pub strata: Vec<Stratum>,
}

// ---------------------------------------------------------------------------
// Settlement tiers
// ---------------------------------------------------------------------------

/// Requirements to advance *into* `tier`.
///
/// The table is opaque data; no formula derives one row from another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierDefinition {
    /// The tier this row unlocks.
    pub tier: u32,
    /// Accumulated investment points needed.
    #[serde(default)]
    pub required_investment: u64,
    /// Resource that must be in the warehouse; consumed on advance.
    #[serde(default)]
    pub milestone: Option<ResourceCost>,
    /// Minimum highest-unlocked world reported by the world provider.
    #[serde(default = "default_unlock_tier")]
    pub required_world: u32,
    /// Credits granted on reaching the tier.
    #[serde(default)]
    pub credit_reward: u32,
}

const fn default_unlock_tier() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn road_tag_detection() {
        let style = TileStyle {
            id: StyleId::new("dirt_road"),
            name: String::from("Dirt Road"),
            category: TileCategory::Gameplay,
            cost: Cost::credits(10),
            unlock_tier: 1,
            required_buildings: Vec::new(),
            tags: BTreeSet::from([ROAD_TAG.to_owned()]),
            investment_points: 1,
        };
        assert!(style.is_road());
        assert!(!style.has_tag("forest"));
    }

    #[test]
    fn cost_builder_and_free_check() {
        assert!(Cost::default().is_free());
        assert!(Cost::credits(0).with_resource("wood", 0).is_free());
        let cost = Cost::credits(5).with_resource("stone", 2);
        assert!(!cost.is_free());
        assert_eq!(cost.resources.len(), 1);
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn building_definition_defaults_from_json() {
        let json = r#"{ "id": "lantern" }"#;
        let def: BuildingDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(def.kind, BuildingKind::Decoration);
        assert_eq!(def.unlock_tier, 1);
        assert!(!def.default_active);
        assert!(def.production.is_none());
    }

    #[test]
    fn production_profile_is_internally_tagged() {
        let json = r#"{
            "type": "capture",
            "base_rate": "0.1",
            "primary": { "resource": "meat", "amount": 4 },
            "secondary": { "resource": "hides", "amount": 2 }
        }"#;
        let profile: Option<ProductionProfile> = serde_json::from_str(json).ok();
        assert!(matches!(profile, Some(ProductionProfile::Capture(_))));
    }
}
