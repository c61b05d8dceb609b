//! Built-in starting catalog.
//!
//! Eight tile styles, seven building definitions, and the tier table for
//! tiers 2 through 10. Used when no catalog file is configured and by
//! tests that need a realistic catalog.

use std::collections::BTreeSet;

use rust_decimal::Decimal;

use hexstead_types::{
    BuildingDefId, BuildingDefinition, BuildingKind, CaptureProfile, Cost, GrowthBonus,
    MultiPlotProfile, ProductionProfile, ROAD_TAG, ResourceCost, StrataProfile, Stratum, StyleId,
    TierDefinition, TileCategory, TileStyle,
};

use crate::catalog::Catalog;
use crate::error::WorldError;

/// Id of the default (fallback) tile style.
pub const DEFAULT_STYLE: &str = "grass";

/// Id of the Town-Hall definition placed on the origin.
pub const TOWN_HALL: &str = "town_hall";

/// Helper to build a [`TileStyle`].
fn style(
    id: &str,
    name: &str,
    category: TileCategory,
    cost: Cost,
    unlock_tier: u32,
    tags: &[&str],
) -> TileStyle {
    TileStyle {
        id: StyleId::new(id),
        name: name.to_owned(),
        category,
        investment_points: cost.credits.checked_div(10).unwrap_or(0),
        cost,
        unlock_tier,
        required_buildings: Vec::new(),
        tags: tags.iter().map(|t| (*t).to_owned()).collect(),
    }
}

/// Helper to build a [`BuildingDefinition`].
fn building(
    id: &str,
    name: &str,
    kind: BuildingKind,
    cost: Cost,
    unlock_tier: u32,
    production: Option<ProductionProfile>,
) -> BuildingDefinition {
    let producing = production.is_some();
    BuildingDefinition {
        id: BuildingDefId::new(id),
        name: name.to_owned(),
        kind,
        investment_points: cost.credits.checked_div(5).unwrap_or(0),
        cost,
        unlock_tier,
        required_buildings: Vec::new(),
        tags: BTreeSet::new(),
        default_active: producing,
        consumes_slot: producing,
        production,
    }
}

fn bonus(tag: &str, per_tile: Decimal) -> GrowthBonus {
    GrowthBonus {
        tag: tag.to_owned(),
        per_tile,
    }
}

/// All built-in tile styles.
pub fn starting_styles() -> Vec<TileStyle> {
    let mut flower_bed = style(
        "flower_bed",
        "Flower Bed",
        TileCategory::Gameplay,
        Cost::credits(25),
        1,
        &["fertile"],
    );
    flower_bed.required_buildings = vec![BuildingDefId::new("herbalist")];

    vec![
        style(DEFAULT_STYLE, "Grass", TileCategory::Cosmetic, Cost::default(), 1, &[]),
        style("meadow", "Meadow", TileCategory::Cosmetic, Cost::default(), 1, &[]),
        style(
            "dirt_road",
            "Dirt Road",
            TileCategory::Gameplay,
            Cost::credits(10),
            1,
            &[ROAD_TAG],
        ),
        style("forest", "Forest", TileCategory::Gameplay, Cost::credits(40), 1, &["forest"]),
        style("farmland", "Farmland", TileCategory::Gameplay, Cost::credits(20), 1, &["fertile"]),
        style(
            "stone_ground",
            "Stone Ground",
            TileCategory::Gameplay,
            Cost::credits(30).with_resource("stone", 5),
            2,
            &["rocky"],
        ),
        flower_bed,
        style(
            "paved_road",
            "Paved Road",
            TileCategory::Gameplay,
            Cost::credits(20).with_resource("stone", 4),
            3,
            &[ROAD_TAG],
        ),
    ]
}

/// All built-in building definitions.
pub fn starting_buildings() -> Vec<BuildingDefinition> {
    let forester = ProductionProfile::MultiPlot(MultiPlotProfile {
        plots: 3,
        base_rate: Decimal::new(1, 1),
        bonuses: vec![bonus("forest", Decimal::new(2, 2))],
        road_bonus: Decimal::new(5, 2),
        harvest: vec![ResourceCost::new("wood", 3)],
        auto_replant: true,
    });
    let herbalist = ProductionProfile::MultiPlot(MultiPlotProfile {
        plots: 2,
        base_rate: Decimal::new(8, 2),
        bonuses: vec![bonus("fertile", Decimal::new(3, 2))],
        road_bonus: Decimal::ZERO,
        harvest: vec![ResourceCost::new("herbs", 2)],
        auto_replant: false,
    });
    let hunter = ProductionProfile::Capture(CaptureProfile {
        base_rate: Decimal::new(2, 1),
        bonuses: vec![bonus("forest", Decimal::new(3, 2))],
        road_bonus: Decimal::new(5, 2),
        primary: ResourceCost::new("meat", 4),
        secondary: ResourceCost::new("hides", 2),
    });
    let quarry = ProductionProfile::Strata(StrataProfile {
        dig_increment: Decimal::ONE,
        dig_energy_cost: Decimal::from(10),
        max_energy: Decimal::from(30),
        energy_regen_per_second: Decimal::new(5, 1),
        passive_output: vec![ResourceCost::new("stone", 2)],
        strata: vec![
            Stratum {
                depth: Decimal::from(3),
                label: String::from("Iron seam"),
                output: ResourceCost::new("iron", 1),
            },
            Stratum {
                depth: Decimal::from(6),
                label: String::from("Crystal cavern"),
                output: ResourceCost::new("crystal", 1),
            },
        ],
    });

    let mut hunter_lodge = building(
        "hunter_lodge",
        "Hunter Lodge",
        BuildingKind::Production,
        Cost::credits(60).with_resource("wood", 10),
        1,
        Some(hunter),
    );
    hunter_lodge.required_buildings = vec![BuildingDefId::new("forester")];

    vec![
        building(TOWN_HALL, "Town Hall", BuildingKind::TownHall, Cost::default(), 1, None),
        building(
            "warehouse",
            "Warehouse",
            BuildingKind::Warehouse,
            Cost::credits(60).with_resource("wood", 10),
            1,
            None,
        ),
        building(
            "forester",
            "Forester",
            BuildingKind::Production,
            Cost::credits(40),
            1,
            Some(forester),
        ),
        building(
            "herbalist",
            "Herbalist",
            BuildingKind::Production,
            Cost::credits(50).with_resource("wood", 5),
            2,
            Some(herbalist),
        ),
        hunter_lodge,
        building(
            "quarry",
            "Quarry",
            BuildingKind::Production,
            Cost::credits(80).with_resource("wood", 15),
            2,
            Some(quarry),
        ),
        building("lantern", "Lantern", BuildingKind::Decoration, Cost::credits(15), 1, None),
    ]
}

/// Tier advancement table for tiers 2..=10.
pub fn starting_tiers() -> Vec<TierDefinition> {
    // (tier, investment, milestone, world, reward)
    let rows: [(u32, u64, Option<(&str, u32)>, u32, u32); 9] = [
        (2, 20, None, 1, 50),
        (3, 50, Some(("wood", 30)), 1, 80),
        (4, 100, Some(("stone", 40)), 2, 120),
        (5, 170, Some(("iron", 10)), 2, 160),
        (6, 260, Some(("hides", 25)), 3, 200),
        (7, 380, Some(("crystal", 5)), 3, 260),
        (8, 530, Some(("iron", 30)), 4, 320),
        (9, 720, Some(("crystal", 15)), 4, 400),
        (10, 950, Some(("crystal", 30)), 5, 500),
    ];
    rows.into_iter()
        .map(|(tier, investment, milestone, world, reward)| TierDefinition {
            tier,
            required_investment: investment,
            milestone: milestone.map(|(resource, amount)| ResourceCost::new(resource, amount)),
            required_world: world,
            credit_reward: reward,
        })
        .collect()
}

/// The complete built-in catalog.
///
/// # Errors
///
/// Returns [`WorldError`] if the built-in data is inconsistent (should not
/// happen with valid hard-coded data).
pub fn starting_catalog() -> Result<Catalog, WorldError> {
    Catalog::from_parts(
        &StyleId::new(DEFAULT_STYLE),
        starting_styles(),
        starting_buildings(),
        starting_tiers(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_complete_catalog() {
        let catalog = starting_catalog();
        assert!(catalog.is_ok());
        let Ok(catalog) = catalog else { return };
        assert_eq!(catalog.styles().count(), 8);
        assert_eq!(catalog.buildings().count(), 7);
        assert_eq!(catalog.default_style().id.as_str(), DEFAULT_STYLE);
        assert_eq!(catalog.town_hall().map(|b| b.id.as_str()), Some(TOWN_HALL));
        for tier in 2..=10 {
            assert!(catalog.tier(tier).is_some(), "missing tier {tier}");
        }
    }

    #[test]
    fn road_styles_are_tagged() {
        let roads: Vec<String> = starting_styles()
            .into_iter()
            .filter(TileStyle::is_road)
            .map(|s| s.id.into_inner())
            .collect();
        assert_eq!(roads, vec![String::from("dirt_road"), String::from("paved_road")]);
    }

    #[test]
    fn producers_start_active_and_use_slots() {
        for def in starting_buildings() {
            assert_eq!(def.production.is_some(), def.default_active, "{}", def.id);
            assert_eq!(def.production.is_some(), def.consumes_slot, "{}", def.id);
            assert_eq!(def.production.is_some(), def.kind == BuildingKind::Production, "{}", def.id);
        }
    }

    #[test]
    fn starting_catalog_yaml_shape_matches() {
        let yaml = r#"
default_style: grass
styles:
  - id: grass
buildings:
  - id: forester
    kind: production
    default_active: true
    consumes_slot: true
    production:
      type: multi_plot
      plots: 3
      base_rate: "0.1"
      bonuses: [{ tag: forest, per_tile: "0.02" }]
      harvest: [{ resource: wood, amount: 3 }]
      auto_replant: true
"#;
        let parsed = Catalog::from_yaml(yaml);
        assert!(parsed.is_ok());
        let built_in = starting_buildings()
            .into_iter()
            .find(|b| b.id.as_str() == "forester")
            .and_then(|b| b.production);
        let loaded = parsed
            .ok()
            .and_then(|c| c.building("forester").and_then(|b| b.production.clone()));
        let plots = |p: Option<ProductionProfile>| match p {
            Some(ProductionProfile::MultiPlot(m)) => Some((m.plots, m.base_rate, m.harvest)),
            _ => None,
        };
        assert_eq!(plots(built_in), plots(loaded));
    }
}
