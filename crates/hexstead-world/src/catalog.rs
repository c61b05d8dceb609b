//! Read-only catalog of tile styles, building definitions, and the
//! settlement tier table.
//!
//! Everything else in the simulation refers to catalog entries by string
//! id. Lookups that must always produce a value ([`Catalog::resolve_style`])
//! fall back to the default style; lookups that may come up empty
//! ([`Catalog::resolve_building`]) log and return `None`. Neither ever
//! fails. `resolve_style` runs on every connectivity recompute, so its
//! misses log at debug level; loaders warn about unknown ids once, when
//! they read them.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use hexstead_types::{
    BuildingDefId, BuildingDefinition, BuildingKind, StyleId, TierDefinition, TileStyle,
};

use crate::error::WorldError;

/// On-disk shape of a catalog file.
#[derive(Debug, Deserialize)]
struct CatalogFile {
    default_style: StyleId,
    #[serde(default)]
    styles: Vec<TileStyle>,
    #[serde(default)]
    buildings: Vec<BuildingDefinition>,
    #[serde(default)]
    tiers: Vec<TierDefinition>,
}

/// Immutable lookup tables for catalog entries.
#[derive(Debug, Clone)]
pub struct Catalog {
    /// Tile styles by id.
    styles: BTreeMap<StyleId, TileStyle>,
    /// Building definitions by id.
    buildings: BTreeMap<BuildingDefId, BuildingDefinition>,
    /// Tier advancement rows by target tier.
    tiers: BTreeMap<u32, TierDefinition>,
    /// Fallback style for unresolved ids, also present in `styles`.
    default_style: TileStyle,
}

impl Catalog {
    /// Build a catalog from its parts.
    ///
    /// Later entries with a duplicate id replace earlier ones.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::MissingDefaultStyle`] if `default_style` is not
    /// among `styles`.
    pub fn from_parts(
        default_style: &StyleId,
        styles: Vec<TileStyle>,
        buildings: Vec<BuildingDefinition>,
        tiers: Vec<TierDefinition>,
    ) -> Result<Self, WorldError> {
        let styles: BTreeMap<StyleId, TileStyle> =
            styles.into_iter().map(|s| (s.id.clone(), s)).collect();
        let default = styles
            .get(default_style)
            .cloned()
            .ok_or_else(|| WorldError::MissingDefaultStyle(default_style.clone()))?;

        Ok(Self {
            styles,
            buildings: buildings.into_iter().map(|b| (b.id.clone(), b)).collect(),
            tiers: tiers.into_iter().map(|t| (t.tier, t)).collect(),
            default_style: default,
        })
    }

    /// Load a catalog from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::CatalogIo`] if the file cannot be read,
    /// [`WorldError::CatalogYaml`] if it is not valid YAML, or
    /// [`WorldError::MissingDefaultStyle`] if the default style is absent.
    pub fn from_file(path: &Path) -> Result<Self, WorldError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parse a catalog from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::CatalogYaml`] if the string is not valid YAML,
    /// or [`WorldError::MissingDefaultStyle`] if the default style is absent.
    pub fn from_yaml(yaml: &str) -> Result<Self, WorldError> {
        let file: CatalogFile = serde_yml::from_str(yaml)?;
        Self::from_parts(&file.default_style, file.styles, file.buildings, file.tiers)
    }

    // -------------------------------------------------------------------
    // Styles
    // -------------------------------------------------------------------

    /// Exact style lookup.
    pub fn style(&self, id: &str) -> Option<&TileStyle> {
        self.styles.get(id)
    }

    /// Style lookup that falls back to the default style on a miss.
    pub fn resolve_style(&self, id: &str) -> &TileStyle {
        self.styles.get(id).unwrap_or_else(|| {
            tracing::debug!(
                style = id,
                fallback = %self.default_style.id,
                "Unknown tile style, using default"
            );
            &self.default_style
        })
    }

    /// The fallback style.
    pub const fn default_style(&self) -> &TileStyle {
        &self.default_style
    }

    /// Iterate over all styles in id order.
    pub fn styles(&self) -> impl Iterator<Item = &TileStyle> {
        self.styles.values()
    }

    // -------------------------------------------------------------------
    // Buildings
    // -------------------------------------------------------------------

    /// Exact building lookup.
    pub fn building(&self, id: &str) -> Option<&BuildingDefinition> {
        self.buildings.get(id)
    }

    /// Building lookup that logs a warning on a miss.
    pub fn resolve_building(&self, id: &str) -> Option<&BuildingDefinition> {
        let found = self.buildings.get(id);
        if found.is_none() {
            tracing::warn!(building = id, "Unknown building definition");
        }
        found
    }

    /// The first definition of the Town-Hall kind, in id order.
    pub fn town_hall(&self) -> Option<&BuildingDefinition> {
        self.buildings
            .values()
            .find(|def| def.kind == BuildingKind::TownHall)
    }

    /// Iterate over all building definitions in id order.
    pub fn buildings(&self) -> impl Iterator<Item = &BuildingDefinition> {
        self.buildings.values()
    }

    // -------------------------------------------------------------------
    // Tiers
    // -------------------------------------------------------------------

    /// Requirements for advancing into `tier`, if the table has a row.
    pub fn tier(&self, tier: u32) -> Option<&TierDefinition> {
        self.tiers.get(&tier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
default_style: grass
styles:
  - id: grass
    name: Grass
  - id: dirt_road
    name: Dirt Road
    category: gameplay
    cost: { credits: 10 }
    tags: [road]
buildings:
  - id: town_hall
    kind: town_hall
  - id: hut
    cost: { credits: 5, resources: [{ resource: wood, amount: 2 }] }
    unlock_tier: 2
tiers:
  - tier: 2
    required_investment: 20
    credit_reward: 50
"#;

    #[allow(clippy::unwrap_used)]
    fn catalog() -> Catalog {
        Catalog::from_yaml(YAML).unwrap()
    }

    #[test]
    fn parses_yaml_catalog() {
        let catalog = catalog();
        assert_eq!(catalog.styles().count(), 2);
        assert!(catalog.style("dirt_road").is_some_and(TileStyle::is_road));
        assert_eq!(catalog.building("hut").map(|b| b.unlock_tier), Some(2));
        assert_eq!(catalog.tier(2).map(|t| t.credit_reward), Some(50));
        assert!(catalog.tier(3).is_none());
        assert_eq!(
            catalog.town_hall().map(|b| b.id.as_str()),
            Some("town_hall")
        );
    }

    #[test]
    fn unknown_style_falls_back_to_default() {
        let catalog = catalog();
        assert_eq!(catalog.resolve_style("marble").id.as_str(), "grass");
        assert_eq!(catalog.resolve_style("dirt_road").id.as_str(), "dirt_road");
    }

    #[test]
    fn unknown_building_resolves_to_none() {
        let catalog = catalog();
        assert!(catalog.resolve_building("castle").is_none());
    }

    #[test]
    fn missing_default_style_is_rejected() {
        let result = Catalog::from_parts(&StyleId::new("void"), Vec::new(), Vec::new(), Vec::new());
        assert!(matches!(result, Err(WorldError::MissingDefaultStyle(_))));
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        let result = Catalog::from_yaml("styles: [");
        assert!(matches!(result, Err(WorldError::CatalogYaml(_))));
    }
}
