//! Enumeration types for the Hexstead simulation.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Edit modes
// ---------------------------------------------------------------------------

/// What a placement click does in the settlement editor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EditMode {
    /// Claim new cells or repaint owned cells with the selected style.
    #[default]
    Tiles,
    /// Like [`EditMode::Tiles`] but restricted to road-tagged styles.
    Roads,
    /// Place the selected building definition on an owned cell.
    Buildings,
    /// Raise the tier of an owned cell.
    TileUpgrade,
    /// Remove the building on a cell, or the cell itself when empty.
    Delete,
}

impl EditMode {
    /// Modes the player picked on purpose and that a new selection must not
    /// silently replace.
    pub const fn is_sticky(self) -> bool {
        matches!(self, Self::Delete | Self::TileUpgrade)
    }
}

// ---------------------------------------------------------------------------
// Catalog categories
// ---------------------------------------------------------------------------

/// Whether a tile style affects gameplay or only looks different.
///
/// The pair `(old, new)` decides which repaint cost regime applies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileCategory {
    /// Purely visual; free to swap between cosmetic styles.
    #[default]
    Cosmetic,
    /// Feeds adjacency bonuses or connectivity; costs to paint and remove.
    Gameplay,
}

/// Broad role of a building definition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingKind {
    /// The settlement seat. Exactly one lives on the origin cell and it can
    /// never be removed.
    TownHall,
    /// Storage building. Always unlocked regardless of blueprints.
    Warehouse,
    /// Runs a production module and counts against the building cap.
    Production,
    /// Ornamental; no module, no slot.
    #[default]
    Decoration,
}

impl BuildingKind {
    /// Kinds that bypass the external blueprint check.
    pub const fn always_unlocked(self) -> bool {
        matches!(self, Self::TownHall | Self::Warehouse)
    }
}

// ---------------------------------------------------------------------------
// Production
// ---------------------------------------------------------------------------

/// Output split selector for single-meter capture buildings.
///
/// Each variant applies a fixed multiplier pair to the primary and secondary
/// output quantities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureFocus {
    /// Both outputs at their base quantity.
    #[default]
    Balanced,
    /// More of the primary output, less of the secondary.
    FavorPrimary,
    /// More of the secondary output, less of the primary.
    FavorSecondary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sticky_modes() {
        assert!(EditMode::Delete.is_sticky());
        assert!(EditMode::TileUpgrade.is_sticky());
        assert!(!EditMode::Tiles.is_sticky());
        assert!(!EditMode::Roads.is_sticky());
        assert!(!EditMode::Buildings.is_sticky());
    }

    #[test]
    fn always_unlocked_kinds() {
        assert!(BuildingKind::TownHall.always_unlocked());
        assert!(BuildingKind::Warehouse.always_unlocked());
        assert!(!BuildingKind::Production.always_unlocked());
        assert!(!BuildingKind::Decoration.always_unlocked());
    }

    #[test]
    fn categories_use_snake_case() {
        let json = serde_json::to_string(&TileCategory::Gameplay).ok();
        assert_eq!(json.as_deref(), Some("\"gameplay\""));
        let focus: Option<CaptureFocus> = serde_json::from_str("\"favor_secondary\"").ok();
        assert_eq!(focus, Some(CaptureFocus::FavorSecondary));
    }
}
