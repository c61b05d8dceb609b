//! Type-safe string identifiers for catalog entries and resources.
//!
//! Tile styles, building definitions, and warehouse resources are all
//! addressed by stable string names that come from the external catalog and
//! appear verbatim in save files. Wrapping each in its own newtype keeps a
//! style name from being passed where a building name is expected.

use serde::{Deserialize, Serialize};

/// Generates a newtype wrapper around [`String`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Create an identifier from any string-like value.
            pub fn new(name: impl Into<String>) -> Self {
                Self(name.into())
            }

            /// Borrow the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Return the inner [`String`].
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(name: &str) -> Self {
                Self(name.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(name: String) -> Self {
                Self(name)
            }
        }

        impl core::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id! {
    /// Identifier of a tile style in the catalog (e.g. `"forest"`).
    StyleId
}

define_id! {
    /// Identifier of a building definition in the catalog (e.g. `"quarry"`).
    BuildingDefId
}

define_id! {
    /// Identifier of a warehouse resource (e.g. `"wood"`).
    ResourceId
}
