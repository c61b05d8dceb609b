//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure mode of startup and the final
//! save, so `main` can propagate with `?`.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: hexstead_core::ConfigError,
    },

    /// Building the settlement failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: hexstead_world::WorldError,
    },

    /// Saving failed.
    #[error("save error: {source}")]
    Persistence {
        /// The underlying persistence error.
        #[from]
        source: hexstead_core::PersistenceError,
    },
}
