//! Headless driver binary for the Hexstead simulation.
//!
//! Wires configuration, the settlement aggregate, and the save file
//! together and runs the frame and production-tick cadences until the tick
//! limit or Ctrl-C.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `hexstead-config.yaml` (defaults if absent)
//! 2. Initialize structured logging (tracing)
//! 3. Build a fresh settlement from the configured catalog
//! 4. Restore the save file if one exists, else keep the fresh settlement
//! 5. Run the session loop
//! 6. Write the final save and log the result

mod error;
mod runner;

use std::path::Path;

use anyhow::Context as _;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use hexstead_core::config::LoggingConfig;
use hexstead_core::{SettlementBuilder, SettlementConfig};

use crate::error::EngineError;

/// Configuration file, relative to the working directory.
const CONFIG_PATH: &str = "hexstead-config.yaml";

/// Application entry point for the engine.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration.
    let config_path = Path::new(CONFIG_PATH);
    let config = load_config(config_path).context("loading configuration")?;

    // 2. Initialize structured logging.
    init_logging(&config.logging);
    info!("hexstead-engine starting");
    if config_path.exists() {
        info!(path = CONFIG_PATH, "Configuration loaded");
    } else {
        info!("Config file not found, using defaults");
    }

    let timing = config.timing.clone();
    let save_path = config.save.path.clone();

    // 3. Build the settlement.
    let mut settlement = SettlementBuilder::new(config)
        .build()
        .map_err(EngineError::from)
        .context("building settlement")?;

    // 4. Restore the save, if any.
    if save_path.exists() {
        if let Err(e) = settlement.load_from_file(&save_path) {
            warn!(
                error = %e,
                path = %save_path.display(),
                "Save file unreadable, starting a fresh settlement"
            );
        }
    } else {
        info!(path = %save_path.display(), "No save file, starting a fresh settlement");
    }

    // 5. Run the session.
    let result =
        runner::run_session(&mut settlement, &timing, Some(&save_path), shutdown_signal()).await;

    // 6. Final save and summary.
    settlement
        .save_to_file(&save_path)
        .map_err(EngineError::from)
        .with_context(|| format!("writing final save to {}", save_path.display()))?;
    runner::log_session_end(&result, &settlement);

    info!("hexstead-engine shutdown complete");
    Ok(())
}

/// Load the settlement configuration from `path`, or defaults when the
/// file does not exist.
fn load_config(path: &Path) -> Result<SettlementConfig, EngineError> {
    if path.exists() {
        Ok(SettlementConfig::from_file(path)?)
    } else {
        Ok(SettlementConfig::default())
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the configured level.
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Resolve on Ctrl-C. If the handler cannot be installed the session runs
/// until its tick limit.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
