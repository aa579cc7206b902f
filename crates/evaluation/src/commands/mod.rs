//! Command implementations.

mod config;
mod drive;
mod evaluate;
mod weather;

pub use config::run_config;
pub use drive::run_drive;
pub use evaluate::run_evaluate;
pub use weather::run_weather;
#[cfg(test)]
pub(crate) use weather::preset_listing;

use std::path::Path;

use anyhow::{Context, Result};
use config_loader::{ConfigLoader, LayeredSettings};
use tracing::{info, warn};

/// Settings from `path`, or the built-in defaults
fn load_settings(path: Option<&Path>) -> Result<LayeredSettings> {
    match path {
        Some(path) => {
            info!(config = %path.display(), "Loading settings");
            if !path.exists() {
                anyhow::bail!("Settings file not found: {}", path.display());
            }
            ConfigLoader::load_from_path(path)
                .with_context(|| format!("Failed to load settings from {}", path.display()))
        }
        None => Ok(ConfigLoader::defaults()),
    }
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
