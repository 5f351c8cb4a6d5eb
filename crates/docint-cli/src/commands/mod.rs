//! CLI subcommands.

pub mod config;
pub mod extract;
pub mod models;
pub mod run;
pub mod serve;

use std::path::{Path, PathBuf};

use tracing::debug;

use docint_core::models::config::DocintConfig;

/// Per-user configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("docint")
        .join("config.json")
}

/// Configuration from `--config`, else the per-user file, else defaults.
///
/// When the configured model directory is missing but the encoder was
/// downloaded with `docint models download`, the downloaded copy is used.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<DocintConfig> {
    let mut config = match config_path {
        Some(path) => DocintConfig::from_file(Path::new(path))?,
        None => {
            let path = default_config_path();
            if path.exists() {
                debug!("Using config file {}", path.display());
                DocintConfig::from_file(&path)?
            } else {
                DocintConfig::default()
            }
        }
    };

    let downloaded = models::default_model_dir();
    if !config.vectorizer.model_dir.exists() && downloaded.exists() {
        debug!("Using downloaded encoder at {}", downloaded.display());
        config.vectorizer.model_dir = downloaded;
    }

    Ok(config)
}
