//! Config file location and loading.

use crate::schema::ApproveTapConfig;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

const CONFIG_FILE_NAME: &str = "config.yaml";

/// `APPROVETAP_CONFIG_DIR` if set, else `~/.approvetap/`.
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("APPROVETAP_CONFIG_DIR") {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }
    dirs::home_dir()
        .map(|home| home.join(".approvetap"))
        .unwrap_or_else(|| PathBuf::from(".approvetap"))
}

pub fn config_file_path(config_dir: &Path) -> PathBuf {
    config_dir.join(CONFIG_FILE_NAME)
}

/// Parse the YAML at `path` without any post-processing.
///
/// A missing file yields the default config (first run). An empty file does
/// too.
pub async fn load_config(path: &Path) -> Result<ApproveTapConfig> {
    if !fs::try_exists(path).await.unwrap_or(false) {
        debug!(path = %path.display(), "Config file does not exist; using defaults");
        return Ok(ApproveTapConfig::default());
    }

    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    if raw.trim().is_empty() {
        return Ok(ApproveTapConfig::default());
    }

    let config: ApproveTapConfig = serde_yaml::from_str(&raw)
        .with_context(|| format!("Failed to parse config YAML at: {}", path.display()))?;

    info!(path = %path.display(), "Loaded config");
    Ok(config)
}
