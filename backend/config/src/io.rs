//! Config file location and loading.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;
use tracing::{debug, info};

use crate::schema::ScreenCapConfig;

/// Default config file name within the config directory.
const CONFIG_FILE_NAME: &str = "config.yaml";

pub const ENV_CONFIG_DIR: &str = "SCREENCAP_CONFIG_DIR";

/// Resolve the config directory.
/// Priority: `SCREENCAP_CONFIG_DIR` env > `~/.screencap/`
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(ENV_CONFIG_DIR) {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }
    match dirs::home_dir() {
        Some(home) => home.join(".screencap"),
        None => PathBuf::from(".screencap"),
    }
}

/// Resolve the full path to the main config file.
pub fn config_file_path(config_dir: &Path) -> PathBuf {
    config_dir.join(CONFIG_FILE_NAME)
}

/// Load and parse the config from disk.
///
/// Returns `Ok(Default::default())` if the file doesn't exist (first run).
pub async fn load_config(path: &Path) -> Result<ScreenCapConfig> {
    if !fs::try_exists(path).await.unwrap_or(false) {
        debug!(path = %path.display(), "Config file does not exist; using defaults");
        return Ok(ScreenCapConfig::default());
    }

    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    // An empty file deserializes to null, not to an empty map.
    if raw.trim().is_empty() {
        return Ok(ScreenCapConfig::default());
    }

    let config: ScreenCapConfig = serde_yaml::from_str(&raw)
        .with_context(|| format!("Failed to parse config YAML at: {}", path.display()))?;

    info!(path = %path.display(), backend = config.capture.backend_name(), "Loaded config");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::CaptureConfig;

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("screencap-config-{}", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_missing_file_gives_defaults() {
        let dir = scratch_dir();
        let config = load_config(&config_file_path(&dir)).await.unwrap();
        assert_eq!(config.capture, CaptureConfig::default());
    }

    #[tokio::test]
    async fn test_empty_file_gives_defaults() {
        let dir = scratch_dir();
        std::fs::create_dir_all(&dir).unwrap();
        let path = config_file_path(&dir);
        std::fs::write(&path, "\n").unwrap();

        let config = load_config(&path).await.unwrap();
        assert_eq!(config.logging.level, "info");
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn test_malformed_yaml_reports_path() {
        let dir = scratch_dir();
        std::fs::create_dir_all(&dir).unwrap();
        let path = config_file_path(&dir);
        std::fs::write(&path, "server: [not, a, map").unwrap();

        let err = load_config(&path).await.unwrap_err();
        assert!(format!("{err:#}").contains("config.yaml"));
        let _ = std::fs::remove_dir_all(dir);
    }
}
