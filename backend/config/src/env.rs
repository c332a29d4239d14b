//! Environment variable overrides applied on top of the config file.
//!
//! | Variable               | Field                         |
//! |------------------------|-------------------------------|
//! | `SCREENCAP_DUMP_PATH`  | `capture.dumpPath` (fileDump) |
//! | `SCREENCAP_BIND`       | `server.bindAddress`          |
//! | `SCREENCAP_PORT`       | `server.port`                 |
//! | `SCREENCAP_LOG_LEVEL`  | `logging.level`               |
//! | `SCREENCAP_LOG_DIR`    | `logging.dir`                 |

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::schema::{CaptureConfig, ScreenCapConfig};

pub const ENV_DUMP_PATH: &str = "SCREENCAP_DUMP_PATH";
pub const ENV_BIND: &str = "SCREENCAP_BIND";
pub const ENV_PORT: &str = "SCREENCAP_PORT";
pub const ENV_LOG_LEVEL: &str = "SCREENCAP_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "SCREENCAP_LOG_DIR";

/// Apply overrides from the process environment.
pub fn apply_env_overrides(config: ScreenCapConfig) -> Result<ScreenCapConfig> {
    apply_env_overrides_with(config, &std::env::vars().collect())
}

/// Apply overrides from a provided map (useful for testing).
pub fn apply_env_overrides_with(
    mut config: ScreenCapConfig,
    env: &HashMap<String, String>,
) -> Result<ScreenCapConfig> {
    let get = |key: &str| env.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());

    if let Some(path) = get(ENV_DUMP_PATH) {
        match &mut config.capture {
            CaptureConfig::FileDump { dump_path } => {
                debug!(path, "Dump path overridden from environment");
                *dump_path = PathBuf::from(path);
            }
            other => warn!(
                backend = other.backend_name(),
                "{ENV_DUMP_PATH} ignored for this capture backend"
            ),
        }
    }
    if let Some(bind) = get(ENV_BIND) {
        config.server.bind_address = bind.to_string();
    }
    if let Some(port) = get(ENV_PORT) {
        config.server.port = port
            .parse()
            .with_context(|| format!("{ENV_PORT} is not a valid port: {port}"))?;
    }
    if let Some(level) = get(ENV_LOG_LEVEL) {
        config.logging.level = level.to_string();
    }
    if let Some(dir) = get(ENV_LOG_DIR) {
        config.logging.dir = Some(PathBuf::from(dir));
    }
    Ok(config)
}
