//! `screencap-config`: runtime configuration for the screencap service.
//!
//! Provides:
//! - Typed config schema (capture backend, worker thread, HTTP client, server, logging)
//! - YAML loading from the config directory
//! - `SCREENCAP_*` environment overrides
//! - Validation with warnings and hard errors

pub mod defaults;
pub mod env;
pub mod io;
pub mod schema;
pub mod validation;

pub use env::{apply_env_overrides, apply_env_overrides_with};
pub use io::{config_dir, config_file_path, load_config};
pub use schema::{
    CaptureConfig, DispatcherConfig, LoggingConfig, ScreenCapConfig, ServerConfig, UploadConfig,
};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{bail, Result};

/// Log the validation report and turn its errors into one failure.
pub fn check(config: &ScreenCapConfig) -> Result<()> {
    let report = validate(config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }
    if let Some(first) = report.errors.first() {
        bail!(
            "{} ({} config error(s) in total)",
            first,
            report.errors.len()
        );
    }
    Ok(())
}
