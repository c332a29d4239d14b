//! Config validation: deep checks with user-friendly error messages.

use crate::schema::{CaptureConfig, ScreenCapConfig};
use thiserror::Error;

/// Smallest worker stack accepted; the HTTP client needs more than a bare thread.
pub const MIN_STACK_SIZE_KB: usize = 256;

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// A collection of validation errors found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &ScreenCapConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_capture(config, &mut report);
    validate_dispatcher(config, &mut report);
    validate_upload(config, &mut report);
    validate_server(config, &mut report);
    validate_logging(config, &mut report);
    report
}

fn validate_capture(config: &ScreenCapConfig, report: &mut ValidationReport) {
    match &config.capture {
        CaptureConfig::FileDump { dump_path } => {
            if dump_path.as_os_str().is_empty() {
                report.error("capture.dumpPath", "Dump path cannot be empty");
            } else if dump_path.is_relative() {
                report.warn(
                    "capture.dumpPath",
                    "Dump path is relative; it resolves against the working directory",
                );
            }
        }
        CaptureConfig::HardwareSession {
            client_name,
            width,
            height,
            ..
        } => {
            if client_name.trim().is_empty() {
                report.error("capture.clientName", "Session client name cannot be empty");
            }
            if *width == 0 || *height == 0 {
                report.error(
                    "capture",
                    format!("Surface size must be non-zero, got {width}x{height}"),
                );
            } else if *width > 8192 || *height > 8192 {
                report.warn(
                    "capture",
                    format!("Surface size {width}x{height} is unusually large"),
                );
            }
        }
    }
}

fn validate_dispatcher(config: &ScreenCapConfig, report: &mut ValidationReport) {
    let dispatcher = &config.dispatcher;
    if dispatcher.thread_name.trim().is_empty() {
        report.error("dispatcher.threadName", "Thread name cannot be empty");
    }
    if dispatcher.thread_name.contains('\0') {
        report.error("dispatcher.threadName", "Thread name cannot contain NUL bytes");
    }
    if dispatcher.stack_size_kb < MIN_STACK_SIZE_KB {
        report.error(
            "dispatcher.stackSizeKb",
            format!(
                "Stack size {} KiB is below the minimum of {MIN_STACK_SIZE_KB} KiB",
                dispatcher.stack_size_kb
            ),
        );
    }
}

fn validate_upload(config: &ScreenCapConfig, report: &mut ValidationReport) {
    if let Some(agent) = &config.upload.user_agent {
        if agent.trim().is_empty() {
            report.warn("upload.userAgent", "Empty user agent; the client default is used");
        }
    }
}

fn validate_server(config: &ScreenCapConfig, report: &mut ValidationReport) {
    if config.server.bind_address.trim().is_empty() {
        report.error("server.bindAddress", "Bind address cannot be empty");
    }
    if config.server.port == 0 {
        report.warn("server.port", "Port 0 binds an ephemeral port");
    }
}

fn validate_logging(config: &ScreenCapConfig, report: &mut ValidationReport) {
    if config.logging.level.trim().is_empty() {
        report.error("logging.level", "Log level cannot be empty");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::DispatcherConfig;
    use std::path::PathBuf;

    #[test]
    fn test_default_config_is_valid() {
        let report = validate(&ScreenCapConfig::default());
        assert!(report.is_valid());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_zero_surface_is_error() {
        let mut config = ScreenCapConfig::default();
        config.capture = CaptureConfig::HardwareSession {
            client_name: "screencap".into(),
            width: 0,
            height: 720,
            pixel_format: Default::default(),
            window: Default::default(),
        };
        let report = validate(&config);
        assert!(!report.is_valid());
        assert_eq!(report.errors[0].path, "capture");
    }

    #[test]
    fn test_relative_dump_path_warns() {
        let mut config = ScreenCapConfig::default();
        config.capture = CaptureConfig::FileDump {
            dump_path: PathBuf::from("dump/wbp"),
        };
        let report = validate(&config);
        assert!(report.is_valid());
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_small_stack_is_error() {
        let mut config = ScreenCapConfig::default();
        config.dispatcher = DispatcherConfig {
            thread_name: "w".into(),
            stack_size_kb: 64,
        };
        let report = validate(&config);
        assert!(report
            .errors
            .iter()
            .any(|e| e.path == "dispatcher.stackSizeKb"));
    }

    #[test]
    fn test_nul_in_thread_name_is_error() {
        let mut config = ScreenCapConfig::default();
        config.dispatcher.thread_name = "bad\0name".into();
        assert!(!validate(&config).is_valid());
    }
}
