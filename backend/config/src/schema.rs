//! screencap runtime configuration schema.
//!
//! Typed for serde YAML/JSON deserialization. Every section is optional in
//! the file; missing values fall back to the constants in [`crate::defaults`].

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use screencap_capture::{PixelFormat, ScreenshotWindow};

use crate::defaults;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenCapConfig {
    /// Which framebuffer backend this deployment uses
    #[serde(default)]
    pub capture: CaptureConfig,

    /// Worker thread settings
    #[serde(default)]
    pub dispatcher: DispatcherConfig,

    /// HTTP client settings
    #[serde(default)]
    pub upload: UploadConfig,

    /// JSON-RPC server settings for `screencap serve`
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// Capture
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "camelCase")]
pub enum CaptureConfig {
    /// Read the display driver's framebuffer dump file
    #[serde(rename_all = "camelCase")]
    FileDump {
        #[serde(default = "defaults::dump_path")]
        dump_path: PathBuf,
    },

    /// Ask the hardware graphics stack for a screenshot surface
    #[serde(rename_all = "camelCase")]
    HardwareSession {
        #[serde(default = "defaults::client_name")]
        client_name: String,
        #[serde(default = "defaults::surface_width")]
        width: u32,
        #[serde(default = "defaults::surface_height")]
        height: u32,
        #[serde(default)]
        pixel_format: PixelFormat,
        #[serde(default)]
        window: ScreenshotWindow,
    },
}

impl Default for CaptureConfig {
    fn default() -> Self {
        CaptureConfig::FileDump {
            dump_path: defaults::dump_path(),
        }
    }
}

impl CaptureConfig {
    pub fn backend_name(&self) -> &'static str {
        match self {
            CaptureConfig::FileDump { .. } => "fileDump",
            CaptureConfig::HardwareSession { .. } => "hardwareSession",
        }
    }
}

// ---------------------------------------------------------------------------
// Dispatcher / upload / server / logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatcherConfig {
    #[serde(default = "defaults::thread_name")]
    pub thread_name: String,
    /// Worker thread stack size in KiB
    #[serde(default = "defaults::stack_size_kb")]
    pub stack_size_kb: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            thread_name: defaults::thread_name(),
            stack_size_kb: defaults::stack_size_kb(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    #[serde(default = "defaults::bind_address")]
    pub bind_address: String,
    #[serde(default = "defaults::port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: defaults::bind_address(),
            port: defaults::port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    #[serde(default = "defaults::log_level")]
    pub level: String,
    /// Directory for rotated JSON logs; console only when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
            dir: None,
        }
    }
}
