//! Config defaults used when a value is absent from the file.

use std::path::PathBuf;

use screencap_capture::hardware::{DEFAULT_CLIENT_NAME, DEFAULT_SURFACE_HEIGHT, DEFAULT_SURFACE_WIDTH};
use screencap_capture::DEFAULT_DUMP_PATH;
use screencap_scheduler::{DEFAULT_STACK_SIZE, DEFAULT_THREAD_NAME};

/// Default JSON-RPC port for `screencap serve`.
pub const DEFAULT_PORT: u16 = 9998;

/// Default bind address; loopback only.
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1";

/// Default worker stack size in KiB.
pub const DEFAULT_STACK_SIZE_KB: usize = DEFAULT_STACK_SIZE / 1024;

pub const DEFAULT_LOG_LEVEL: &str = "info";

pub fn dump_path() -> PathBuf {
    PathBuf::from(DEFAULT_DUMP_PATH)
}

pub fn client_name() -> String {
    DEFAULT_CLIENT_NAME.to_string()
}

pub fn surface_width() -> u32 {
    DEFAULT_SURFACE_WIDTH
}

pub fn surface_height() -> u32 {
    DEFAULT_SURFACE_HEIGHT
}

pub fn thread_name() -> String {
    DEFAULT_THREAD_NAME.to_string()
}

pub fn stack_size_kb() -> usize {
    DEFAULT_STACK_SIZE_KB
}

pub fn bind_address() -> String {
    DEFAULT_BIND_ADDRESS.to_string()
}

pub fn port() -> u16 {
    DEFAULT_PORT
}

pub fn log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}
