//! Telemetry and structured logging components for screencap.
//!
//! Handles subscriber setup with optional NDJSON file rotation, URL and token
//! redaction, and logging of completion events.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{CompletionLogEntry, CompletionLogger};
pub use logger::init_logger;
pub use redact::{redact_sensitive_data, redact_url};
