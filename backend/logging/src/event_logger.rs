//! Completion Event Logger
//!
//! Every finished job is recorded on the `capture_events` target before the
//! event is handed on to its real consumer.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use screencap_core::{CompletionEvent, CompletionSink};

use crate::redact::redact_sensitive_data;

#[derive(Debug, Serialize)]
pub struct CompletionLogEntry {
    pub call_guid: String,
    pub status: bool,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl From<&CompletionEvent> for CompletionLogEntry {
    fn from(event: &CompletionEvent) -> Self {
        Self {
            call_guid: event.correlation_token.clone(),
            status: event.succeeded,
            message: redact_sensitive_data(&event.message),
            timestamp: Utc::now(),
        }
    }
}

/// A [`CompletionSink`] that logs each event and forwards it to an inner sink.
pub struct CompletionLogger {
    inner: Arc<dyn CompletionSink>,
}

impl CompletionLogger {
    pub fn new(inner: Arc<dyn CompletionSink>) -> Self {
        Self { inner }
    }

    pub fn log_event(event: &CompletionEvent) {
        let entry = CompletionLogEntry::from(event);
        let json = serde_json::to_string(&entry).unwrap_or_default();
        if entry.status {
            info!(target: "capture_events", call_guid = %entry.call_guid, entry = %json, "Upload complete");
        } else {
            warn!(target: "capture_events", call_guid = %entry.call_guid, entry = %json, "Upload failed");
        }
    }
}

impl CompletionSink for CompletionLogger {
    fn publish(&self, event: CompletionEvent) {
        Self::log_event(&event);
        self.inner.publish(event);
    }
}
