//! Host-facing wire types for the upload method and its completion event.

use serde::{Deserialize, Serialize};

use crate::types::CompletionEvent;

/// Inbound method name.
pub const METHOD_UPLOAD: &str = "uploadScreenCapture";

/// Outbound event name.
pub const EVT_UPLOAD_COMPLETE: &str = "uploadComplete";

/// Parameters of `uploadScreenCapture`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadRequestParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(rename = "callGUID", default, skip_serializing_if = "Option::is_none")]
    pub call_guid: Option<String>,
}

/// Synchronous reply to `uploadScreenCapture`: acceptance only, never the pipeline result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl UploadResponse {
    pub fn accepted() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

/// Payload of the `uploadComplete` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadCompleteEvent {
    pub status: bool,
    pub message: String,
    pub call_guid: String,
}

impl From<&CompletionEvent> for UploadCompleteEvent {
    fn from(event: &CompletionEvent) -> Self {
        Self {
            status: event.succeeded,
            message: event.message.clone(),
            call_guid: event.correlation_token.clone(),
        }
    }
}

impl UploadCompleteEvent {
    /// Wrap the payload as a JSON-RPC 2.0 notification.
    pub fn to_notification(&self) -> serde_json::Value {
        serde_json::json!({
            "jsonrpc": "2.0",
            "method": EVT_UPLOAD_COMPLETE,
            "params": self,
        })
    }
}
