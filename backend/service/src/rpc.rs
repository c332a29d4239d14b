//! JSON-RPC 2.0 marshalling for the host-facing method.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error};

use screencap_core::{UploadRequestParams, UploadResponse, METHOD_UPLOAD};

use crate::error::RequestError;
use crate::service::ScreenCaptureService;

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;

#[derive(Debug, Clone, Deserialize)]
pub struct RpcRequest {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

impl RpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RpcResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl RpcResponse {
    pub fn ok(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn err(id: Value, error: RpcError) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// Dispatch one method call against the service.
///
/// A rejected request is a normal result with `success: false`; only
/// protocol problems become RPC errors.
pub fn handle_call(
    service: &ScreenCaptureService,
    method: &str,
    params: Option<Value>,
) -> Result<Value, RpcError> {
    match method {
        METHOD_UPLOAD => {
            let params: UploadRequestParams = match params {
                None | Some(Value::Null) => UploadRequestParams::default(),
                Some(value) => serde_json::from_value(value)
                    .map_err(|e| RpcError::new(INVALID_PARAMS, format!("Invalid params: {e}")))?,
            };
            let response = match service
                .request_upload(params.url.as_deref(), params.call_guid.as_deref())
            {
                Ok(ticket) => {
                    debug!(job_id = %ticket.job_id, sequence = ticket.sequence, "Upload queued");
                    UploadResponse::accepted()
                }
                Err(RequestError::MissingUrl) => {
                    UploadResponse::rejected(RequestError::MissingUrl.to_string())
                }
                Err(e) => {
                    error!(error = %e, "Capture request could not be queued");
                    return Err(RpcError::new(INTERNAL_ERROR, e.to_string()));
                }
            };
            serde_json::to_value(response).map_err(|e| RpcError::new(INTERNAL_ERROR, e.to_string()))
        }
        other => Err(RpcError::new(
            METHOD_NOT_FOUND,
            format!("Method not found: {other}"),
        )),
    }
}

/// Handle a raw JSON-RPC request body.
pub fn handle_request(service: &ScreenCaptureService, body: Value) -> RpcResponse {
    let id = body.get("id").cloned().unwrap_or(Value::Null);
    let request: RpcRequest = match serde_json::from_value(body) {
        Ok(request) => request,
        Err(e) => {
            return RpcResponse::err(
                id,
                RpcError::new(INVALID_REQUEST, format!("Invalid request: {e}")),
            )
        }
    };
    if request.jsonrpc.as_deref().is_some_and(|v| v != "2.0") {
        return RpcResponse::err(id, RpcError::new(INVALID_REQUEST, "Unsupported jsonrpc version"));
    }
    match handle_call(service, &request.method, request.params) {
        Ok(result) => RpcResponse::ok(id, result),
        Err(error) => RpcResponse::err(id, error),
    }
}
