use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use futures::stream::StreamExt;
use serde_json::{json, Value};
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tracing::{debug, warn};

use screencap_core::UploadCompleteEvent;
use screencap_service::rpc::{RpcError, RpcResponse, PARSE_ERROR};
use screencap_service::{handle_request, ScreenCaptureService};

/// Shared application state for API handlers.
pub struct AppState {
    pub service: Arc<ScreenCaptureService>,
}

/// Build the Axum router with all API routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/jsonrpc", post(jsonrpc))
        .route("/api/ws", get(ws_handler))
        .with_state(state)
}

/// JSON-RPC 2.0 endpoint. Always answers 200 with a response envelope.
async fn jsonrpc(State(state): State<Arc<AppState>>, body: String) -> Json<RpcResponse> {
    let request: Value = match serde_json::from_str(&body) {
        Ok(value) => value,
        Err(e) => {
            debug!(error = %e, "Unparseable JSON-RPC body");
            return Json(RpcResponse::err(
                Value::Null,
                RpcError::new(PARSE_ERROR, format!("Parse error: {e}")),
            ));
        }
    };
    Json(handle_request(&state.service, request))
}

/// WebSocket feed of `uploadComplete` notifications.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>) {
    let mut stream = BroadcastStream::new(state.service.subscribe());

    while let Some(msg) = stream.next().await {
        match msg {
            Ok(event) => {
                let notification = UploadCompleteEvent::from(&event).to_notification();
                if socket
                    .send(Message::Text(notification.to_string().into()))
                    .await
                    .is_err()
                {
                    break;
                }
            }
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                warn!(skipped, "WebSocket client fell behind, events dropped");
            }
        }
    }
    debug!("WebSocket client disconnected");
}

/// Health check endpoint.
async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "screencap",
        "version": env!("CARGO_PKG_VERSION"),
        "backend": state.service.backend(),
        "accepted": state.service.accepted(),
        "pending": state.service.pending(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use screencap_core::{
        CaptureError, EncodedImage, FramebufferSource, ImageUploader, RawFrame, UploadOutcome,
    };
    use screencap_scheduler::DispatcherOptions;
    use std::time::Duration;
    use tokio::net::TcpListener;

    struct DarkScreen;

    impl FramebufferSource for DarkScreen {
        fn name(&self) -> &str {
            "dark"
        }

        fn capture(&self) -> Result<RawFrame, CaptureError> {
            Err(CaptureError::Unavailable("display off".into()))
        }
    }

    struct NullUploader;

    #[async_trait]
    impl ImageUploader for NullUploader {
        async fn upload(&self, _image: &EncodedImage, _url: &str) -> UploadOutcome {
            UploadOutcome::Success
        }
    }

    async fn serve() -> (String, Arc<ScreenCaptureService>) {
        let service = Arc::new(
            ScreenCaptureService::start(
                Arc::new(DarkScreen),
                Arc::new(NullUploader),
                DispatcherOptions::default(),
            )
            .unwrap(),
        );
        let app = build_router(Arc::new(AppState {
            service: Arc::clone(&service),
        }));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        (format!("http://{addr}"), service)
    }

    #[tokio::test]
    async fn test_health_reports_backend() {
        let (base, _service) = serve().await;
        let body: Value = reqwest::get(format!("{base}/api/health"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["backend"], "dark");
        assert_eq!(body["accepted"], 0);
    }

    #[tokio::test]
    async fn test_jsonrpc_upload_emits_event() {
        let (base, service) = serve().await;
        let mut events = service.subscribe();

        let body: Value = reqwest::Client::new()
            .post(format!("{base}/jsonrpc"))
            .body(
                json!({
                    "jsonrpc": "2.0",
                    "id": 1,
                    "method": "uploadScreenCapture",
                    "params": { "url": "http://127.0.0.1:9/up", "callGUID": "call-1" }
                })
                .to_string(),
            )
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["id"], 1);
        assert_eq!(body["result"]["success"], true);

        let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.correlation_token, "call-1");
        assert_eq!(event.message, "Failed to get screen data");
    }

    #[tokio::test]
    async fn test_jsonrpc_errors() {
        let (base, _service) = serve().await;
        let client = reqwest::Client::new();

        let body: Value = client
            .post(format!("{base}/jsonrpc"))
            .body("{not json")
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["error"]["code"], PARSE_ERROR);

        let body: Value = client
            .post(format!("{base}/jsonrpc"))
            .body(json!({ "jsonrpc": "2.0", "id": 2, "method": "nope" }).to_string())
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["error"]["code"], -32601);
    }
}
