//! One-shot capture: accept one request, wait for its event, print it.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use screencap_config::ScreenCapConfig;
use screencap_core::{CompletionEvent, UploadCompleteEvent};
use screencap_service::ScreenCaptureService;

pub async fn run(config: &ScreenCapConfig, url: &str, call_guid: Option<&str>) -> Result<CompletionEvent> {
    let service = Arc::new(
        ScreenCaptureService::from_config(config, None).context("Failed to start capture service")?,
    );
    let mut events = service.subscribe();

    let ticket = service
        .request_upload(Some(url), call_guid)
        .context("Capture request rejected")?;
    info!(job_id = %ticket.job_id, backend = service.backend(), "Capture queued");

    let event = events
        .recv()
        .await
        .context("Capture service stopped before reporting")?;

    let drain = Arc::clone(&service);
    tokio::task::spawn_blocking(move || drain.shutdown())
        .await
        .context("Capture service shutdown panicked")?;

    let wire = UploadCompleteEvent::from(&event);
    println!("{}", serde_json::to_string_pretty(&wire)?);
    Ok(event)
}
