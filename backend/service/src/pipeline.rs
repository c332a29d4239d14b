//! The capture → encode → upload pipeline run for every accepted job.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use screencap_core::{
    CaptureJob, CompletionEvent, FramebufferSource, ImageUploader, JobRunner, UploadOutcome,
};
use screencap_logging::redact_url;
use screencap_media::encode_frame;

use crate::error::StageError;

/// Runs one job from start to finish on the dispatcher's worker.
///
/// Stages short-circuit: a failed capture skips encoding and upload, a failed
/// encode skips the upload. Whatever happens, the job yields one event.
pub struct CapturePipeline {
    source: Arc<dyn FramebufferSource>,
    uploader: Arc<dyn ImageUploader>,
}

impl CapturePipeline {
    pub fn new(source: Arc<dyn FramebufferSource>, uploader: Arc<dyn ImageUploader>) -> Self {
        Self { source, uploader }
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    async fn execute(&self, job: &CaptureJob) -> Result<(), StageError> {
        let started = Instant::now();

        let frame = self.source.capture().map_err(StageError::Capture)?;
        debug!(
            job_id = %job.job_id,
            backend = self.source.name(),
            width = frame.width(),
            height = frame.height(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Frame captured"
        );

        let image = encode_frame(&frame).map_err(StageError::Encode)?;
        // release the raw pixels before the network round trip
        drop(frame);
        debug!(job_id = %job.job_id, bytes = image.len(), "Frame encoded");

        match self.uploader.upload(&image, &job.destination_url).await {
            UploadOutcome::Success => Ok(()),
            UploadOutcome::Failure(reason) => Err(StageError::Upload(reason)),
        }
    }
}

#[async_trait]
impl JobRunner for CapturePipeline {
    async fn run(&self, job: CaptureJob) -> CompletionEvent {
        match self.execute(&job).await {
            Ok(()) => {
                info!(
                    job_id = %job.job_id,
                    url = %redact_url(&job.destination_url),
                    "Capture uploaded"
                );
                CompletionEvent::success(job.correlation_token)
            }
            Err(e) => {
                match &e {
                    StageError::Capture(cause) => {
                        warn!(job_id = %job.job_id, error = %cause, "Capture failed")
                    }
                    StageError::Encode(cause) => {
                        warn!(job_id = %job.job_id, error = %cause, "Encoding failed")
                    }
                    StageError::Upload(reason) => {
                        warn!(job_id = %job.job_id, reason = %reason, "Upload failed")
                    }
                }
                CompletionEvent::failure(job.correlation_token, e.to_string())
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{FakeSource, FakeUploader};
    use super::*;
    use screencap_core::{CaptureError, EncodeError};
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn test_success_uploads_png() {
        let uploader = Arc::new(FakeUploader::answering(UploadOutcome::Success));
        let pipeline = CapturePipeline::new(Arc::new(FakeSource::working()), uploader.clone());

        let event = pipeline.run(CaptureJob::new("http://h/up", "g-1")).await;
        assert!(event.succeeded);
        assert_eq!(event.message, "Success");
        assert_eq!(event.correlation_token, "g-1");

        let uploads = uploader.uploads.lock().unwrap();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].0, "http://h/up");
        assert_eq!(uploads[0].1.content_type, "image/png");
        assert_eq!(&uploads[0].1.data[..4], b"\x89PNG");
    }

    #[tokio::test]
    async fn test_capture_failure_skips_upload() {
        let source = Arc::new(FakeSource::broken());
        let uploader = Arc::new(FakeUploader::answering(UploadOutcome::Success));
        let pipeline = CapturePipeline::new(source.clone(), uploader.clone());

        let event = pipeline.run(CaptureJob::new("http://h/up", "g-2")).await;
        assert!(!event.succeeded);
        assert_eq!(event.message, "Failed to get screen data");
        assert_eq!(source.captures.load(Ordering::SeqCst), 1);
        assert!(uploader.uploads.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upload_failure_reason_is_reported() {
        let uploader = Arc::new(FakeUploader::answering(UploadOutcome::Failure(
            "response code:404".into(),
        )));
        let pipeline = CapturePipeline::new(Arc::new(FakeSource::working()), uploader);

        let event = pipeline.run(CaptureJob::new("http://h/up", "g-3")).await;
        assert!(!event.succeeded);
        assert_eq!(event.message, "Upload Failed: response code:404");
    }

    #[test]
    fn test_stage_messages() {
        let capture = StageError::Capture(CaptureError::Unavailable("x".into()));
        assert_eq!(capture.to_string(), "Failed to get screen data");

        let encode = StageError::Encode(EncodeError::EmptyInput);
        assert_eq!(encode.to_string(), "Failed to encode screen data");

        let upload = StageError::Upload("7:'connection refused'".into());
        assert_eq!(upload.to_string(), "Upload Failed: 7:'connection refused'");
    }
}
