use async_trait::async_trait;

use crate::error::CaptureError;
use crate::types::{CaptureJob, CompletionEvent, EncodedImage, RawFrame, UploadOutcome};

/// A source of raw framebuffer snapshots.
///
/// Exactly one implementation backs a running service. Implementations must
/// release every file handle or surface they acquire before returning.
pub trait FramebufferSource: Send + Sync {
    /// Short backend name used in logs (e.g. "file-dump").
    fn name(&self) -> &str;

    /// Acquire one snapshot of the current screen contents.
    fn capture(&self) -> Result<RawFrame, CaptureError>;
}

/// Delivers an encoded image to a remote endpoint.
#[async_trait]
pub trait ImageUploader: Send + Sync {
    /// Perform a single upload attempt and classify its result.
    async fn upload(&self, image: &EncodedImage, url: &str) -> UploadOutcome;
}

/// Runs the full pipeline for one job and reports what happened.
#[async_trait]
pub trait JobRunner: Send + Sync + 'static {
    async fn run(&self, job: CaptureJob) -> CompletionEvent;
}

/// Receives completion events as jobs finish.
pub trait CompletionSink: Send + Sync {
    fn publish(&self, event: CompletionEvent);
}
