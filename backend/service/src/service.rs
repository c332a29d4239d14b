use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

use screencap_capture::GraphicsStack;
use screencap_config::{DispatcherConfig, ScreenCapConfig};
use screencap_core::{
    CaptureJob, CompletionBus, CompletionEvent, CompletionSink, FramebufferSource, ImageUploader,
};
use screencap_logging::{redact_url, CompletionLogger};
use screencap_scheduler::{DispatcherOptions, JobDispatcher};
use screencap_uploader::HttpUploader;

use crate::error::{RequestError, ServiceError};
use crate::pipeline::CapturePipeline;
use crate::source::build_source;

/// Receipt for an accepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct JobTicket {
    pub job_id: Uuid,
    /// Acceptance order; completion events arrive in this order.
    pub sequence: u64,
}

struct Acceptance {
    dispatcher: Option<JobDispatcher>,
    accepted: u64,
}

/// Front door of the capture pipeline.
///
/// Accepts requests from any thread without waiting for capture work, and
/// publishes exactly one [`CompletionEvent`] per accepted request on its
/// event bus. Rejected requests publish nothing.
pub struct ScreenCaptureService {
    state: Mutex<Acceptance>,
    bus: CompletionBus,
    backend: String,
}

impl ScreenCaptureService {
    /// Start a service over an explicit source and uploader.
    pub fn start(
        source: Arc<dyn FramebufferSource>,
        uploader: Arc<dyn ImageUploader>,
        options: DispatcherOptions,
    ) -> Result<Self, ServiceError> {
        let bus = CompletionBus::new();
        let sink: Arc<dyn CompletionSink> = Arc::new(CompletionLogger::new(Arc::new(bus.clone())));
        let pipeline = CapturePipeline::new(source, uploader);
        let backend = pipeline.source_name().to_string();

        let dispatcher = JobDispatcher::spawn(options, Arc::new(pipeline), sink)?;
        info!(backend = %backend, "Screen capture service started");

        Ok(Self {
            state: Mutex::new(Acceptance {
                dispatcher: Some(dispatcher),
                accepted: 0,
            }),
            bus,
            backend,
        })
    }

    /// Start a service from configuration, uploading over HTTP.
    ///
    /// `stack` is only consulted when the configured backend is `hardwareSession`.
    pub fn from_config(
        config: &ScreenCapConfig,
        stack: Option<Arc<dyn GraphicsStack>>,
    ) -> Result<Self, ServiceError> {
        let source = build_source(&config.capture, stack)?;
        let uploader = HttpUploader::with_user_agent(config.upload.user_agent.as_deref())
            .map_err(|e| ServiceError::HttpClient(e.to_string()))?;
        Self::start(source, Arc::new(uploader), dispatcher_options(&config.dispatcher))
    }

    /// Accept a capture-and-upload request.
    ///
    /// A missing or blank URL is rejected without creating a job. A missing
    /// token is treated as the empty string and echoed as such in the event.
    pub fn request_upload(
        &self,
        url: Option<&str>,
        token: Option<&str>,
    ) -> Result<JobTicket, RequestError> {
        let url = match url.map(str::trim) {
            Some(url) if !url.is_empty() => url,
            _ => {
                warn!("Rejected capture request without upload url");
                return Err(RequestError::MissingUrl);
            }
        };
        // Numbering, job construction and enqueueing share one critical
        // section so sequence order is queue order.
        let mut state = self.lock_state();
        let sequence = state.accepted + 1;
        let dispatcher = state.dispatcher.as_ref().ok_or(RequestError::ShutDown)?;
        let job = CaptureJob::new(url, token.unwrap_or_default());
        let job_id = job.job_id;
        dispatcher.schedule(job)?;
        state.accepted = sequence;
        drop(state);

        info!(
            job_id = %job_id,
            sequence,
            url = %redact_url(url),
            call_guid = token.unwrap_or_default(),
            "Capture request accepted"
        );
        Ok(JobTicket { job_id, sequence })
    }

    /// Listen for completion events. Only events published after this call are seen.
    pub fn subscribe(&self) -> broadcast::Receiver<CompletionEvent> {
        self.bus.subscribe()
    }

    /// Name of the capture backend in use.
    pub fn backend(&self) -> &str {
        &self.backend
    }

    /// Requests accepted so far.
    pub fn accepted(&self) -> u64 {
        self.lock_state().accepted
    }

    /// Jobs queued or running.
    pub fn pending(&self) -> usize {
        self.lock_state()
            .dispatcher
            .as_ref()
            .map_or(0, JobDispatcher::pending)
    }

    /// Stop accepting requests and wait for accepted jobs to finish.
    ///
    /// Blocks the calling thread; call it from `spawn_blocking` inside a runtime.
    pub fn shutdown(&self) {
        let dispatcher = self.lock_state().dispatcher.take();
        match dispatcher {
            Some(dispatcher) => {
                debug!(pending = dispatcher.pending(), "Draining capture queue");
                dispatcher.shutdown();
                info!("Screen capture service stopped");
            }
            None => debug!("Screen capture service already stopped"),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, Acceptance> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub fn dispatcher_options(config: &DispatcherConfig) -> DispatcherOptions {
    DispatcherOptions {
        thread_name: config.thread_name.clone(),
        stack_size: config.stack_size_kb.saturating_mul(1024),
    }
}
