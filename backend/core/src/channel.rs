use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::traits::CompletionSink;
use crate::types::CompletionEvent;

/// Default number of completion events buffered per subscriber.
const DEFAULT_BUFFER_SIZE: usize = 256;

/// Fan-out bus for completion events.
///
/// Every subscriber sees every event published after it subscribed. Publishing
/// never blocks; a slow subscriber lags instead of stalling the worker.
#[derive(Clone)]
pub struct CompletionBus {
    tx: broadcast::Sender<CompletionEvent>,
}

impl CompletionBus {
    /// Create a new bus with the default buffer size.
    pub fn new() -> Self {
        Self::with_buffer_size(DEFAULT_BUFFER_SIZE)
    }

    /// Create a new bus with a custom buffer size.
    pub fn with_buffer_size(buffer: usize) -> Self {
        let (tx, _) = broadcast::channel(buffer);
        info!(buffer_size = buffer, "CompletionBus initialized");
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CompletionEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for CompletionBus {
    fn default() -> Self {
        Self::new()
    }
}

impl CompletionSink for CompletionBus {
    fn publish(&self, event: CompletionEvent) {
        if self.tx.send(event).is_err() {
            debug!("Completion event dropped, no subscribers");
        }
    }
}
