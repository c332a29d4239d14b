use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use tokio::sync::mpsc;
use tokio::task::JoinError;
use tracing::{debug, error, info};

use screencap_core::{CaptureJob, CompletionEvent, CompletionSink, DispatchError, JobRunner};

pub const DEFAULT_THREAD_NAME: &str = "screencap-dispatcher";
pub const DEFAULT_STACK_SIZE: usize = 2 * 1024 * 1024;

/// Worker thread settings.
#[derive(Debug, Clone)]
pub struct DispatcherOptions {
    pub thread_name: String,
    pub stack_size: usize,
}

impl Default for DispatcherOptions {
    fn default() -> Self {
        Self {
            thread_name: DEFAULT_THREAD_NAME.to_string(),
            stack_size: DEFAULT_STACK_SIZE,
        }
    }
}

/// Single-worker job queue.
///
/// `schedule` never waits for pipeline work. Jobs run one at a time, in the
/// order they were scheduled, on a dedicated thread that owns a
/// single-threaded Tokio runtime. Every scheduled job produces exactly one
/// [`CompletionEvent`] on the sink, even if its runner panics.
pub struct JobDispatcher {
    tx: mpsc::UnboundedSender<CaptureJob>,
    pending: Arc<AtomicUsize>,
    worker: Option<thread::JoinHandle<()>>,
    name: String,
}

impl JobDispatcher {
    /// Start the worker thread. Fails if the thread or its runtime cannot be created.
    pub fn spawn(
        options: DispatcherOptions,
        runner: Arc<dyn JobRunner>,
        sink: Arc<dyn CompletionSink>,
    ) -> Result<Self, DispatchError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| DispatchError::WorkerStart(e.to_string()))?;

        let (tx, rx) = mpsc::unbounded_channel();
        let pending = Arc::new(AtomicUsize::new(0));
        let worker_pending = Arc::clone(&pending);

        let worker = thread::Builder::new()
            .name(options.thread_name.clone())
            .stack_size(options.stack_size)
            .spawn(move || {
                runtime.block_on(run_worker(rx, runner, sink, worker_pending));
            })
            .map_err(|e| {
                error!(error = %e, "Could not spawn dispatcher thread");
                DispatchError::WorkerStart(e.to_string())
            })?;

        info!(
            name = %options.thread_name,
            stack_size = options.stack_size,
            "Job dispatcher started"
        );

        Ok(Self {
            tx,
            pending,
            worker: Some(worker),
            name: options.thread_name,
        })
    }

    /// Queue a job for execution and return immediately.
    pub fn schedule(&self, job: CaptureJob) -> Result<(), DispatchError> {
        let job_id = job.job_id;
        self.pending.fetch_add(1, Ordering::SeqCst);
        if self.tx.send(job).is_err() {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            error!(job_id = %job_id, dispatcher = %self.name, "Dispatcher worker is gone");
            return Err(DispatchError::Closed);
        }
        debug!(job_id = %job_id, pending = self.pending(), "Job scheduled");
        Ok(())
    }

    /// Jobs queued or currently running.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Stop accepting jobs, let the worker finish the queued ones, and join it.
    ///
    /// Blocks the calling thread until the queue is drained.
    pub fn shutdown(self) {
        let Self {
            tx, worker, name, ..
        } = self;
        drop(tx);
        if let Some(handle) = worker {
            if handle.join().is_err() {
                error!(dispatcher = %name, "Dispatcher thread panicked");
            }
        }
        info!(dispatcher = %name, "Job dispatcher stopped");
    }
}

async fn run_worker(
    mut rx: mpsc::UnboundedReceiver<CaptureJob>,
    runner: Arc<dyn JobRunner>,
    sink: Arc<dyn CompletionSink>,
    pending: Arc<AtomicUsize>,
) {
    while let Some(job) = rx.recv().await {
        let job_id = job.job_id;
        let token = job.correlation_token.clone();
        let started = Instant::now();
        debug!(job_id = %job_id, "Job started");

        let task_runner = Arc::clone(&runner);
        let event = match tokio::spawn(async move { task_runner.run(job).await }).await {
            Ok(event) => event,
            Err(e) => {
                let detail = fault_detail(e);
                error!(job_id = %job_id, fault = %detail, "Job faulted");
                CompletionEvent::failure(token, format!("Unexpected fault: {detail}"))
            }
        };

        info!(
            job_id = %job_id,
            succeeded = event.succeeded,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Job finished"
        );
        pending.fetch_sub(1, Ordering::SeqCst);
        sink.publish(event);
    }
    debug!("Dispatcher queue closed, worker exiting");
}

fn fault_detail(err: JoinError) -> String {
    if !err.is_panic() {
        return err.to_string();
    }
    let payload = err.into_panic();
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::Semaphore;

    struct ChannelSink(mpsc::UnboundedSender<CompletionEvent>);

    impl CompletionSink for ChannelSink {
        fn publish(&self, event: CompletionEvent) {
            let _ = self.0.send(event);
        }
    }

    #[derive(Default)]
    struct RecordingRunner {
        running: AtomicUsize,
        max_running: AtomicUsize,
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl JobRunner for RecordingRunner {
        async fn run(&self, job: CaptureJob) -> CompletionEvent {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_running.fetch_max(now, Ordering::SeqCst);
            if job.correlation_token == "boom" {
                self.running.fetch_sub(1, Ordering::SeqCst);
                panic!("surface exploded");
            }
            // later jobs finish faster, so any reordering would show
            let delay = 30u64.saturating_sub(job.correlation_token.len() as u64 * 3);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            self.seen.lock().unwrap().push(job.correlation_token.clone());
            self.running.fetch_sub(1, Ordering::SeqCst);
            CompletionEvent::success(job.correlation_token)
        }
    }

    struct GatedRunner(Arc<Semaphore>);

    #[async_trait]
    impl JobRunner for GatedRunner {
        async fn run(&self, job: CaptureJob) -> CompletionEvent {
            self.0.acquire().await.unwrap().forget();
            CompletionEvent::success(job.correlation_token)
        }
    }

    fn start(
        runner: Arc<dyn JobRunner>,
    ) -> (JobDispatcher, mpsc::UnboundedReceiver<CompletionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let dispatcher =
            JobDispatcher::spawn(DispatcherOptions::default(), runner, Arc::new(ChannelSink(tx)))
                .unwrap();
        (dispatcher, rx)
    }

    async fn next(rx: &mut mpsc::UnboundedReceiver<CompletionEvent>) -> CompletionEvent {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn test_jobs_complete_in_fifo_order() {
        let runner = Arc::new(RecordingRunner::default());
        let (dispatcher, mut rx) = start(runner.clone());

        let tokens: Vec<String> = (0..8).map(|i| "x".repeat(i + 1)).collect();
        for token in &tokens {
            dispatcher.schedule(CaptureJob::new("http://h/up", token.clone())).unwrap();
        }

        let mut order = Vec::new();
        for _ in 0..tokens.len() {
            order.push(next(&mut rx).await.correlation_token);
        }
        assert_eq!(order, tokens);
        assert_eq!(*runner.seen.lock().unwrap(), tokens);
        assert_eq!(runner.max_running.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_submitters_are_serialized() {
        let runner = Arc::new(RecordingRunner::default());
        let (dispatcher, mut rx) = start(runner.clone());
        let dispatcher = Arc::new(dispatcher);

        let handles: Vec<_> = (0..6)
            .map(|t| {
                let d = Arc::clone(&dispatcher);
                std::thread::spawn(move || {
                    for i in 0..4 {
                        d.schedule(CaptureJob::new("http://h/up", format!("t{t}-{i}"))).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        for _ in 0..24 {
            assert!(next(&mut rx).await.succeeded);
        }
        assert_eq!(runner.max_running.load(Ordering::SeqCst), 1);
        assert_eq!(dispatcher.pending(), 0);
    }

    #[tokio::test]
    async fn test_panicking_job_does_not_halt_queue() {
        let runner = Arc::new(RecordingRunner::default());
        let (dispatcher, mut rx) = start(runner);

        for token in ["a", "boom", "b"] {
            dispatcher.schedule(CaptureJob::new("http://h/up", token)).unwrap();
        }

        let first = next(&mut rx).await;
        assert_eq!(first.correlation_token, "a");
        assert!(first.succeeded);

        let faulted = next(&mut rx).await;
        assert_eq!(faulted.correlation_token, "boom");
        assert!(!faulted.succeeded);
        assert!(faulted.message.starts_with("Unexpected fault"));
        assert!(faulted.message.contains("surface exploded"));

        let last = next(&mut rx).await;
        assert_eq!(last.correlation_token, "b");
        assert!(last.succeeded);
    }

    #[tokio::test]
    async fn test_schedule_does_not_wait_for_execution() {
        let gate = Arc::new(Semaphore::new(0));
        let (dispatcher, mut rx) = start(Arc::new(GatedRunner(gate.clone())));

        for i in 0..3 {
            dispatcher.schedule(CaptureJob::new("http://h/up", format!("{i}"))).unwrap();
        }
        assert_eq!(dispatcher.pending(), 3);
        assert!(rx.try_recv().is_err());

        gate.add_permits(3);
        for i in 0..3 {
            assert_eq!(next(&mut rx).await.correlation_token, format!("{i}"));
        }
    }

    #[tokio::test]
    async fn test_shutdown_drains_queue() {
        let runner = Arc::new(RecordingRunner::default());
        let (dispatcher, mut rx) = start(runner);

        for token in ["one", "two", "three"] {
            dispatcher.schedule(CaptureJob::new("http://h/up", token)).unwrap();
        }
        dispatcher.shutdown();

        let mut tokens = Vec::new();
        while let Ok(event) = rx.try_recv() {
            tokens.push(event.correlation_token);
        }
        assert_eq!(tokens, vec!["one", "two", "three"]);
    }
}
