pub mod dispatcher;

pub use dispatcher::{DispatcherOptions, JobDispatcher, DEFAULT_STACK_SIZE, DEFAULT_THREAD_NAME};
