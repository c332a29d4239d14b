//! Capture service facade.
//!
//! [`ScreenCaptureService`] accepts `uploadScreenCapture` requests, hands
//! each accepted one to a single-worker dispatcher running [`CapturePipeline`],
//! and publishes one completion event per job on its event bus. [`rpc`] maps
//! the host's JSON-RPC calls onto it.

pub mod error;
pub mod pipeline;
pub mod rpc;
pub mod service;
pub mod source;

pub use error::{RequestError, ServiceError, StageError};
pub use pipeline::CapturePipeline;
pub use rpc::{handle_call, handle_request, RpcError, RpcRequest, RpcResponse};
pub use service::{dispatcher_options, JobTicket, ScreenCaptureService};
pub use source::build_source;
