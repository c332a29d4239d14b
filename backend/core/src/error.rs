use std::path::PathBuf;

use thiserror::Error;

/// Error reported by a graphics stack operation (session join, surface calls).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{operation} failed with code {code}")]
pub struct StackError {
    pub operation: &'static str,
    pub code: i32,
}

impl StackError {
    pub fn new(operation: &'static str, code: i32) -> Self {
        Self { operation, code }
    }
}

/// Failure to acquire a raw frame from a framebuffer source.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("could not open framebuffer dump '{path}': {source}")]
    OpenDump {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not read framebuffer dump '{path}': {source}")]
    ReadDump {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid frame dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("invalid frame: {0}")]
    InvalidFrame(String),

    #[error("could not join graphics session: {0}")]
    SessionJoin(#[source] StackError),

    #[error("could not create capture surface: {0}")]
    SurfaceCreate(#[source] StackError),

    #[error("screenshot request failed: {0}")]
    Screenshot(#[source] StackError),

    #[error("could not lock capture surface: {0}")]
    SurfaceLock(#[source] StackError),

    #[error("surface memory holds {actual} bytes, expected at least {expected}")]
    SurfaceTooSmall { expected: usize, actual: usize },

    #[error("capture backend unavailable: {0}")]
    Unavailable(String),
}

/// Failure to turn a raster into a compressed image.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("no pixel data to encode")]
    EmptyInput,

    #[error("row pitch is zero")]
    ZeroPitch,

    #[error("pixel buffer holds {actual} bytes, expected {expected}")]
    BufferTooSmall { expected: usize, actual: usize },

    #[error("png encoder failed: {0}")]
    Encoder(String),
}

/// Failure to hand a job to the dispatcher.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("could not start dispatcher worker: {0}")]
    WorkerStart(String),

    #[error("dispatcher queue is closed")]
    Closed,
}
