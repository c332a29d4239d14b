use thiserror::Error;

use screencap_core::{CaptureError, DispatchError, EncodeError};

/// Why a capture request was not accepted.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("Upload url is not specified")]
    MissingUrl,

    #[error("capture service is shut down")]
    ShutDown,

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// Why the service could not be constructed.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("the hardwareSession capture backend needs a graphics stack and none was provided")]
    NoGraphicsStack,

    #[error("could not build HTTP client: {0}")]
    HttpClient(String),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// The pipeline stage a job failed in. Displays as the completion event message.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("Failed to get screen data")]
    Capture(#[source] CaptureError),

    #[error("Failed to encode screen data")]
    Encode(#[source] EncodeError),

    #[error("Upload Failed: {0}")]
    Upload(String),
}
