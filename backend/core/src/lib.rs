pub mod channel;
pub mod error;
pub mod event;
pub mod traits;
pub mod types;

pub use channel::CompletionBus;
pub use error::{CaptureError, DispatchError, EncodeError, StackError};
pub use event::{
    UploadCompleteEvent, UploadRequestParams, UploadResponse, EVT_UPLOAD_COMPLETE, METHOD_UPLOAD,
};
pub use traits::{CompletionSink, FramebufferSource, ImageUploader, JobRunner};
pub use types::{
    CaptureJob, CompletionEvent, EncodedImage, RawFrame, UploadOutcome, BYTES_PER_PIXEL,
};
