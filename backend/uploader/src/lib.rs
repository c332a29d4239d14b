//! Upload stage of the capture pipeline.

pub mod http;

pub use http::{classify_status, codes, HttpUploader, TransportFailure};
