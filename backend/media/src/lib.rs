//! Image encoding for captured frames.

pub mod png;

pub use png::{encode_frame, encode_png, PNG_CONTENT_TYPE};
