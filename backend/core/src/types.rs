use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CaptureError;

/// Bytes per pixel of every raster handled by the pipeline (RGBA, 8 bits per channel).
pub const BYTES_PER_PIXEL: u32 = 4;

/// A single accepted capture-and-upload request.
///
/// Created by the capture service, owned by the dispatcher until it runs,
/// and consumed by execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureJob {
    pub job_id: Uuid,
    pub correlation_token: String,
    pub destination_url: String,
    pub submitted_at: DateTime<Utc>,
}

impl CaptureJob {
    pub fn new(destination_url: impl Into<String>, correlation_token: impl Into<String>) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            correlation_token: correlation_token.into(),
            destination_url: destination_url.into(),
            submitted_at: Utc::now(),
        }
    }
}

/// One raw RGBA snapshot of the framebuffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    width: u32,
    height: u32,
    row_stride: u32,
    pixels: Vec<u8>,
}

impl RawFrame {
    /// Build a frame whose rows are tightly packed (`row_stride == width * 4`).
    pub fn packed(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, CaptureError> {
        let stride = width
            .checked_mul(BYTES_PER_PIXEL)
            .ok_or(CaptureError::InvalidDimensions { width, height })?;
        Self::with_stride(width, height, stride, pixels)
    }

    /// Build a frame with an explicit row stride in bytes.
    ///
    /// Rejects buffers that do not hold exactly `row_stride * height` bytes,
    /// and strides narrower than one row of pixels.
    pub fn with_stride(
        width: u32,
        height: u32,
        row_stride: u32,
        pixels: Vec<u8>,
    ) -> Result<Self, CaptureError> {
        if width == 0 || height == 0 {
            return Err(CaptureError::InvalidDimensions { width, height });
        }
        let min_stride = u64::from(width) * u64::from(BYTES_PER_PIXEL);
        if u64::from(row_stride) < min_stride {
            return Err(CaptureError::InvalidFrame(format!(
                "row stride {row_stride} is narrower than {min_stride} bytes"
            )));
        }
        let expected = u64::from(row_stride) * u64::from(height);
        if pixels.len() as u64 != expected {
            return Err(CaptureError::InvalidFrame(format!(
                "expected {expected} pixel bytes, got {}",
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            row_stride,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn row_stride(&self) -> u32 {
        self.row_stride
    }

    pub fn bytes_per_pixel(&self) -> u32 {
        BYTES_PER_PIXEL
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Whether rows are laid out back to back with no padding.
    pub fn is_packed(&self) -> bool {
        u64::from(self.row_stride) == u64::from(self.width) * u64::from(BYTES_PER_PIXEL)
    }
}

/// A complete compressed image file ready for upload.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub data: Bytes,
    pub content_type: &'static str,
    pub width: u32,
    pub height: u32,
}

impl EncodedImage {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Result of a single upload attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Success,
    Failure(String),
}

impl UploadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, UploadOutcome::Success)
    }
}

impl fmt::Display for UploadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadOutcome::Success => write!(f, "success"),
            UploadOutcome::Failure(reason) => write!(f, "failure: {reason}"),
        }
    }
}

/// The externally observable result of one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionEvent {
    pub correlation_token: String,
    pub succeeded: bool,
    pub message: String,
}

impl CompletionEvent {
    pub fn success(correlation_token: impl Into<String>) -> Self {
        Self {
            correlation_token: correlation_token.into(),
            succeeded: true,
            message: "Success".to_string(),
        }
    }

    pub fn failure(correlation_token: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            correlation_token: correlation_token.into(),
            succeeded: false,
            message: message.into(),
        }
    }
}
