//! PNG encoding of RGBA rasters.
//!
//! Output is 8-bit RGBA, non-interlaced, default compression with adaptive
//! filtering, written straight into an in-memory buffer.

use std::borrow::Cow;

use bytes::Bytes;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder};
use tracing::{debug, error};

use screencap_core::{EncodeError, EncodedImage, RawFrame, BYTES_PER_PIXEL};

pub const PNG_CONTENT_TYPE: &str = "image/png";

/// Encode a tightly packed RGBA buffer (`pitch = 4 * width`) as PNG.
pub fn encode_png(pixels: &[u8], width: u32, height: u32) -> Result<EncodedImage, EncodeError> {
    if pixels.is_empty() {
        error!("Refusing to encode an empty pixel buffer");
        return Err(EncodeError::EmptyInput);
    }
    let pitch = usize::try_from(width)
        .ok()
        .and_then(|w| w.checked_mul(BYTES_PER_PIXEL as usize))
        .ok_or_else(|| EncodeError::Encoder(format!("width {width} is too large")))?;
    if pitch == 0 {
        error!("Refusing to encode with a zero row pitch");
        return Err(EncodeError::ZeroPitch);
    }
    let expected = pitch
        .checked_mul(height as usize)
        .ok_or_else(|| EncodeError::Encoder(format!("{width}x{height} raster is too large")))?;
    if expected == 0 {
        return Err(EncodeError::EmptyInput);
    }
    if pixels.len() < expected {
        return Err(EncodeError::BufferTooSmall {
            expected,
            actual: pixels.len(),
        });
    }

    let mut out = Vec::with_capacity(expected / 2);
    let encoder = PngEncoder::new_with_quality(&mut out, CompressionType::Default, FilterType::Adaptive);
    encoder
        .write_image(&pixels[..expected], width, height, ExtendedColorType::Rgba8)
        .map_err(|e| {
            error!(error = %e, "PNG encoding failed");
            EncodeError::Encoder(e.to_string())
        })?;

    debug!(width, height, png_bytes = out.len(), "Encoded raster as PNG");
    Ok(EncodedImage {
        data: Bytes::from(out),
        content_type: PNG_CONTENT_TYPE,
        width,
        height,
    })
}

/// Encode a captured frame, dropping any row padding first.
pub fn encode_frame(frame: &RawFrame) -> Result<EncodedImage, EncodeError> {
    let pixels = packed_rows(frame);
    encode_png(&pixels, frame.width(), frame.height())
}

fn packed_rows(frame: &RawFrame) -> Cow<'_, [u8]> {
    if frame.is_packed() {
        return Cow::Borrowed(frame.pixels());
    }
    let pitch = frame.width() as usize * BYTES_PER_PIXEL as usize;
    let stride = frame.row_stride() as usize;
    let mut packed = Vec::with_capacity(pitch * frame.height() as usize);
    for row in frame.pixels().chunks_exact(stride) {
        packed.extend_from_slice(&row[..pitch]);
    }
    Cow::Owned(packed)
}
