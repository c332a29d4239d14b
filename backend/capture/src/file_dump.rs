//! Capture backend reading a live framebuffer dump pseudo-file.
//!
//! The dump is a 56-byte header followed by 32-bit BGRA pixels. Width and
//! height are little-endian `i32` values at offsets 18 and 22; a negative
//! value only encodes row order, so the absolute value is used.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use screencap_core::{CaptureError, FramebufferSource, RawFrame, BYTES_PER_PIXEL};
use tracing::{debug, error, info};

/// Default dump exposing both video and graphics planes.
pub const DEFAULT_DUMP_PATH: &str = "/proc/gdl/dump/wbp";

/// Size of the header preceding the pixel data.
pub const HEADER_LEN: usize = 56;

/// Largest width or height accepted from a dump header.
pub const MAX_DIMENSION: u32 = 8192;

const WIDTH_OFFSET: usize = 18;
const HEIGHT_OFFSET: usize = 22;

/// Reads one frame per capture from a fixed dump path.
#[derive(Debug, Clone)]
pub struct FileDumpSource {
    path: PathBuf,
}

impl FileDumpSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_frame(&self, file: &mut File) -> Result<RawFrame, CaptureError> {
        let mut header = [0u8; HEADER_LEN];
        file.read_exact(&mut header).map_err(|source| CaptureError::ReadDump {
            path: self.path.clone(),
            source,
        })?;

        let (width, height) = parse_dimensions(&header);
        info!(width, height, path = %self.path.display(), "Framebuffer dump header loaded");

        let size = frame_len(width, height).ok_or_else(|| {
            error!(width, height, "Framebuffer dump reports an unusable image size");
            CaptureError::InvalidDimensions { width, height }
        })?;

        let mut pixels = Vec::new();
        pixels.try_reserve_exact(size).map_err(|e| {
            CaptureError::InvalidFrame(format!("cannot allocate {size} pixel bytes: {e}"))
        })?;
        pixels.resize(size, 0);
        file.read_exact(&mut pixels).map_err(|source| CaptureError::ReadDump {
            path: self.path.clone(),
            source,
        })?;

        swap_red_blue(&mut pixels);
        RawFrame::packed(width, height, pixels)
    }
}

impl FramebufferSource for FileDumpSource {
    fn name(&self) -> &str {
        "file-dump"
    }

    fn capture(&self) -> Result<RawFrame, CaptureError> {
        let mut file = File::open(&self.path).map_err(|source| {
            error!(path = %self.path.display(), error = %source, "Could not open framebuffer dump");
            CaptureError::OpenDump {
                path: self.path.clone(),
                source,
            }
        })?;
        debug!(path = %self.path.display(), "Framebuffer dump opened");
        self.read_frame(&mut file)
    }
}

/// Pixel byte count for a dump of the given size, if it is positive and at
/// most [`MAX_DIMENSION`] on each side.
fn frame_len(width: u32, height: u32) -> Option<usize> {
    if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
        return None;
    }
    width
        .checked_mul(height)?
        .checked_mul(BYTES_PER_PIXEL)
        .and_then(|n| usize::try_from(n).ok())
}

/// Extract `(width, height)` from a dump header.
pub fn parse_dimensions(header: &[u8; HEADER_LEN]) -> (u32, u32) {
    let read = |offset: usize| {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(&header[offset..offset + 4]);
        i32::from_le_bytes(raw).unsigned_abs()
    };
    (read(WIDTH_OFFSET), read(HEIGHT_OFFSET))
}

/// Swap the first and third byte of every 4-byte pixel in place.
pub fn swap_red_blue(pixels: &mut [u8]) {
    for px in pixels.chunks_exact_mut(BYTES_PER_PIXEL as usize) {
        px.swap(0, 2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn header(width: i32, height: i32) -> [u8; HEADER_LEN] {
        let mut h = [0u8; HEADER_LEN];
        h[0] = b'B';
        h[1] = b'M';
        h[WIDTH_OFFSET..WIDTH_OFFSET + 4].copy_from_slice(&width.to_le_bytes());
        h[HEIGHT_OFFSET..HEIGHT_OFFSET + 4].copy_from_slice(&height.to_le_bytes());
        h
    }

    fn write_dump(bytes: &[u8]) -> PathBuf {
        let path = std::env::temp_dir().join(format!("screencap-dump-{}.bin", uuid::Uuid::new_v4()));
        let mut file = File::create(&path).unwrap();
        file.write_all(bytes).unwrap();
        path
    }

    #[test]
    fn test_parse_dimensions_takes_absolute_values() {
        assert_eq!(parse_dimensions(&header(640, -480)), (640, 480));
        assert_eq!(parse_dimensions(&header(-2, 3)), (2, 3));
    }

    #[test]
    fn test_swap_red_blue() {
        let mut px = vec![1, 2, 3, 4, 10, 20, 30, 40];
        swap_red_blue(&mut px);
        assert_eq!(px, vec![3, 2, 1, 4, 30, 20, 10, 40]);
    }

    #[test]
    fn test_capture_reads_and_normalizes_pixels() {
        let mut bytes = header(2, -1).to_vec();
        // BGRA blue pixel, BGRA red pixel
        bytes.extend_from_slice(&[255, 0, 0, 255, 0, 0, 255, 128]);
        let path = write_dump(&bytes);

        let frame = FileDumpSource::new(&path).capture().unwrap();
        assert_eq!((frame.width(), frame.height()), (2, 1));
        assert_eq!(frame.pixels(), &[0, 0, 255, 255, 255, 0, 0, 128]);

        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_missing_file_fails() {
        let source = FileDumpSource::new("/nonexistent/screencap/wbp");
        let err = source.capture().unwrap_err();
        assert!(matches!(err, CaptureError::OpenDump { .. }));
    }

    #[test]
    fn test_zero_size_fails() {
        let path = write_dump(&header(0, 720));
        let err = FileDumpSource::new(&path).capture().unwrap_err();
        assert!(matches!(err, CaptureError::InvalidDimensions { width: 0, height: 720 }));
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_extreme_header_dimensions_fail() {
        let path = write_dump(&header(i32::MIN, i32::MIN));
        let err = FileDumpSource::new(&path).capture().unwrap_err();
        assert!(matches!(
            err,
            CaptureError::InvalidDimensions { width: 2147483648, height: 2147483648 }
        ));
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_oversized_dimensions_fail() {
        let path = write_dump(&header(MAX_DIMENSION as i32 + 1, 2));
        let err = FileDumpSource::new(&path).capture().unwrap_err();
        assert!(matches!(err, CaptureError::InvalidDimensions { .. }));
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_frame_len_bounds() {
        assert_eq!(frame_len(2, 3), Some(24));
        assert_eq!(frame_len(0, 3), None);
        assert_eq!(frame_len(MAX_DIMENSION, MAX_DIMENSION), Some(8192 * 8192 * 4));
        assert_eq!(frame_len(u32::MAX, u32::MAX), None);
    }

    #[test]
    fn test_truncated_pixels_fail() {
        let mut bytes = header(4, 4).to_vec();
        bytes.extend_from_slice(&[0u8; 10]);
        let path = write_dump(&bytes);
        let err = FileDumpSource::new(&path).capture().unwrap_err();
        assert!(matches!(err, CaptureError::ReadDump { .. }));
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_truncated_header_fails() {
        let path = write_dump(&[0u8; 20]);
        let err = FileDumpSource::new(&path).capture().unwrap_err();
        assert!(matches!(err, CaptureError::ReadDump { .. }));
        std::fs::remove_file(path).unwrap();
    }
}
