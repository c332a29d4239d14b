//! Capture backend driving a hardware graphics stack.
//!
//! The vendor SDK is reached through [`GraphicsStack`]. Each capture joins the
//! session on first use, renders a screenshot into a scratch surface, copies
//! the locked pixels out and tears the surface down again. Surfaces and locks
//! are held by guards so every exit path releases them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use screencap_core::{CaptureError, FramebufferSource, RawFrame, StackError, BYTES_PER_PIXEL};

use crate::file_dump::swap_red_blue;

pub const DEFAULT_SURFACE_WIDTH: u32 = 1280;
pub const DEFAULT_SURFACE_HEIGHT: u32 = 720;
pub const DEFAULT_CLIENT_NAME: &str = "screencap";

/// Memory layout of a surface, named by component order from the most significant byte.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelFormat {
    /// Stored as R,G,B,A in little-endian memory; already canonical RGBA.
    #[default]
    #[serde(rename = "A8B8G8R8")]
    A8B8G8R8,
    /// Stored as B,G,R,A in little-endian memory; needs a red/blue swap.
    #[serde(rename = "A8R8G8B8")]
    A8R8G8B8,
}

/// Which planes the screenshot composes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScreenshotWindow {
    /// Graphics including video.
    #[default]
    All,
    /// Graphics only; required where secure video cannot be read back.
    Graphics,
}

/// Parameters for the scratch surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSpec {
    pub width: u32,
    pub height: u32,
    pub pixel_format: PixelFormat,
}

impl Default for SurfaceSpec {
    fn default() -> Self {
        Self {
            width: DEFAULT_SURFACE_WIDTH,
            height: DEFAULT_SURFACE_HEIGHT,
            pixel_format: PixelFormat::default(),
        }
    }
}

/// Opaque SDK surface identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceHandle(pub u64);

/// CPU view of a locked surface.
#[derive(Debug, Clone)]
pub struct SurfaceMemory {
    pub bytes: Bytes,
    /// Offset of the first pixel within `bytes`.
    pub pixel_offset: usize,
}

/// The vendor graphics SDK as seen by the capture backend.
pub trait GraphicsStack: Send + Sync {
    fn join(&self, client_name: &str) -> Result<(), StackError>;
    fn create_surface(&self, spec: &SurfaceSpec) -> Result<SurfaceHandle, StackError>;
    fn screenshot(&self, window: ScreenshotWindow, surface: SurfaceHandle) -> Result<(), StackError>;
    fn lock(&self, surface: SurfaceHandle) -> Result<SurfaceMemory, StackError>;
    fn unlock(&self, surface: SurfaceHandle);
    fn destroy_surface(&self, surface: SurfaceHandle);
}

struct SurfaceGuard<'a> {
    stack: &'a dyn GraphicsStack,
    handle: SurfaceHandle,
}

impl Drop for SurfaceGuard<'_> {
    fn drop(&mut self) {
        self.stack.destroy_surface(self.handle);
        debug!(surface = self.handle.0, "Capture surface destroyed");
    }
}

struct LockGuard<'a> {
    stack: &'a dyn GraphicsStack,
    handle: SurfaceHandle,
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        self.stack.unlock(self.handle);
        debug!(surface = self.handle.0, "Capture surface unlocked");
    }
}

/// Screenshot source backed by a hardware graphics session.
pub struct HardwareSessionSource {
    stack: Arc<dyn GraphicsStack>,
    client_name: String,
    surface: SurfaceSpec,
    window: ScreenshotWindow,
    joined: AtomicBool,
}

impl HardwareSessionSource {
    pub fn new(stack: Arc<dyn GraphicsStack>) -> Self {
        Self {
            stack,
            client_name: DEFAULT_CLIENT_NAME.to_string(),
            surface: SurfaceSpec::default(),
            window: ScreenshotWindow::default(),
            joined: AtomicBool::new(false),
        }
    }

    pub fn with_client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = name.into();
        self
    }

    pub fn with_surface(mut self, surface: SurfaceSpec) -> Self {
        self.surface = surface;
        self
    }

    pub fn with_window(mut self, window: ScreenshotWindow) -> Self {
        self.window = window;
        match window {
            ScreenshotWindow::All => info!("Screenshots include graphics and video"),
            ScreenshotWindow::Graphics => info!("Screenshots include graphics only, no video"),
        }
        self
    }

    /// Join the graphics session unless this source already has.
    fn ensure_joined(&self) -> Result<(), CaptureError> {
        if self.joined.load(Ordering::Acquire) {
            return Ok(());
        }
        self.stack.join(&self.client_name).map_err(|e| {
            error!(error = %e, "Could not join graphics session");
            CaptureError::SessionJoin(e)
        })?;
        self.joined.store(true, Ordering::Release);
        info!(client = %self.client_name, "Graphics session joined");
        Ok(())
    }

    fn region_len(&self) -> Result<usize, CaptureError> {
        let SurfaceSpec { width, height, .. } = self.surface;
        if width == 0 || height == 0 {
            return Err(CaptureError::InvalidDimensions { width, height });
        }
        usize::try_from(u64::from(width) * u64::from(height) * u64::from(BYTES_PER_PIXEL))
            .map_err(|_| CaptureError::InvalidDimensions { width, height })
    }
}

impl FramebufferSource for HardwareSessionSource {
    fn name(&self) -> &str {
        "hardware-session"
    }

    fn capture(&self) -> Result<RawFrame, CaptureError> {
        self.ensure_joined()?;
        let len = self.region_len()?;
        let stack = self.stack.as_ref();

        let handle = stack
            .create_surface(&self.surface)
            .map_err(CaptureError::SurfaceCreate)?;
        let surface = SurfaceGuard { stack, handle };

        stack.screenshot(self.window, surface.handle).map_err(|e| {
            error!(error = %e, "Failed to get screenshot");
            CaptureError::Screenshot(e)
        })?;

        let memory = stack.lock(surface.handle).map_err(|e| {
            error!(error = %e, "Failed to lock surface");
            CaptureError::SurfaceLock(e)
        })?;
        let lock = LockGuard {
            stack,
            handle: surface.handle,
        };
        debug!(
            surface = handle.0,
            pixel_offset = memory.pixel_offset,
            width = self.surface.width,
            height = self.surface.height,
            "Capture surface locked"
        );

        let available = memory.bytes.len().saturating_sub(memory.pixel_offset);
        if available < len {
            return Err(CaptureError::SurfaceTooSmall {
                expected: len,
                actual: available,
            });
        }
        let mut pixels = memory.bytes[memory.pixel_offset..memory.pixel_offset + len].to_vec();

        drop(lock);
        drop(surface);

        if self.surface.pixel_format == PixelFormat::A8R8G8B8 {
            swap_red_blue(&mut pixels);
        }
        RawFrame::packed(self.surface.width, self.surface.height, pixels)
    }
}
