//! Framebuffer sources for the capture pipeline.
//!
//! Two mutually exclusive backends are provided:
//! - [`FileDumpSource`] reads the framebuffer dump pseudo-file exposed by the display driver
//! - [`HardwareSessionSource`] asks the graphics stack for a screenshot surface
//!
//! A service instance picks one of them at construction time.

pub mod file_dump;
pub mod hardware;

pub use file_dump::{FileDumpSource, DEFAULT_DUMP_PATH};
pub use hardware::{
    GraphicsStack, HardwareSessionSource, PixelFormat, ScreenshotWindow, SurfaceHandle,
    SurfaceMemory, SurfaceSpec,
};
