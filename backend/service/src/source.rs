use std::sync::Arc;

use tracing::info;

use screencap_capture::{FileDumpSource, GraphicsStack, HardwareSessionSource, SurfaceSpec};
use screencap_config::CaptureConfig;
use screencap_core::FramebufferSource;

use crate::error::ServiceError;

/// Resolve the configured capture backend into the one source this service will use.
///
/// The hardware backend needs a graphics stack from the host; there is no
/// built-in one.
pub fn build_source(
    config: &CaptureConfig,
    stack: Option<Arc<dyn GraphicsStack>>,
) -> Result<Arc<dyn FramebufferSource>, ServiceError> {
    let source: Arc<dyn FramebufferSource> = match config {
        CaptureConfig::FileDump { dump_path } => {
            info!(path = %dump_path.display(), "Using framebuffer dump capture");
            Arc::new(FileDumpSource::new(dump_path.clone()))
        }
        CaptureConfig::HardwareSession {
            client_name,
            width,
            height,
            pixel_format,
            window,
        } => {
            let stack = stack.ok_or(ServiceError::NoGraphicsStack)?;
            info!(width, height, ?pixel_format, "Using hardware session capture");
            Arc::new(
                HardwareSessionSource::new(stack)
                    .with_client_name(client_name.clone())
                    .with_surface(SurfaceSpec {
                        width: *width,
                        height: *height,
                        pixel_format: *pixel_format,
                    })
                    .with_window(*window),
            )
        }
    };
    Ok(source)
}
