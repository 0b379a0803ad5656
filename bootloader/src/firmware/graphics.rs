//! Graphics output query
//!
//! Resolves the firmware's current graphics mode into the framebuffer
//! description the kernel console draws against. The mode is taken as
//! the firmware left it; no mode switching happens here.

use lumen_boot_api::GraphicsInfo;
use uefi::boot;
use uefi::proto::console::gop::GraphicsOutput;

use crate::error::{BootError, Result};

/// Linear framebuffer, draw directly.
const STRATEGY_LINEAR: u8 = 1;

/// Describe the active framebuffer.
pub fn query() -> Result<GraphicsInfo> {
    let handle = boot::get_handle_for_protocol::<GraphicsOutput>()
        .map_err(|err| BootError::from(err.status()))?;
    let mut gop = boot::open_protocol_exclusive::<GraphicsOutput>(handle)
        .map_err(|err| BootError::from(err.status()))?;

    let mode = gop.current_mode_info();
    let (width, height) = mode.resolution();
    let stride = mode.stride();
    let mut frame_buffer = gop.frame_buffer();

    log::info!(
        "graphics: {}x{} (stride {}), {} byte framebuffer",
        width,
        height,
        stride,
        frame_buffer.size()
    );

    Ok(GraphicsInfo {
        base_address: frame_buffer.as_mut_ptr(),
        buffer_size: frame_buffer.size(),
        width: width as u32,
        height: height as u32,
        pixels_per_scan_line: stride as u32,
        strategy: STRATEGY_LINEAR,
        pointer_x: 0,
        pointer_y: 0,
    })
}
