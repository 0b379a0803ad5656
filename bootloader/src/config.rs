//! Boot configuration
//!
//! Volume paths for the artifacts the loader pulls from the boot
//! partition. The kernel image is mandatory; the console font is
//! optional and its absence degrades to a fontless boot.

use uefi::{cstr16, CStr16};

/// Paths on the boot volume.
#[derive(Debug, Clone, Copy)]
pub struct BootConfig {
    /// Kernel executable image
    pub kernel_path: &'static CStr16,
    /// PSF1 console font, or `None` to boot fontless
    pub font_path: Option<&'static CStr16>,
}

impl BootConfig {
    pub const fn new() -> Self {
        Self {
            kernel_path: cstr16!("kernel64.sys"),
            font_path: Some(cstr16!("zap-light16.psf")),
        }
    }
}

impl Default for BootConfig {
    fn default() -> Self {
        Self::new()
    }
}
