//! Handoff assembly and kernel entry
//!
//! Composes the [`BootInfo`] record from the collaborator results and
//! transfers control to the loaded entry point. The record and
//! everything it points to must already live in memory that survives the
//! boot services exit; the builder is pure pointer plumbing and performs
//! no allocation.

use core::ffi::c_void;
use core::ptr;

use lumen_boot_api::{BootInfo, GraphicsInfo, MemoryInfo, Psf1Font};

/// Builder for the kernel handoff record.
///
/// Graphics and memory information are mandatory; the font and the
/// platform root default to null when their collaborators produced
/// nothing.
pub struct HandoffBuilder {
    graphics_info: *const GraphicsInfo,
    font: *const Psf1Font,
    memory_info: *const MemoryInfo,
    rsdp: *const c_void,
}

impl HandoffBuilder {
    pub fn new(graphics_info: &GraphicsInfo, memory_info: &MemoryInfo) -> Self {
        Self {
            graphics_info,
            font: ptr::null(),
            memory_info,
            rsdp: ptr::null(),
        }
    }

    /// Attach a console font.
    pub fn font(mut self, font: *const Psf1Font) -> Self {
        self.font = font;
        self
    }

    /// Attach the platform root description table.
    pub fn platform_root(mut self, rsdp: *const c_void) -> Self {
        self.rsdp = rsdp;
        self
    }

    /// Assemble the record. Pure passthrough, field order per the ABI.
    pub fn build(self) -> BootInfo {
        BootInfo {
            graphics_info: self.graphics_info,
            font: self.font,
            memory_info: self.memory_info,
            rsdp: self.rsdp,
        }
    }
}

/// Signature the kernel entry point is linked with: one pointer argument,
/// System V calling convention.
pub type KernelEntry = extern "sysv64" fn(*const BootInfo) -> u64;

/// Jump to the loaded kernel.
///
/// Does not return under normal operation; the `u64` return path exists
/// only as a defensive fallback for a kernel that comes back.
///
/// # Safety
/// `entry_point` must be the entry address of an image whose segments
/// were loaded at their linked physical addresses, and `info` and its
/// pointees must remain valid for the kernel's lifetime.
pub unsafe fn enter_kernel(entry_point: u64, info: &BootInfo) -> u64 {
    let entry: KernelEntry = unsafe { core::mem::transmute(entry_point) };
    entry(info as *const BootInfo)
}
