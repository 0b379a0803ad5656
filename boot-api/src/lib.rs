//! Lumen boot API
//!
//! This crate defines the handoff structures passed from the bootloader to
//! the kernel at its entry point. The kernel receives a single
//! `*const BootInfo` argument and reads every other structure through the
//! pointers it carries, so all types here are `#[repr(C)]` and their layout
//! is part of the boot ABI.
//!
//! Layout stability rules:
//! - Field order in [`BootInfo`] is the contract. Never reorder or insert
//!   fields; append-only changes require a new kernel entry revision.
//! - Pointers are physical, identity-mapped addresses valid at the time of
//!   the entry call. Ownership transfers to the kernel; the bootloader
//!   performs no further access after invocation.

#![no_std]

use core::ffi::c_void;

use static_assertions::const_assert_eq;

/// Framebuffer description produced by the bootloader's graphics query.
///
/// Opaque to the bootloader core; it is filled from the firmware graphics
/// mode and passed through to the kernel verbatim.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct GraphicsInfo {
    /// Physical base address of the framebuffer
    pub base_address: *mut u8,
    /// Total framebuffer size in bytes
    pub buffer_size: usize,
    /// Horizontal resolution in pixels
    pub width: u32,
    /// Vertical resolution in pixels
    pub height: u32,
    /// Pixels per scanline (may exceed `width`)
    pub pixels_per_scan_line: u32,
    /// Drawing strategy hint for the kernel console (1 = linear ARGB)
    pub strategy: u8,
    /// Initial pointer position, X
    pub pointer_x: usize,
    /// Initial pointer position, Y
    pub pointer_y: usize,
}

/// PSF1 bitmap font header (the first 4 bytes of a `.psf` file).
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct Psf1Header {
    /// Magic bytes, 0x36 0x04
    pub magic: [u8; 2],
    /// Font mode; bit 0 set means 512 glyphs instead of 256
    pub mode: u8,
    /// Bytes per glyph (glyphs are 8 pixels wide, `charsize` tall)
    pub charsize: u8,
}

/// A loaded PSF1 font: validated header plus the raw glyph buffer.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct Psf1Font {
    /// Pointer to the validated font header
    pub header: *const Psf1Header,
    /// Pointer to `charsize * glyph_count` bytes of glyph data
    pub glyph_buffer: *const u8,
}

/// One physical memory region, in EFI memory descriptor layout.
///
/// The firmware may report descriptors larger than this struct. Walk the
/// array by [`MemoryInfo::descriptor_size`], never by `size_of`.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct MemoryDescriptor {
    /// Region type classification (EFI memory type numbering)
    pub ty: u32,
    /// Padding to the 64-bit field that follows
    pub pad: u32,
    /// Physical start address
    pub physical_start: u64,
    /// Virtual start address (identity at handoff)
    pub virtual_start: u64,
    /// Region length in 4 KiB pages
    pub page_count: u64,
    /// Attribute flags
    pub attribute: u64,
}

/// The firmware memory map captured immediately before boot services exit.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct MemoryInfo {
    /// Pointer to the first descriptor
    pub map: *const MemoryDescriptor,
    /// Total size of the descriptor array in bytes
    pub map_size: u64,
    /// Stride between descriptors in bytes
    pub descriptor_size: u64,
}

impl MemoryInfo {
    /// Number of descriptors in the map.
    pub fn entry_count(&self) -> usize {
        if self.descriptor_size == 0 {
            return 0;
        }
        (self.map_size / self.descriptor_size) as usize
    }
}

/// Boot information handed to the kernel entry point.
///
/// The kernel depends on this structure byte-for-byte: four pointer-sized
/// fields, in exactly this order. `font` and `rsdp` are null when the
/// corresponding collaborator produced nothing.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct BootInfo {
    /// Framebuffer description for the kernel console
    pub graphics_info: *const GraphicsInfo,
    /// Console font, or null for a fontless boot
    pub font: *const Psf1Font,
    /// Physical memory map snapshot
    pub memory_info: *const MemoryInfo,
    /// ACPI root system description pointer (RSDP), or null
    pub rsdp: *const c_void,
}

impl BootInfo {
    /// Check whether a console font was supplied.
    pub fn has_font(&self) -> bool {
        !self.font.is_null()
    }

    /// Check whether platform description tables were supplied.
    pub fn has_platform_tables(&self) -> bool {
        !self.rsdp.is_null()
    }
}

// The boot ABI is append-only; these sizes are load-bearing.
const_assert_eq!(core::mem::size_of::<BootInfo>(), 32);
const_assert_eq!(core::mem::size_of::<MemoryDescriptor>(), 40);
const_assert_eq!(core::mem::size_of::<MemoryInfo>(), 24);
const_assert_eq!(core::mem::size_of::<Psf1Header>(), 4);
const_assert_eq!(core::mem::size_of::<Psf1Font>(), 16);

#[cfg(test)]
mod tests {
    use super::*;
    use core::mem::offset_of;
    use core::ptr;

    #[test]
    fn boot_info_field_order() {
        // The kernel reads these fields by offset; the order is the ABI.
        assert_eq!(offset_of!(BootInfo, graphics_info), 0);
        assert_eq!(offset_of!(BootInfo, font), 8);
        assert_eq!(offset_of!(BootInfo, memory_info), 16);
        assert_eq!(offset_of!(BootInfo, rsdp), 24);
    }

    #[test]
    fn memory_descriptor_layout() {
        assert_eq!(offset_of!(MemoryDescriptor, ty), 0);
        assert_eq!(offset_of!(MemoryDescriptor, physical_start), 8);
        assert_eq!(offset_of!(MemoryDescriptor, virtual_start), 16);
        assert_eq!(offset_of!(MemoryDescriptor, page_count), 24);
        assert_eq!(offset_of!(MemoryDescriptor, attribute), 32);
    }

    #[test]
    fn memory_info_entry_count() {
        let info = MemoryInfo {
            map: ptr::null(),
            map_size: 480,
            descriptor_size: 48,
        };
        assert_eq!(info.entry_count(), 10);

        let empty = MemoryInfo {
            map: ptr::null(),
            map_size: 0,
            descriptor_size: 0,
        };
        assert_eq!(empty.entry_count(), 0);
    }

    #[test]
    fn boot_info_optional_fields() {
        let info = BootInfo {
            graphics_info: ptr::null(),
            font: ptr::null(),
            memory_info: ptr::null(),
            rsdp: ptr::null(),
        };
        assert!(!info.has_font());
        assert!(!info.has_platform_tables());
    }
}
