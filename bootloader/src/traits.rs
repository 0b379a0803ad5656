//! Collaborator interfaces for the load pipeline
//!
//! Defines the firmware-facing interfaces the loader core depends on, so
//! the ELF and font code stays decoupled from UEFI protocol plumbing and
//! can be exercised against in-memory implementations in tests.

use core::ptr::NonNull;

use crate::error::Result;

/// Byte-addressable read access to a boot volume file.
pub trait ImageFile {
    /// Move the read cursor to an absolute byte offset.
    fn seek(&mut self, offset: u64) -> Result<()>;

    /// Fill `buf` completely from the current cursor.
    ///
    /// A short read is an error; the on-disk structures the loader reads
    /// have exact sizes and a truncated file cannot be loaded.
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()>;

    /// Total file size in bytes.
    fn size(&mut self) -> Result<u64>;
}

/// Byte-granular allocation that outlives boot services.
///
/// Buffers handed out here end up referenced by the handoff record, so an
/// implementation must carve them from memory the firmware classifies as
/// loader data, not from a transient heap.
pub trait BootAlloc {
    /// Allocate `size` bytes, 8-byte aligned. The allocation is never
    /// freed.
    fn allocate(&mut self, size: usize) -> Result<NonNull<u8>>;
}

/// Page reservation at caller-chosen physical addresses.
///
/// The kernel image is linked against fixed physical addresses and there
/// is no relocation step: a reservation that cannot be satisfied at the
/// exact requested address is a terminal failure.
pub trait PageAllocator {
    /// Reserve `pages` 4 KiB pages starting exactly at `phys`, returning
    /// a pointer through which the pages are written.
    fn allocate_at(&mut self, phys: u64, pages: usize) -> Result<NonNull<u8>>;
}
