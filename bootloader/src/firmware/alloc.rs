//! Firmware-backed allocation
//!
//! Everything allocated here is typed `LOADER_DATA` so it stays usable
//! by the kernel after the boot services exit, and nothing is ever
//! freed: the loader's allocations are either handed to the kernel or
//! abandoned with the rest of the firmware environment.

use core::ptr::NonNull;

use uefi::boot::{self, AllocateType, MemoryType};

use crate::error::{BootError, Result};
use crate::traits::{BootAlloc, PageAllocator};

/// Pool allocator for headers, tables, and font data.
pub struct PoolAlloc;

impl BootAlloc for PoolAlloc {
    fn allocate(&mut self, size: usize) -> Result<NonNull<u8>> {
        boot::allocate_pool(MemoryType::LOADER_DATA, size)
            .map_err(|err| BootError::from(err.status()))
    }
}

/// Fixed-address page reservations for kernel segments.
pub struct FirmwarePages;

impl PageAllocator for FirmwarePages {
    fn allocate_at(&mut self, phys: u64, pages: usize) -> Result<NonNull<u8>> {
        // AllocateType::Address either gives us exactly this range or
        // fails; there is no fallback placement.
        boot::allocate_pages(AllocateType::Address(phys), MemoryType::LOADER_DATA, pages)
            .map_err(|_| BootError::SegmentPlacementFailed)
    }
}
