//! ELF kernel loading
//!
//! Reads the image header and program header table through an
//! [`ImageFile`] and places every loadable segment at its fixed physical
//! address through a [`PageAllocator`]. The kernel is linked against
//! those exact addresses; nothing here relocates.

use core::slice;

use crate::elf::format::{ImageHeader, SegmentDescriptor, PAGE_SIZE};
use crate::error::{BootError, Result};
use crate::traits::{BootAlloc, ImageFile, PageAllocator};

/// The program header table, read once into a firmware-lifetime buffer.
///
/// Descriptors are decoded on access, stepping by the entry size the
/// header reports (which may exceed [`SegmentDescriptor::SIZE`]).
pub struct SegmentTable {
    raw: &'static [u8],
    entry_size: usize,
}

impl SegmentTable {
    /// Number of descriptors in the table.
    pub fn len(&self) -> usize {
        if self.entry_size == 0 {
            return 0;
        }
        self.raw.len() / self.entry_size
    }

    /// Whether the table holds no descriptors.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Decode the descriptor at `index`.
    pub fn get(&self, index: usize) -> Result<SegmentDescriptor> {
        let start = index * self.entry_size;
        let end = start + self.entry_size;
        if end > self.raw.len() {
            return Err(BootError::ShortRead);
        }
        SegmentDescriptor::parse(&self.raw[start..end])
    }

    /// Iterate descriptors in file order.
    pub fn iter(&self) -> impl Iterator<Item = Result<SegmentDescriptor>> + '_ {
        (0..self.len()).map(move |i| self.get(i))
    }
}

/// What a [`load_segments`] pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadSummary {
    /// Segments copied into place
    pub loaded: usize,
    /// Non-loadable or empty segments passed over
    pub skipped: usize,
    /// Total pages reserved
    pub pages: usize,
}

/// Read and validate the image header at offset 0.
pub fn read_image_header<F: ImageFile>(file: &mut F) -> Result<ImageHeader> {
    let mut raw = [0u8; ImageHeader::SIZE];
    file.seek(0)?;
    file.read_exact(&mut raw)?;
    ImageHeader::parse(&raw)
}

/// Read the program header table into a freshly allocated buffer.
pub fn read_segment_table<F, A>(
    file: &mut F,
    header: &ImageHeader,
    alloc: &mut A,
) -> Result<SegmentTable>
where
    F: ImageFile,
    A: BootAlloc,
{
    let entry_size = header.ph_entry_size as usize;
    if entry_size < SegmentDescriptor::SIZE {
        return Err(BootError::InvalidKernelImage("program header entry too small"));
    }

    let table_size = header.segment_table_size();
    if table_size == 0 {
        return Ok(SegmentTable {
            raw: &[],
            entry_size,
        });
    }

    let buffer = alloc.allocate(table_size)?;
    // Allocations from BootAlloc are never freed; the slice lives until
    // the firmware hands the machine over.
    let raw = unsafe { slice::from_raw_parts_mut(buffer.as_ptr(), table_size) };

    file.seek(header.ph_offset)?;
    file.read_exact(raw)?;

    Ok(SegmentTable {
        raw,
        entry_size,
    })
}

/// Place every loadable segment at its fixed physical address.
///
/// For each `PT_LOAD` descriptor: reserve `ceil(mem_size / 4 KiB)` pages
/// at exactly `physical_address`, copy `file_size` bytes from the file,
/// and zero the remainder of the reservation (freshly allocated pages are
/// not guaranteed to be clear, and the segment's `.bss` tail must be).
pub fn load_segments<F, P>(
    file: &mut F,
    table: &SegmentTable,
    pages: &mut P,
) -> Result<LoadSummary>
where
    F: ImageFile,
    P: PageAllocator,
{
    let mut summary = LoadSummary {
        loaded: 0,
        skipped: 0,
        pages: 0,
    };

    for descriptor in table.iter() {
        let descriptor = descriptor?;
        if !descriptor.is_loadable() {
            summary.skipped += 1;
            continue;
        }
        if descriptor.file_size > descriptor.mem_size {
            return Err(BootError::InvalidKernelImage("segment file size exceeds memory size"));
        }

        let page_count = descriptor.page_count();
        if page_count == 0 {
            summary.skipped += 1;
            continue;
        }

        let destination = pages.allocate_at(descriptor.physical_address, page_count)?;
        let region = unsafe {
            slice::from_raw_parts_mut(destination.as_ptr(), page_count * PAGE_SIZE as usize)
        };

        let file_size = descriptor.file_size as usize;
        file.seek(descriptor.file_offset)?;
        file.read_exact(&mut region[..file_size])?;
        region[file_size..].fill(0);

        summary.loaded += 1;
        summary.pages += page_count;
    }

    Ok(summary)
}
