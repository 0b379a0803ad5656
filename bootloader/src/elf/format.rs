//! ELF64 format support
//!
//! Decoded views of the ELF header and program header table. Fields are
//! read out of byte buffers with explicit little-endian accessors rather
//! than overlaying `#[repr(C)]` structs on file data, so alignment and
//! padding of the on-disk format never leak into the in-memory types.

use bitflags::bitflags;

use crate::error::{BootError, Result};

/// ELF magic number (0x7F 'E' 'L' 'F')
pub const ELF_MAGIC: [u8; 4] = [0x7F, b'E', b'L', b'F'];
/// 64-bit file class
pub const ELF_CLASS_64: u8 = 2;
/// Little-endian data encoding
pub const ELF_DATA_LITTLE: u8 = 1;
/// Executable file type
pub const ET_EXEC: u16 = 2;
/// AMD x86-64 machine
pub const EM_X86_64: u16 = 62;

/// Loadable segment
pub const PT_LOAD: u32 = 1;

/// Page size used for segment placement
pub const PAGE_SIZE: u64 = 0x1000;

bitflags! {
    /// Program header permission flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SegmentFlags: u32 {
        const EXECUTE = 0x1;
        const WRITE = 0x2;
        const READ = 0x4;
    }
}

/// Decoded ELF64 file header
#[derive(Debug, Clone, Copy)]
pub struct ImageHeader {
    /// Entry point virtual address
    pub entry_point: u64,
    /// Program header table file offset
    pub ph_offset: u64,
    /// Program header entry size
    pub ph_entry_size: u16,
    /// Program header entry count
    pub ph_count: u16,
}

impl ImageHeader {
    /// On-disk size of the ELF64 header
    pub const SIZE: usize = 64;

    /// Decode and validate a header from the first [`Self::SIZE`] bytes
    /// of the image.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::SIZE {
            return Err(BootError::ShortRead);
        }
        if bytes[0..4] != ELF_MAGIC {
            return Err(BootError::InvalidKernelImage("bad ELF magic"));
        }
        if bytes[4] != ELF_CLASS_64 {
            return Err(BootError::InvalidKernelImage("not a 64-bit image"));
        }
        if bytes[5] != ELF_DATA_LITTLE {
            return Err(BootError::InvalidKernelImage("not little-endian"));
        }
        if read_u16(bytes, 16) != ET_EXEC {
            return Err(BootError::InvalidKernelImage("not an executable image"));
        }
        if read_u16(bytes, 18) != EM_X86_64 {
            return Err(BootError::InvalidKernelImage("wrong machine type"));
        }

        Ok(Self {
            entry_point: read_u64(bytes, 24),
            ph_offset: read_u64(bytes, 32),
            ph_entry_size: read_u16(bytes, 54),
            ph_count: read_u16(bytes, 56),
        })
    }

    /// Total byte size of the program header table.
    pub fn segment_table_size(&self) -> usize {
        self.ph_count as usize * self.ph_entry_size as usize
    }
}

/// Decoded ELF64 program header
#[derive(Debug, Clone, Copy)]
pub struct SegmentDescriptor {
    /// Segment type (only [`PT_LOAD`] triggers loading)
    pub segment_type: u32,
    /// Permission flags
    pub flags: SegmentFlags,
    /// File offset of the segment bytes
    pub file_offset: u64,
    /// Virtual address
    pub virtual_address: u64,
    /// Target physical address
    pub physical_address: u64,
    /// Segment size in the file
    pub file_size: u64,
    /// Segment size in memory
    pub mem_size: u64,
    /// Segment alignment
    pub alignment: u64,
}

impl SegmentDescriptor {
    /// On-disk size of an ELF64 program header
    pub const SIZE: usize = 56;

    /// Decode one descriptor from its on-disk representation.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::SIZE {
            return Err(BootError::ShortRead);
        }
        Ok(Self {
            segment_type: read_u32(bytes, 0),
            flags: SegmentFlags::from_bits_retain(read_u32(bytes, 4)),
            file_offset: read_u64(bytes, 8),
            virtual_address: read_u64(bytes, 16),
            physical_address: read_u64(bytes, 24),
            file_size: read_u64(bytes, 32),
            mem_size: read_u64(bytes, 40),
            alignment: read_u64(bytes, 48),
        })
    }

    /// Whether this segment must be copied into memory before execution.
    pub fn is_loadable(&self) -> bool {
        self.segment_type == PT_LOAD
    }

    /// Pages needed to hold the in-memory extent of this segment.
    pub fn page_count(&self) -> usize {
        page_count(self.mem_size)
    }
}

/// Exact ceiling division of a byte size into 4 KiB pages.
pub fn page_count(mem_size: u64) -> usize {
    mem_size.div_ceil(PAGE_SIZE) as usize
}

fn read_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

fn read_u64(bytes: &[u8], offset: usize) -> u64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&bytes[offset..offset + 8]);
    u64::from_le_bytes(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a minimal valid ELF64 executable header.
    fn sample_header(entry: u64, ph_offset: u64, ph_count: u16) -> [u8; 64] {
        let mut raw = [0u8; 64];
        raw[0..4].copy_from_slice(&ELF_MAGIC);
        raw[4] = ELF_CLASS_64;
        raw[5] = ELF_DATA_LITTLE;
        raw[6] = 1; // EV_CURRENT
        raw[16..18].copy_from_slice(&ET_EXEC.to_le_bytes());
        raw[18..20].copy_from_slice(&EM_X86_64.to_le_bytes());
        raw[24..32].copy_from_slice(&entry.to_le_bytes());
        raw[32..40].copy_from_slice(&ph_offset.to_le_bytes());
        raw[54..56].copy_from_slice(&(SegmentDescriptor::SIZE as u16).to_le_bytes());
        raw[56..58].copy_from_slice(&ph_count.to_le_bytes());
        raw
    }

    fn sample_segment(
        segment_type: u32,
        file_offset: u64,
        paddr: u64,
        file_size: u64,
        mem_size: u64,
    ) -> [u8; 56] {
        let mut raw = [0u8; 56];
        raw[0..4].copy_from_slice(&segment_type.to_le_bytes());
        raw[4..8].copy_from_slice(&(SegmentFlags::READ | SegmentFlags::EXECUTE).bits().to_le_bytes());
        raw[8..16].copy_from_slice(&file_offset.to_le_bytes());
        raw[24..32].copy_from_slice(&paddr.to_le_bytes());
        raw[32..40].copy_from_slice(&file_size.to_le_bytes());
        raw[40..48].copy_from_slice(&mem_size.to_le_bytes());
        raw[48..56].copy_from_slice(&0x1000u64.to_le_bytes());
        raw
    }

    #[test]
    fn test_parse_valid_header() {
        let raw = sample_header(0x10_0000, 64, 3);
        let header = ImageHeader::parse(&raw).unwrap();
        assert_eq!(header.entry_point, 0x10_0000);
        assert_eq!(header.ph_offset, 64);
        assert_eq!(header.ph_count, 3);
        assert_eq!(header.segment_table_size(), 3 * 56);
    }

    #[test]
    fn test_reject_bad_magic() {
        let mut raw = sample_header(0, 64, 1);
        raw[0] = 0x7E;
        assert!(matches!(
            ImageHeader::parse(&raw),
            Err(BootError::InvalidKernelImage("bad ELF magic"))
        ));
    }

    #[test]
    fn test_reject_32bit_class() {
        let mut raw = sample_header(0, 64, 1);
        raw[4] = 1;
        assert!(matches!(
            ImageHeader::parse(&raw),
            Err(BootError::InvalidKernelImage("not a 64-bit image"))
        ));
    }

    #[test]
    fn test_reject_wrong_machine() {
        let mut raw = sample_header(0, 64, 1);
        raw[18..20].copy_from_slice(&183u16.to_le_bytes()); // EM_AARCH64
        assert!(matches!(
            ImageHeader::parse(&raw),
            Err(BootError::InvalidKernelImage("wrong machine type"))
        ));
    }

    #[test]
    fn test_reject_truncated_header() {
        let raw = sample_header(0, 64, 1);
        assert!(matches!(
            ImageHeader::parse(&raw[..32]),
            Err(BootError::ShortRead)
        ));
    }

    #[test]
    fn test_parse_segment() {
        let raw = sample_segment(PT_LOAD, 0x200, 0x20_0000, 0x1800, 0x2000);
        let seg = SegmentDescriptor::parse(&raw).unwrap();
        assert!(seg.is_loadable());
        assert_eq!(seg.file_offset, 0x200);
        assert_eq!(seg.physical_address, 0x20_0000);
        assert_eq!(seg.file_size, 0x1800);
        assert_eq!(seg.mem_size, 0x2000);
        assert!(seg.flags.contains(SegmentFlags::EXECUTE));
        assert!(!seg.flags.contains(SegmentFlags::WRITE));
    }

    #[test]
    fn test_page_count_exact_ceiling() {
        assert_eq!(page_count(0), 0);
        assert_eq!(page_count(1), 1);
        assert_eq!(page_count(0x1000), 1);
        assert_eq!(page_count(0x1001), 2);
        assert_eq!(page_count(0x2000), 2);
    }
}
