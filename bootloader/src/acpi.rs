//! ACPI system description table support
//!
//! The platform hands over one root table (the XSDT) whose body is an
//! array of 64-bit physical pointers to further tables, each identified
//! by a 4-byte signature. The locator here is a linear signature scan;
//! it never mutates table memory and never recurses into subtables.

use core::ffi::c_void;
use core::mem::size_of;
use core::ptr::{self, NonNull};

/// Signature at the start of the root system description pointer.
pub const RSDP_SIGNATURE: [u8; 8] = *b"RSD PTR ";

/// Common header shared by the root table and every subtable.
///
/// Tables live wherever the firmware put them; fields are read through
/// unaligned loads rather than references into packed memory.
#[repr(C, packed)]
pub struct SdtHeader {
    pub signature: [u8; 4],
    pub length: u32,
    pub revision: u8,
    pub checksum: u8,
    pub oem_id: [u8; 6],
    pub oem_table_id: [u8; 8],
    pub oem_revision: u32,
    pub creator_id: u32,
    pub creator_revision: u32,
}

impl SdtHeader {
    /// Read the table signature.
    ///
    /// # Safety
    /// `table` must point to a readable SDT header.
    pub unsafe fn signature_at(table: *const SdtHeader) -> [u8; 4] {
        unsafe { ptr::read_unaligned(ptr::addr_of!((*table).signature)) }
    }

    /// Read the total table length in bytes.
    ///
    /// # Safety
    /// `table` must point to a readable SDT header.
    pub unsafe fn length_at(table: *const SdtHeader) -> u32 {
        unsafe { ptr::read_unaligned(ptr::addr_of!((*table).length)) }
    }

    /// Verify the table checksum: all `length` bytes sum to zero mod 256.
    ///
    /// # Safety
    /// `table` must point to a readable table of at least `length` bytes.
    pub unsafe fn checksum_ok(table: *const SdtHeader) -> bool {
        let length = unsafe { Self::length_at(table) } as usize;
        let bytes = table as *const u8;
        let mut sum = 0u8;
        for i in 0..length {
            sum = sum.wrapping_add(unsafe { ptr::read(bytes.add(i)) });
        }
        sum == 0
    }
}

/// Number of subtable pointers in a root table of the given length.
pub fn entry_count(table_length: u32) -> usize {
    let header = size_of::<SdtHeader>() as u32;
    if table_length <= header {
        return 0;
    }
    ((table_length - header) / 8) as usize
}

/// Find the first subtable of `root` whose signature equals `signature`.
///
/// The comparison is an exact 4-byte match; a table whose signature
/// merely shares a prefix with the query does not qualify. Returns `None`
/// when no entry matches.
///
/// # Safety
/// `root` must point to a valid root description table whose entries
/// point to readable SDT headers.
pub unsafe fn find_table(root: *const SdtHeader, signature: &[u8; 4]) -> Option<NonNull<SdtHeader>> {
    let entries = entry_count(unsafe { SdtHeader::length_at(root) });
    let entry_base = unsafe { (root as *const u8).add(size_of::<SdtHeader>()) };

    for index in 0..entries {
        // Entry pointers are packed right after the header; 8-byte
        // alignment is not guaranteed.
        let entry = unsafe { ptr::read_unaligned(entry_base.add(index * 8) as *const u64) };
        let candidate = entry as *const SdtHeader;
        if candidate.is_null() {
            continue;
        }
        if unsafe { SdtHeader::signature_at(candidate) } == *signature {
            return NonNull::new(candidate as *mut SdtHeader);
        }
    }
    None
}

/// Resolve the RSDP published by the firmware to its XSDT.
///
/// Validates the 8-byte signature and requires an ACPI 2.0+ revision;
/// earlier revisions carry only the 32-bit RSDT address and are not
/// supported here. Returns `None` on any mismatch.
///
/// # Safety
/// `rsdp` must be null or point to at least 36 readable bytes.
pub unsafe fn root_table_from_rsdp(rsdp: *const c_void) -> Option<NonNull<SdtHeader>> {
    if rsdp.is_null() {
        return None;
    }
    let bytes = rsdp as *const u8;

    let mut signature = [0u8; 8];
    for (i, byte) in signature.iter_mut().enumerate() {
        *byte = unsafe { ptr::read(bytes.add(i)) };
    }
    if signature != RSDP_SIGNATURE {
        return None;
    }

    // Revision at offset 15; the 64-bit XSDT address at offset 24 only
    // exists from revision 2 on.
    let revision = unsafe { ptr::read(bytes.add(15)) };
    if revision < 2 {
        return None;
    }
    let xsdt = unsafe { ptr::read_unaligned(bytes.add(24) as *const u64) };
    NonNull::new(xsdt as *mut SdtHeader)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::vec;
    use std::vec::Vec;

    const HEADER_SIZE: usize = size_of::<SdtHeader>();

    fn make_table(signature: &[u8; 4], body: usize) -> Vec<u8> {
        let length = (HEADER_SIZE + body) as u32;
        let mut table = vec![0u8; HEADER_SIZE + body];
        table[0..4].copy_from_slice(signature);
        table[4..8].copy_from_slice(&length.to_le_bytes());
        table
    }

    fn fix_checksum(table: &mut [u8]) {
        table[9] = 0;
        let sum: u8 = table.iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
        table[9] = 0u8.wrapping_sub(sum);
    }

    fn make_root(subtables: &[&Vec<u8>]) -> Vec<u8> {
        let mut root = make_table(b"XSDT", subtables.len() * 8);
        for (i, sub) in subtables.iter().enumerate() {
            let addr = sub.as_ptr() as u64;
            let at = HEADER_SIZE + i * 8;
            root[at..at + 8].copy_from_slice(&addr.to_le_bytes());
        }
        root
    }

    #[test]
    fn test_header_is_36_bytes() {
        assert_eq!(HEADER_SIZE, 36);
    }

    #[test]
    fn test_entry_count() {
        assert_eq!(entry_count(36), 0);
        assert_eq!(entry_count(36 + 24), 3);
        assert_eq!(entry_count(0), 0);
    }

    #[test]
    fn test_find_present_table() {
        let facp = make_table(b"FACP", 0);
        let apic = make_table(b"APIC", 0);
        let hpet = make_table(b"HPET", 0);
        let root = make_root(&[&facp, &apic, &hpet]);

        let found = unsafe { find_table(root.as_ptr() as *const SdtHeader, b"APIC") };
        let found = found.expect("APIC should be found");
        assert_eq!(found.as_ptr() as *const u8, apic.as_ptr());
    }

    #[test]
    fn test_absent_table_returns_none() {
        let facp = make_table(b"FACP", 0);
        let apic = make_table(b"APIC", 0);
        let root = make_root(&[&facp, &apic]);

        let found = unsafe { find_table(root.as_ptr() as *const SdtHeader, b"XSDT") };
        assert!(found.is_none());
    }

    #[test]
    fn test_prefix_does_not_match() {
        // "HPET" and "HPEX" share three bytes; byte 4 must still compare.
        let hpet = make_table(b"HPET", 0);
        let root = make_root(&[&hpet]);

        let found = unsafe { find_table(root.as_ptr() as *const SdtHeader, b"HPEX") };
        assert!(found.is_none());
    }

    #[test]
    fn test_first_match_wins() {
        let first = make_table(b"SSDT", 0);
        let second = make_table(b"SSDT", 0);
        let root = make_root(&[&first, &second]);

        let found = unsafe { find_table(root.as_ptr() as *const SdtHeader, b"SSDT") };
        assert_eq!(found.unwrap().as_ptr() as *const u8, first.as_ptr());
    }

    fn make_rsdp(signature: &[u8; 8], revision: u8, xsdt: u64) -> Vec<u8> {
        let mut rsdp = vec![0u8; 36];
        rsdp[0..8].copy_from_slice(signature);
        rsdp[15] = revision;
        rsdp[24..32].copy_from_slice(&xsdt.to_le_bytes());
        rsdp
    }

    #[test]
    fn test_rsdp_resolves_to_xsdt() {
        let xsdt = make_table(b"XSDT", 0);
        let rsdp = make_rsdp(&RSDP_SIGNATURE, 2, xsdt.as_ptr() as u64);

        let root = unsafe { root_table_from_rsdp(rsdp.as_ptr() as *const _) };
        assert_eq!(root.unwrap().as_ptr() as *const u8, xsdt.as_ptr());
    }

    #[test]
    fn test_rsdp_rejects_bad_signature() {
        let rsdp = make_rsdp(b"RSD PTR!", 2, 0x1000);
        assert!(unsafe { root_table_from_rsdp(rsdp.as_ptr() as *const _) }.is_none());
    }

    #[test]
    fn test_rsdp_rejects_legacy_revision() {
        let rsdp = make_rsdp(&RSDP_SIGNATURE, 0, 0x1000);
        assert!(unsafe { root_table_from_rsdp(rsdp.as_ptr() as *const _) }.is_none());
    }

    #[test]
    fn test_rsdp_null_inputs() {
        assert!(unsafe { root_table_from_rsdp(core::ptr::null()) }.is_none());

        let rsdp = make_rsdp(&RSDP_SIGNATURE, 2, 0);
        assert!(unsafe { root_table_from_rsdp(rsdp.as_ptr() as *const _) }.is_none());
    }

    #[test]
    fn test_checksum() {
        let mut table = make_table(b"FACP", 4);
        table[HEADER_SIZE] = 0x42;
        fix_checksum(&mut table);
        assert!(unsafe { SdtHeader::checksum_ok(table.as_ptr() as *const SdtHeader) });

        table[HEADER_SIZE] = 0x43;
        assert!(!unsafe { SdtHeader::checksum_ok(table.as_ptr() as *const SdtHeader) });
    }
}
