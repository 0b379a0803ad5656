//! Platform configuration tables
//!
//! The firmware publishes vendor tables in the system configuration
//! table, keyed by GUID. The only one the handoff cares about is the
//! ACPI root pointer; ACPI 2.0 takes precedence over the 1.0 entry when
//! both are published.

use core::ffi::c_void;
use core::ptr;

use uefi::system;
use uefi::table::cfg::ConfigTableEntry;

/// Locate the ACPI RSDP, preferring the ACPI 2.0 entry.
///
/// Returns null when the platform publishes no ACPI tables at all; the
/// handoff carries the absence through rather than failing the boot.
pub fn acpi_root() -> *const c_void {
    system::with_config_table(|entries| {
        let mut legacy = ptr::null();
        for entry in entries {
            if entry.guid == ConfigTableEntry::ACPI2_GUID {
                return entry.address;
            }
            if entry.guid == ConfigTableEntry::ACPI_GUID {
                legacy = entry.address;
            }
        }
        legacy
    })
}
