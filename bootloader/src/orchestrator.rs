//! Boot orchestration
//!
//! Drives one boot attempt end to end: load the kernel image, query the
//! framebuffer, pull in the optional console font, locate the platform
//! tables, capture the memory map while leaving the firmware, and jump
//! to the kernel. Ordering matters throughout; everything that needs a
//! firmware service, the log output included, happens before the exit
//! protocol runs.

use core::convert::Infallible;
use core::ffi::c_void;
use core::ptr;

use lumen_boot_api::Psf1Font;

use crate::acpi;
use crate::config::BootConfig;
use crate::elf::{load_segments, read_image_header, read_segment_table};
use crate::error::{BootError, Result};
use crate::firmware::alloc::{FirmwarePages, PoolAlloc};
use crate::firmware::file::UefiFile;
use crate::firmware::graphics;
use crate::firmware::memmap::UefiMemoryMap;
use crate::firmware::platform;
use crate::handoff::{enter_kernel, HandoffBuilder};
use crate::memmap::exit_boot_environment;
use crate::psf;

/// Run the boot sequence. Returns only on failure.
pub fn boot(config: &BootConfig) -> BootError {
    match run(config) {
        Ok(never) => match never {},
        Err(err) => err,
    }
}

fn run(config: &BootConfig) -> Result<Infallible> {
    let mut pool = PoolAlloc;

    log::info!("loading kernel image {}", config.kernel_path);
    let mut kernel = UefiFile::open(config.kernel_path)?;
    let header = read_image_header(&mut kernel)?;
    let table = read_segment_table(&mut kernel, &header, &mut pool)?;
    let summary = load_segments(&mut kernel, &table, &mut FirmwarePages)?;
    log::info!(
        "kernel placed: {} segments ({} skipped), {} pages, entry {:#x}",
        summary.loaded,
        summary.skipped,
        summary.pages,
        header.entry_point
    );

    let graphics_info = graphics::query()?;
    let font = load_console_font(config, &mut pool)?;

    let rsdp = platform::acpi_root();
    describe_platform(rsdp);

    // Last firmware interaction. Past this point every boot service is
    // gone, the console and the allocator included.
    let mut firmware_map = UefiMemoryMap::new()?;
    let snapshot = exit_boot_environment(&mut firmware_map)?;

    let memory_info = snapshot.to_memory_info();
    let boot_info = HandoffBuilder::new(&graphics_info, &memory_info)
        .font(font)
        .platform_root(rsdp)
        .build();

    unsafe { enter_kernel(header.entry_point, &boot_info) };
    Err(BootError::KernelReturned)
}

/// Load the configured console font, degrading to a fontless boot when
/// the file is missing, truncated, or not PSF1. Allocation failures are
/// not a font problem and still abort the boot.
fn load_console_font(config: &BootConfig, pool: &mut PoolAlloc) -> Result<*const Psf1Font> {
    let Some(path) = config.font_path else {
        return Ok(ptr::null());
    };

    let loaded = UefiFile::open(path).and_then(|mut file| psf::load_font(&mut file, pool));
    match loaded {
        Ok(font) => {
            log::info!("console font {} loaded", path);
            Ok(font.as_ptr() as *const Psf1Font)
        }
        Err(err) if err.is_degradable() || err == BootError::ShortRead => {
            log::warn!("console font {} unavailable ({}), booting fontless", path, err);
            Ok(ptr::null())
        }
        Err(err) => Err(err),
    }
}

/// Log what the platform tables look like before the console goes away.
fn describe_platform(rsdp: *const c_void) {
    let Some(root) = (unsafe { acpi::root_table_from_rsdp(rsdp) }) else {
        log::warn!("no ACPI root table published; kernel boots without platform tables");
        return;
    };

    let madt = unsafe { acpi::find_table(root.as_ptr(), b"APIC") };
    log::info!(
        "ACPI root table at {:p}, MADT {}",
        root.as_ptr(),
        if madt.is_some() { "present" } else { "absent" }
    );
}
