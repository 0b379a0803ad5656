//! UEFI protocol glue
//!
//! Implementations of the collaborator interfaces over firmware boot
//! services: volume file access, pool and fixed-address page allocation,
//! the raw memory-map/exit services, the graphics output query, and the
//! configuration-table lookup for the ACPI root pointer. No loader
//! policy lives here; these modules only translate between the firmware
//! ABI and the interfaces in [`crate::traits`] and [`crate::memmap`].

pub mod alloc;
pub mod file;
pub mod graphics;
pub mod memmap;
pub mod platform;

use core::sync::atomic::{AtomicBool, Ordering};

static SERVICES_EXITED: AtomicBool = AtomicBool::new(false);

/// Record that ExitBootServices succeeded.
pub(crate) fn mark_services_exited() {
    SERVICES_EXITED.store(true, Ordering::Release);
}

/// Whether firmware boot services, the console logger included, are
/// still callable from this image.
pub fn services_active() -> bool {
    !SERVICES_EXITED.load(Ordering::Acquire)
}
