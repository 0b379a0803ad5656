//! Raw memory-map and exit services
//!
//! The high-level `uefi` crate wraps GetMemoryMap/ExitBootServices with
//! its own retry policy; the boot protocol here needs the retry bound
//! under its own control (see [`crate::memmap`]), so these calls go
//! through the raw boot services table.

use core::ptr::{self, NonNull};

use uefi::boot::{self, MemoryType};
use uefi::table::system_table_raw;
use uefi_raw::table::boot::BootServices;
use uefi_raw::Status;

use crate::error::{BootError, Result};
use crate::memmap::{FirmwareMemoryMap, MapFill, MapKey, MapProbe};

/// Live boot-services implementation of the memory-map collaborator.
pub struct UefiMemoryMap {
    boot_services: NonNull<BootServices>,
    image_handle: uefi_raw::Handle,
}

impl UefiMemoryMap {
    pub fn new() -> Result<Self> {
        let system_table = system_table_raw().ok_or(BootError::UefiNotFound)?;
        let boot_services = unsafe { (*system_table.as_ptr()).boot_services };
        let boot_services = NonNull::new(boot_services).ok_or(BootError::UefiNotFound)?;
        Ok(Self {
            boot_services,
            image_handle: boot::image_handle().as_ptr(),
        })
    }
}

impl FirmwareMemoryMap for UefiMemoryMap {
    fn probe(&mut self) -> Result<MapProbe> {
        let services = unsafe { self.boot_services.as_ref() };
        let mut map_size = 0usize;
        let mut map_key = 0usize;
        let mut descriptor_size = 0usize;
        let mut descriptor_version = 0u32;

        let status = unsafe {
            (services.get_memory_map)(
                &mut map_size,
                ptr::null_mut(),
                &mut map_key,
                &mut descriptor_size,
                &mut descriptor_version,
            )
        };
        // The null-buffer call fails with BUFFER_TOO_SMALL by design;
        // that failure carries the size we are after.
        if status != Status::BUFFER_TOO_SMALL {
            return Err(BootError::MemoryMapError);
        }
        Ok(MapProbe {
            map_size,
            descriptor_size,
        })
    }

    fn allocate(&mut self, size: usize) -> Result<NonNull<u8>> {
        boot::allocate_pool(MemoryType::LOADER_DATA, size)
            .map_err(|err| BootError::from(err.status()))
    }

    fn fill(&mut self, buffer: &mut [u8]) -> Result<MapFill> {
        let services = unsafe { self.boot_services.as_ref() };
        let mut map_size = buffer.len();
        let mut map_key = 0usize;
        let mut descriptor_size = 0usize;
        let mut descriptor_version = 0u32;

        let status = unsafe {
            (services.get_memory_map)(
                &mut map_size,
                buffer.as_mut_ptr().cast(),
                &mut map_key,
                &mut descriptor_size,
                &mut descriptor_version,
            )
        };
        if status != Status::SUCCESS {
            return Err(BootError::MemoryMapError);
        }
        Ok(MapFill {
            len: map_size,
            descriptor_size,
            key: MapKey::new(map_key),
        })
    }

    fn exit_firmware(&mut self, key: MapKey) -> Result<()> {
        let services = unsafe { self.boot_services.as_ref() };
        let status = unsafe { (services.exit_boot_services)(self.image_handle, key.raw()) };
        if status != Status::SUCCESS {
            return Err(BootError::Uefi(status));
        }
        super::mark_services_exited();
        Ok(())
    }
}
