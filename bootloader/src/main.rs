//! UEFI application entry point
//!
//! Thin shell around [`lumen_bootloader::boot`]: initialize the firmware
//! helpers and logger, run the boot sequence, and report whatever failure
//! brought control back here. On non-UEFI targets this builds as an empty
//! host binary so the crate's tests link.

#![cfg_attr(target_os = "uefi", no_std)]
#![cfg_attr(target_os = "uefi", no_main)]

#[cfg(target_os = "uefi")]
mod efi {
    use lumen_bootloader::config::BootConfig;
    use lumen_bootloader::error::BootError;
    use uefi::Status;

    #[uefi::entry]
    fn efi_main() -> Status {
        if let Err(err) = uefi::helpers::init() {
            return err.status();
        }
        log::info!("lumen bootloader starting");

        let config = BootConfig::new();
        match lumen_bootloader::boot(&config) {
            // Control came back from past the boot services exit; the
            // console no longer exists, so halt silently.
            BootError::KernelReturned => halt(),
            err => {
                log::error!("boot failed: {}", err);
                Status::LOAD_ERROR
            }
        }
    }

    fn halt() -> ! {
        loop {
            x86_64::instructions::hlt();
        }
    }

    #[panic_handler]
    fn panic(info: &core::panic::PanicInfo) -> ! {
        // The console is itself a boot service; a panic landing after a
        // successful exit has nowhere to print to.
        if lumen_bootloader::firmware::services_active() {
            log::error!("bootloader panic: {}", info);
        }
        halt()
    }
}

#[cfg(not(target_os = "uefi"))]
fn main() {}
