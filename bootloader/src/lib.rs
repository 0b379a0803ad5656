//! Lumen UEFI bootloader
//!
//! Loads the kernel ELF image from the boot volume to its fixed physical
//! addresses, gathers the framebuffer, console font, memory map, and ACPI
//! root pointer, exits boot services, and transfers control with a single
//! [`lumen_boot_api::BootInfo`] record.
//!
//! The loader core ([`elf`], [`psf`], [`memmap`], [`acpi`], [`handoff`])
//! is pure logic over the interfaces in [`traits`] and is tested on the
//! host; the UEFI protocol plumbing lives under [`firmware`] and the
//! sequencing in [`orchestrator`].

#![no_std]

#[cfg(test)]
extern crate std;

pub mod acpi;
pub mod config;
pub mod elf;
pub mod error;
pub mod firmware;
pub mod handoff;
pub mod memmap;
pub mod orchestrator;
pub mod psf;
pub mod traits;

pub use orchestrator::boot;
