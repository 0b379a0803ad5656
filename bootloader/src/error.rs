//! Bootloader error handling
//!
//! This module defines the error types used throughout the bootloader
//! for consistent error reporting and handling.

use core::fmt;

/// Bootloader error type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootError {
    /// UEFI-specific errors
    Uefi(uefi::Status),
    UefiNotFound,

    /// Filesystem errors
    FileNotFound,
    FileSystemError,
    /// Read returned fewer bytes than the on-disk structure requires
    ShortRead,

    /// Kernel image errors
    InvalidKernelImage(&'static str),
    /// Fixed-address page reservation failed; the descriptor's physical
    /// range is already claimed and there is no relocation path
    SegmentPlacementFailed,

    /// Memory map / boot services exit errors
    MemoryAllocationFailed,
    MemoryMapError,
    /// ExitBootServices rejected the map key twice
    TransitionRejected,

    /// Font file is not PSF1
    InvalidFontFormat,

    /// Kernel entry point unexpectedly returned
    KernelReturned,
}

impl BootError {
    /// Get a human-readable description of the error
    pub fn description(&self) -> &'static str {
        match self {
            BootError::Uefi(_) => "UEFI error",
            BootError::UefiNotFound => "UEFI protocol not found",
            BootError::FileNotFound => "File not found",
            BootError::FileSystemError => "File system error",
            BootError::ShortRead => "Unexpected end of file",
            BootError::InvalidKernelImage(msg) => msg,
            BootError::SegmentPlacementFailed => "Segment physical range unavailable",
            BootError::MemoryAllocationFailed => "Failed to allocate memory",
            BootError::MemoryMapError => "Memory map error",
            BootError::TransitionRejected => "ExitBootServices rejected twice",
            BootError::InvalidFontFormat => "Font file is not PSF1",
            BootError::KernelReturned => "Kernel unexpectedly returned",
        }
    }

    /// Whether the boot can continue in a degraded configuration.
    ///
    /// Only collaborator-format failures qualify; everything in the load
    /// and handoff path is terminal.
    pub fn is_degradable(&self) -> bool {
        matches!(
            self,
            BootError::InvalidFontFormat | BootError::FileNotFound
        )
    }
}

impl fmt::Display for BootError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootError::Uefi(status) => write!(f, "BootError: UEFI status {:?}", status),
            _ => write!(f, "BootError: {}", self.description()),
        }
    }
}

/// Result type used throughout the bootloader
pub type Result<T = ()> = core::result::Result<T, BootError>;

/// Convert UEFI status to bootloader error
impl From<uefi::Status> for BootError {
    fn from(status: uefi::Status) -> Self {
        match status {
            uefi::Status::NOT_FOUND => BootError::UefiNotFound,
            uefi::Status::OUT_OF_RESOURCES => BootError::MemoryAllocationFailed,
            _ => BootError::Uefi(status),
        }
    }
}

impl From<uefi::Error> for BootError {
    fn from(err: uefi::Error) -> Self {
        BootError::from(err.status())
    }
}
