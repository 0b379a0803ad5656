//! Memory map capture and the boot services exit protocol
//!
//! The firmware only reveals the size of its memory map through a failed
//! call, and the allocation that stores the map is itself a memory event
//! that can grow the map. Capture is therefore two-phase (size probe,
//! then allocate-and-fill), and the exit call consumes a key from the
//! most recent fill. If the firmware rejects the key because the map
//! changed underneath, the map is retrieved again into the same buffer
//! and the exit retried, exactly once; a second rejection is terminal.
//! A rejected exit narrows what the firmware still permits to map
//! retrieval and the exit call, so the retry round never allocates.
//!
//! The sequencing lives in [`TransitionFlow`], an explicit state machine
//! over the [`FirmwareMemoryMap`] collaborator, so the retry bound is
//! visible and testable without firmware. After a successful exit call
//! nothing may allocate: every firmware service, including the console,
//! is gone.

use core::ptr::NonNull;
use core::slice;

use lumen_boot_api::{MemoryDescriptor, MemoryInfo};

use crate::error::{BootError, Result};

/// Opaque token tying an exit request to a specific map revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapKey(usize);

impl MapKey {
    pub fn new(raw: usize) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> usize {
        self.0
    }
}

/// Result of the size probe.
#[derive(Debug, Clone, Copy)]
pub struct MapProbe {
    /// Bytes required to hold the map right now
    pub map_size: usize,
    /// Per-entry stride the firmware will use
    pub descriptor_size: usize,
}

/// Result of filling a buffer with the map.
#[derive(Debug, Clone, Copy)]
pub struct MapFill {
    /// Bytes actually written
    pub len: usize,
    /// Per-entry stride (may exceed the descriptor struct size)
    pub descriptor_size: usize,
    /// Key for the exit call
    pub key: MapKey,
}

/// The firmware operations the exit protocol consumes.
pub trait FirmwareMemoryMap {
    /// Query the required buffer size without populating anything.
    ///
    /// The underlying firmware call fails with a "buffer too small"
    /// status by design; implementations translate that into the
    /// reported size.
    fn probe(&mut self) -> Result<MapProbe>;

    /// Allocate a buffer that survives the exit call. Never freed.
    fn allocate(&mut self, size: usize) -> Result<NonNull<u8>>;

    /// Retrieve the current map into `buffer`.
    fn fill(&mut self, buffer: &mut [u8]) -> Result<MapFill>;

    /// Irreversibly leave the firmware environment. Fails when `key` no
    /// longer names the current map revision.
    fn exit_firmware(&mut self, key: MapKey) -> Result<()>;
}

/// Extra bytes beyond the probed size, absorbing the map growth caused
/// by the buffer allocation itself.
pub const MAP_BUFFER_SLACK: usize = 1024;

/// The captured memory map: buffer, used length, per-entry stride.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemorySnapshot {
    buffer: NonNull<u8>,
    len: usize,
    stride: usize,
}

impl MemorySnapshot {
    /// Bytes of descriptor data captured.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Stride between descriptors in bytes.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Number of descriptors captured.
    pub fn entry_count(&self) -> usize {
        self.len / self.stride
    }

    /// The handoff view of this snapshot.
    pub fn to_memory_info(&self) -> MemoryInfo {
        MemoryInfo {
            map: self.buffer.as_ptr() as *const MemoryDescriptor,
            map_size: self.len as u64,
            descriptor_size: self.stride as u64,
        }
    }
}

/// Phases of the exit protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionPhase {
    /// Asking the firmware how large the map is
    Probing,
    /// Map captured, key in hand
    Filled,
    /// Exit call issued
    Transitioning,
    /// Exit rejected once; one re-fill and re-exit permitted
    RetryPending,
    /// Firmware services are gone; the machine is ours
    Committed,
    /// Second rejection or capture failure; boot aborts
    Fatal,
}

/// Explicit state machine driving capture and exit.
pub struct TransitionFlow {
    phase: TransitionPhase,
    retried: bool,
}

impl TransitionFlow {
    pub fn new() -> Self {
        Self {
            phase: TransitionPhase::Probing,
            retried: false,
        }
    }

    /// Current phase, terminal after [`Self::run`] returns.
    pub fn phase(&self) -> TransitionPhase {
        self.phase
    }

    /// Capture the map and leave the firmware environment.
    ///
    /// On success the returned snapshot describes the machine's physical
    /// memory exactly as the firmware left it, and no further firmware
    /// call is legal.
    pub fn run<S: FirmwareMemoryMap>(&mut self, services: &mut S) -> Result<MemorySnapshot> {
        let mut storage: Option<(NonNull<u8>, usize)> = None;
        loop {
            let (snapshot, key) = match self.capture(services, &mut storage) {
                Ok(captured) => captured,
                Err(err) => {
                    self.phase = TransitionPhase::Fatal;
                    return Err(err);
                }
            };

            self.phase = TransitionPhase::Transitioning;
            match services.exit_firmware(key) {
                Ok(()) => {
                    self.phase = TransitionPhase::Committed;
                    return Ok(snapshot);
                }
                Err(_) if !self.retried => {
                    // The fill's own bookkeeping can invalidate the key;
                    // the protocol tolerates exactly one retry.
                    self.retried = true;
                    self.phase = TransitionPhase::RetryPending;
                }
                Err(_) => {
                    self.phase = TransitionPhase::Fatal;
                    return Err(BootError::TransitionRejected);
                }
            }

            self.phase = TransitionPhase::Probing;
        }
    }

    fn capture<S: FirmwareMemoryMap>(
        &mut self,
        services: &mut S,
        storage: &mut Option<(NonNull<u8>, usize)>,
    ) -> Result<(MemorySnapshot, MapKey)> {
        self.phase = TransitionPhase::Probing;

        // After a rejected exit the only legal firmware calls are the
        // map retrieval and the exit itself: the retry round must reuse
        // the round-one buffer, whose slack absorbs any map growth.
        let (buffer, buffer_size) = match *storage {
            Some(existing) => existing,
            None => {
                let probe = services.probe()?;
                if probe.map_size == 0 {
                    return Err(BootError::MemoryMapError);
                }
                let buffer_size = probe.map_size + MAP_BUFFER_SLACK;
                let buffer = services.allocate(buffer_size)?;
                *storage = Some((buffer, buffer_size));
                (buffer, buffer_size)
            }
        };
        let raw = unsafe { slice::from_raw_parts_mut(buffer.as_ptr(), buffer_size) };

        let fill = services.fill(raw)?;
        if fill.descriptor_size == 0 || fill.len > buffer_size {
            return Err(BootError::MemoryMapError);
        }

        self.phase = TransitionPhase::Filled;
        Ok((
            MemorySnapshot {
                buffer,
                len: fill.len,
                stride: fill.descriptor_size,
            },
            fill.key,
        ))
    }
}

impl Default for TransitionFlow {
    fn default() -> Self {
        Self::new()
    }
}

/// Capture the memory map and exit boot services, retrying once.
pub fn exit_boot_environment<S: FirmwareMemoryMap>(services: &mut S) -> Result<MemorySnapshot> {
    TransitionFlow::new().run(services)
}
