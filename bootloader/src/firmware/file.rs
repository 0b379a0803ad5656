//! Boot volume file access

use uefi::boot::{self, ScopedProtocol};
use uefi::proto::media::file::{File, FileAttribute, FileInfo, FileMode, RegularFile};
use uefi::proto::media::fs::SimpleFileSystem;
use uefi::CStr16;

use crate::error::{BootError, Result};
use crate::traits::ImageFile;

/// FileInfo scratch space; the protocol wants an 8-aligned buffer.
#[repr(C, align(8))]
struct InfoBuffer([u8; 512]);

/// A regular file on the volume the bootloader image was loaded from.
pub struct UefiFile {
    file: RegularFile,
    // Keeps the filesystem protocol open for as long as the file handle
    // is in use.
    _fs: ScopedProtocol<SimpleFileSystem>,
}

impl UefiFile {
    /// Open `path` read-only on the boot volume.
    pub fn open(path: &CStr16) -> Result<Self> {
        let mut fs = boot::get_image_file_system(boot::image_handle())
            .map_err(|err| BootError::from(err.status()))?;
        let mut root = fs
            .open_volume()
            .map_err(|err| BootError::from(err.status()))?;
        let handle = root
            .open(path, FileMode::Read, FileAttribute::empty())
            .map_err(|_| BootError::FileNotFound)?;
        let file = handle
            .into_regular_file()
            .ok_or(BootError::FileNotFound)?;
        Ok(Self { file, _fs: fs })
    }
}

impl ImageFile for UefiFile {
    fn seek(&mut self, offset: u64) -> Result<()> {
        self.file
            .set_position(offset)
            .map_err(|err| BootError::from(err.status()))
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut filled = 0;
        while filled < buf.len() {
            let read = self
                .file
                .read(&mut buf[filled..])
                .map_err(|err| BootError::from(err.status()))?;
            if read == 0 {
                return Err(BootError::ShortRead);
            }
            filled += read;
        }
        Ok(())
    }

    fn size(&mut self) -> Result<u64> {
        let mut storage = InfoBuffer([0; 512]);
        let info = self
            .file
            .get_info::<FileInfo>(&mut storage.0)
            .map_err(|_| BootError::FileSystemError)?;
        Ok(info.file_size())
    }
}
