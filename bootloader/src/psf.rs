//! PSF1 console font loading
//!
//! Parses the 4-byte PSF1 header, validates the magic, and pulls the
//! glyph buffer into firmware-lifetime memory. The resulting
//! [`Psf1Font`] record is referenced by the handoff structure; a font
//! that fails validation surfaces as an error the caller downgrades to a
//! fontless boot.

use core::mem::size_of;
use core::ptr::NonNull;

use lumen_boot_api::{Psf1Font, Psf1Header};

use crate::error::{BootError, Result};
use crate::traits::{BootAlloc, ImageFile};

/// PSF1 magic bytes
pub const PSF1_MAGIC: [u8; 2] = [0x36, 0x04];

/// Mode bit selecting 512 glyphs instead of 256
const PSF1_MODE_512: u8 = 0x01;

/// Load a PSF1 font from `file` into allocator-backed memory.
///
/// The header, glyph buffer, and font record all come from `alloc`, so
/// the returned pointer stays valid across the boot services exit.
pub fn load_font<F, A>(file: &mut F, alloc: &mut A) -> Result<NonNull<Psf1Font>>
where
    F: ImageFile,
    A: BootAlloc,
{
    let mut raw = [0u8; size_of::<Psf1Header>()];
    file.seek(0)?;
    file.read_exact(&mut raw)?;

    if raw[0..2] != PSF1_MAGIC {
        return Err(BootError::InvalidFontFormat);
    }

    let header = Psf1Header {
        magic: [raw[0], raw[1]],
        mode: raw[2],
        charsize: raw[3],
    };
    if header.charsize == 0 {
        return Err(BootError::InvalidFontFormat);
    }

    let glyph_buffer_size = glyph_buffer_size(&header);
    let glyphs = alloc.allocate(glyph_buffer_size)?;
    let glyph_slice =
        unsafe { core::slice::from_raw_parts_mut(glyphs.as_ptr(), glyph_buffer_size) };
    file.seek(size_of::<Psf1Header>() as u64)?;
    file.read_exact(glyph_slice)?;

    let header_slot = alloc.allocate(size_of::<Psf1Header>())?.cast::<Psf1Header>();
    let font_slot = alloc.allocate(size_of::<Psf1Font>())?.cast::<Psf1Font>();
    unsafe {
        header_slot.write(header);
        font_slot.write(Psf1Font {
            header: header_slot.as_ptr(),
            glyph_buffer: glyphs.as_ptr(),
        });
    }

    Ok(font_slot)
}

/// Glyph buffer size for a validated header.
pub fn glyph_buffer_size(header: &Psf1Header) -> usize {
    let glyph_count = if header.mode & PSF1_MODE_512 != 0 {
        512
    } else {
        256
    };
    header.charsize as usize * glyph_count
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::boxed::Box;
    use std::vec;
    use std::vec::Vec;

    struct MemFile {
        data: Vec<u8>,
        pos: u64,
    }

    impl ImageFile for MemFile {
        fn seek(&mut self, offset: u64) -> Result<()> {
            self.pos = offset;
            Ok(())
        }

        fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
            let start = self.pos as usize;
            let end = start + buf.len();
            if end > self.data.len() {
                return Err(BootError::ShortRead);
            }
            buf.copy_from_slice(&self.data[start..end]);
            self.pos = end as u64;
            Ok(())
        }

        fn size(&mut self) -> Result<u64> {
            Ok(self.data.len() as u64)
        }
    }

    /// 8-byte aligned leaking allocator, matching the pool guarantee.
    struct LeakAlloc;

    impl BootAlloc for LeakAlloc {
        fn allocate(&mut self, size: usize) -> Result<NonNull<u8>> {
            let words = size.div_ceil(8).max(1);
            let buffer = Box::leak(vec![0u64; words].into_boxed_slice());
            Ok(NonNull::new(buffer.as_mut_ptr() as *mut u8).unwrap())
        }
    }

    fn font_file(mode: u8, charsize: u8) -> MemFile {
        let glyph_count = if mode & 0x01 != 0 { 512 } else { 256 };
        let mut data = vec![PSF1_MAGIC[0], PSF1_MAGIC[1], mode, charsize];
        for i in 0..charsize as usize * glyph_count {
            data.push((i % 255) as u8);
        }
        MemFile { data, pos: 0 }
    }

    #[test]
    fn test_load_256_glyph_font() {
        let mut file = font_file(0, 16);
        let font = load_font(&mut file, &mut LeakAlloc).unwrap();

        let font = unsafe { font.as_ref() };
        let header = unsafe { &*font.header };
        assert_eq!(header.magic, PSF1_MAGIC);
        assert_eq!(header.charsize, 16);
        assert_eq!(glyph_buffer_size(header), 16 * 256);

        let glyphs =
            unsafe { core::slice::from_raw_parts(font.glyph_buffer, glyph_buffer_size(header)) };
        assert_eq!(glyphs[0], 0);
        assert_eq!(glyphs[100], 100);
    }

    #[test]
    fn test_512_glyph_mode_doubles_buffer() {
        let mut file = font_file(1, 8);
        let font = load_font(&mut file, &mut LeakAlloc).unwrap();
        let header = unsafe { &*(*font.as_ptr()).header };
        assert_eq!(glyph_buffer_size(header), 8 * 512);
    }

    #[test]
    fn test_bad_magic_rejected() {
        let mut file = font_file(0, 16);
        file.data[0] = 0x00;
        assert_eq!(
            load_font(&mut file, &mut LeakAlloc).unwrap_err(),
            BootError::InvalidFontFormat
        );
    }

    #[test]
    fn test_truncated_glyphs_rejected() {
        let mut file = font_file(0, 16);
        file.data.truncate(4 + 100);
        assert_eq!(
            load_font(&mut file, &mut LeakAlloc).unwrap_err(),
            BootError::ShortRead
        );
    }
}
