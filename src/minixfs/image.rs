//! Random-access reads over a filesystem image.

use libc::ioctl;
use std::ffi::c_long;
use std::fs::File;
use std::io;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use std::os::fd::AsRawFd;
use std::os::unix::fs::FileTypeExt;
use std::path::Path;

/// ioctl macro: Command.
macro_rules! ioc {
    ($a:expr, $b:expr, $c:expr, $d:expr) => {
        (($a) << 30) | (($b) << 8) | ($c) | (($d) << 16)
    };
}

/// ioctl macro: Read command.
macro_rules! ior {
    ($a:expr, $b:expr, $c:ty) => {
        ioc!(2, $a, $b, std::mem::size_of::<$c>() as c_long)
    };
}

/// ioctl command: Get size of disk in bytes.
const BLKGETSIZE64: c_long = ior!(0x12, 114, u64);

/// Random-access reader over a filesystem image.
///
/// Offsets taken by [`Image::read_at`] are relative to the filesystem base,
/// which is 0 for a bare image and the byte offset of the selected partition
/// otherwise.
#[derive(Debug)]
pub struct Image<R> {
    /// The underlying image handle.
    inner: R,
    /// Total size of the image in bytes.
    size: u64,
    /// Byte offset of the filesystem within the image.
    base: u64,
}

impl Image<File> {
    /// Opens the image file or device at `path` read-only.
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        let size = image_size(&file)?;
        Ok(Self::new(file, size))
    }
}

impl<R: Read + Seek> Image<R> {
    /// Wraps a reader over an image of `size` bytes.
    pub fn new(inner: R, size: u64) -> Self {
        Self {
            inner,
            size,
            base: 0,
        }
    }

    /// Returns the filesystem-base byte offset.
    pub fn base(&self) -> u64 {
        self.base
    }

    /// Moves the filesystem base to `base` bytes from the start of the image.
    pub fn set_base(&mut self, base: u64) {
        self.base = base;
    }

    /// Reads exactly `buf.len()` bytes at `offset` bytes from the filesystem
    /// base.
    ///
    /// Negative offsets and reads crossing the end of the image fail without
    /// touching the underlying handle.
    pub fn read_at(&mut self, offset: i64, buf: &mut [u8]) -> io::Result<()> {
        if offset < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "negative image offset",
            ));
        }
        let start = self.base + offset as u64;
        let end = start
            .checked_add(buf.len() as u64)
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "image offset overflow"))?;
        if end > self.size {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "read past the end of the image",
            ));
        }
        self.inner.seek(SeekFrom::Start(start))?;
        self.inner.read_exact(buf)
    }
}

/// Converts a block number and a block size to a byte offset, rejecting
/// products that cannot fit a signed 64-bit offset.
pub(crate) fn byte_offset(block: u64, block_size: u64) -> io::Result<i64> {
    block
        .checked_mul(block_size)
        .and_then(|off| i64::try_from(off).ok())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "block offset out of range"))
}

/// Returns the size in bytes of the image behind `file`.
///
/// Block and character devices are sized with an ioctl, regular files with
/// their metadata.
fn image_size(file: &File) -> io::Result<u64> {
    let metadata = file.metadata()?;
    let file_type = metadata.file_type();
    if file_type.is_block_device() || file_type.is_char_device() {
        let mut size: u64 = 0;
        let ret = unsafe { ioctl(file.as_raw_fd(), BLKGETSIZE64 as _, &mut size) };
        if ret < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(size)
    } else if file_type.is_file() {
        Ok(metadata.len())
    } else {
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn image(len: usize) -> Image<Cursor<Vec<u8>>> {
        let bytes: Vec<u8> = (0..len).map(|i| i as u8).collect();
        Image::new(Cursor::new(bytes), len as u64)
    }

    #[test]
    fn read_at_exact() {
        let mut img = image(64);
        let mut buf = [0u8; 4];
        img.read_at(10, &mut buf).unwrap();
        assert_eq!(buf, [10, 11, 12, 13]);
    }

    #[test]
    fn read_at_base() {
        let mut img = image(64);
        img.set_base(32);
        let mut buf = [0u8; 2];
        img.read_at(0, &mut buf).unwrap();
        assert_eq!(buf, [32, 33]);
    }

    #[test]
    fn read_at_negative_offset() {
        let mut img = image(64);
        let mut buf = [0u8; 1];
        img.read_at(-1, &mut buf).unwrap_err();
    }

    #[test]
    fn read_at_past_end() {
        let mut img = image(64);
        let mut buf = [0u8; 8];
        img.read_at(60, &mut buf).unwrap_err();
        // A read ending exactly at the image end is fine.
        img.read_at(56, &mut buf).unwrap();
    }

    #[test]
    fn byte_offset_overflow() {
        byte_offset(u64::MAX / 2, 1024).unwrap_err();
        assert_eq!(byte_offset(3, 1024).unwrap(), 3072);
    }
}
