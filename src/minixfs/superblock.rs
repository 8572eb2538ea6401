//! MINIX v3 superblock decoding.

use crate::dir::DIRENT_SIZE;
use crate::error::Error;
use crate::error::Result;
use crate::image::Image;
use crate::{read_i16, read_u16, read_u32};
use std::fmt;
use std::io::Read;
use std::io::Seek;

/// The offset of the superblock from the start of the filesystem.
pub const SUPERBLOCK_OFFSET: u64 = 1024;
/// The MINIX v3 filesystem's signature.
const MINIX_MAGIC: i16 = 0x4d5a;
/// Size of the packed superblock record on disk.
pub(crate) const SUPERBLOCK_SIZE: usize = 32;
/// Size of a zone table pointer in bytes.
pub const ZONE_PTR_SIZE: u64 = 4;

/// The MINIX v3 superblock.
#[derive(Clone, Copy, Debug)]
pub struct Superblock {
    /// Number of inodes on the filesystem, numbered starting at 1.
    pub ninodes: u32,
    /// Number of blocks used by the inode bitmap.
    pub i_blocks: i16,
    /// Number of blocks used by the zone bitmap.
    pub z_blocks: i16,
    /// Number of the first data zone.
    pub firstdata: u16,
    /// log2 of the number of blocks per zone.
    pub log_zone_size: i16,
    /// Advisory maximum file size in bytes.
    pub max_file: u32,
    /// Total number of zones on the filesystem.
    pub zones: u32,
    /// The filesystem's signature.
    pub magic: i16,
    /// Block size in bytes.
    pub blocksize: u16,
    /// Filesystem sub-version.
    pub subversion: u8,
}

impl Superblock {
    /// Reads and validates the superblock of the filesystem on `img`.
    pub fn read<R: Read + Seek>(img: &mut Image<R>) -> Result<Self> {
        let mut raw = [0u8; SUPERBLOCK_SIZE];
        img.read_at(SUPERBLOCK_OFFSET as i64, &mut raw)?;
        let sb = Self::decode(&raw);
        if sb.magic != MINIX_MAGIC {
            return Err(Error::BadFilesystemMagic(sb.magic as u16));
        }
        Ok(sb)
    }

    /// Decodes the packed on-disk superblock record.
    fn decode(raw: &[u8; SUPERBLOCK_SIZE]) -> Self {
        Self {
            ninodes: read_u32(raw, 0),
            i_blocks: read_i16(raw, 6),
            z_blocks: read_i16(raw, 8),
            firstdata: read_u16(raw, 10),
            log_zone_size: read_i16(raw, 12),
            max_file: read_u32(raw, 16),
            zones: read_u32(raw, 20),
            magic: read_i16(raw, 24),
            blocksize: read_u16(raw, 28),
            subversion: raw[30],
        }
    }

    /// Derives the block and zone geometry of the filesystem.
    ///
    /// The block size must be a positive multiple of the directory entry
    /// size, so that directory blocks hold a whole number of entries, and
    /// `log_zone_size` must be small enough for zone arithmetic to stay in
    /// range.
    pub fn geometry(&self) -> Result<Geometry> {
        let block_size = self.blocksize as u64;
        if block_size == 0 || block_size % DIRENT_SIZE != 0 {
            return Err(Error::BadSuperblock("block size is not a multiple of 64"));
        }
        if !(0..=16).contains(&self.log_zone_size) {
            return Err(Error::BadSuperblock("zone size log out of range"));
        }
        let blocks_per_zone = 1u64 << self.log_zone_size;
        Ok(Geometry {
            block_size,
            blocks_per_zone,
            zone_size: block_size * blocks_per_zone,
            ptrs_per_block: block_size / ZONE_PTR_SIZE,
        })
    }
}

impl fmt::Display for Superblock {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(fmt, "Superblock:")?;
        writeln!(fmt, "  ninodes       {}", self.ninodes)?;
        writeln!(fmt, "  i_blocks      {}", self.i_blocks)?;
        writeln!(fmt, "  z_blocks      {}", self.z_blocks)?;
        writeln!(fmt, "  firstdata     {}", self.firstdata)?;
        writeln!(fmt, "  log_zone_size {}", self.log_zone_size)?;
        writeln!(fmt, "  max_file      {}", self.max_file)?;
        writeln!(fmt, "  zones         {}", self.zones)?;
        writeln!(fmt, "  magic         0x{:04x}", self.magic)?;
        writeln!(fmt, "  blocksize     {}", self.blocksize)?;
        write!(fmt, "  subversion    {}", self.subversion)
    }
}

/// Geometry derived from the superblock, fixed after mount.
#[derive(Clone, Copy, Debug)]
pub struct Geometry {
    /// Block size in bytes.
    pub block_size: u64,
    /// Number of blocks per zone.
    pub blocks_per_zone: u64,
    /// Zone size in bytes.
    pub zone_size: u64,
    /// Number of zone pointers held by one indirect table block.
    pub ptrs_per_block: u64,
}

impl fmt::Display for Geometry {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(fmt, "Geometry:")?;
        writeln!(fmt, "  block_size      {}", self.block_size)?;
        writeln!(fmt, "  blocks_per_zone {}", self.blocks_per_zone)?;
        writeln!(fmt, "  zone_size       {}", self.zone_size)?;
        write!(fmt, "  ptrs_per_block  {}", self.ptrs_per_block)
    }
}
