//! DOS partition table walking.

use crate::error::Error;
use crate::error::Result;
use crate::image::Image;
use crate::read_u32;
use std::fmt;
use std::io::Read;
use std::io::Seek;

/// The size of a disk sector in bytes.
pub const SECTOR_SIZE: u64 = 512;
/// The signature of the MBR partition table.
const MBR_SIGNATURE: [u8; 2] = [0x55, 0xaa];
/// Byte offset of the partition entry array within a boot sector.
const TABLE_OFFSET: usize = 0x1be;
/// Number of entries in a partition table.
const TABLE_ENTRIES: u32 = 4;
/// Size of one partition table entry in bytes.
const ENTRY_SIZE: usize = 16;
/// The type byte of a MINIX partition.
pub const MINIX_PARTITION_TYPE: u8 = 0x81;

/// A decoded partition table entry.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct PartitionEntry {
    /// Partition attributes; bit 7 marks the partition bootable.
    pub bootind: u8,
    /// CHS address of partition start (unused for locating).
    pub chs_start: [u8; 3],
    /// The type of the partition.
    pub partition_type: u8,
    /// CHS address of partition end (unused for locating).
    pub chs_end: [u8; 3],
    /// LBA address of partition start, always relative to the whole disk.
    pub lba_start: u32,
    /// The number of sectors in the partition.
    pub sectors_count: u32,
}

impl PartitionEntry {
    /// Decodes one 16-byte table entry.
    fn decode(raw: &[u8]) -> Self {
        Self {
            bootind: raw[0],
            chs_start: [raw[1], raw[2], raw[3]],
            partition_type: raw[4],
            chs_end: [raw[5], raw[6], raw[7]],
            lba_start: read_u32(raw, 8),
            sectors_count: read_u32(raw, 12),
        }
    }
}

impl fmt::Display for PartitionEntry {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(fmt, "Partition:")?;
        writeln!(fmt, "  bootind       0x{:02x}", self.bootind)?;
        writeln!(fmt, "  type          0x{:02x}", self.partition_type)?;
        writeln!(fmt, "  lba_start     {}", self.lba_start)?;
        write!(fmt, "  sectors_count {}", self.sectors_count)
    }
}

/// Reads the partition table of the boot sector at byte offset `sector_off`
/// and returns its validated entry `n`.
fn read_table<R: Read + Seek>(
    img: &mut Image<R>,
    sector_off: u64,
    n: u32,
) -> Result<PartitionEntry> {
    let mut sector = [0u8; SECTOR_SIZE as usize];
    img.read_at(sector_off as i64, &mut sector)?;
    if sector[510..512] != MBR_SIGNATURE {
        return Err(Error::BadPartitionMagic(sector[510], sector[511]));
    }
    if n >= TABLE_ENTRIES {
        return Err(Error::BadPartitionNumber(n));
    }
    let off = TABLE_OFFSET + n as usize * ENTRY_SIZE;
    let entry = PartitionEntry::decode(&sector[off..off + ENTRY_SIZE]);
    if entry.partition_type != MINIX_PARTITION_TYPE {
        return Err(Error::NotMinixPartition(entry.partition_type));
    }
    Ok(entry)
}

/// Locates the filesystem on the image, returning its base byte offset and
/// the table entry it was selected through.
///
/// With no partition selected the filesystem starts at offset 0. Otherwise
/// the boot sector at the start of the disk selects primary partition
/// `primary` and, when given, the boot sector of that partition selects
/// sub-partition `sub`. Start addresses in a sub-partition table are
/// absolute on the disk, not relative to the primary partition.
pub fn locate<R: Read + Seek>(
    img: &mut Image<R>,
    primary: Option<u32>,
    sub: Option<u32>,
) -> Result<(u64, Option<PartitionEntry>)> {
    let Some(primary) = primary else {
        return Ok((0, None));
    };
    let mut entry = read_table(img, 0, primary)?;
    let mut base = entry.lba_start as u64 * SECTOR_SIZE;
    if let Some(sub) = sub {
        entry = read_table(img, base, sub)?;
        base = entry.lba_start as u64 * SECTOR_SIZE;
    }
    Ok((base, Some(entry)))
}
