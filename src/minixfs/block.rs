//! Translation of file-relative block indices to absolute blocks.

use crate::error::Result;
use crate::fs::MinixFs;
use crate::image::byte_offset;
use crate::inode::DIRECT_ZONES;
use crate::inode::Inode;
use crate::read_u32;
use crate::superblock::ZONE_PTR_SIZE;
use std::io::Read;
use std::io::Seek;

/// Result of translating a file-relative block index.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BlockRef {
    /// The block has no backing storage and reads as zeros.
    Hole,
    /// Absolute block number within the filesystem.
    Disk(u64),
}

impl<R: Read + Seek> MinixFs<R> {
    /// Maps the file-relative block `index` of `inode` to an absolute block.
    ///
    /// The zone holding the block is looked up in the inode's direct table,
    /// then through the single and double indirect tables. A zone number of
    /// 0 anywhere along the translation denotes a sparse hole, as does an
    /// index beyond the double-indirect range; whether a hole comes from a
    /// direct slot or from either indirect level is not distinguished.
    pub fn map_block(&mut self, inode: &Inode, index: u64) -> Result<BlockRef> {
        let geom = *self.geometry();
        let zone_index = index / geom.blocks_per_zone;
        let block_in_zone = index % geom.blocks_per_zone;
        let direct = DIRECT_ZONES as u64;
        let ptrs = geom.ptrs_per_block;

        let zone = if zone_index < direct {
            inode.zone[zone_index as usize]
        } else if zone_index < direct + ptrs {
            match inode.indirect {
                0 => 0,
                table => self.zone_slot(table, zone_index - direct)?,
            }
        } else if zone_index < direct + ptrs + ptrs * ptrs {
            let slot = zone_index - direct - ptrs;
            let table = match inode.two_indirect {
                0 => 0,
                table => self.zone_slot(table, slot / ptrs)?,
            };
            match table {
                0 => 0,
                table => self.zone_slot(table, slot % ptrs)?,
            }
        } else {
            return Ok(BlockRef::Hole);
        };

        if zone == 0 {
            return Ok(BlockRef::Hole);
        }
        Ok(BlockRef::Disk(zone as u64 * geom.blocks_per_zone + block_in_zone))
    }

    /// Reads slot `slot` of the zone table held in zone `zone`.
    ///
    /// The table occupies the first block of the zone and is read in full
    /// into the session's scratch block; a failure to read it is an I/O
    /// error, not a hole.
    fn zone_slot(&mut self, zone: u32, slot: u64) -> Result<u32> {
        let off = byte_offset(zone as u64, self.geometry().zone_size)?;
        self.img.read_at(off, &mut self.table_buf)?;
        Ok(read_u32(&self.table_buf, slot as usize * ZONE_PTR_SIZE as usize))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::ImageBuilder;

    // 1 KiB blocks, one block per zone: 256 pointers per indirect table.
    const PTRS: u64 = 256;

    #[test]
    fn map_direct() {
        let mut builder = ImageBuilder::new(64);
        let inode = builder.inode(2, 0o100644, 20000, &[10, 0, 12, 13, 14, 15, 16]);
        let mut fs = builder.mount();
        assert_eq!(fs.map_block(&inode, 0).unwrap(), BlockRef::Disk(10));
        assert_eq!(fs.map_block(&inode, 1).unwrap(), BlockRef::Hole);
        assert_eq!(fs.map_block(&inode, 6).unwrap(), BlockRef::Disk(16));
    }

    #[test]
    fn map_single_indirect() {
        let mut builder = ImageBuilder::new(64);
        let mut inode = builder.inode(2, 0o100644, 300 << 10, &[10, 11, 12, 13, 14, 15, 16]);
        inode.indirect = 20;
        builder.zone_table(20, &[(0, 30), (5, 31)]);
        let mut fs = builder.mount();
        assert_eq!(fs.map_block(&inode, 7).unwrap(), BlockRef::Disk(30));
        assert_eq!(fs.map_block(&inode, 12).unwrap(), BlockRef::Disk(31));
        // An unset slot in a present table is a hole.
        assert_eq!(fs.map_block(&inode, 8).unwrap(), BlockRef::Hole);
    }

    #[test]
    fn map_missing_indirect_table() {
        let mut builder = ImageBuilder::new(64);
        let inode = builder.inode(2, 0o100644, 300 << 10, &[10, 11, 12, 13, 14, 15, 16]);
        let mut fs = builder.mount();
        // indirect == 0: the whole single-indirect range reads as holes.
        assert_eq!(fs.map_block(&inode, 7).unwrap(), BlockRef::Hole);
        assert_eq!(fs.map_block(&inode, 7 + PTRS - 1).unwrap(), BlockRef::Hole);
    }

    #[test]
    fn map_double_indirect() {
        let mut builder = ImageBuilder::new(64);
        let mut inode = builder.inode(2, 0o100644, u32::MAX, &[10, 11, 12, 13, 14, 15, 16]);
        inode.two_indirect = 21;
        // Second first-level slot points at a table whose third slot is set.
        builder.zone_table(21, &[(1, 22)]);
        builder.zone_table(22, &[(2, 40)]);
        let mut fs = builder.mount();
        let index = 7 + PTRS + PTRS + 2;
        assert_eq!(fs.map_block(&inode, index).unwrap(), BlockRef::Disk(40));
        // First-level slot 0 is vacant.
        assert_eq!(fs.map_block(&inode, 7 + PTRS).unwrap(), BlockRef::Hole);
        // Second-level slot 3 is vacant.
        assert_eq!(fs.map_block(&inode, index + 1).unwrap(), BlockRef::Hole);
    }

    #[test]
    fn map_beyond_addressable_range() {
        let mut builder = ImageBuilder::new(64);
        let mut inode = builder.inode(2, 0o100644, u32::MAX, &[10, 11, 12, 13, 14, 15, 16]);
        inode.indirect = 20;
        inode.two_indirect = 21;
        let mut fs = builder.mount();
        let beyond = 7 + PTRS + PTRS * PTRS;
        assert_eq!(fs.map_block(&inode, beyond).unwrap(), BlockRef::Hole);
    }

    #[test]
    fn map_multi_block_zones() {
        // log_zone_size = 1: two blocks per zone.
        let mut builder = ImageBuilder::with_zone_log(64, 1);
        let inode = builder.inode(2, 0o100644, 20000, &[5, 0, 7, 0, 0, 0, 0]);
        let mut fs = builder.mount();
        assert_eq!(fs.map_block(&inode, 0).unwrap(), BlockRef::Disk(10));
        assert_eq!(fs.map_block(&inode, 1).unwrap(), BlockRef::Disk(11));
        assert_eq!(fs.map_block(&inode, 2).unwrap(), BlockRef::Hole);
        assert_eq!(fs.map_block(&inode, 4).unwrap(), BlockRef::Disk(14));
        assert_eq!(fs.map_block(&inode, 5).unwrap(), BlockRef::Disk(15));
    }
}
