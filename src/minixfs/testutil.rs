//! In-memory image fixtures shared by the decoder tests.

use crate::fs::MinixFs;
use crate::image::Image;
use crate::inode::DIRECT_ZONES;
use crate::inode::INODE_SIZE;
use crate::inode::Inode;
use crate::superblock::SUPERBLOCK_OFFSET;
use crate::superblock::SUPERBLOCK_SIZE;
use crate::superblock::Superblock;
use std::io::Cursor;

/// Block size used by every fixture image.
pub const BLOCK_SIZE: usize = 1024;
/// Number of inodes on every fixture image.
pub const NINODES: u32 = 16;
/// Block number of the inode table: boot block, superblock and one block for
/// each bitmap come first.
const INODE_TABLE_BLOCK: usize = 4;

/// Encodes a superblock record the way it sits on disk.
pub fn encode_superblock(sb: &Superblock) -> [u8; SUPERBLOCK_SIZE] {
    let mut raw = [0u8; SUPERBLOCK_SIZE];
    raw[0..4].copy_from_slice(&sb.ninodes.to_le_bytes());
    raw[6..8].copy_from_slice(&sb.i_blocks.to_le_bytes());
    raw[8..10].copy_from_slice(&sb.z_blocks.to_le_bytes());
    raw[10..12].copy_from_slice(&sb.firstdata.to_le_bytes());
    raw[12..14].copy_from_slice(&sb.log_zone_size.to_le_bytes());
    raw[16..20].copy_from_slice(&sb.max_file.to_le_bytes());
    raw[20..24].copy_from_slice(&sb.zones.to_le_bytes());
    raw[24..26].copy_from_slice(&sb.magic.to_le_bytes());
    raw[28..30].copy_from_slice(&sb.blocksize.to_le_bytes());
    raw[30] = sb.subversion;
    raw
}

/// Builds a small MINIX filesystem image in memory.
///
/// The layout is fixed: 1 KiB blocks, 16 inodes in one table block starting
/// at block 4, data blocks from block 5 on.
pub struct ImageBuilder {
    buf: Vec<u8>,
    log_zone_size: i16,
}

impl ImageBuilder {
    /// Starts an image of `blocks` blocks with one block per zone.
    pub fn new(blocks: usize) -> Self {
        Self::with_zone_log(blocks, 0)
    }

    /// Starts an image of `blocks` blocks with `1 << log_zone_size` blocks
    /// per zone.
    pub fn with_zone_log(blocks: usize, log_zone_size: i16) -> Self {
        let mut builder = Self {
            buf: vec![0; blocks * BLOCK_SIZE],
            log_zone_size,
        };
        let sb = Superblock {
            ninodes: NINODES,
            i_blocks: 1,
            z_blocks: 1,
            firstdata: 5,
            log_zone_size,
            max_file: u32::MAX,
            zones: (blocks >> log_zone_size) as u32,
            magic: 0x4d5a,
            blocksize: BLOCK_SIZE as u16,
            subversion: 0,
        };
        let raw = encode_superblock(&sb);
        let off = SUPERBLOCK_OFFSET as usize;
        builder.buf[off..off + SUPERBLOCK_SIZE].copy_from_slice(&raw);
        builder
    }

    /// Writes inode `n` to the inode table and returns the decoded record.
    pub fn inode(&mut self, n: u32, mode: u16, size: u32, zone: &[u32; DIRECT_ZONES]) -> Inode {
        let inode = Inode {
            mode,
            links: 1,
            uid: 0,
            gid: 0,
            size,
            atime: 0,
            mtime: 0,
            ctime: 0,
            zone: *zone,
            indirect: 0,
            two_indirect: 0,
            unused: 0,
        };
        self.put_inode(n, &inode);
        inode
    }

    /// Writes the full record of inode `n` to the inode table.
    pub fn put_inode(&mut self, n: u32, inode: &Inode) {
        let mut raw = [0u8; INODE_SIZE];
        raw[0..2].copy_from_slice(&inode.mode.to_le_bytes());
        raw[2..4].copy_from_slice(&inode.links.to_le_bytes());
        raw[4..6].copy_from_slice(&inode.uid.to_le_bytes());
        raw[6..8].copy_from_slice(&inode.gid.to_le_bytes());
        raw[8..12].copy_from_slice(&inode.size.to_le_bytes());
        raw[12..16].copy_from_slice(&inode.atime.to_le_bytes());
        raw[16..20].copy_from_slice(&inode.mtime.to_le_bytes());
        raw[20..24].copy_from_slice(&inode.ctime.to_le_bytes());
        for (i, z) in inode.zone.iter().enumerate() {
            let off = 24 + i * 4;
            raw[off..off + 4].copy_from_slice(&z.to_le_bytes());
        }
        raw[52..56].copy_from_slice(&inode.indirect.to_le_bytes());
        raw[56..60].copy_from_slice(&inode.two_indirect.to_le_bytes());
        let off = INODE_TABLE_BLOCK * BLOCK_SIZE + (n as usize - 1) * INODE_SIZE;
        self.buf[off..off + INODE_SIZE].copy_from_slice(&raw);
    }

    /// Writes `(slot, zone)` pointers into the zone table held in `zone`.
    pub fn zone_table(&mut self, zone: u32, entries: &[(usize, u32)]) {
        let base = zone as usize * self.zone_size();
        for (slot, value) in entries {
            let off = base + slot * 4;
            self.buf[off..off + 4].copy_from_slice(&value.to_le_bytes());
        }
    }

    /// Writes a directory entry into slot `slot` of block `block`.
    pub fn dirent(&mut self, block: u64, slot: usize, ino: u32, name: &[u8]) {
        let off = block as usize * BLOCK_SIZE + slot * 64;
        self.buf[off..off + 4].copy_from_slice(&ino.to_le_bytes());
        self.buf[off + 4..off + 64].fill(0);
        self.buf[off + 4..off + 4 + name.len()].copy_from_slice(name);
    }

    /// Writes raw bytes at the start of block `block`.
    pub fn data(&mut self, block: u64, bytes: &[u8]) {
        let off = block as usize * BLOCK_SIZE;
        self.buf[off..off + bytes.len()].copy_from_slice(bytes);
    }

    /// Returns the finished image bytes.
    pub fn finish(self) -> Vec<u8> {
        self.buf
    }

    /// Mounts the finished image as a bare filesystem.
    pub fn mount(self) -> MinixFs<Cursor<Vec<u8>>> {
        let size = self.buf.len() as u64;
        let img = Image::new(Cursor::new(self.buf), size);
        MinixFs::mount(img, None, None).unwrap()
    }

    fn zone_size(&self) -> usize {
        BLOCK_SIZE << self.log_zone_size
    }
}
