//! Filesystem session and high-level operations.

use crate::block::BlockRef;
use crate::error::Error;
use crate::error::Result;
use crate::image::Image;
use crate::image::byte_offset;
use crate::inode::INODE_SIZE;
use crate::inode::Inode;
use crate::inode::ROOT_INODE;
use crate::partition;
use crate::partition::PartitionEntry;
use crate::path;
use crate::superblock::Geometry;
use crate::superblock::Superblock;
use std::fs::File;
use std::io::Read;
use std::io::Seek;
use std::io::Write;
use std::path::Path;

/// A mounted read-only MINIX filesystem.
///
/// The session owns the image handle exclusively; the superblock and the
/// geometry derived from it are fixed once mounting succeeds.
#[derive(Debug)]
pub struct MinixFs<R> {
    pub(crate) img: Image<R>,
    sb: Superblock,
    geom: Geometry,
    /// The table entry the filesystem was selected through, if any.
    partition: Option<PartitionEntry>,
    /// Scratch block for indirect zone tables, reused across calls.
    pub(crate) table_buf: Vec<u8>,
}

impl MinixFs<File> {
    /// Opens the image at `path` and mounts the filesystem on it.
    pub fn open(path: &Path, primary: Option<u32>, sub: Option<u32>) -> Result<Self> {
        let img = Image::open(path).map_err(Error::Io)?;
        Self::mount(img, primary, sub)
    }
}

impl<R: Read + Seek> MinixFs<R> {
    /// Mounts the filesystem found on `img`.
    ///
    /// When a partition is selected the partition table is walked first and
    /// the image is rebased onto the partition; the superblock is then read
    /// at its fixed offset from the filesystem base.
    pub fn mount(mut img: Image<R>, primary: Option<u32>, sub: Option<u32>) -> Result<Self> {
        let (base, partition) = partition::locate(&mut img, primary, sub)?;
        img.set_base(base);
        let sb = Superblock::read(&mut img)?;
        let geom = sb.geometry()?;
        let table_buf = vec![0; geom.block_size as usize];
        Ok(Self {
            img,
            sb,
            geom,
            partition,
            table_buf,
        })
    }

    /// Returns the decoded superblock.
    pub fn superblock(&self) -> &Superblock {
        &self.sb
    }

    /// Returns the geometry derived at mount time.
    pub fn geometry(&self) -> &Geometry {
        &self.geom
    }

    /// Returns the partition table entry the filesystem sits in, when it was
    /// mounted through one.
    pub fn partition(&self) -> Option<&PartitionEntry> {
        self.partition.as_ref()
    }

    /// Reads inode number `n`; inodes are numbered starting at 1.
    pub fn read_inode(&mut self, n: u32) -> Result<Inode> {
        if n == 0 || n > self.sb.ninodes {
            return Err(Error::BadInode(n));
        }
        // The inode table follows the boot block, the superblock and the two
        // bitmap regions.
        let table_block = 2 + self.sb.i_blocks as i64 + self.sb.z_blocks as i64;
        let off = table_block * self.geom.block_size as i64 + (n as i64 - 1) * INODE_SIZE as i64;
        let mut raw = [0u8; INODE_SIZE];
        self.img.read_at(off, &mut raw)?;
        Ok(Inode::decode(&raw))
    }

    /// Reads the filesystem block `block` in full into `buf`.
    pub(crate) fn read_block(&mut self, block: u64, buf: &mut [u8]) -> Result<()> {
        let off = byte_offset(block, self.geom.block_size)?;
        self.img.read_at(off, buf)?;
        Ok(())
    }

    /// Resolves `path` to an inode number, starting from the root directory.
    pub fn resolve(&mut self, path: &str) -> Result<u32> {
        let canon = path::canonicalize(path);
        let mut cur = ROOT_INODE;
        for comp in path::components(&canon) {
            let inode = self.read_inode(cur)?;
            if !inode.is_directory() {
                return Err(Error::NotADirectory(canon.clone()));
            }
            cur = self
                .lookup(inode, comp.as_bytes())?
                .ok_or_else(|| Error::NotFound(canon.clone()))?;
        }
        Ok(cur)
    }

    /// Searches the directory `dir` for an entry named exactly `name`.
    ///
    /// The scan stops at the first match, so duplicate names resolve to the
    /// entry that comes first in on-disk order.
    fn lookup(&mut self, dir: Inode, name: &[u8]) -> Result<Option<u32>> {
        let mut walk = self.walk_dir(dir);
        while let Some(entry) = walk.next_entry()? {
            if entry.name == name {
                return Ok(Some(entry.inode));
            }
        }
        Ok(None)
    }

    /// Lists the target of `path` on `out`.
    ///
    /// A directory prints a `path:` header followed by one line per entry;
    /// any other target prints the single line for the target itself.
    /// Nothing is written unless the whole listing decoded successfully.
    pub fn list_directory<W: Write>(&mut self, path: &str, out: &mut W) -> Result<()> {
        let canon = path::canonicalize(path);
        let n = self.resolve(&canon)?;
        let inode = self.read_inode(n)?;
        if !inode.is_directory() {
            return self.list_single_entry(n, &canon, out);
        }
        let mut entries = Vec::new();
        let mut walk = self.walk_dir(inode);
        while let Some(entry) = walk.next_entry()? {
            entries.push(entry);
        }
        let mut rows = Vec::with_capacity(entries.len());
        for entry in entries {
            let inode = self.read_inode(entry.inode)?;
            rows.push((inode.file_mode(), inode.size, entry.name));
        }
        writeln!(out, "{canon}:")?;
        for (mode, size, name) in rows {
            // Names are arbitrary bytes on disk; write them through as-is.
            write!(out, "{mode} {size:>9} ")?;
            out.write_all(&name)?;
            writeln!(out)?;
        }
        Ok(())
    }

    /// Writes the single listing line for inode `n` under `display_name`.
    pub fn list_single_entry<W: Write>(
        &mut self,
        n: u32,
        display_name: &str,
        out: &mut W,
    ) -> Result<()> {
        let inode = self.read_inode(n)?;
        writeln!(
            out,
            "{} {:>9} {}",
            inode.file_mode(),
            inode.size,
            display_name
        )?;
        Ok(())
    }

    /// Copies the contents of the regular file at `path` into `sink`.
    ///
    /// Exactly `size` bytes are written, one block at a time; holes are
    /// materialized as zeros without touching the image.
    pub fn stream_file<W: Write>(&mut self, path: &str, sink: &mut W) -> Result<()> {
        let canon = path::canonicalize(path);
        let n = self.resolve(&canon)?;
        let inode = self.read_inode(n)?;
        if !inode.is_regular() {
            return Err(Error::NotARegularFile(canon));
        }
        let block_size = self.geom.block_size;
        let mut buf = vec![0u8; block_size as usize];
        let mut remaining = inode.size as u64;
        let mut index = 0;
        while remaining > 0 {
            let want = remaining.min(block_size) as usize;
            match self.map_block(&inode, index)? {
                BlockRef::Hole => buf[..want].fill(0),
                BlockRef::Disk(block) => {
                    let off = byte_offset(block, block_size)?;
                    self.img.read_at(off, &mut buf[..want])?;
                }
            }
            sink.write_all(&buf[..want])?;
            remaining -= want as u64;
            index += 1;
        }
        Ok(())
    }
}
