/*
 * Copyright 2025 Luc Lenôtre
 *
 * This file is part of Maestro.
 *
 * Maestro is free software: you can redistribute it and/or modify it under the
 * terms of the GNU General Public License as published by the Free Software
 * Foundation, either version 3 of the License, or (at your option) any later
 * version.
 *
 * Maestro is distributed in the hope that it will be useful, but WITHOUT ANY
 * WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR
 * A PARTICULAR PURPOSE. See the GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License along with
 * Maestro. If not, see <https://www.gnu.org/licenses/>.
 */

//! Iteration over directory contents.

use crate::block::BlockRef;
use crate::error::Result;
use crate::fs::MinixFs;
use crate::inode::Inode;
use crate::read_u32;
use std::io::Read;
use std::io::Seek;

/// Size of an on-disk directory entry in bytes.
pub const DIRENT_SIZE: u64 = 64;
/// Maximum length of a directory entry name in bytes.
pub const NAME_LEN: usize = 60;

/// A live directory entry.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DirEntry {
    /// The inode number of the entry; never 0.
    pub inode: u32,
    /// The entry's name, cut at the first NUL byte.
    pub name: Vec<u8>,
}

impl DirEntry {
    /// Decodes one 64-byte directory slot.
    fn decode(raw: &[u8]) -> Self {
        let name = &raw[4..4 + NAME_LEN];
        let len = name.iter().position(|b| *b == 0).unwrap_or(NAME_LEN);
        Self {
            inode: read_u32(raw, 0),
            name: name[..len].to_vec(),
        }
    }
}

/// Streaming walk over the entries of a directory inode, in on-disk order.
///
/// Vacant slots (inode 0) are skipped and hole blocks contribute no entries,
/// exactly as if they held all-zero slots. I/O failures stop the walk with a
/// hard error.
pub struct DirWalker<'fs, R> {
    fs: &'fs mut MinixFs<R>,
    inode: Inode,
    /// Block-sized scratch holding the directory block being scanned.
    buf: Vec<u8>,
    /// File-relative index of the next block to load.
    next_block: u64,
    /// Byte offset of the next slot within `buf`.
    pos: usize,
    /// Whether `buf` currently holds a data block.
    have_block: bool,
}

impl<'fs, R: Read + Seek> DirWalker<'fs, R> {
    fn new(fs: &'fs mut MinixFs<R>, inode: Inode) -> Self {
        let buf = vec![0; fs.geometry().block_size as usize];
        Self {
            fs,
            inode,
            buf,
            next_block: 0,
            pos: 0,
            have_block: false,
        }
    }

    /// Returns the next live entry, or `None` once the directory is
    /// exhausted.
    pub fn next_entry(&mut self) -> Result<Option<DirEntry>> {
        loop {
            if self.have_block && self.pos < self.buf.len() {
                let raw = &self.buf[self.pos..self.pos + DIRENT_SIZE as usize];
                self.pos += DIRENT_SIZE as usize;
                let entry = DirEntry::decode(raw);
                if entry.inode != 0 {
                    return Ok(Some(entry));
                }
                continue;
            }
            // Scanned the current block in full: move to the next one.
            let block_size = self.buf.len() as u64;
            if self.next_block * block_size >= self.inode.size as u64 {
                return Ok(None);
            }
            match self.fs.map_block(&self.inode, self.next_block)? {
                BlockRef::Hole => self.have_block = false,
                BlockRef::Disk(block) => {
                    self.fs.read_block(block, &mut self.buf)?;
                    self.have_block = true;
                    self.pos = 0;
                }
            }
            self.next_block += 1;
        }
    }
}

impl<R: Read + Seek> MinixFs<R> {
    /// Starts a walk over the entries of the directory `inode`.
    pub fn walk_dir(&mut self, inode: Inode) -> DirWalker<'_, R> {
        DirWalker::new(self, inode)
    }
}
