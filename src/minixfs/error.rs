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

//! Errors reported while decoding a filesystem image.

use std::io;
use thiserror::Error;

/// Result alias for filesystem decoding operations.
pub type Result<T> = std::result::Result<T, Error>;

/// An error encountered while decoding a filesystem image.
///
/// None of these are recoverable: every operation propagates the first error
/// to the caller and the tools turn it into a one-line diagnostic.
#[derive(Debug, Error)]
pub enum Error {
    /// The underlying read failed, or went outside the image's bounds.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    /// The boot sector does not end with the `0x55AA` signature.
    #[error("invalid partition table signature: 0x{0:02x} 0x{1:02x}")]
    BadPartitionMagic(u8, u8),
    /// Partition index outside the four-entry table.
    #[error("no such partition: {0}")]
    BadPartitionNumber(u32),
    /// The selected table entry does not carry the MINIX partition type.
    #[error("not a MINIX partition (type 0x{0:02x})")]
    NotMinixPartition(u8),
    /// The superblock magic is not `0x4D5A`.
    #[error("bad magic number (0x{0:04x}), not a MINIX filesystem")]
    BadFilesystemMagic(u16),
    /// The superblock decoded but its geometry is unusable.
    #[error("corrupt superblock: {0}")]
    BadSuperblock(&'static str),
    /// Inode number outside `1..=ninodes`.
    #[error("inode {0} out of range")]
    BadInode(u32),
    /// No directory entry matched a path component.
    #[error("Can't find {0}")]
    NotFound(String),
    /// Path resolution tried to traverse through a non-directory.
    #[error("{0}: not a directory")]
    NotADirectory(String),
    /// The source of an extraction is not a regular file.
    #[error("{0}: not a regular file")]
    NotARegularFile(String),
}
