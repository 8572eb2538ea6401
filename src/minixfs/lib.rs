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

//! Read-only access to MINIX version-3 filesystem images.
//!
//! The entry point is [`MinixFs`], a session over an opened image. Mounting
//! walks the DOS partition table when a partition is selected, decodes the
//! superblock and fixes the filesystem geometry; the session then resolves
//! paths, lists directories and extracts file contents.

use std::env::ArgsOs;
use std::path::PathBuf;
use std::process::exit;
use std::{env, fmt};

pub mod block;
pub mod dir;
pub mod error;
pub mod fs;
pub mod image;
pub mod inode;
pub mod partition;
pub mod path;
pub mod superblock;

#[cfg(test)]
pub(crate) mod testutil;

pub use error::{Error, Result};
pub use fs::MinixFs;

/// Returns the command's name along with an iterator over the command's arguments.
pub fn args() -> (String, ArgsOs) {
    let mut args = env::args_os();
    let bin = args
        .next()
        .map(PathBuf::from)
        .and_then(|p| {
            p.file_name()
                .and_then(|name| name.to_str())
                .map(str::to_owned)
        })
        .unwrap_or_else(|| {
            error("mfsutils", "missing binary name");
        });
    (bin, args)
}

/// Writes an error to stderr, then exits.
pub fn error<M: fmt::Display>(bin: &str, msg: M) -> ! {
    eprintln!("{bin}: error: {msg}");
    exit(1);
}

/// Decodes a little-endian `u16` at offset `off` in `raw`.
pub(crate) fn read_u16(raw: &[u8], off: usize) -> u16 {
    u16::from_le_bytes([raw[off], raw[off + 1]])
}

/// Decodes a little-endian `i16` at offset `off` in `raw`.
pub(crate) fn read_i16(raw: &[u8], off: usize) -> i16 {
    i16::from_le_bytes([raw[off], raw[off + 1]])
}

/// Decodes a little-endian `u32` at offset `off` in `raw`.
pub(crate) fn read_u32(raw: &[u8], off: usize) -> u32 {
    u32::from_le_bytes([raw[off], raw[off + 1], raw[off + 2], raw[off + 3]])
}

/// Decodes a little-endian `i32` at offset `off` in `raw`.
pub(crate) fn read_i32(raw: &[u8], off: usize) -> i32 {
    i32::from_le_bytes([raw[off], raw[off + 1], raw[off + 2], raw[off + 3]])
}
