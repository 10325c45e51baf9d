// Copyright (c) 2026 proc-disasm Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The view of a target process the disassembler works against.
//!
//! Everything the engine needs from the host (memory map, module and section
//! enumeration, raw reads) goes through [`Process`]. The Linux `/proc` backed
//! implementation lives in [`linux`]; tests provide their own in-memory one.

pub mod linux;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{MemoryError, MemoryResult};

pub use linux::LinuxProcess;

const PAGE_SIZE: u64 = 0x1000;
const READ_CHUNK: u64 = 64;
const MAX_STRING_BYTES: usize = 0x10000;

/// CPU architecture of the target, named the way the front end expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arch {
    Arm,
    Arm64,
    Ia32,
    X64,
    Other(String),
}

impl Arch {
    /// Only the two ARM families can be disassembled.
    pub fn is_supported(&self) -> bool {
        matches!(self, Arch::Arm | Arch::Arm64)
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arch::Arm => f.write_str("arm"),
            Arch::Arm64 => f.write_str("arm64"),
            Arch::Ia32 => f.write_str("ia32"),
            Arch::X64 => f.write_str("x64"),
            Arch::Other(name) => f.write_str(name),
        }
    }
}

/// Page protection of a mapped range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Protection {
    pub read: bool,
    pub write: bool,
    pub execute: bool,
}

impl FromStr for Protection {
    type Err = anyhow::Error;

    /// Parses the `rwxp` column of a maps file (the sharing flag is ignored).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() < 3 {
            anyhow::bail!("bad protection string {:?}", s);
        }
        Ok(Self {
            read: bytes[0] == b'r',
            write: bytes[1] == b'w',
            execute: bytes[2] == b'x',
        })
    }
}

impl fmt::Display for Protection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            if self.read { 'r' } else { '-' },
            if self.write { 'w' } else { '-' },
            if self.execute { 'x' } else { '-' }
        )
    }
}

/// One contiguous mapping of the target's address space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryRange {
    pub base: u64,
    pub size: u64,
    pub protection: Protection,
    /// Backing file and the file offset of `base`, for file mappings.
    pub file: Option<(PathBuf, u64)>,
}

impl MemoryRange {
    pub fn end(&self) -> u64 {
        self.base.saturating_add(self.size)
    }

    pub fn contains(&self, addr: u64) -> bool {
        addr >= self.base && addr < self.end()
    }
}

/// A loaded module (main executable or shared library).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    pub name: String,
    pub path: Option<PathBuf>,
    pub base: u64,
}

/// A named section of a loaded module, at its runtime address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionInfo {
    pub name: String,
    pub base: u64,
    pub size: u64,
}

/// Host process access used by the disassembler.
///
/// Implementors provide the primitive queries; the typed reads (pointers and
/// strings) are derived from [`Process::read_bytes`].
pub trait Process {
    fn arch(&self) -> Arch;

    fn pointer_size(&self) -> usize {
        match self.arch() {
            Arch::Arm | Arch::Ia32 => 4,
            _ => 8,
        }
    }

    /// The mapped range containing `address`, if any.
    fn find_range(&self, address: u64) -> Option<MemoryRange>;

    /// Currently loaded modules, in load order.
    fn modules(&self) -> Vec<Module>;

    /// Named sections of `module`, in the order the module declares them.
    fn sections(&self, module: &Module) -> Vec<SectionInfo>;

    /// Reads exactly `len` bytes or fails.
    fn read_bytes(&self, address: u64, len: usize) -> MemoryResult<Vec<u8>>;

    /// Reads a little-endian pointer-sized value.
    fn read_pointer(&self, address: u64) -> MemoryResult<u64> {
        let width = self.pointer_size();
        let bytes = self.read_bytes(address, width)?;
        if bytes.len() < width {
            return Err(MemoryError::Unreadable { address, len: width });
        }
        let mut buf = [0u8; 8];
        buf[..width].copy_from_slice(&bytes[..width]);
        Ok(u64::from_le_bytes(buf))
    }

    /// Reads a NUL-terminated byte string, decoding it as lossy UTF-8.
    fn read_c_string(&self, address: u64) -> MemoryResult<String> {
        let bytes = read_terminated(self, address, 1)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Reads a NUL-terminated UTF-16LE string.
    fn read_utf16_string(&self, address: u64) -> MemoryResult<String> {
        let bytes = read_terminated(self, address, 2)?;
        let units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        Ok(String::from_utf16_lossy(&units))
    }
}

/// Reads `unit`-sized elements until an all-zero element, never crossing a page
/// boundary in a single read so a string ending right before an unmapped page
/// still reads cleanly. Strings longer than `MAX_STRING_BYTES` are cut there.
fn read_terminated<P: Process + ?Sized>(
    process: &P,
    address: u64,
    unit: usize,
) -> MemoryResult<Vec<u8>> {
    let mut out: Vec<u8> = Vec::new();
    let mut cursor = address;
    while out.len() < MAX_STRING_BYTES {
        let to_page_end = PAGE_SIZE - (cursor % PAGE_SIZE);
        let len = READ_CHUNK.min(to_page_end) as usize;
        let chunk = process.read_bytes(cursor, len)?;
        out.extend_from_slice(&chunk);

        let whole = out.len() - out.len() % unit;
        if let Some(end) = out[..whole]
            .chunks_exact(unit)
            .position(|elem| elem.iter().all(|b| *b == 0))
        {
            out.truncate(end * unit);
            return Ok(out);
        }
        cursor = cursor.wrapping_add(len as u64);
    }
    log::debug!("string at 0x{:x} cut at {} bytes", address, MAX_STRING_BYTES);
    out.truncate(MAX_STRING_BYTES);
    Ok(out)
}
