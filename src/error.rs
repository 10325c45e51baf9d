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

//! Error types surfaced by the disassembly engine and the memory readers.

use thiserror::Error;

use crate::process::Arch;

/// Precondition failures of [`crate::disasm::disassemble`]. These are the only
/// ways a call can fail; anything later just shortens the listing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DisasmError {
    #[error("CPU not supported: {0}")]
    ArchitectureUnsupported(Arch),

    #[error("Invalid address 0x{0:x}")]
    InvalidAddress(u64),

    #[error("Address 0x{0:x} is not mapped")]
    UnmappedAddress(u64),

    #[error("0x{0:x} is not executable")]
    NonExecutable(u64),
}

/// A failed read of target process memory.
#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("access violation reading 0x{address:x} ({len} bytes)")]
    Unreadable { address: u64, len: usize },
}

pub type MemoryResult<T> = std::result::Result<T, MemoryError>;
