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

//! `/proc` backed access to a live Linux process.
//!
//! The memory map and module list are re-read on every query, so modules that
//! load or unload between calls are picked up. Section and symbol tables come
//! from the module files on disk, shifted by each module's load bias.
//!
//! Region names are whatever the module format calls its sections, so ELF
//! modules yield `.text`, `.rodata` and so on. The literal readers are keyed
//! on Mach-O section names, which means load pairs in ELF code are never
//! annotated with literals through this backend.

use std::fs::{self, File};
use std::os::unix::fs::FileExt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use memmap2::Mmap;
use object::{Object, ObjectSection, ObjectSegment, ObjectSymbol};

use super::{Arch, MemoryRange, Module, Process, SectionInfo};
use crate::error::{MemoryError, MemoryResult};
use crate::symbols::{Symbol, SymbolResolver, SymbolScope, SymbolTable};

const PAGE_MASK: u64 = !0xfff;

pub struct LinuxProcess {
    pid: u32,
    proc_root: PathBuf,
    arch: Arch,
    mem: Option<File>,
    symbols: SymbolTable,
}

impl LinuxProcess {
    /// Attach to `pid` through the real `/proc`.
    pub fn attach(pid: u32) -> Result<Self> {
        Self::with_proc_root("/proc", pid)
    }

    /// Attach using an alternative proc root laid out like `/proc/<pid>/...`.
    pub fn with_proc_root(root: impl Into<PathBuf>, pid: u32) -> Result<Self> {
        let mut process = Self {
            pid,
            proc_root: root.into(),
            arch: Arch::Other("unknown".to_string()),
            mem: None,
            symbols: SymbolTable::new(),
        };

        // Fail early on a pid that does not exist.
        let maps = process.maps()?;

        match detect_arch(&process.proc_path("exe")) {
            Ok(arch) => process.arch = arch,
            Err(e) => log::warn!("pid {}: cannot determine architecture: {:#}", pid, e),
        }

        match File::open(process.proc_path("mem")) {
            Ok(f) => process.mem = Some(f),
            Err(e) => log::warn!("pid {}: memory not readable: {}", pid, e),
        }

        for module in modules_from_maps(&maps) {
            if let Err(e) = load_symbols(&module, &process.arch, &mut process.symbols) {
                log::debug!("no symbols for {}: {:#}", module.name, e);
            }
        }
        log::info!(
            "attached to pid {} ({}, {} symbols)",
            pid,
            process.arch,
            process.symbols.len()
        );

        Ok(process)
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    fn proc_path(&self, leaf: &str) -> PathBuf {
        self.proc_root.join(self.pid.to_string()).join(leaf)
    }

    /// Current memory map of the process.
    pub fn maps(&self) -> Result<Vec<MemoryRange>> {
        let path = self.proc_path("maps");
        let text = fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        parse_maps(&text)
    }
}

impl Process for LinuxProcess {
    fn arch(&self) -> Arch {
        self.arch.clone()
    }

    fn find_range(&self, address: u64) -> Option<MemoryRange> {
        match self.maps() {
            Ok(maps) => maps.into_iter().find(|r| r.contains(address)),
            Err(e) => {
                log::warn!("pid {}: {:#}", self.pid, e);
                None
            }
        }
    }

    fn modules(&self) -> Vec<Module> {
        match self.maps() {
            Ok(maps) => modules_from_maps(&maps),
            Err(e) => {
                log::warn!("pid {}: {:#}", self.pid, e);
                Vec::new()
            }
        }
    }

    fn sections(&self, module: &Module) -> Vec<SectionInfo> {
        load_sections(module).unwrap_or_else(|e| {
            log::debug!("no sections for {}: {:#}", module.name, e);
            Vec::new()
        })
    }

    fn read_bytes(&self, address: u64, len: usize) -> MemoryResult<Vec<u8>> {
        let mem = self
            .mem
            .as_ref()
            .ok_or(MemoryError::Unreadable { address, len })?;
        let mut buf = vec![0u8; len];
        mem.read_exact_at(&mut buf, address)
            .map_err(|_| MemoryError::Unreadable { address, len })?;
        Ok(buf)
    }
}

impl SymbolResolver for LinuxProcess {
    fn resolve(&self, address: u64) -> String {
        self.symbols.resolve(address)
    }
}

/// Parse the text of a `/proc/<pid>/maps` file.
///
/// Line format: `start-end perms offset dev inode [path]`.
pub fn parse_maps(text: &str) -> Result<Vec<MemoryRange>> {
    let mut ranges = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let mut fields = line.split_whitespace();
        let mut next = |what: &str| {
            fields
                .next()
                .with_context(|| format!("maps line {}: missing {}", lineno + 1, what))
        };
        let span = next("address range")?;
        let perms = next("permissions")?;
        let offset = next("offset")?;
        let _dev = next("device")?;
        let _inode = next("inode")?;
        // Paths may contain spaces; the rest of the line is the path.
        let path = fields.collect::<Vec<_>>().join(" ");

        let (start, end) = span
            .split_once('-')
            .with_context(|| format!("maps line {}: bad range {:?}", lineno + 1, span))?;
        let base = u64::from_str_radix(start, 16)?;
        let end = u64::from_str_radix(end, 16)?;
        let offset = u64::from_str_radix(offset, 16)?;

        let file = if path.starts_with('/') {
            Some((PathBuf::from(path), offset))
        } else {
            None
        };

        ranges.push(MemoryRange {
            base,
            size: end.saturating_sub(base),
            protection: perms.parse()?,
            file,
        });
    }
    Ok(ranges)
}

/// Group file-backed mappings into modules, in order of first appearance.
pub fn modules_from_maps(ranges: &[MemoryRange]) -> Vec<Module> {
    let mut modules: Vec<Module> = Vec::new();
    for range in ranges {
        let Some((path, _offset)) = &range.file else {
            continue;
        };
        if let Some(module) = modules.iter_mut().find(|m| m.path.as_ref() == Some(path)) {
            module.base = module.base.min(range.base);
            continue;
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        modules.push(Module {
            name,
            path: Some(path.clone()),
            base: range.base,
        });
    }
    modules
}

fn map_file(path: &Path) -> Result<Mmap> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    // SAFETY: read-only mapping of a module file the target has loaded; those are not
    // rewritten in place.
    let mmap = unsafe { Mmap::map(&file) }.with_context(|| format!("mapping {}", path.display()))?;
    Ok(mmap)
}

/// Difference between where a module is loaded and the addresses its file uses.
fn load_bias(file: &object::File, module_base: u64) -> u64 {
    let lowest = file.segments().map(|s| s.address()).min().unwrap_or(0);
    module_base.wrapping_sub(lowest & PAGE_MASK)
}

fn detect_arch(exe: &Path) -> Result<Arch> {
    let data = map_file(exe)?;
    let file = object::File::parse(&*data)?;
    Ok(match file.architecture() {
        object::Architecture::Arm => Arch::Arm,
        object::Architecture::Aarch64 => Arch::Arm64,
        object::Architecture::I386 => Arch::Ia32,
        object::Architecture::X86_64 => Arch::X64,
        other => Arch::Other(format!("{:?}", other).to_lowercase()),
    })
}

/// Sections of `module` at their runtime addresses.
pub fn load_sections(module: &Module) -> Result<Vec<SectionInfo>> {
    let path = module.path.as_ref().context("module has no backing file")?;
    let data = map_file(path)?;
    let file = object::File::parse(&*data)?;
    let bias = load_bias(&file, module.base);

    let mut sections = Vec::new();
    for section in file.sections() {
        // Unallocated sections (debug info, symbol tables) have no address.
        if section.address() == 0 {
            continue;
        }
        sections.push(SectionInfo {
            name: section.name().unwrap_or("").to_string(),
            base: section.address().wrapping_add(bias),
            size: section.size(),
        });
    }
    Ok(sections)
}

/// Runtime address of a symbol. ELF marks Thumb functions by setting bit 0 of
/// their value; branch targets are even, so the bit is dropped.
fn symbol_address(raw: u64, bias: u64, kind: object::SymbolKind, arch: &Arch) -> u64 {
    let address = raw.wrapping_add(bias);
    if *arch == Arch::Arm && kind == object::SymbolKind::Text {
        address & !1
    } else {
        address
    }
}

fn load_symbols(module: &Module, arch: &Arch, table: &mut SymbolTable) -> Result<()> {
    let path = module.path.as_ref().context("module has no backing file")?;
    let data = map_file(path)?;
    let file = object::File::parse(&*data)?;
    let bias = load_bias(&file, module.base);

    for sym in file.symbols().chain(file.dynamic_symbols()) {
        if sym.is_undefined() || sym.address() == 0 {
            continue;
        }
        if !matches!(sym.kind(), object::SymbolKind::Text | object::SymbolKind::Data) {
            continue;
        }
        let name = match sym.name() {
            Ok(n) if !n.is_empty() => n.to_string(),
            _ => continue,
        };
        let scope = if sym.is_global() {
            SymbolScope::Global
        } else {
            SymbolScope::Static
        };
        table.insert(Symbol {
            name,
            address: symbol_address(sym.address(), bias, sym.kind(), arch),
            size: sym.size(),
            scope,
        });
    }
    Ok(())
}
