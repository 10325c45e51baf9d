// In-memory stand-ins for a live process, an instruction decoder and a symbol
// resolver, shared by the integration tests.
#![allow(dead_code)]

use std::cell::Cell;
use std::collections::{BTreeMap, HashMap};

use proc_disasm::error::MemoryResult;
use proc_disasm::symbols::placeholder;
use proc_disasm::{
    Arch, DecodedInstruction, InstructionDecoder, MemOperand, MemoryError, MemoryRange, Module,
    Operand, Process, Protection, SectionInfo, SymbolResolver,
};

const PAGE: u64 = 0x1000;

pub const RX: Protection = Protection {
    read: true,
    write: false,
    execute: true,
};
pub const RW: Protection = Protection {
    read: true,
    write: true,
    execute: false,
};

pub struct FakeProcess {
    pub arch: Arch,
    pub ranges: Vec<MemoryRange>,
    pub modules: Vec<(Module, Vec<SectionInfo>)>,
    pages: BTreeMap<u64, Vec<u8>>,
    pub reads: Cell<usize>,
    pub range_lookups: Cell<usize>,
}

impl FakeProcess {
    pub fn new(arch: Arch) -> Self {
        Self {
            arch,
            ranges: Vec::new(),
            modules: Vec::new(),
            pages: BTreeMap::new(),
            reads: Cell::new(0),
            range_lookups: Cell::new(0),
        }
    }

    pub fn arm64() -> Self {
        Self::new(Arch::Arm64)
    }

    pub fn map(&mut self, base: u64, size: u64, protection: Protection) -> &mut Self {
        self.ranges.push(MemoryRange {
            base,
            size,
            protection,
            file: None,
        });
        self
    }

    /// Add a module whose sections are `(name, base, size)`.
    pub fn module(&mut self, name: &str, sections: &[(&str, u64, u64)]) -> &mut Self {
        let sections: Vec<SectionInfo> = sections
            .iter()
            .map(|(name, base, size)| SectionInfo {
                name: name.to_string(),
                base: *base,
                size: *size,
            })
            .collect();
        let base = sections.iter().map(|s| s.base).min().unwrap_or(0);
        self.modules.push((
            Module {
                name: name.to_string(),
                path: None,
                base,
            },
            sections,
        ));
        self
    }

    /// Store bytes, backing every touched page.
    pub fn write(&mut self, address: u64, bytes: &[u8]) -> &mut Self {
        for (i, b) in bytes.iter().enumerate() {
            let a = address + i as u64;
            let page = self
                .pages
                .entry(a & !(PAGE - 1))
                .or_insert_with(|| vec![0; PAGE as usize]);
            page[(a % PAGE) as usize] = *b;
        }
        self
    }

    pub fn write_c_string(&mut self, address: u64, s: &str) -> &mut Self {
        let mut bytes = s.as_bytes().to_vec();
        bytes.push(0);
        self.write(address, &bytes)
    }

    pub fn write_pointer(&mut self, address: u64, value: u64) -> &mut Self {
        self.write(address, &value.to_le_bytes())
    }
}

impl Process for FakeProcess {
    fn arch(&self) -> Arch {
        self.arch.clone()
    }

    fn find_range(&self, address: u64) -> Option<MemoryRange> {
        self.range_lookups.set(self.range_lookups.get() + 1);
        self.ranges.iter().find(|r| r.contains(address)).cloned()
    }

    fn modules(&self) -> Vec<Module> {
        self.modules.iter().map(|(m, _)| m.clone()).collect()
    }

    fn sections(&self, module: &Module) -> Vec<SectionInfo> {
        self.modules
            .iter()
            .find(|(m, _)| m == module)
            .map(|(_, s)| s.clone())
            .unwrap_or_default()
    }

    fn read_bytes(&self, address: u64, len: usize) -> MemoryResult<Vec<u8>> {
        self.reads.set(self.reads.get() + 1);
        let mut out = Vec::with_capacity(len);
        for i in 0..len as u64 {
            let a = address + i;
            let page = self
                .pages
                .get(&(a & !(PAGE - 1)))
                .ok_or(MemoryError::Unreadable { address, len })?;
            out.push(page[(a % PAGE) as usize]);
        }
        Ok(out)
    }
}

/// Decoder that plays back a fixed set of instructions.
#[derive(Default)]
pub struct ScriptDecoder {
    pub instructions: HashMap<u64, DecodedInstruction>,
}

impl ScriptDecoder {
    pub fn push(&mut self, insn: DecodedInstruction) -> &mut Self {
        self.instructions.insert(insn.address, insn);
        self
    }

    /// `n` consecutive nops starting at `address`.
    pub fn nops(address: u64, n: usize) -> Self {
        let mut decoder = Self::default();
        for i in 0..n as u64 {
            decoder.push(insn(address + 4 * i, "nop", vec![], &[]));
        }
        decoder
    }
}

impl InstructionDecoder for ScriptDecoder {
    fn decode(&self, address: u64) -> Option<DecodedInstruction> {
        self.instructions.get(&address).cloned()
    }
}

#[derive(Default)]
pub struct MapResolver {
    pub names: HashMap<u64, String>,
}

impl MapResolver {
    pub fn with(mut self, address: u64, name: &str) -> Self {
        self.names.insert(address, name.to_string());
        self
    }
}

impl SymbolResolver for MapResolver {
    fn resolve(&self, address: u64) -> String {
        self.names
            .get(&address)
            .cloned()
            .unwrap_or_else(|| placeholder(address))
    }
}

/// A 4-byte instruction at `address`.
pub fn insn(address: u64, mnemonic: &str, operands: Vec<Operand>, groups: &[&str]) -> DecodedInstruction {
    DecodedInstruction {
        address,
        mnemonic: mnemonic.to_string(),
        op_str: String::new(),
        operands,
        groups: groups.iter().map(|g| g.to_string()).collect(),
        regs_read: vec![],
        regs_written: vec![],
        text: mnemonic.to_string(),
        next: address + 4,
    }
}

pub fn reg(name: &str) -> Operand {
    Operand::Register(name.to_string())
}

pub fn imm(value: u64) -> Operand {
    Operand::Immediate(value as i64)
}

pub fn mem(base: &str, disp: i64) -> Operand {
    Operand::Memory(MemOperand {
        base: Some(base.to_string()),
        index: None,
        scale: 1,
        disp,
    })
}
