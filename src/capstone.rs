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

use anyhow::Result;
use capstone::arch::arm::ArmOperandType;
use capstone::arch::arm64::Arm64OperandType;
use capstone::arch::ArchOperand;
use capstone::prelude::*;

use crate::instr::{DecodedInstruction, InstructionDecoder, MemOperand, Operand};
use crate::process::{Arch, Process};

// Every instruction of both ARM families fits in one word.
const MAX_INSN_LEN: usize = 4;

enum Engines {
    Arm64(Capstone),
    // Thumb code is addressed with the low bit set.
    Arm { arm: Capstone, thumb: Capstone },
    Unsupported,
}

/// Capstone-backed decoder reading instructions straight out of a process.
pub struct Disassembler<'a, P: ?Sized> {
    process: &'a P,
    engines: Engines,
}

fn build(builder: Result<Capstone, capstone::Error>) -> Result<Capstone> {
    builder.map_err(|e| anyhow::anyhow!("capstone init: {e}"))
}

impl<'a, P: Process + ?Sized> Disassembler<'a, P> {
    /// Set up engines for the process architecture. Other architectures get a
    /// decoder that never decodes anything.
    pub fn new(process: &'a P) -> Result<Self> {
        let engines = match process.arch() {
            Arch::Arm64 => Engines::Arm64(build(
                Capstone::new()
                    .arm64()
                    .mode(arch::arm64::ArchMode::Arm)
                    .detail(true) // Required for operands and groups
                    .build(),
            )?),
            Arch::Arm => Engines::Arm {
                arm: build(
                    Capstone::new()
                        .arm()
                        .mode(arch::arm::ArchMode::Arm)
                        .detail(true)
                        .build(),
                )?,
                thumb: build(
                    Capstone::new()
                        .arm()
                        .mode(arch::arm::ArchMode::Thumb)
                        .detail(true)
                        .build(),
                )?,
            },
            _ => Engines::Unsupported,
        };
        Ok(Self { process, engines })
    }

    fn fetch(&self, address: u64) -> Option<Vec<u8>> {
        // A 16-bit Thumb instruction may be the last thing before unmapped memory.
        self.process
            .read_bytes(address, MAX_INSN_LEN)
            .or_else(|_| self.process.read_bytes(address, 2))
            .ok()
    }

    fn decode_with(&self, cs: &Capstone, address: u64, thumb: bool) -> Option<DecodedInstruction> {
        let code = self.fetch(address)?;
        let insns = cs.disasm_count(&code, address, 1).ok()?;
        let insn = insns.as_ref().first()?;
        let detail = cs.insn_detail(insn).ok()?;

        let mnemonic = insn.mnemonic().unwrap_or("").to_string();
        let op_str = insn.op_str().unwrap_or("").to_string();
        let text = if op_str.is_empty() {
            mnemonic.clone()
        } else {
            format!("{} {}", mnemonic, op_str)
        };

        let mut next = address + insn.len() as u64;
        if thumb {
            next |= 1;
        }

        Some(DecodedInstruction {
            address,
            operands: operands(cs, &detail),
            groups: detail
                .groups()
                .iter()
                .filter_map(|g| cs.group_name(*g))
                .collect(),
            regs_read: reg_names(cs, detail.regs_read()),
            regs_written: reg_names(cs, detail.regs_write()),
            mnemonic,
            op_str,
            text,
            next,
        })
    }
}

impl<P: Process + ?Sized> InstructionDecoder for Disassembler<'_, P> {
    fn decode(&self, address: u64) -> Option<DecodedInstruction> {
        match &self.engines {
            Engines::Arm64(cs) => self.decode_with(cs, address, false),
            Engines::Arm { thumb, .. } if address & 1 == 1 => {
                self.decode_with(thumb, address & !1, true)
            }
            Engines::Arm { arm, .. } => self.decode_with(arm, address, false),
            Engines::Unsupported => None,
        }
    }
}

fn reg_name(cs: &Capstone, reg: RegId) -> Option<String> {
    if reg.0 == 0 {
        return None;
    }
    cs.reg_name(reg)
}

fn reg_names(cs: &Capstone, regs: &[RegId]) -> Vec<String> {
    regs.iter().filter_map(|r| reg_name(cs, *r)).collect()
}

/// Operands capstone reports, reduced to immediates, registers and memory
/// references. Other kinds (system registers, barriers, ...) are dropped.
fn operands(cs: &Capstone, detail: &InsnDetail) -> Vec<Operand> {
    detail
        .arch_detail()
        .operands()
        .into_iter()
        .filter_map(|op| match op {
            ArchOperand::Arm64Operand(op) => match op.op_type {
                Arm64OperandType::Imm(v) => Some(Operand::Immediate(v)),
                Arm64OperandType::Reg(r) => reg_name(cs, r).map(Operand::Register),
                Arm64OperandType::Mem(m) => Some(Operand::Memory(MemOperand {
                    base: reg_name(cs, m.base()),
                    index: reg_name(cs, m.index()),
                    scale: 1,
                    disp: m.disp() as i64,
                })),
                _ => None,
            },
            // 32-bit immediates are mostly addresses, so zero-extend them.
            ArchOperand::ArmOperand(op) => match op.op_type {
                ArmOperandType::Imm(v) => Some(Operand::Immediate(v as u32 as i64)),
                ArmOperandType::Reg(r) => reg_name(cs, r).map(Operand::Register),
                ArmOperandType::Mem(m) => Some(Operand::Memory(MemOperand {
                    base: reg_name(cs, m.base()),
                    index: reg_name(cs, m.index()),
                    scale: m.scale(),
                    disp: m.disp() as i64,
                })),
                _ => None,
            },
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{MemoryError, MemoryResult};
    use crate::process::{MemoryRange, Module, SectionInfo};

    struct Code {
        arch: Arch,
        base: u64,
        bytes: Vec<u8>,
    }

    impl Process for Code {
        fn arch(&self) -> Arch {
            self.arch.clone()
        }
        fn find_range(&self, _address: u64) -> Option<MemoryRange> {
            None
        }
        fn modules(&self) -> Vec<Module> {
            Vec::new()
        }
        fn sections(&self, _module: &Module) -> Vec<SectionInfo> {
            Vec::new()
        }
        fn read_bytes(&self, address: u64, len: usize) -> MemoryResult<Vec<u8>> {
            let start = address.wrapping_sub(self.base) as usize;
            self.bytes
                .get(start..start.saturating_add(len))
                .map(|s| s.to_vec())
                .ok_or(MemoryError::Unreadable { address, len })
        }
    }

    fn arm64(words: &[u32]) -> Code {
        Code {
            arch: Arch::Arm64,
            base: 0x10000,
            bytes: words.iter().flat_map(|w| w.to_le_bytes()).collect(),
        }
    }

    #[test]
    fn decodes_adrp_ldr_pair() {
        // adrp x8, #0x11000 ; ldr x0, [x8, #0x10]
        let code = arm64(&[0xb000_0008, 0xf940_0900]);
        let dis = Disassembler::new(&code).unwrap();

        let adrp = dis.decode(0x10000).unwrap();
        assert_eq!(adrp.mnemonic, "adrp");
        assert_eq!(adrp.next, 0x10004);
        assert_eq!(adrp.operands[0], Operand::Register("x8".into()));
        assert_eq!(adrp.operands[1], Operand::Immediate(0x11000));

        let ldr = dis.decode(adrp.next).unwrap();
        assert_eq!(ldr.mnemonic, "ldr");
        let mem = ldr.operands[1].memory().unwrap();
        assert_eq!(mem.base.as_deref(), Some("x8"));
        assert_eq!(mem.disp, 0x10);
        assert_eq!(ldr.text, "ldr x0, [x8, #0x10]");
    }

    #[test]
    fn branch_is_a_jump_with_one_immediate() {
        // b #0x10010
        let code = arm64(&[0x1400_0004]);
        let dis = Disassembler::new(&code).unwrap();
        let b = dis.decode(0x10000).unwrap();
        assert_eq!(b.mnemonic, "b");
        assert!(b.is_jump());
        assert_eq!(b.operands, vec![Operand::Immediate(0x10010)]);
    }

    #[test]
    fn unreadable_or_unsupported_yields_none() {
        let code = arm64(&[0xd503_201f]); // nop
        let dis = Disassembler::new(&code).unwrap();
        assert!(dis.decode(0x10000).is_some());
        assert!(dis.decode(0x10004).is_none());

        let x86 = Code {
            arch: Arch::X64,
            base: 0,
            bytes: vec![0x90; 16],
        };
        let dis = Disassembler::new(&x86).unwrap();
        assert!(dis.decode(0).is_none());
    }

    #[test]
    fn thumb_addresses_keep_low_bit() {
        // movs r0, #0 ; bx lr
        let code = Code {
            arch: Arch::Arm,
            base: 0x8000,
            bytes: vec![0x00, 0x20, 0x70, 0x47],
        };
        let dis = Disassembler::new(&code).unwrap();
        let movs = dis.decode(0x8001).unwrap();
        assert_eq!(movs.address, 0x8000);
        assert_eq!(movs.mnemonic, "movs");
        assert_eq!(movs.next, 0x8003);
    }
}
