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

//! The annotating disassembly loop.
//!
//! Starting from an address in executable memory, instructions are decoded one
//! after another until the requested count, the end of the mapping, or the
//! first undecodable word. Each one is annotated with:
//!
//! * the symbol name of a jump target, and
//! * the literal referenced by an `adrp` + `ldr` pair, rendered according to
//!   the section it points into (see [`crate::literals`]).

use crate::classifier::AddressClassifier;
use crate::error::DisasmError;
use crate::instr::{AnnotatedRecord, DecodedInstruction, InstructionDecoder};
use crate::memory::{build_region_map, Region};
use crate::process::Process;
use crate::symbols::{is_placeholder, SymbolResolver};

pub const DEFAULT_COUNT: usize = 100;

/// Loads the page address of a symbol into a register.
const PAGE_LOAD: &str = "adrp";
/// Loads a register from memory.
const REGISTER_LOAD: &str = "ldr";

/// Disassemble up to `count` instructions at `address` in `process`.
///
/// Fails only when the call cannot start: unsupported architecture, null
/// address, unmapped address or non-executable memory, checked in that order.
/// Anything going wrong later ends the listing early instead.
pub fn disassemble<P, D, R>(
    process: &P,
    decoder: &D,
    resolver: &R,
    address: u64,
    count: usize,
) -> Result<Vec<AnnotatedRecord>, DisasmError>
where
    P: Process + ?Sized,
    D: InstructionDecoder + ?Sized,
    R: SymbolResolver + ?Sized,
{
    let arch = process.arch();
    if !arch.is_supported() {
        return Err(DisasmError::ArchitectureUnsupported(arch));
    }
    if address == 0 {
        return Err(DisasmError::InvalidAddress(address));
    }
    let range = process
        .find_range(address)
        .ok_or(DisasmError::UnmappedAddress(address))?;
    if !range.protection.execute {
        return Err(DisasmError::NonExecutable(address));
    }

    let regions = build_region_map(process);
    let records: Vec<AnnotatedRecord> =
        RecordStream::new(&regions, process, decoder, resolver, address, range.end(), count)
            .collect();
    log::debug!(
        "disassembled {} instructions at 0x{:x} (limit {})",
        records.len(),
        address,
        count
    );
    Ok(records)
}

/// Lazily decodes and annotates instructions for one [`disassemble`] call.
struct RecordStream<'a, P: ?Sized, D: ?Sized, R: ?Sized> {
    decoder: &'a D,
    resolver: &'a R,
    classifier: AddressClassifier<'a, P, R>,
    cursor: Option<u64>,
    end: u64,
    remaining: usize,
    previous: Option<DecodedInstruction>,
}

impl<'a, P, D, R> RecordStream<'a, P, D, R>
where
    P: Process + ?Sized,
    D: InstructionDecoder + ?Sized,
    R: SymbolResolver + ?Sized,
{
    fn new(
        regions: &'a [Region],
        process: &'a P,
        decoder: &'a D,
        resolver: &'a R,
        start: u64,
        end: u64,
        count: usize,
    ) -> Self {
        Self {
            decoder,
            resolver,
            classifier: AddressClassifier::new(regions, process, resolver),
            cursor: Some(start),
            end,
            remaining: count,
            previous: None,
        }
    }

    /// Name the targets of a jump. A lone target operand becomes the symbol;
    /// with other operands around it (e.g. `cbz x0, target`) it goes to the
    /// comment instead.
    fn resolve_jump(&self, insn: &DecodedInstruction, record: &mut AnnotatedRecord) {
        for value in insn.operands.iter().filter_map(|op| op.immediate()) {
            let name = self.resolver.resolve(value as u64);
            if is_placeholder(&name) {
                continue;
            }
            if insn.operands.len() == 1 {
                record.symbol = Some(name);
            } else {
                record.comment = Some(name);
            }
        }
    }
}

impl<P, D, R> Iterator for RecordStream<'_, P, D, R>
where
    P: Process + ?Sized,
    D: InstructionDecoder + ?Sized,
    R: SymbolResolver + ?Sized,
{
    type Item = AnnotatedRecord;

    fn next(&mut self) -> Option<AnnotatedRecord> {
        if self.remaining == 0 {
            return None;
        }
        let cursor = self.cursor?;
        let Some(insn) = self.decoder.decode(cursor) else {
            log::debug!("no instruction at 0x{:x}, stopping", cursor);
            self.cursor = None;
            return None;
        };

        let mut record = AnnotatedRecord::from_instruction(&insn);
        if insn.is_jump() {
            self.resolve_jump(&insn, &mut record);
        }
        if let Some(target) = load_pair_target(self.previous.as_ref(), &insn) {
            match self.classifier.classify(target) {
                Ok(Some(text)) => record.comment = Some(text),
                Ok(None) => {}
                Err(e) => {
                    log::warn!(
                        "reading literal at 0x{:x} for 0x{:x} failed: {}",
                        target,
                        insn.address,
                        e
                    );
                    self.cursor = None;
                    return None;
                }
            }
        }

        self.remaining -= 1;
        self.cursor = if insn.next == 0 || insn.next >= self.end {
            None
        } else {
            Some(insn.next)
        };
        self.previous = Some(insn);
        Some(record)
    }
}

/// Address referenced by `adrp Rd, page` followed by `ldr Rt, [Rd, #disp]`.
fn load_pair_target(previous: Option<&DecodedInstruction>, insn: &DecodedInstruction) -> Option<u64> {
    let previous = previous?;
    if previous.mnemonic != PAGE_LOAD || insn.mnemonic != REGISTER_LOAD {
        return None;
    }
    let page = previous.operands.get(1)?.immediate()?;
    let dest = previous.operands.first()?.register()?;
    let mem = insn.operands.get(1)?.memory()?;
    if mem.base.as_deref() != Some(dest) {
        return None;
    }
    Some((page as u64).wrapping_add(mem.disp as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instr::{MemOperand, Operand};

    fn insn(mnemonic: &str, operands: Vec<Operand>) -> DecodedInstruction {
        DecodedInstruction {
            address: 0x1000,
            mnemonic: mnemonic.into(),
            op_str: String::new(),
            operands,
            groups: vec![],
            regs_read: vec![],
            regs_written: vec![],
            text: mnemonic.into(),
            next: 0x1004,
        }
    }

    fn mem(base: &str, disp: i64) -> Operand {
        Operand::Memory(MemOperand {
            base: Some(base.into()),
            index: None,
            scale: 1,
            disp,
        })
    }

    #[test]
    fn load_pair_needs_matching_base() {
        let adrp = insn(
            "adrp",
            vec![Operand::Register("x8".into()), Operand::Immediate(0x5000)],
        );
        let ldr = insn("ldr", vec![Operand::Register("x0".into()), mem("x8", 0x18)]);
        assert_eq!(load_pair_target(Some(&adrp), &ldr), Some(0x5018));

        let other = insn("ldr", vec![Operand::Register("x0".into()), mem("x9", 0x18)]);
        assert_eq!(load_pair_target(Some(&adrp), &other), None);
        assert_eq!(load_pair_target(None, &ldr), None);
    }

    #[test]
    fn load_pair_needs_exact_mnemonics() {
        let adrp = insn(
            "adrp",
            vec![Operand::Register("x8".into()), Operand::Immediate(0x5000)],
        );
        let add = insn("add", vec![Operand::Register("x0".into()), mem("x8", 0x18)]);
        assert_eq!(load_pair_target(Some(&adrp), &add), None);

        let adr = insn(
            "adr",
            vec![Operand::Register("x8".into()), Operand::Immediate(0x5000)],
        );
        let ldr = insn("ldr", vec![Operand::Register("x0".into()), mem("x8", 0x18)]);
        assert_eq!(load_pair_target(Some(&adr), &ldr), None);
    }

    #[test]
    fn negative_displacement_wraps() {
        let adrp = insn(
            "adrp",
            vec![Operand::Register("x1".into()), Operand::Immediate(0x5000)],
        );
        let ldr = insn("ldr", vec![Operand::Register("x0".into()), mem("x1", -8)]);
        assert_eq!(load_pair_target(Some(&adrp), &ldr), Some(0x4ff8));
    }
}
