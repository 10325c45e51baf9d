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

use serde::{Serialize, Serializer};

// 64-bit addresses go over the wire as hex strings to survive JavaScript numbers.
fn hex_address<S: Serializer>(address: &u64, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format!("0x{:x}", address))
}

/// Memory operand `[base, index, lsl #scale, #disp]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ts_rs::TS)]
#[ts(export)]
pub struct MemOperand {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,
    pub scale: i32,
    pub disp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ts_rs::TS)]
#[ts(export)]
#[serde(tag = "type", content = "value")]
pub enum Operand {
    #[serde(rename = "imm")]
    Immediate(i64),
    #[serde(rename = "reg")]
    Register(String),
    #[serde(rename = "mem")]
    Memory(MemOperand),
}

impl Operand {
    pub fn immediate(&self) -> Option<i64> {
        match self {
            Operand::Immediate(v) => Some(*v),
            _ => None,
        }
    }

    pub fn register(&self) -> Option<&str> {
        match self {
            Operand::Register(r) => Some(r),
            _ => None,
        }
    }

    pub fn memory(&self) -> Option<&MemOperand> {
        match self {
            Operand::Memory(m) => Some(m),
            _ => None,
        }
    }
}

/// One instruction as produced by an [`InstructionDecoder`].
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedInstruction {
    pub address: u64,
    pub mnemonic: String,
    pub op_str: String,
    pub operands: Vec<Operand>,
    /// Semantic group names, e.g. `jump`, `call`, `branch_relative`.
    pub groups: Vec<String>,
    pub regs_read: Vec<String>,
    pub regs_written: Vec<String>,
    /// `mnemonic op_str`, e.g. "ldr x0, [x8, #0x10]"
    pub text: String,
    /// Address of the following instruction.
    pub next: u64,
}

impl DecodedInstruction {
    pub fn is_jump(&self) -> bool {
        self.groups.iter().any(|g| g == "jump")
    }
}

/// Decodes single instructions out of target memory.
pub trait InstructionDecoder {
    /// `None` when the bytes at `address` are unreadable or not an instruction.
    fn decode(&self, address: u64) -> Option<DecodedInstruction>;
}

/// A decoded instruction plus what the disassembler worked out about it.
#[derive(Debug, Clone, PartialEq, Serialize, ts_rs::TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AnnotatedRecord {
    #[serde(serialize_with = "hex_address")]
    #[ts(type = "string")]
    pub address: u64,
    pub mnemonic: String,
    pub op_str: String,
    pub groups: Vec<String>,
    pub operands: Vec<Operand>,
    pub regs_read: Vec<String>,
    pub regs_written: Vec<String>,
    pub text: String,
    /// Literal or target name that does not replace the operand text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Name of the sole jump target.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
}

impl AnnotatedRecord {
    pub fn from_instruction(insn: &DecodedInstruction) -> Self {
        Self {
            address: insn.address,
            mnemonic: insn.mnemonic.clone(),
            op_str: insn.op_str.clone(),
            groups: insn.groups.clone(),
            operands: insn.operands.clone(),
            regs_read: insn.regs_read.clone(),
            regs_written: insn.regs_written.clone(),
            text: insn.text.clone(),
            comment: None,
            symbol: None,
        }
    }
}
