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

use serde::{Deserialize, Serialize};

use crate::instr::AnnotatedRecord;

// Request and response types for the serve loop. Addresses are hex strings on
// the wire to avoid JavaScript number precision issues.

/**
 * DisasmArguments selects what to disassemble. `address` is a hex string such as
 * "0x1000a3f0" (or a bare hex number); `count` defaults to 100.
 */
#[derive(Serialize, Deserialize, Debug, ts_rs::TS)]
#[ts(export)]
pub struct DisasmArguments {
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
}

#[derive(Serialize, Deserialize, Debug, ts_rs::TS)]
#[ts(export)]
pub struct DisasmRequest {
    pub req: String, // "disasm"
    pub seq: u64,
    pub arguments: DisasmArguments,
}

#[derive(Serialize, Deserialize, Debug, ts_rs::TS)]
#[ts(export)]
pub struct RegionsRequest {
    pub req: String, // "regions"
    pub seq: u64,
}

#[derive(Serialize, Debug, ts_rs::TS)]
#[ts(export)]
pub struct DisasmResponse {
    pub req: String,
    pub seq: u64,
    pub instructions: Vec<AnnotatedRecord>,
}

/// Sent instead of the regular response when a request cannot be served.
#[derive(Serialize, Deserialize, Debug, ts_rs::TS)]
#[ts(export)]
pub struct ErrorResponse {
    pub req: String,
    pub seq: u64,
    pub error: String,
}

impl DisasmResponse {
    pub fn new(seq: u64, instructions: Vec<AnnotatedRecord>) -> Self {
        Self {
            req: "disasm".to_string(),
            seq,
            instructions,
        }
    }
}

impl ErrorResponse {
    pub fn new(req: &str, seq: u64, error: impl ToString) -> Self {
        Self {
            req: req.to_string(),
            seq,
            error: error.to_string(),
        }
    }
}
