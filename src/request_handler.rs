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

/// Request parsing and dispatch for the serve loop.
use anyhow::Result;
use serde_json::{json, Value};

use crate::disasm::{disassemble, DEFAULT_COUNT};
use crate::helper_requests::*;
use crate::instr::InstructionDecoder;
use crate::memory::build_region_map;
use crate::process::Process;
use crate::symbols::SymbolResolver;
use crate::transport::Transport;

/// Everything a request may need from the attached process.
pub struct Session<'a> {
    pub process: &'a dyn Process,
    pub decoder: &'a dyn InstructionDecoder,
    pub resolver: &'a dyn SymbolResolver,
}

impl Session<'_> {
    /// Parse and dispatch one request based on its `req` discriminant, returning
    /// the response to send back.
    pub fn dispatch_request(&self, msg: &Value) -> Value {
        let req_type = msg.get("req").and_then(|v| v.as_str()).unwrap_or("");
        let seq = msg.get("seq").and_then(|v| v.as_u64()).unwrap_or(0);

        let response = match req_type {
            "disasm" | "disassemble" => self.handle_disasm_request(msg),
            "regions" => self.handle_regions_request(msg),
            other => Err(format!("Unknown request type: {:?}", other)),
        };
        response.unwrap_or_else(|error| {
            log::warn!("request {} ({}) failed: {}", seq, req_type, error);
            to_value(&ErrorResponse::new(req_type, seq, error))
        })
    }

    fn handle_disasm_request(&self, msg: &Value) -> Result<Value, String> {
        let typed_req = serde_json::from_value::<DisasmRequest>(msg.clone())
            .map_err(|e| format!("Failed to parse DisasmRequest: {}", e))?;
        let address = parse_hex_address(&typed_req.arguments.address)
            .ok_or_else(|| format!("Invalid address {}", typed_req.arguments.address))?;
        let count = typed_req
            .arguments
            .count
            .map(|c| c as usize)
            .unwrap_or(DEFAULT_COUNT);

        let records = disassemble(self.process, self.decoder, self.resolver, address, count)
            .map_err(|e| e.to_string())?;
        Ok(to_value(&DisasmResponse::new(typed_req.seq, records)))
    }

    fn handle_regions_request(&self, msg: &Value) -> Result<Value, String> {
        let typed_req = serde_json::from_value::<RegionsRequest>(msg.clone())
            .map_err(|e| format!("Failed to parse RegionsRequest: {}", e))?;
        let regions: Vec<Value> = build_region_map(self.process)
            .iter()
            .map(|r| r.to_json())
            .collect();
        Ok(json!({
            "req": "regions",
            "seq": typed_req.seq,
            "regions": regions,
        }))
    }

    /// Answer requests until the peer closes the stream.
    pub fn serve<T: Transport>(&self, transport: &mut T) -> Result<()> {
        while let Some(msg) = transport.read_message()? {
            log::debug!("request: {}", msg);
            let response = self.dispatch_request(&msg);
            transport.write_message(&response)?;
        }
        log::info!("client closed the connection");
        Ok(())
    }
}

fn to_value<T: serde::Serialize>(v: &T) -> Value {
    serde_json::to_value(v).unwrap_or_else(|e| json!({ "error": e.to_string() }))
}

/// Parse hex address from string (supports "0x1234" or "1234" format)
pub fn parse_hex_address(input: &str) -> Option<u64> {
    let trimmed = input.trim();
    let hex_str = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    u64::from_str_radix(hex_str, 16).ok()
}
