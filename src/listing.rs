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

use std::fmt::Write;

use crate::instr::AnnotatedRecord;

/// One listing line:
/// `0x100004  ldr      x0, [x8, #0x10] ; "ok"`
/// `0x100008  b        #0x100100 <main>`
pub fn format_record(record: &AnnotatedRecord) -> String {
    let mut line = format!(
        "0x{:x}  {:<8} {}",
        record.address, record.mnemonic, record.op_str
    );
    if let Some(symbol) = &record.symbol {
        let _ = write!(line, " <{}>", symbol);
    }
    if let Some(comment) = &record.comment {
        let _ = write!(line, " ; {}", comment);
    }
    line.trim_end().to_string()
}

pub fn format_listing(records: &[AnnotatedRecord]) -> String {
    let mut out = String::new();
    for record in records {
        out.push_str(&format_record(record));
        out.push('\n');
    }
    out
}
