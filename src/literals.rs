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

//! Readers that render the contents of literal-pool sections.
//!
//! Each known section name maps to one [`LiteralKind`]; the kind knows how to
//! follow the pointers stored in that section and print what they lead to.

use crate::error::MemoryResult;
use crate::process::Process;
use crate::symbols::SymbolResolver;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    /// `__cstring`: plain C strings.
    CString,
    /// `__cfstring`: constant `NSString` objects.
    CfString,
    /// `__objc_methtype`: method type encodings.
    MethodType,
    /// `__objc_selrefs`: selector references.
    SelectorRef,
    /// `__objc_classrefs`: class references.
    ClassRef,
    /// `__objc_superrefs`: superclass references.
    SuperRef,
    /// `__ustring`: UTF-16 string data.
    UString,
}

impl LiteralKind {
    pub const ALL: [LiteralKind; 7] = [
        LiteralKind::CString,
        LiteralKind::CfString,
        LiteralKind::MethodType,
        LiteralKind::SelectorRef,
        LiteralKind::ClassRef,
        LiteralKind::SuperRef,
        LiteralKind::UString,
    ];

    pub fn section_name(self) -> &'static str {
        match self {
            LiteralKind::CString => "__cstring",
            LiteralKind::CfString => "__cfstring",
            LiteralKind::MethodType => "__objc_methtype",
            LiteralKind::SelectorRef => "__objc_selrefs",
            LiteralKind::ClassRef => "__objc_classrefs",
            LiteralKind::SuperRef => "__objc_superrefs",
            LiteralKind::UString => "__ustring",
        }
    }

    /// The reader registered for a region name, if any.
    pub fn for_region(name: &str) -> Option<LiteralKind> {
        Self::ALL.into_iter().find(|kind| kind.section_name() == name)
    }

    /// Render the literal that `p` (an address inside a region of this kind)
    /// refers to. Read failures are returned, not hidden.
    pub fn read<P, R>(self, process: &P, resolver: &R, p: u64) -> MemoryResult<String>
    where
        P: Process + ?Sized,
        R: SymbolResolver + ?Sized,
    {
        let width = process.pointer_size() as u64;
        let text = match self {
            LiteralKind::CString => format!("\"{}\"", process.read_c_string(p)?),
            LiteralKind::CfString => {
                let object = process.read_pointer(p)?;
                let chars = process.read_pointer(object)?;
                format!("@\"{}\"", process.read_c_string(chars)?)
            }
            LiteralKind::MethodType => process.read_c_string(p)?,
            LiteralKind::SelectorRef => {
                let name = process.read_pointer(p.wrapping_add(2 * width))?;
                format!("@selector({})", process.read_c_string(name)?)
            }
            LiteralKind::ClassRef => resolver.resolve(process.read_pointer(p)?),
            LiteralKind::SuperRef => {
                let class = process.read_pointer(p)?;
                resolver.resolve(process.read_pointer(class.wrapping_add(width))?)
            }
            LiteralKind::UString => format!("u\"{}\"", process.read_utf16_string(p)?),
        };
        Ok(text)
    }
}
