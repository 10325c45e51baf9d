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

use crate::error::MemoryResult;
use crate::literals::LiteralKind;
use crate::memory::Region;
use crate::process::Process;
use crate::symbols::SymbolResolver;

/// Renders pointers that land in a known literal section.
pub struct AddressClassifier<'a, P: ?Sized, R: ?Sized> {
    regions: &'a [Region],
    process: &'a P,
    resolver: &'a R,
}

impl<'a, P, R> AddressClassifier<'a, P, R>
where
    P: Process + ?Sized,
    R: SymbolResolver + ?Sized,
{
    pub fn new(regions: &'a [Region], process: &'a P, resolver: &'a R) -> Self {
        Self {
            regions,
            process,
            resolver,
        }
    }

    /// Readable form of the literal at `pointer`.
    ///
    /// The first region containing `pointer` decides; if it has no reader the
    /// result is `None` even when a later region would have one.
    pub fn classify(&self, pointer: u64) -> MemoryResult<Option<String>> {
        let Some(region) = self.regions.iter().find(|r| r.contains(pointer)) else {
            return Ok(None);
        };
        log::debug!(
            "0x{:x} is in {}",
            pointer,
            region.name.as_deref().unwrap_or("<unnamed>")
        );
        let Some(kind) = region.name.as_deref().and_then(LiteralKind::for_region) else {
            return Ok(None);
        };
        kind.read(self.process, self.resolver, pointer).map(Some)
    }
}
