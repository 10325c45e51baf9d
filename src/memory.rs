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

use serde_json::{json, Value};

use crate::process::Process;

/// Section names longer than this are cut, as Mach-O `sectname` fields are.
pub const MAX_REGION_NAME: usize = 16;

/// One named section of one loaded module, covering `[floor, ceil)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub name: Option<String>,
    pub floor: u64,
    pub ceil: u64,
}

impl Region {
    pub fn new(name: Option<String>, floor: u64, size: u64) -> Self {
        Self {
            name,
            floor,
            ceil: floor.saturating_add(size),
        }
    }

    pub fn contains(&self, addr: u64) -> bool {
        addr >= self.floor && addr < self.ceil
    }

    pub fn to_json(&self) -> Value {
        json!({
            "name": self.name,
            "floor": format!("0x{:x}", self.floor),
            "ceil": format!("0x{:x}", self.ceil),
        })
    }
}

fn truncate_name(name: &str) -> Option<String> {
    if name.is_empty() {
        return None;
    }
    Some(name.chars().take(MAX_REGION_NAME).collect())
}

/// Every section of every loaded module, in module order then section order.
///
/// Not sorted and not de-duplicated: overlapping regions are resolved by
/// whichever comes first.
pub fn build_region_map<P: Process + ?Sized>(process: &P) -> Vec<Region> {
    let mut regions = Vec::new();
    for module in process.modules() {
        for section in process.sections(&module) {
            regions.push(Region::new(
                truncate_name(&section.name),
                section.base,
                section.size,
            ));
        }
    }
    log::debug!("region map: {} regions", regions.len());
    regions
}
