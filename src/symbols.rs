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

use std::sync::{Arc, OnceLock};

use regex::Regex;

#[derive(Debug, Clone, PartialEq)]
pub enum SymbolScope {
    Global,
    Static,
}

#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub address: u64,
    pub size: u64,
    pub scope: SymbolScope,
}

/// Turns an address into a name.
///
/// When nothing better is known the name is a placeholder of the form
/// `0x<hex>`; see [`is_placeholder`].
pub trait SymbolResolver {
    fn resolve(&self, address: u64) -> String;
}

/// Placeholder name for an address with no symbol.
pub fn placeholder(address: u64) -> String {
    format!("0x{:x}", address)
}

/// True for names that carry no information beyond the address itself.
///
/// Matches the leading `0x` + digits shape, so `0x4010` and `0x1a2b` are both
/// placeholders while `0xdeadbeef` (no leading digit) is not.
pub fn is_placeholder(name: &str) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^0x\d+").expect("static regex"))
        .is_match(name)
}

pub struct SymbolTable {
    // Map start_addr -> Symbol
    symbols_by_addr: std::collections::BTreeMap<u64, Arc<Symbol>>,
    symbols_by_name: std::collections::HashMap<String, Arc<Symbol>>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            symbols_by_addr: std::collections::BTreeMap::new(),
            symbols_by_name: std::collections::HashMap::new(),
        }
    }

    pub fn insert(&mut self, symbol: Symbol) {
        // Aliases share a start address; a global name wins over a local one.
        if let Some(existing) = self.symbols_by_addr.get(&symbol.address) {
            if existing.scope == SymbolScope::Global && symbol.scope != SymbolScope::Global {
                self.symbols_by_name
                    .entry(symbol.name.clone())
                    .or_insert_with(|| Arc::new(symbol));
                return;
            }
        }
        let arc_symbol = Arc::new(symbol);
        let name = arc_symbol.name.clone();

        self.symbols_by_addr
            .insert(arc_symbol.address, arc_symbol.clone());
        self.symbols_by_name.insert(name, arc_symbol);
    }

    pub fn len(&self) -> usize {
        self.symbols_by_addr.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols_by_addr.is_empty()
    }

    /// The symbol whose extent covers `address`. Zero-sized symbols only
    /// match their exact start.
    pub fn lookup(&self, address: u64) -> Option<&Symbol> {
        // range(..=address).next_back() is the largest start address <= address.
        let (&start, symbol) = self.symbols_by_addr.range(..=address).next_back()?;
        if symbol.size > 0 && address - start < symbol.size {
            return Some(symbol.as_ref());
        }
        if symbol.size == 0 && address == start {
            return Some(symbol.as_ref());
        }
        None
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Symbol> {
        self.symbols_by_name.get(name).map(|s| s.as_ref())
    }
}

impl SymbolResolver for SymbolTable {
    fn resolve(&self, address: u64) -> String {
        match self.lookup(address) {
            Some(symbol) => symbol.name.clone(),
            None => placeholder(address),
        }
    }
}
