// Crate root: declare modules and control visibility
pub mod capstone;
pub mod classifier;
pub mod disasm;
pub mod error;
pub mod helper_requests;
pub mod instr;
pub mod listing;
pub mod literals;
pub mod logging;
pub mod memory;
pub mod process;
pub mod request_handler;
pub mod symbols;
pub mod transport;

// Re-export commonly used API from the library for binaries/tests
pub use classifier::AddressClassifier;
pub use disasm::{disassemble, DEFAULT_COUNT};
pub use error::{DisasmError, MemoryError};
pub use instr::{AnnotatedRecord, DecodedInstruction, InstructionDecoder, MemOperand, Operand};
pub use memory::{build_region_map, Region};
pub use process::{Arch, LinuxProcess, MemoryRange, Module, Process, Protection, SectionInfo};
pub use symbols::SymbolResolver;
