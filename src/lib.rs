//! Register-based VM whose opcode byte values are a per-instance,
//! key-derived permutation rather than a fixed table.

pub mod address_space;
pub mod fault;
pub mod opcodes;
pub mod registers;
pub mod tracer;
pub mod vm;

pub use address_space::AddressSpace;
pub use fault::Fault;
pub use opcodes::{Mnemonic, OpDescriptor, OpcodeTable};
pub use registers::{Flags, Registers};
pub use tracer::{TraceStep, Tracer};
pub use vm::{ExecutionReport, Vm};
