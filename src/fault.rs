//! Typed faults the core can raise. Every handler failure in the reference
//! collapses to a boolean; here each distinct reason gets its own variant so
//! a host can tell an intended `SHIT` halt from a real fault.

use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    #[error("decode out of bounds at code offset {at}")]
    CodeOutOfBounds { at: usize },

    #[error("unknown opcode 0x{0:02X}")]
    UnknownOpcode(u8),

    #[error("invalid register 0x{0:02X}")]
    InvalidRegister(u8),

    #[error("data access out of bounds at address 0x{addr:04X}")]
    DataOutOfBounds { addr: u16 },

    #[error("stack overflow")]
    StackOverflow,

    #[error("stack underflow")]
    StackUnderflow,

    #[error("division by zero")]
    DivisionByZero,

    #[error("halted by SHIT")]
    Halted,
}
