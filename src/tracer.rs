//! Opt-in execution tracing. A [`Tracer`] only accumulates [`TraceStep`]s in
//! memory; it never formats or writes anywhere itself, so attaching one
//! doesn't couple the core to any particular log sink.

use crate::opcodes::Mnemonic;
use crate::registers::{Flags, NUM_REGS};

/// A snapshot taken immediately before one instruction is dispatched.
#[derive(Debug, Clone, Copy)]
pub struct TraceStep {
    pub pc: usize,
    pub mnemonic: Mnemonic,
    pub registers: [u16; NUM_REGS],
    pub flags: Flags,
}

/// Records execution steps for a host to inspect after (or during) a run.
#[derive(Debug, Clone, Default)]
pub struct Tracer {
    steps: Vec<TraceStep>,
}

impl Tracer {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    pub fn record(&mut self, step: TraceStep) {
        self.steps.push(step);
    }

    pub fn steps(&self) -> &[TraceStep] {
        &self.steps
    }

    pub fn clear(&mut self) {
        self.steps.clear();
    }
}
