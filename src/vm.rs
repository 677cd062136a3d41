//! The execution loop: instruction fetch, opcode-table lookup, and the
//! per-mnemonic handlers.

use crate::address_space::AddressSpace;
use crate::fault::Fault;
use crate::opcodes::{Mnemonic, OpcodeTable};
use crate::registers::{self, Flags, Registers, IP, RP, SP};
use crate::tracer::{TraceStep, Tracer};

/// Summary of a finished [`Vm::run`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionReport {
    /// Why the loop stopped. A clean `SHIT` halt reports [`Fault::Halted`]
    /// here too — there is no separate "success" path, the same as the
    /// reference, where every exit from the instruction loop is a failed
    /// `exec*` call.
    pub halted_by: Fault,
    pub steps: u64,
}

/// A VM instance: its address space, registers, flags, and the opcode
/// permutation fixed at construction.
pub struct Vm {
    address_space: AddressSpace,
    registers: Registers,
    flags: Flags,
    table: OpcodeTable,
    tracer: Option<Tracer>,
}

impl Vm {
    /// Builds a VM over a fresh, default-sized address space, with its
    /// opcode table permuted from `key`.
    pub fn new(key: &[u8]) -> Self {
        Self::with_address_space(key, AddressSpace::with_defaults())
    }

    /// Builds a VM with `code` pre-loaded at offset 0. If `code` doesn't fit
    /// the default code segment, the segment is left zeroed — the same
    /// silent-no-op-on-overflow behavior as [`AddressSpace::insert_code`].
    pub fn with_code(key: &[u8], code: &[u8]) -> Self {
        let mut vm = Self::new(key);
        vm.address_space.insert_code(code);
        vm
    }

    pub fn with_address_space(key: &[u8], address_space: AddressSpace) -> Self {
        Self {
            address_space,
            registers: Registers::new(),
            flags: Flags::default(),
            table: OpcodeTable::new(key),
            tracer: None,
        }
    }

    pub fn address_space(&self) -> &AddressSpace {
        &self.address_space
    }

    pub fn address_space_mut(&mut self) -> &mut AddressSpace {
        &mut self.address_space
    }

    pub fn opcode_table(&self) -> &OpcodeTable {
        &self.table
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    /// Reads a register by id. Fails for ids `>= NUM_REGS`, but unlike
    /// instruction operands this does not reject `IP`/`SP`/`RP` — it's meant
    /// for a host inspecting VM state between runs.
    pub fn reg(&self, reg: u8) -> Result<u16, Fault> {
        if !registers::is_known(reg) {
            return Err(Fault::InvalidRegister(reg));
        }
        Ok(self.registers.get(reg))
    }

    /// Attaches an empty [`Tracer`] that accumulates a [`TraceStep`] before
    /// every instruction dispatch from here on.
    pub fn attach_tracer(&mut self) {
        self.tracer = Some(Tracer::new());
    }

    /// Builder-style equivalent of [`Vm::attach_tracer`].
    pub fn with_tracer(mut self) -> Self {
        self.attach_tracer();
        self
    }

    pub fn tracer(&self) -> Option<&Tracer> {
        self.tracer.as_ref()
    }

    /// Runs until the program issues `SHIT` (reported as `Ok`, with
    /// `halted_by == Fault::Halted` — the intended way to stop) or a handler
    /// raises any other fault (reported as `Err`, distinguishing a real
    /// failure from the intended halt).
    pub fn run(&mut self) -> Result<ExecutionReport, Fault> {
        let mut steps = 0u64;
        loop {
            match self.step() {
                Ok(()) => steps += 1,
                Err(Fault::Halted) => {
                    return Ok(ExecutionReport {
                        halted_by: Fault::Halted,
                        steps,
                    })
                }
                Err(fault) => return Err(fault),
            }
        }
    }

    /// Fetches, decodes, and dispatches exactly one instruction.
    fn step(&mut self) -> Result<(), Fault> {
        let ip = self.registers.get(IP) as usize;
        let op_byte = *self
            .address_space
            .code()
            .get(ip)
            .ok_or(Fault::CodeOutOfBounds { at: ip })?;
        let descriptor = *self
            .table
            .find(op_byte)
            .ok_or(Fault::UnknownOpcode(op_byte))?;

        if let Some(tracer) = &mut self.tracer {
            tracer.record(TraceStep {
                pc: ip,
                mnemonic: descriptor.mnemonic,
                registers: self.registers.snapshot(),
                flags: self.flags,
            });
        }

        self.dispatch(descriptor.mnemonic, ip)?;

        if !descriptor.is_jump {
            self.registers
                .set(IP, ip as u16 + descriptor.length as u16);
        }
        Ok(())
    }

    fn dispatch(&mut self, mnemonic: Mnemonic, ip: usize) -> Result<(), Fault> {
        use Mnemonic::*;
        match mnemonic {
            Movi => self.exec_movi(ip),
            Movr => self.exec_movr(ip),
            Lodi => self.exec_lodi(ip),
            Lodr => self.exec_lodr(ip),
            Stri => self.exec_stri(ip),
            Strr => self.exec_strr(ip),
            Addi => self.exec_addi(ip),
            Addr => self.exec_addr(ip),
            Subi => self.exec_subi(ip),
            Subr => self.exec_subr(ip),
            Andb => self.exec_andb(ip),
            Andw => self.exec_andw(ip),
            Andr => self.exec_andr(ip),
            Yorb => self.exec_yorb(ip),
            Yorw => self.exec_yorw(ip),
            Yorr => self.exec_yorr(ip),
            Xorb => self.exec_xorb(ip),
            Xorw => self.exec_xorw(ip),
            Xorr => self.exec_xorr(ip),
            Notr => self.exec_notr(ip),
            Muli => self.exec_muli(ip),
            Mulr => self.exec_mulr(ip),
            Divi => self.exec_divi(ip),
            Divr => self.exec_divr(ip),
            Shli => self.exec_shli(ip),
            Shlr => self.exec_shlr(ip),
            Shri => self.exec_shri(ip),
            Shrr => self.exec_shrr(ip),
            Push => self.exec_push(ip),
            Poop => self.exec_poop(ip),
            Cmpb => self.exec_cmpb(ip),
            Cmpw => self.exec_cmpw(ip),
            Cmpr => self.exec_cmpr(ip),
            Jmpi => self.exec_jmpi(ip),
            Jmpr => self.exec_jmpr(ip),
            Jpai => self.exec_jpai(ip),
            Jpar => self.exec_jpar(ip),
            Jpbi => self.exec_jpbi(ip),
            Jpbr => self.exec_jpbr(ip),
            Jpei => self.exec_jpei(ip),
            Jper => self.exec_jper(ip),
            Jpni => self.exec_jpni(ip),
            Jpnr => self.exec_jpnr(ip),
            Call => self.exec_call(ip),
            Retn => self.exec_retn(),
            Shit => Err(Fault::Halted),
            Nope => Ok(()),
            Grmn => {
                self.registers.scramble();
                Ok(())
            }
            #[cfg(feature = "diagnostic")]
            Debg => self.exec_debg(ip),
        }
    }

    // -- operand validation -------------------------------------------------

    /// Validates a register id the same way the reference's `isRegValid`
    /// does for every register operand, whether it's read or written.
    fn validate(&self, reg: u8) -> Result<(), Fault> {
        if registers::is_operand_valid(reg) {
            Ok(())
        } else {
            Err(Fault::InvalidRegister(reg))
        }
    }

    fn decode_reg_pair(&self, ip: usize) -> Result<(u8, u8), Fault> {
        self.address_space
            .decode_reg_pair(ip)
            .ok_or(Fault::CodeOutOfBounds { at: ip })
    }

    fn decode_reg_imm8(&self, ip: usize) -> Result<(u8, u8), Fault> {
        self.address_space
            .decode_reg_imm8(ip)
            .ok_or(Fault::CodeOutOfBounds { at: ip })
    }

    fn decode_reg_imm16(&self, ip: usize) -> Result<(u8, u16), Fault> {
        self.address_space
            .decode_reg_imm16(ip)
            .ok_or(Fault::CodeOutOfBounds { at: ip })
    }

    fn decode_imm16_reg(&self, ip: usize) -> Result<(u16, u8), Fault> {
        self.address_space
            .decode_imm16_reg(ip)
            .ok_or(Fault::CodeOutOfBounds { at: ip })
    }

    fn decode_reg(&self, ip: usize) -> Result<u8, Fault> {
        self.address_space
            .decode_reg(ip)
            .ok_or(Fault::CodeOutOfBounds { at: ip })
    }

    fn decode_imm16(&self, ip: usize) -> Result<u16, Fault> {
        self.address_space
            .decode_imm16(ip)
            .ok_or(Fault::CodeOutOfBounds { at: ip })
    }

    // -- move / load / store -------------------------------------------------

    fn exec_movi(&mut self, ip: usize) -> Result<(), Fault> {
        let (dst, imm) = self.decode_reg_imm16(ip)?;
        self.validate(dst)?;
        self.registers.set(dst, imm);
        Ok(())
    }

    fn exec_movr(&mut self, ip: usize) -> Result<(), Fault> {
        let (dst, src) = self.decode_reg_pair(ip)?;
        self.validate(dst)?;
        self.validate(src)?;
        self.registers.set(dst, self.registers.get(src));
        Ok(())
    }

    fn exec_lodi(&mut self, ip: usize) -> Result<(), Fault> {
        let (dst, addr) = self.decode_reg_imm16(ip)?;
        self.validate(dst)?;
        let word = self
            .address_space
            .read_data_word(addr)
            .ok_or(Fault::DataOutOfBounds { addr })?;
        self.registers.set(dst, word);
        Ok(())
    }

    fn exec_lodr(&mut self, ip: usize) -> Result<(), Fault> {
        let (dst, src) = self.decode_reg_pair(ip)?;
        self.validate(dst)?;
        self.validate(src)?;
        let addr = self.registers.get(src);
        let word = self
            .address_space
            .read_data_word(addr)
            .ok_or(Fault::DataOutOfBounds { addr })?;
        self.registers.set(dst, word);
        Ok(())
    }

    /// `STRI addr, src`: validates `src` (the register operand), not a
    /// truncation of `addr` — the reference instead calls `isRegValid` on
    /// the destination address, which is very likely a reference bug (it
    /// spuriously rejects any address whose low byte happens to collide with
    /// a register id). The distilled contract here only ever promised the
    /// `addr + 2 <= datasize` bounds check, so that bug isn't replicated.
    fn exec_stri(&mut self, ip: usize) -> Result<(), Fault> {
        let (addr, src) = self.decode_imm16_reg(ip)?;
        self.validate(src)?;
        self.address_space
            .write_data_word(addr, self.registers.get(src))
            .ok_or(Fault::DataOutOfBounds { addr })
    }

    fn exec_strr(&mut self, ip: usize) -> Result<(), Fault> {
        let (dst, src) = self.decode_reg_pair(ip)?;
        self.validate(dst)?;
        self.validate(src)?;
        let addr = self.registers.get(dst);
        self.address_space
            .write_data_word(addr, self.registers.get(src))
            .ok_or(Fault::DataOutOfBounds { addr })
    }

    // -- arithmetic -----------------------------------------------------------

    fn exec_addi(&mut self, ip: usize) -> Result<(), Fault> {
        let (dst, imm) = self.decode_reg_imm16(ip)?;
        self.validate(dst)?;
        self.registers
            .set(dst, self.registers.get(dst).wrapping_add(imm));
        Ok(())
    }

    fn exec_addr(&mut self, ip: usize) -> Result<(), Fault> {
        let (dst, src) = self.decode_reg_pair(ip)?;
        self.validate(dst)?;
        self.validate(src)?;
        self.registers
            .set(dst, self.registers.get(dst).wrapping_add(self.registers.get(src)));
        Ok(())
    }

    fn exec_subi(&mut self, ip: usize) -> Result<(), Fault> {
        let (dst, imm) = self.decode_reg_imm16(ip)?;
        self.validate(dst)?;
        self.registers
            .set(dst, self.registers.get(dst).wrapping_sub(imm));
        Ok(())
    }

    fn exec_subr(&mut self, ip: usize) -> Result<(), Fault> {
        let (dst, src) = self.decode_reg_pair(ip)?;
        self.validate(dst)?;
        self.validate(src)?;
        self.registers
            .set(dst, self.registers.get(dst).wrapping_sub(self.registers.get(src)));
        Ok(())
    }

    fn exec_muli(&mut self, ip: usize) -> Result<(), Fault> {
        let (dst, imm) = self.decode_reg_imm16(ip)?;
        self.validate(dst)?;
        self.registers
            .set(dst, self.registers.get(dst).wrapping_mul(imm));
        Ok(())
    }

    fn exec_mulr(&mut self, ip: usize) -> Result<(), Fault> {
        let (dst, src) = self.decode_reg_pair(ip)?;
        self.validate(dst)?;
        self.validate(src)?;
        self.registers
            .set(dst, self.registers.get(dst).wrapping_mul(self.registers.get(src)));
        Ok(())
    }

    fn exec_divi(&mut self, ip: usize) -> Result<(), Fault> {
        let (dst, imm) = self.decode_reg_imm16(ip)?;
        self.validate(dst)?;
        if imm == 0 {
            return Err(Fault::DivisionByZero);
        }
        self.registers.set(dst, self.registers.get(dst) / imm);
        Ok(())
    }

    fn exec_divr(&mut self, ip: usize) -> Result<(), Fault> {
        let (dst, src) = self.decode_reg_pair(ip)?;
        self.validate(dst)?;
        self.validate(src)?;
        let divisor = self.registers.get(src);
        if divisor == 0 {
            return Err(Fault::DivisionByZero);
        }
        self.registers.set(dst, self.registers.get(dst) / divisor);
        Ok(())
    }

    // -- bitwise ----------------------------------------------------------------

    fn exec_andb(&mut self, ip: usize) -> Result<(), Fault> {
        let (dst, imm) = self.decode_reg_imm8(ip)?;
        self.validate(dst)?;
        self.registers
            .set(dst, self.registers.get(dst) & imm as u16);
        Ok(())
    }

    fn exec_andw(&mut self, ip: usize) -> Result<(), Fault> {
        let (dst, imm) = self.decode_reg_imm16(ip)?;
        self.validate(dst)?;
        self.registers.set(dst, self.registers.get(dst) & imm);
        Ok(())
    }

    fn exec_andr(&mut self, ip: usize) -> Result<(), Fault> {
        let (dst, src) = self.decode_reg_pair(ip)?;
        self.validate(dst)?;
        self.validate(src)?;
        self.registers
            .set(dst, self.registers.get(dst) & self.registers.get(src));
        Ok(())
    }

    fn exec_yorb(&mut self, ip: usize) -> Result<(), Fault> {
        let (dst, imm) = self.decode_reg_imm8(ip)?;
        self.validate(dst)?;
        self.registers
            .set(dst, self.registers.get(dst) | imm as u16);
        Ok(())
    }

    fn exec_yorw(&mut self, ip: usize) -> Result<(), Fault> {
        let (dst, imm) = self.decode_reg_imm16(ip)?;
        self.validate(dst)?;
        self.registers.set(dst, self.registers.get(dst) | imm);
        Ok(())
    }

    fn exec_yorr(&mut self, ip: usize) -> Result<(), Fault> {
        let (dst, src) = self.decode_reg_pair(ip)?;
        self.validate(dst)?;
        self.validate(src)?;
        self.registers
            .set(dst, self.registers.get(dst) | self.registers.get(src));
        Ok(())
    }

    fn exec_xorb(&mut self, ip: usize) -> Result<(), Fault> {
        let (dst, imm) = self.decode_reg_imm8(ip)?;
        self.validate(dst)?;
        self.registers
            .set(dst, self.registers.get(dst) ^ imm as u16);
        Ok(())
    }

    fn exec_xorw(&mut self, ip: usize) -> Result<(), Fault> {
        let (dst, imm) = self.decode_reg_imm16(ip)?;
        self.validate(dst)?;
        self.registers.set(dst, self.registers.get(dst) ^ imm);
        Ok(())
    }

    fn exec_xorr(&mut self, ip: usize) -> Result<(), Fault> {
        let (dst, src) = self.decode_reg_pair(ip)?;
        self.validate(dst)?;
        self.validate(src)?;
        self.registers
            .set(dst, self.registers.get(dst) ^ self.registers.get(src));
        Ok(())
    }

    fn exec_notr(&mut self, ip: usize) -> Result<(), Fault> {
        let (dst, src) = self.decode_reg_pair(ip)?;
        self.validate(dst)?;
        self.validate(src)?;
        self.registers.set(dst, !self.registers.get(src));
        Ok(())
    }

    // -- shifts (count masked to 0..=15 so Rust's shl/shr never panics) --------

    fn exec_shli(&mut self, ip: usize) -> Result<(), Fault> {
        let (dst, imm) = self.decode_reg_imm16(ip)?;
        self.validate(dst)?;
        self.registers
            .set(dst, self.registers.get(dst) << (imm & 0xF));
        Ok(())
    }

    fn exec_shlr(&mut self, ip: usize) -> Result<(), Fault> {
        let (dst, src) = self.decode_reg_pair(ip)?;
        self.validate(dst)?;
        self.validate(src)?;
        let shift = self.registers.get(src) & 0xF;
        self.registers.set(dst, self.registers.get(dst) << shift);
        Ok(())
    }

    fn exec_shri(&mut self, ip: usize) -> Result<(), Fault> {
        let (dst, imm) = self.decode_reg_imm16(ip)?;
        self.validate(dst)?;
        self.registers
            .set(dst, self.registers.get(dst) >> (imm & 0xF));
        Ok(())
    }

    fn exec_shrr(&mut self, ip: usize) -> Result<(), Fault> {
        let (dst, src) = self.decode_reg_pair(ip)?;
        self.validate(dst)?;
        self.validate(src)?;
        let shift = self.registers.get(src) & 0xF;
        self.registers.set(dst, self.registers.get(dst) >> shift);
        Ok(())
    }

    // -- stack ------------------------------------------------------------------

    fn exec_push(&mut self, ip: usize) -> Result<(), Fault> {
        let reg = self.decode_reg(ip)?;
        self.validate(reg)?;
        let sp = self.registers.get(SP) as usize;
        if sp + 2 >= self.address_space.stacksize() {
            return Err(Fault::StackOverflow);
        }
        let bytes = self.registers.get(reg).to_le_bytes();
        let stack = self.address_space.stack_mut();
        stack[sp] = bytes[0];
        stack[sp + 1] = bytes[1];
        self.registers.set(SP, sp as u16 + 2);
        Ok(())
    }

    fn exec_poop(&mut self, ip: usize) -> Result<(), Fault> {
        let reg = self.decode_reg(ip)?;
        self.validate(reg)?;
        let sp = self.registers.get(SP) as usize;
        if sp < 2 {
            return Err(Fault::StackUnderflow);
        }
        let sp = sp - 2;
        let stack = self.address_space.stack();
        let value = u16::from_le_bytes([stack[sp], stack[sp + 1]]);
        self.registers.set(reg, value);
        self.registers.set(SP, sp as u16);
        Ok(())
    }

    // -- compare ------------------------------------------------------------------

    fn exec_cmpb(&mut self, ip: usize) -> Result<(), Fault> {
        let (dst, imm) = self.decode_reg_imm8(ip)?;
        self.validate(dst)?;
        self.flags.compare(self.registers.get(dst) & 0xFF, imm as u16);
        Ok(())
    }

    fn exec_cmpw(&mut self, ip: usize) -> Result<(), Fault> {
        let (dst, imm) = self.decode_reg_imm16(ip)?;
        self.validate(dst)?;
        self.flags.compare(self.registers.get(dst), imm);
        Ok(())
    }

    fn exec_cmpr(&mut self, ip: usize) -> Result<(), Fault> {
        let (dst, src) = self.decode_reg_pair(ip)?;
        self.validate(dst)?;
        self.validate(src)?;
        self.flags.compare(self.registers.get(dst), self.registers.get(src));
        Ok(())
    }

    // -- unconditional / conditional jumps -----------------------------------

    fn exec_jmpi(&mut self, ip: usize) -> Result<(), Fault> {
        let target = self.decode_imm16(ip)?;
        self.registers.set(IP, target);
        Ok(())
    }

    /// `JMPR reg`: jumps to `reg`'s *value*, the one jump in this family the
    /// reference gets "right" by the naive reading — contrast with the
    /// `JPxR` conditional forms below.
    fn exec_jmpr(&mut self, ip: usize) -> Result<(), Fault> {
        let reg = self.decode_reg(ip)?;
        self.validate(reg)?;
        self.registers.set(IP, self.registers.get(reg));
        Ok(())
    }

    fn next_ip(&self, ip: usize, mnemonic: Mnemonic) -> u16 {
        ip as u16 + mnemonic.length() as u16
    }

    fn exec_jpai(&mut self, ip: usize) -> Result<(), Fault> {
        let target = self.decode_imm16(ip)?;
        let next = self.next_ip(ip, Mnemonic::Jpai);
        self.registers
            .set(IP, if self.flags.cf && !self.flags.zf { target } else { next });
        Ok(())
    }

    /// `JPAR reg`: jumps to the raw register *id* byte, not the register's
    /// value — a fault-for-fault replica of the reference, which passes the
    /// decoded id straight into `regs[IP] = reg` instead of `regs[reg]`.
    fn exec_jpar(&mut self, ip: usize) -> Result<(), Fault> {
        let reg = self.decode_reg(ip)?;
        self.validate(reg)?;
        let next = self.next_ip(ip, Mnemonic::Jpar);
        self.registers
            .set(IP, if self.flags.cf && !self.flags.zf { reg as u16 } else { next });
        Ok(())
    }

    fn exec_jpbi(&mut self, ip: usize) -> Result<(), Fault> {
        let target = self.decode_imm16(ip)?;
        let next = self.next_ip(ip, Mnemonic::Jpbi);
        self.registers
            .set(IP, if self.flags.cf { target } else { next });
        Ok(())
    }

    fn exec_jpbr(&mut self, ip: usize) -> Result<(), Fault> {
        let reg = self.decode_reg(ip)?;
        self.validate(reg)?;
        let next = self.next_ip(ip, Mnemonic::Jpbr);
        self.registers
            .set(IP, if self.flags.cf { reg as u16 } else { next });
        Ok(())
    }

    fn exec_jpei(&mut self, ip: usize) -> Result<(), Fault> {
        let target = self.decode_imm16(ip)?;
        let next = self.next_ip(ip, Mnemonic::Jpei);
        self.registers
            .set(IP, if self.flags.zf { target } else { next });
        Ok(())
    }

    fn exec_jper(&mut self, ip: usize) -> Result<(), Fault> {
        let reg = self.decode_reg(ip)?;
        self.validate(reg)?;
        let next = self.next_ip(ip, Mnemonic::Jper);
        self.registers
            .set(IP, if self.flags.zf { reg as u16 } else { next });
        Ok(())
    }

    fn exec_jpni(&mut self, ip: usize) -> Result<(), Fault> {
        let target = self.decode_imm16(ip)?;
        let next = self.next_ip(ip, Mnemonic::Jpni);
        self.registers
            .set(IP, if self.flags.zf { next } else { target });
        Ok(())
    }

    fn exec_jpnr(&mut self, ip: usize) -> Result<(), Fault> {
        let reg = self.decode_reg(ip)?;
        self.validate(reg)?;
        let next = self.next_ip(ip, Mnemonic::Jpnr);
        self.registers
            .set(IP, if self.flags.zf { next } else { reg as u16 });
        Ok(())
    }

    // -- call / return --------------------------------------------------------

    /// `CALL target`: saves the return address in `RP` and also pushes it to
    /// the stack, then jumps. `RETN` ignores that pushed copy (see below) —
    /// only one call can be outstanding at a time, since `RP` is a single
    /// slot, not a stack, and a nested `CALL` clobbers the outer return
    /// address regardless of what's sitting on the stack underneath it.
    fn exec_call(&mut self, ip: usize) -> Result<(), Fault> {
        let target = self.decode_imm16(ip)?;
        let sp = self.registers.get(SP) as usize;
        if sp + 2 >= self.address_space.stacksize() {
            return Err(Fault::StackOverflow);
        }
        if ip + 1 + 2 >= self.address_space.codesize() {
            return Err(Fault::CodeOutOfBounds { at: ip });
        }
        let return_to = self.next_ip(ip, Mnemonic::Call);
        self.registers.set(RP, return_to);
        let bytes = return_to.to_le_bytes();
        let stack = self.address_space.stack_mut();
        stack[sp] = bytes[0];
        stack[sp + 1] = bytes[1];
        self.registers.set(SP, sp as u16 + 2);
        self.registers.set(IP, target);
        Ok(())
    }

    /// `RETN`: jumps to whatever `RP` currently holds. It drops two bytes
    /// off the stack but never reads them back into `RP` — the value `CALL`
    /// pushed there is dead weight, and a second `RETN` without an
    /// intervening `CALL` returns to the same place again.
    fn exec_retn(&mut self) -> Result<(), Fault> {
        let sp = self.registers.get(SP) as usize;
        if sp < 2 {
            return Err(Fault::StackUnderflow);
        }
        self.registers.set(SP, sp as u16 - 2);
        self.registers.set(IP, self.registers.get(RP));
        Ok(())
    }

    /// `DEBG`: no register/memory effect of its own, but pushes a status
    /// snapshot through the tracer — the same snapshot a host would get by
    /// tracing any other instruction — so a program can request one on
    /// demand instead of attaching a tracer for the whole run.
    #[cfg(feature = "diagnostic")]
    fn exec_debg(&mut self, ip: usize) -> Result<(), Fault> {
        if let Some(tracer) = &mut self.tracer {
            tracer.record(TraceStep {
                pc: ip,
                mnemonic: Mnemonic::Debg,
                registers: self.registers.snapshot(),
                flags: self.flags,
            });
        }
        Ok(())
    }
}
