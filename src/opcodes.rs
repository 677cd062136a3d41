//! The opcode descriptor table and the RC4-style key schedule that assigns
//! each mnemonic its per-VM byte value.

/// A VM mnemonic. Variant order here has no bearing on the encoded byte
/// value — that's assigned per-instance by [`permutation`] — but it does
/// fix `NUM_OPS` and is used as the stable identifier for diagnostics and
/// tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Mnemonic {
    Movi,
    Movr,
    Lodi,
    Lodr,
    Stri,
    Strr,
    Addi,
    Addr,
    Subi,
    Subr,
    Andb,
    Andw,
    Andr,
    Yorb,
    Yorw,
    Yorr,
    Xorb,
    Xorw,
    Xorr,
    Notr,
    Muli,
    Mulr,
    Divi,
    Divr,
    Shli,
    Shlr,
    Shri,
    Shrr,
    Push,
    Poop,
    Cmpb,
    Cmpw,
    Cmpr,
    Jmpi,
    Jmpr,
    Jpai,
    Jpar,
    Jpbi,
    Jpbr,
    Jpei,
    Jper,
    Jpni,
    Jpnr,
    Call,
    Retn,
    Shit,
    Nope,
    Grmn,
    #[cfg(feature = "diagnostic")]
    Debg,
}

#[cfg(not(feature = "diagnostic"))]
pub const NUM_OPS: usize = 48;
#[cfg(feature = "diagnostic")]
pub const NUM_OPS: usize = 49;

#[cfg(not(feature = "diagnostic"))]
const ALL: [Mnemonic; NUM_OPS] = {
    use Mnemonic::*;
    [
        Movi, Movr, Lodi, Lodr, Stri, Strr, Addi, Addr, Subi, Subr, Andb, Andw, Andr, Yorb, Yorw,
        Yorr, Xorb, Xorw, Xorr, Notr, Muli, Mulr, Divi, Divr, Shli, Shlr, Shri, Shrr, Push, Poop,
        Cmpb, Cmpw, Cmpr, Jmpi, Jmpr, Jpai, Jpar, Jpbi, Jpbr, Jpei, Jper, Jpni, Jpnr, Call, Retn,
        Shit, Nope, Grmn,
    ]
};

#[cfg(feature = "diagnostic")]
const ALL: [Mnemonic; NUM_OPS] = {
    use Mnemonic::*;
    [
        Movi, Movr, Lodi, Lodr, Stri, Strr, Addi, Addr, Subi, Subr, Andb, Andw, Andr, Yorb, Yorw,
        Yorr, Xorb, Xorw, Xorr, Notr, Muli, Mulr, Divi, Divr, Shli, Shlr, Shri, Shrr, Push, Poop,
        Cmpb, Cmpw, Cmpr, Jmpi, Jmpr, Jpai, Jpar, Jpbi, Jpbr, Jpei, Jper, Jpni, Jpnr, Call, Retn,
        Shit, Nope, Grmn, Debg,
    ]
};

impl Mnemonic {
    pub fn name(self) -> &'static str {
        match self {
            Mnemonic::Movi => "MOVI",
            Mnemonic::Movr => "MOVR",
            Mnemonic::Lodi => "LODI",
            Mnemonic::Lodr => "LODR",
            Mnemonic::Stri => "STRI",
            Mnemonic::Strr => "STRR",
            Mnemonic::Addi => "ADDI",
            Mnemonic::Addr => "ADDR",
            Mnemonic::Subi => "SUBI",
            Mnemonic::Subr => "SUBR",
            Mnemonic::Andb => "ANDB",
            Mnemonic::Andw => "ANDW",
            Mnemonic::Andr => "ANDR",
            Mnemonic::Yorb => "YORB",
            Mnemonic::Yorw => "YORW",
            Mnemonic::Yorr => "YORR",
            Mnemonic::Xorb => "XORB",
            Mnemonic::Xorw => "XORW",
            Mnemonic::Xorr => "XORR",
            Mnemonic::Notr => "NOTR",
            Mnemonic::Muli => "MULI",
            Mnemonic::Mulr => "MULR",
            Mnemonic::Divi => "DIVI",
            Mnemonic::Divr => "DIVR",
            Mnemonic::Shli => "SHLI",
            Mnemonic::Shlr => "SHLR",
            Mnemonic::Shri => "SHRI",
            Mnemonic::Shrr => "SHRR",
            Mnemonic::Push => "PUSH",
            Mnemonic::Poop => "POOP",
            Mnemonic::Cmpb => "CMPB",
            Mnemonic::Cmpw => "CMPW",
            Mnemonic::Cmpr => "CMPR",
            Mnemonic::Jmpi => "JMPI",
            Mnemonic::Jmpr => "JMPR",
            Mnemonic::Jpai => "JPAI",
            Mnemonic::Jpar => "JPAR",
            Mnemonic::Jpbi => "JPBI",
            Mnemonic::Jpbr => "JPBR",
            Mnemonic::Jpei => "JPEI",
            Mnemonic::Jper => "JPER",
            Mnemonic::Jpni => "JPNI",
            Mnemonic::Jpnr => "JPNR",
            Mnemonic::Call => "CALL",
            Mnemonic::Retn => "RETN",
            Mnemonic::Shit => "SHIT",
            Mnemonic::Nope => "NOPE",
            Mnemonic::Grmn => "GRMN",
            #[cfg(feature = "diagnostic")]
            Mnemonic::Debg => "DEBG",
        }
    }

    /// Total encoded size in bytes, opcode byte included.
    pub fn length(self) -> u8 {
        use Mnemonic::*;
        match self {
            Movi | Lodi | Stri | Addi | Subi | Andw | Yorw | Xorw | Muli | Divi | Shli | Shri
            | Cmpw => 4,
            Movr | Lodr | Strr | Addr | Subr | Andr | Yorr | Xorr | Notr | Mulr | Divr | Shlr
            | Shrr | Cmpr => 2,
            Andb | Yorb | Xorb | Cmpb => 3,
            Push | Poop | Jmpr | Jpar | Jpbr | Jper | Jpnr => 2,
            Jmpi | Jpai | Jpbi | Jpei | Jpni | Call => 3,
            Retn | Shit | Nope | Grmn => 1,
            #[cfg(feature = "diagnostic")]
            Debg => 1,
        }
    }

    /// True iff the execution loop must not auto-advance `IP` after this
    /// handler runs — the handler sets `IP` itself on every path, including
    /// the not-taken branch of conditional jumps.
    pub fn is_jump(self) -> bool {
        use Mnemonic::*;
        matches!(
            self,
            Jmpi | Jmpr | Jpai | Jpar | Jpbi | Jpbr | Jpei | Jper | Jpni | Jpnr | Call | Retn
        )
    }
}

/// One entry of the opcode table: a mnemonic plus the per-VM byte value it
/// was assigned by the key schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpDescriptor {
    pub mnemonic: Mnemonic,
    pub value: u8,
    pub length: u8,
    pub is_jump: bool,
}

/// The full, per-VM-instance opcode table: `NUM_OPS` descriptors whose
/// `value` fields come from [`permutation`].
#[derive(Debug, Clone)]
pub struct OpcodeTable {
    entries: [OpDescriptor; NUM_OPS],
}

impl OpcodeTable {
    /// Builds the table for `key`, assigning `entries[i].value = S[i]` from
    /// the RC4 key schedule over `key`.
    pub fn new(key: &[u8]) -> Self {
        let s = permutation(key);
        let mut entries = [OpDescriptor {
            mnemonic: ALL[0],
            value: 0,
            length: ALL[0].length(),
            is_jump: ALL[0].is_jump(),
        }; NUM_OPS];
        for (i, mnemonic) in ALL.into_iter().enumerate() {
            entries[i] = OpDescriptor {
                mnemonic,
                value: s[i],
                length: mnemonic.length(),
                is_jump: mnemonic.is_jump(),
            };
        }
        Self { entries }
    }

    pub fn entries(&self) -> &[OpDescriptor] {
        &self.entries
    }

    /// Linear scan for the descriptor whose `value` matches the fetched
    /// opcode byte, mirroring the reference's fetch step exactly (including
    /// its cost: this is `O(NUM_OPS)`, not a jump table, because opcode
    /// values aren't known until construction).
    pub fn find(&self, byte: u8) -> Option<&OpDescriptor> {
        self.entries.iter().find(|d| d.value == byte)
    }

    /// Encoded byte for `mnemonic` in this table. The surface an external
    /// assembler needs to emit bytecode matching this VM's permutation.
    pub fn encoded_byte(&self, mnemonic: Mnemonic) -> u8 {
        self.entries
            .iter()
            .find(|d| d.mnemonic == mnemonic)
            .expect("every Mnemonic has exactly one table entry")
            .value
    }
}

/// RC4-style key-scheduling algorithm over a 256-entry permutation, seeded
/// with the identity. `key` is treated as null-terminated: only the bytes
/// before the first `0x00` participate (if there are none, a single zero
/// byte is used instead of dividing by zero).
pub fn permutation(key: &[u8]) -> [u8; 256] {
    let keysize = key.iter().position(|&b| b == 0).unwrap_or(key.len());
    let key: &[u8] = if keysize == 0 { &[0] } else { &key[..keysize] };

    let mut s = [0u8; 256];
    for (i, slot) in s.iter_mut().enumerate() {
        *slot = i as u8;
    }
    let mut j: usize = 0;
    for i in 0..256 {
        j = (j + s[i] as usize + key[i % key.len()] as usize) % 256;
        s.swap(i, j);
    }
    s
}
