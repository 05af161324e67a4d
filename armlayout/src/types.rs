//! Narrow integer aliases shared across the layout engine, mirroring the
//! width-tagged types the original linker threads through its `Addr`/`Prog`
//! structures.

/// A 32-bit ARM machine word.
pub type Word = u32;

/// Register number 0..=15 (R0..R14 plus R15 == PC).
pub type RegisterId = u8;

/// R13 is the conventional stack pointer.
pub const REGSP: RegisterId = 13;
/// R14 holds the link (return) address.
pub const REGLINK: RegisterId = 14;
/// R15 is the hardware program counter.
pub const REGPC: RegisterId = 15;
/// R9 is reserved for the NaCl sandbox base and may not be written directly.
pub const REG_NACL_RESERVED: RegisterId = 9;

/// Condition code occupying the top 4 bits of every conditional ARM word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Cond {
    Eq = 0x0,
    Ne = 0x1,
    Cs = 0x2,
    Cc = 0x3,
    Mi = 0x4,
    Pl = 0x5,
    Vs = 0x6,
    Vc = 0x7,
    Hi = 0x8,
    Ls = 0x9,
    Ge = 0xa,
    Lt = 0xb,
    Gt = 0xc,
    Le = 0xd,
    Al = 0xe,
}

impl Default for Cond {
    fn default() -> Self {
        Cond::Al
    }
}

impl Cond {
    pub const fn bits(self) -> u32 {
        (self as u32) << 28
    }
}

/// The `.S`/`.P`/`.U`/`.W` suffix bits that ride along with a condition code:
/// set-flags, pre-index, up (positive offset), writeback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Scond(pub u8);

impl Scond {
    pub const NONE: Scond = Scond(0);
    pub const S: Scond = Scond(1 << 0);
    pub const P: Scond = Scond(1 << 1);
    pub const U: Scond = Scond(1 << 2);
    pub const W: Scond = Scond(1 << 3);

    pub fn contains(self, other: Scond) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for Scond {
    type Output = Scond;
    fn bitor(self, rhs: Scond) -> Scond {
        Scond(self.0 | rhs.0)
    }
}

impl std::ops::BitAnd for Scond {
    type Output = Scond;
    fn bitand(self, rhs: Scond) -> Scond {
        Scond(self.0 & rhs.0)
    }
}
