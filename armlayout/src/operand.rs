//! The addressing classifier: maps an [`Operand`] to one of ~30
//! [`OperandClass`] tags, the same job `aclass` does in the original
//! assembler.

use crate::context::Context;
use crate::immediate;
use crate::symbol::SymbolId;
use crate::types::RegisterId;

/// Which name-scope a memory operand's offset is relative to. `Auto` and
/// `Param` offsets get biased by the current function's frame size
/// (`ctx.autosize`) before classification, matching local-variable and
/// incoming-parameter addressing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// A plain `offset(base)` with no frame relationship.
    None,
    /// A local variable slot: `offset+autosize(base)`.
    Auto,
    /// An incoming parameter slot: `offset+autosize+4(base)`.
    Param,
    /// A reference to an external symbol's address.
    Extern,
    /// A reference to a file-local symbol's address.
    Static,
}

/// A register-relative memory operand, `offset(base)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemOperand {
    pub base: RegisterId,
    pub offset: i32,
    pub scope: Scope,
    pub symbol: Option<SymbolId>,
}

/// A branch target: a fixed pc (patched in once the destination instruction
/// has been laid out), a reference to another symbol, or a register holding
/// the target address (an indirect branch -- under NaCl, the layout driver
/// requires one of these be preceded by a masking instruction, see
/// [`crate::nacl::indirect_branch_target`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchTarget {
    Pc(i32),
    Symbol(SymbolId),
    Register(RegisterId),
}

/// A classified instruction operand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operand {
    None,
    Reg(RegisterId),
    RegPair(RegisterId, RegisterId),
    RegPairWide(RegisterId, RegisterId),
    Shift(RegisterId, u8),
    FReg(u8),
    Psr,
    /// A bare immediate constant with no symbol attached.
    Const(i64),
    /// `$off(base)`: an immediate computed from a register-relative offset,
    /// used by arithmetic pseudo-ops that take a symbolic constant operand.
    ConstOffset(MemOperand),
    /// The address of a symbol (`$sym(SB)`), not a dereference.
    Addr(SymbolId),
    /// A dereferenced memory operand (load/store source or destination).
    Mem(MemOperand),
    Branch(BranchTarget),
    ConstFloat(f64),
}

/// One of the ~30 operand classes the opcode table is indexed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum OperandClass {
    None = 0,
    Reg,
    RegReg,
    RegReg2,
    Shift,
    FReg,
    Fcr,
    Psr,
    Rcon,
    Ncon,
    Lcon,
    Racon,
    Lacon,
    Addr,
    LconAddr,
    Sroreg,
    Roreg,
    Horeg,
    Foreg,
    Hforeg,
    Soreg,
    Loreg,
    Sauto,
    Lauto,
    Fauto,
    Hauto,
    Hfauto,
    Sbra,
    Zfcon,
    Sfcon,
    Lfcon,
    /// Unclassifiable; the lookup step will surface "illegal combination".
    Gok,
}

pub const NUM_CLASSES: usize = OperandClass::Gok as usize + 1;

impl OperandClass {
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Classifies `operand`, stashing the resolved byte offset (after any
/// frame-size bias) into `ctx.instoffset` for the emitter to reuse, exactly
/// as the original classifier leaves `ctxt->instoffset` behind for `asmout`.
pub fn classify(ctx: &mut Context, operand: &Operand) -> OperandClass {
    use OperandClass as C;
    match *operand {
        Operand::None => C::None,
        Operand::Reg(_) => C::Reg,
        Operand::RegPair(..) => C::RegReg,
        Operand::RegPairWide(..) => C::RegReg2,
        Operand::Shift(..) => C::Shift,
        Operand::FReg(_) => C::FReg,
        Operand::Psr => C::Psr,
        Operand::Addr(_) => C::Addr,
        Operand::Branch(_) => C::Sbra,

        Operand::Const(v) => {
            ctx.instoffset = v as i32;
            if immediate::imm_rot(v as u32).is_some() {
                C::Rcon
            } else if immediate::imm_rot((!v) as u32).is_some() {
                C::Ncon
            } else {
                C::Lcon
            }
        }

        Operand::ConstFloat(v) => {
            if immediate::chip_zero(v) {
                C::Zfcon
            } else if immediate::chip_float(v).is_some() {
                C::Sfcon
            } else {
                C::Lfcon
            }
        }

        Operand::ConstOffset(mem) => match mem.scope {
            Scope::Extern | Scope::Static => {
                ctx.instoffset = 0;
                if mem.symbol.is_some() {
                    C::LconAddr
                } else {
                    C::Gok
                }
            }
            Scope::Auto => {
                ctx.instoffset = ctx.autosize + mem.offset;
                aconsize(ctx)
            }
            Scope::Param => {
                ctx.instoffset = ctx.autosize + mem.offset + 4;
                aconsize(ctx)
            }
            Scope::None => {
                ctx.instoffset = mem.offset;
                aconsize(ctx)
            }
        },

        Operand::Mem(mem) => classify_mem(ctx, mem),
    }
}

fn aconsize(ctx: &mut Context) -> OperandClass {
    if immediate::imm_rot(ctx.instoffset as u32).is_some() {
        OperandClass::Racon
    } else {
        OperandClass::Lacon
    }
}

fn classify_mem(ctx: &mut Context, mem: MemOperand) -> OperandClass {
    use OperandClass as C;
    match mem.scope {
        Scope::Extern | Scope::Static => {
            ctx.instoffset = 0;
            if mem.symbol.is_some() {
                C::Addr
            } else {
                C::Gok
            }
        }
        Scope::Auto => {
            ctx.instoffset = ctx.autosize + mem.offset;
            classify_offset(ctx.instoffset, true)
        }
        Scope::Param => {
            ctx.instoffset = ctx.autosize + mem.offset + 4;
            classify_offset(ctx.instoffset, true)
        }
        Scope::None => {
            ctx.instoffset = mem.offset;
            classify_offset(ctx.instoffset, false)
        }
    }
}

/// Shared tail of `aclass`'s `D_AUTO`/`D_PARAM`/plain-`D_OREG` cases: same
/// range tests, different class names depending on whether this is a frame
/// slot (`is_auto`) or a bare register-offset operand.
fn classify_offset(off: i32, is_auto: bool) -> OperandClass {
    use OperandClass as C;

    if immediate::imm_addr(off).is_none() {
        if !is_auto && immediate::imm_rot(off as u32).is_some() {
            return C::Roreg;
        }
        return if is_auto { C::Lauto } else { C::Loreg };
    }

    if immediate::imm_half(off).is_some() {
        return match (is_auto, immediate::imm_float(off)) {
            (true, true) => C::Hfauto,
            (true, false) => C::Hauto,
            (false, true) => C::Hforeg,
            (false, false) => C::Horeg,
        };
    }

    if immediate::imm_float(off) {
        return if is_auto { C::Fauto } else { C::Foreg };
    }

    if is_auto {
        return C::Sauto;
    }

    if immediate::imm_rot(off as u32).is_some() {
        return C::Sroreg;
    }

    C::Soreg
}

/// The class-compatibility predicate used by [`crate::optab`]'s linear
/// fallback scan: does an opcode table slot constrained to class `want`
/// accept an operand actually classified as `have`?
pub fn compatible(want: OperandClass, have: OperandClass) -> bool {
    use OperandClass as C;

    if want == have {
        return true;
    }

    match want {
        C::Lcon => matches!(have, C::Rcon | C::Ncon),
        C::Lacon => have == C::Racon,
        C::Lfcon => matches!(have, C::Zfcon | C::Sfcon),
        C::Hfauto => matches!(have, C::Hauto | C::Fauto),
        C::Sauto => compatible(C::Hfauto, have),
        C::Lauto => compatible(C::Sauto, have),
        C::Hforeg => matches!(have, C::Horeg | C::Foreg),
        C::Sroreg => compatible(C::Soreg, have) || compatible(C::Roreg, have),
        C::Roreg => have == C::Sroreg || compatible(C::Hforeg, have),
        C::Loreg => compatible(C::Sroreg, have),
        _ => false,
    }
}
