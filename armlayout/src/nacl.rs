//! NaCl sandboxing constraints: 16-byte bundle alignment, masked indirect
//! branches, and the R9-is-reserved rule. Only active when
//! [`crate::context::TargetConfig::nacl`] is set; every function here is a
//! no-op query the layout driver consults, not a separate pass.

use crate::context::Context;
use crate::instruction::Instruction;
use crate::opcode::PseudoOp;
use crate::operand::{BranchTarget, Operand};
use crate::types::{Cond, RegisterId, Scond, REGSP, REG_NACL_RESERVED};

pub const BUNDLE_SIZE: i32 = 16;

/// Rounds `pc` up to the next bundle boundary.
pub const fn bundle_align(pc: i32) -> i32 {
    (pc + BUNDLE_SIZE - 1) & !(BUNDLE_SIZE - 1)
}

/// True if an instruction of `size` bytes starting at `pc` would straddle a
/// bundle boundary, and so needs NOP padding inserted before it.
pub fn crosses_bundle(pc: i32, size: i32) -> bool {
    let start_bundle = pc / BUNDLE_SIZE;
    let end_bundle = (pc + size - 1) / BUNDLE_SIZE;
    start_bundle != end_bundle
}

/// How many NOP bytes to insert before an instruction of `size` bytes at
/// `pc` so it starts on (or at least doesn't cross) a bundle boundary.
pub fn pad_for_bundle(pc: i32, size: i32) -> i32 {
    if !crosses_bundle(pc, size) {
        return 0;
    }
    bundle_align(pc) - pc
}

/// The `BIC Rt, Rt, #0xc000000f` template with its condition and both
/// register fields (`Rn`, `Rd` -- the same register on both sides) zeroed:
/// `cond<<28 | target<<16 | target<<12` OR's straight in. Clears the low 4
/// bits (bundle alignment) and the top 2 bits (the sandbox's 1GB address
/// ceiling) in a single instruction, so a hijacked target can't land
/// mid-bundle or outside the sandboxed region.
const INDIRECT_BRANCH_MASK_TEMPLATE: u32 = 0x03c0_013f;

/// If `instr` is an indirect branch (`B`/`BL` through a register target
/// rather than a PC-relative displacement), returns that target register.
pub fn indirect_branch_target(instr: &Instruction) -> Option<RegisterId> {
    if !instr.op.is_branch() {
        return None;
    }
    match instr.to {
        Operand::Branch(BranchTarget::Register(r)) => Some(r),
        _ => None,
    }
}

/// NaCl requires every indirect branch to mask its target register to
/// bundle alignment and the sandbox's address ceiling first. Builds that
/// masking instruction for `target`, carrying the same condition as the
/// branch it guards.
pub fn mask_for_indirect_branch(target: RegisterId, cond: Cond) -> Instruction {
    Instruction::new(PseudoOp::NaclMask, Operand::None, Operand::Reg(target)).with_cond(cond)
}

/// Builds the encoded word for a [`PseudoOp::NaclMask`] guarding `target`.
pub fn indirect_branch_mask_word(target: RegisterId, cond: Cond) -> u32 {
    cond.bits() | INDIRECT_BRANCH_MASK_TEMPLATE | ((target as u32) << 16) | ((target as u32) << 12)
}

/// NaCl reserves R9 as a thread-pointer register; user code may read it but
/// never write it. Records a diagnostic against `ctx` if `instr` writes R9.
pub fn check_write_guard(ctx: &mut Context, instr: &Instruction) {
    if !ctx.target.nacl {
        return;
    }
    if !instr.op.has_destination() {
        return;
    }
    if let Operand::Reg(r) = instr.to {
        if r == REG_NACL_RESERVED as RegisterId {
            ctx.diag("NaCl: write to reserved register R9");
        }
    }
}

/// Splits a stack-pointer adjustment (`ADD`/`SUB $imm, SP, SP`) larger than
/// a single rotated immediate into two halves, each independently
/// encodable, so the pointer is never left pointing somewhere a concurrent
/// signal handler could treat as valid outside the sandboxed region for
/// more than one instruction. Returns `(first, second)` deltas summing to
/// `total`, or `None` if `total` already fits one instruction.
pub fn split_sp_adjust(total: i32) -> Option<(i32, i32)> {
    if crate::immediate::imm_rot(total.unsigned_abs()).is_some() {
        return None;
    }
    let half = total / 2;
    Some((half, total - half))
}

/// If `instr` is a writeback SP-relative load/store (`MOVW.W R14,
/// -100004(R13)` and friends) under NaCl, returns its memory operand's
/// offset -- the stack-pointer delta that must be materialized by an
/// explicit `ADD`/`SUB` before the access itself runs at offset 0, rather
/// than folded into the load/store's own writeback bit. NaCl forbids SP
/// writeback on loads and stores because the window between reading the
/// old SP and committing the adjusted one is exactly the kind of
/// momentarily-invalid pointer the sandbox exists to rule out.
pub fn writeback_sp_offset(ctx: &Context, instr: &Instruction) -> Option<i32> {
    if !ctx.target.nacl || !instr.scond.contains(Scond::W) {
        return None;
    }
    let mem = match instr.op {
        PseudoOp::Ldr | PseudoOp::Ldrb | PseudoOp::Ldrh => match instr.from {
            Operand::Mem(m) => m,
            _ => return None,
        },
        PseudoOp::Str | PseudoOp::Strb | PseudoOp::Strh => match instr.to {
            Operand::Mem(m) => m,
            _ => return None,
        },
        _ => return None,
    };
    if mem.base != REGSP {
        return None;
    }
    Some(mem.offset)
}
