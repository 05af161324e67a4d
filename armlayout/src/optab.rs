//! The opcode table and its lookup engine: a sorted table of legal
//! `(op, from-class, to-class)` combinations, a hash-keyed fast path for
//! exact matches (`opcross`), and a linear class-compatibility scan
//! (`xcmp`) for everything the fast path misses. Mirrors `oplook_asm5`:
//! the original caches the winning row on the instruction itself
//! (`p.optab`) so repeated passes over the fixed-point loop don't re-scan.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::context::Context;
use crate::instruction::{InstrId, InstrList};
use crate::operand::{classify, compatible, OperandClass};
use crate::opcode::PseudoOp;

/// One legal instruction shape: an opcode paired with the operand classes
/// its `from` and `to` fields (and optional extra register) must be
/// compatible with.
#[derive(Debug, Clone, Copy)]
pub struct OpEntry {
    pub op: PseudoOp,
    pub from: OperandClass,
    pub to: OperandClass,
    /// Encoded instruction size in bytes. Every row in this table emits a
    /// single 4-byte ARM word; `Case` additionally emits its jump table, but
    /// that's sized separately from the table entries on the dispatch
    /// instruction itself.
    pub size: i32,
}

macro_rules! row {
    ($op:expr, $from:expr, $to:expr) => {
        OpEntry {
            op: $op,
            from: $from,
            to: $to,
            size: 4,
        }
    };
}

/// The legal shapes this engine accepts, grouped by opcode. Order doesn't
/// matter for correctness (the fast path is a hash lookup and the fallback
/// scan checks every row) but keeping related rows together mirrors how
/// `optab` reads in the original source.
static TABLE: &[OpEntry] = &[
    row!(PseudoOp::Mov, OperandClass::Reg, OperandClass::Reg),
    row!(PseudoOp::Mov, OperandClass::Shift, OperandClass::Reg),
    row!(PseudoOp::Mov, OperandClass::Rcon, OperandClass::Reg),
    row!(PseudoOp::Mov, OperandClass::Ncon, OperandClass::Reg),
    row!(PseudoOp::Mov, OperandClass::Lcon, OperandClass::Reg),
    row!(PseudoOp::Mvn, OperandClass::Reg, OperandClass::Reg),
    row!(PseudoOp::Mvn, OperandClass::Rcon, OperandClass::Reg),
    row!(PseudoOp::Mvn, OperandClass::Ncon, OperandClass::Reg),
    row!(PseudoOp::Mvn, OperandClass::Lcon, OperandClass::Reg),
    row!(PseudoOp::Add, OperandClass::Reg, OperandClass::Reg),
    row!(PseudoOp::Add, OperandClass::Shift, OperandClass::Reg),
    row!(PseudoOp::Add, OperandClass::Rcon, OperandClass::Reg),
    row!(PseudoOp::Sub, OperandClass::Reg, OperandClass::Reg),
    row!(PseudoOp::Sub, OperandClass::Shift, OperandClass::Reg),
    row!(PseudoOp::Sub, OperandClass::Rcon, OperandClass::Reg),
    row!(PseudoOp::And, OperandClass::Reg, OperandClass::Reg),
    row!(PseudoOp::And, OperandClass::Rcon, OperandClass::Reg),
    row!(PseudoOp::Orr, OperandClass::Reg, OperandClass::Reg),
    row!(PseudoOp::Orr, OperandClass::Rcon, OperandClass::Reg),
    row!(PseudoOp::Eor, OperandClass::Reg, OperandClass::Reg),
    row!(PseudoOp::Eor, OperandClass::Rcon, OperandClass::Reg),
    row!(PseudoOp::Cmp, OperandClass::Reg, OperandClass::Reg),
    row!(PseudoOp::Cmp, OperandClass::Rcon, OperandClass::Reg),
    row!(PseudoOp::Teq, OperandClass::Reg, OperandClass::Reg),
    row!(PseudoOp::Teq, OperandClass::Rcon, OperandClass::Reg),
    row!(PseudoOp::B, OperandClass::None, OperandClass::Sbra),
    row!(PseudoOp::Bl, OperandClass::None, OperandClass::Sbra),
    row!(PseudoOp::Ldr, OperandClass::Soreg, OperandClass::Reg),
    row!(PseudoOp::Ldr, OperandClass::Roreg, OperandClass::Reg),
    row!(PseudoOp::Ldr, OperandClass::Sauto, OperandClass::Reg),
    row!(PseudoOp::Ldr, OperandClass::Lauto, OperandClass::Reg),
    row!(PseudoOp::Ldr, OperandClass::Addr, OperandClass::Reg),
    row!(PseudoOp::Ldr, OperandClass::LconAddr, OperandClass::Reg),
    row!(PseudoOp::Str, OperandClass::Reg, OperandClass::Soreg),
    row!(PseudoOp::Str, OperandClass::Reg, OperandClass::Roreg),
    row!(PseudoOp::Str, OperandClass::Reg, OperandClass::Sauto),
    row!(PseudoOp::Str, OperandClass::Reg, OperandClass::Lauto),
    row!(PseudoOp::Ldrb, OperandClass::Soreg, OperandClass::Reg),
    row!(PseudoOp::Ldrb, OperandClass::Sauto, OperandClass::Reg),
    row!(PseudoOp::Strb, OperandClass::Reg, OperandClass::Soreg),
    row!(PseudoOp::Strb, OperandClass::Reg, OperandClass::Sauto),
    row!(PseudoOp::Ldrh, OperandClass::Hforeg, OperandClass::Reg),
    row!(PseudoOp::Ldrh, OperandClass::Hfauto, OperandClass::Reg),
    row!(PseudoOp::Strh, OperandClass::Reg, OperandClass::Hforeg),
    row!(PseudoOp::Strh, OperandClass::Reg, OperandClass::Hfauto),
    row!(PseudoOp::Case, OperandClass::Reg, OperandClass::None),
    row!(PseudoOp::Word, OperandClass::Lcon, OperandClass::None),
    row!(PseudoOp::Word, OperandClass::Addr, OperandClass::None),
    row!(PseudoOp::Nop, OperandClass::None, OperandClass::None),
];

/// `opcross`: exact `(op, from, to)` triples mapped straight to their row
/// index, checked before falling back to the compatibility scan.
static OPCROSS: Lazy<HashMap<(PseudoOp, OperandClass, OperandClass), usize>> = Lazy::new(|| {
    let mut m = HashMap::with_capacity(TABLE.len());
    for (i, e) in TABLE.iter().enumerate() {
        m.entry((e.op, e.from, e.to)).or_insert(i);
    }
    m
});

/// Resolves `instr`'s table row, caching the result on the instruction so a
/// second pass over the same list (the fixed-point re-layout loop) skips
/// straight to it. An operand combination no row accepts is a malformed-input
/// diagnostic, not a fatal error, matching `oplook_asm5`: it calls
/// `ctxt.diag` and falls back to `optab[0]` so layout keeps going and the
/// caller sees every diagnostic in one pass, rather than aborting on the
/// first illegal combination.
pub fn oplook(ctx: &mut Context, list: &mut InstrList, id: InstrId) -> usize {
    if let Some(idx) = list.get(id).optab_index {
        return idx;
    }

    let (op, from, to) = {
        let instr = list.get(id);
        (instr.op, instr.from, instr.to)
    };

    let from_class = classify(ctx, &from);
    let to_class = classify(ctx, &to);

    {
        let instr = list.get_mut(id);
        instr.from_class = Some(from_class);
        instr.to_class = Some(to_class);
    }

    if let Some(&idx) = OPCROSS.get(&(op, from_class, to_class)) {
        list.get_mut(id).optab_index = Some(idx);
        return idx;
    }

    for (idx, entry) in TABLE.iter().enumerate() {
        if entry.op != op {
            continue;
        }
        if compatible(entry.from, from_class) && compatible(entry.to, to_class) {
            list.get_mut(id).optab_index = Some(idx);
            return idx;
        }
    }

    ctx.diag(format!(
        "illegal combination {:?} {:?}/{:?}",
        op, from_class, to_class
    ));
    list.get_mut(id).optab_index = Some(0);
    0
}

pub fn entry(idx: usize) -> &'static OpEntry {
    &TABLE[idx]
}
