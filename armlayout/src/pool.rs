//! The literal pool: `addpool`/`checkpool`/`flushpool`, unchanged in shape
//! from the original assembler's per-function constant pool. Constants
//! that don't fit a rotated immediate get parked here and loaded via a
//! PC-relative `LDR` once they're flushed into the instruction stream.

use crate::context::{Context, PoolEntry};
use crate::instruction::{InstrId, InstrList, Instruction};
use crate::operand::Operand;
use crate::opcode::PseudoOp;
use crate::symbol::SymbolId;

/// A flush is forced once the pool has grown this large (in bytes): beyond
/// it a `LDR`'s 12-bit PC-relative reach can no longer guarantee every
/// entry is still in range by the time layout converges.
pub const MAX_POOL_SIZE: i32 = 0xff0;

/// Queues `value` (optionally a symbol's address) for the literal pool,
/// deduplicating against an existing entry with the same value when
/// neither carries a symbol relocation -- two requests for the same
/// constant share one slot, matching `addpool`.
pub fn addpool(ctx: &mut Context, requester: InstrId, value: u32, symbol: Option<SymbolId>) {
    if symbol.is_none() {
        if let Some(existing) = ctx
            .pool
            .iter()
            .find(|e| e.symbol.is_none() && e.value == value)
        {
            let _ = existing;
            return;
        }
    }
    ctx.pool.push(PoolEntry {
        value,
        symbol,
        requester,
    });
    ctx.pool_size += 4;
    if ctx.pool.len() == 1 {
        ctx.pool_start = ctx.pc;
    }
}

/// True if the pool must be flushed before laying out the instruction at
/// `next_pc`: either it has grown past [`MAX_POOL_SIZE`], or the oldest
/// entry's PC-relative `LDR` would overflow its 12-bit displacement by the
/// time `next_pc` is reached.
pub fn checkpool(ctx: &Context, next_pc: i32) -> bool {
    if ctx.pool.is_empty() {
        return false;
    }
    if ctx.pool_size >= MAX_POOL_SIZE {
        return true;
    }
    // Leave headroom for the branch-around and any trailing instructions
    // emitted before the flush actually lands.
    (next_pc - ctx.pool_start) >= 0xffc - 8
}

/// Splices the pending pool into the instruction list directly after
/// `after`, as a branch-around followed by one `Word` pseudo-instruction
/// per entry, and patches each requester's `pcond` to point at its slot.
/// Returns the id of the last instruction spliced in (the new `after` for
/// whatever comes next), or `None` if the pool was empty.
pub fn flushpool(ctx: &mut Context, list: &mut InstrList, after: InstrId) -> Option<InstrId> {
    if ctx.pool.is_empty() {
        return None;
    }

    let entries = std::mem::take(&mut ctx.pool);
    ctx.pool_size = 0;

    // Skip over the pool's data words so a disassembler (or the CPU) never
    // tries to decode them as instructions.
    let skip_words = entries.len() as i64;
    let mut cursor = list.splice_after(
        after,
        Instruction::new(PseudoOp::B, Operand::None, Operand::Branch(
            crate::operand::BranchTarget::Pc(skip_words as i32 * 4),
        )),
    );

    for e in entries {
        let word_operand = match e.symbol {
            Some(sym) => Operand::Addr(sym),
            None => Operand::Const(e.value as i64),
        };
        let pool_id = list.splice_after(cursor, Instruction::new(PseudoOp::Word, word_operand, Operand::None));
        list.get_mut(e.requester).pcond = Some(pool_id);
        cursor = pool_id;
    }

    Some(cursor)
}
