//! The layout driver: three passes over the instruction list, mirroring
//! `span5`'s sizing, fixed-point re-sizing, and final emission loop.
//!
//! 1. **Size + pool-drop pass** -- walk the list once, sizing every
//!    instruction and flushing the literal pool wherever [`pool::checkpool`]
//!    says it must, so later passes see the pool instructions already
//!    spliced in as real list members.
//! 2. **Fixed-point pass** -- instruction sizes can change as operand
//!    classes are re-resolved against updated PCs (a branch that was
//!    `Sbra`-reachable one iteration can drift out of range the next once
//!    an earlier flush shifts everything after it). Re-walk until no size
//!    changes, capped the same way the original bounds its `times` counter.
//! 3. **Emit pass** -- PCs are final; encode every instruction's words and
//!    relocations into its symbol's byte buffer.

use crate::context::Context;
use crate::diag::Fatal;
use crate::emit;
use crate::instruction::{InstrId, InstrList, Instruction};
use crate::nacl;
use crate::operand::{Operand, OperandClass};
use crate::opcode::PseudoOp;
use crate::pool;
use crate::symbol::Symbol;
use crate::types::{Scond, REGSP};

/// Hard cap on fixed-point re-layout iterations, the same backstop
/// `span5`'s `times < 20` guards against: a genuinely non-converging
/// layout (one where flushing a pool always pushes some other branch out
/// of range) is a caller bug, not something to loop on forever.
const MAX_FIXED_POINT_ITERATIONS: usize = 20;

/// Whether an operand class this engine assigned means "this constant or
/// address didn't fit inline and needs a literal pool slot."
fn needs_pool_entry(class: OperandClass) -> bool {
    matches!(
        class,
        OperandClass::Lcon | OperandClass::Lacon | OperandClass::Lauto | OperandClass::LconAddr
    )
}

fn pool_value_for(op: &Operand) -> (u32, Option<crate::symbol::SymbolId>) {
    match *op {
        Operand::Const(v) => (v as u32, None),
        Operand::ConstOffset(mem) => (mem.offset as u32, mem.symbol),
        Operand::Addr(sym) => (0, Some(sym)),
        Operand::Mem(mem) => (mem.offset as u32, mem.symbol),
        _ => (0, None),
    }
}

/// Runs all three passes and writes the final encoding into `sym`. Returns
/// the relocations recorded against `sym` (already present in `sym` too,
/// but returned for convenience the way [`crate::layout`]'s public entry
/// point hands them back to the caller).
pub fn run(ctx: &mut Context, list: &mut InstrList, sym: &mut Symbol) -> Result<(), Fatal> {
    size_and_drop_pool(ctx, list)?;
    log::trace!("initial size pass placed {} instructions, pc={}", list.len(), ctx.pc);

    let mut iterations = 0;
    let mut changed = false;
    loop {
        changed = resize_pass(ctx, list)?;
        iterations += 1;
        if !changed || iterations >= MAX_FIXED_POINT_ITERATIONS {
            break;
        }
    }
    if changed {
        ctx.diag(format!(
            "NaCl re-layout instability: PCs still moving after {} iterations",
            iterations
        ));
    }
    log::trace!("layout converged after {} fixed-point iterations", iterations);

    emit_pass(ctx, list, sym)
}

fn size_and_drop_pool(ctx: &mut Context, list: &mut InstrList) -> Result<(), Fatal> {
    ctx.pc = 0;
    let mut cursor = list.head();
    let mut prev: Option<InstrId> = None;
    // Guards against re-splicing a mask ahead of the same indirect branch
    // every time the loop comes back around to it (its operand shape,
    // unlike the SP-writeback case below, isn't itself mutated to record
    // that it's already guarded).
    let mut masked: std::collections::HashSet<InstrId> = std::collections::HashSet::new();

    while let Some(id) = cursor {
        // An indirect branch needs a masking instruction ahead of it, and a
        // writeback SP-relative access needs its adjustment pulled out into
        // its own instruction(s); both splice something new in before `id`
        // and restart this iteration on the spliced-in node so it gets
        // sized like any other instruction, falling through to `id` itself
        // right afterward.
        if ctx.target.nacl {
            if !masked.contains(&id) {
                if let Some(target) = nacl::indirect_branch_target(list.get(id)) {
                    masked.insert(id);
                    let cond = list.get(id).cond;
                    let mask_instr = nacl::mask_for_indirect_branch(target, cond);
                    let mask_id = match prev {
                        Some(p) => list.splice_after(p, mask_instr),
                        None => list.push_front(mask_instr),
                    };
                    cursor = Some(mask_id);
                    continue;
                }
            }

            if let Some(offset) = nacl::writeback_sp_offset(ctx, list.get(id)) {
                let cond = list.get(id).cond;
                let deltas = match nacl::split_sp_adjust(offset) {
                    Some((a, b)) => vec![a, b],
                    None => vec![offset],
                };

                let mut insert_after = prev;
                let mut first_inserted = None;
                for delta in deltas {
                    let (op, mag) = if delta < 0 { (PseudoOp::Sub, -delta) } else { (PseudoOp::Add, delta) };
                    let add_instr =
                        Instruction::new(op, Operand::Const(mag as i64), Operand::Reg(REGSP)).with_cond(cond);
                    let new_id = match insert_after {
                        Some(p) => list.splice_after(p, add_instr),
                        None => list.push_front(add_instr),
                    };
                    if first_inserted.is_none() {
                        first_inserted = Some(new_id);
                    }
                    insert_after = Some(new_id);
                }

                // The ADDs above already move SP by the full original
                // offset; the access itself now happens right there.
                let instr = list.get_mut(id);
                instr.scond = Scond(instr.scond.0 & !Scond::W.0);
                match instr.op {
                    PseudoOp::Ldr | PseudoOp::Ldrb | PseudoOp::Ldrh => {
                        if let Operand::Mem(ref mut mem) = instr.from {
                            mem.offset = 0;
                        }
                    }
                    _ => {
                        if let Operand::Mem(ref mut mem) = instr.to {
                            mem.offset = 0;
                        }
                    }
                }

                cursor = first_inserted;
                continue;
            }
        }

        let mut next = list.next(id);

        let pad = if ctx.target.nacl && !list.get(id).op.is_marker() {
            // Sized speculatively against the un-padded position; NaCl
            // bundle crossing only matters for real encodable ops.
            nacl::pad_for_bundle(ctx.pc, 4)
        } else {
            0
        };
        ctx.pc += pad;

        list.get_mut(id).pc = ctx.pc;
        let size = emit::size_of(ctx, list, id)?;
        list.get_mut(id).size = size;
        ctx.pc += size;

        if ctx.target.nacl {
            nacl::check_write_guard(ctx, list.get(id));
        }

        {
            let instr = list.get(id);
            if matches!(instr.op, PseudoOp::Mov) {
                if let Some(class) = instr.from_class {
                    if needs_pool_entry(class) {
                        let (value, symbol) = pool_value_for(&instr.from);
                        pool::addpool(ctx, id, value, symbol);
                    }
                }
            }
        }

        let mut last_id = id;
        if pool::checkpool(ctx, ctx.pc) {
            if let Some(new_tail) = flush_and_size(ctx, list, id)? {
                next = list.next(new_tail);
                last_id = new_tail;
            }
        }

        prev = Some(last_id);
        cursor = next;

        // End of list: anything still pending in the pool has nowhere
        // left to flush to but right here, the same as `span5`'s final
        // `flushpool` call once `p == nil`.
        if cursor.is_none() && !ctx.pool.is_empty() {
            flush_and_size(ctx, list, id)?;
        }
    }

    Ok(())
}

/// Flushes the pending pool after `after` and sizes every instruction the
/// flush spliced in, returning the new tail (the last pool word, or the
/// branch-around if the pool was empty).
fn flush_and_size(
    ctx: &mut Context,
    list: &mut InstrList,
    after: InstrId,
) -> Result<Option<InstrId>, Fatal> {
    let new_tail = match pool::flushpool(ctx, list, after) {
        Some(t) => t,
        None => return Ok(None),
    };
    let mut p = list.next(after);
    let mut first = true;
    while let Some(pid) = p {
        list.get_mut(pid).pc = ctx.pc;
        let size = emit::size_of(ctx, list, pid)?;
        list.get_mut(pid).size = size;

        // The branch-around's operand was stashed at splice time as a
        // byte count relative to its own start (the only thing `flushpool`
        // knew then); now that its own pc is final, rewrite it to the
        // absolute target `emit_branch` expects.
        if first {
            first = false;
            if let Operand::Branch(crate::operand::BranchTarget::Pc(rel)) = list.get(pid).to {
                let absolute = list.get(pid).pc + size + rel;
                list.get_mut(pid).to = Operand::Branch(crate::operand::BranchTarget::Pc(absolute));
            }
        }

        ctx.pc += size;
        if pid == new_tail {
            break;
        }
        p = list.next(pid);
    }
    Ok(Some(new_tail))
}

/// Re-walks the list recomputing PCs and sizes from scratch. Returns
/// whether anything moved relative to the previous pass.
fn resize_pass(ctx: &mut Context, list: &mut InstrList) -> Result<bool, Fatal> {
    ctx.pc = 0;
    let mut changed = false;
    let mut cursor = list.head();

    while let Some(id) = cursor {
        let next = list.next(id);
        let old_pc = list.get(id).pc;

        // Mirrors the padding `size_and_drop_pool` applies: without it,
        // every resize of a program straddling a bundle boundary lands 4
        // bytes short of the padded sizing pass, `changed` never settles,
        // and the fixed-point loop burns every iteration for nothing.
        let pad = if ctx.target.nacl && !list.get(id).op.is_marker() {
            nacl::pad_for_bundle(ctx.pc, 4)
        } else {
            0
        };
        ctx.pc += pad;

        list.get_mut(id).invalidate_cache();
        list.get_mut(id).pc = ctx.pc;
        let size = emit::size_of(ctx, list, id)?;
        list.get_mut(id).size = size;
        ctx.pc += size;

        if list.get(id).pc != old_pc {
            changed = true;
        }

        cursor = next;
    }

    Ok(changed)
}

/// The canonical ARM NOP (`MOV R0, R0`), used to backfill any gap a PC bump
/// leaves between two instructions' emitted bytes.
const NOP_WORD: u32 = 0xe1a0_0000;

fn emit_pass(ctx: &mut Context, list: &mut InstrList, sym: &mut Symbol) -> Result<(), Fatal> {
    let mut cursor = list.head();
    let mut expected_pc: Option<i32> = None;
    while let Some(id) = cursor {
        let next = list.next(id);

        // Force a fresh classification so `ctx.instoffset` reflects this
        // instruction's own operand, not whichever one was last resolved;
        // `oplook`'s cache would otherwise skip straight past it.
        list.get_mut(id).invalidate_cache();
        emit::size_of(ctx, list, id)?;

        let pc = list.get(id).pc;

        // A gap between the previous instruction's end and this one's start
        // (NaCl bundle padding, most commonly) is otherwise left as
        // whatever `sym`'s buffer was zero-initialized to; fill it with
        // real NOP words instead.
        if let Some(expected) = expected_pc {
            let mut gap_pc = expected;
            while gap_pc < pc {
                sym.write_word_le(gap_pc as usize, NOP_WORD);
                gap_pc += 4;
            }
        }

        let encoded = emit::emit(ctx, list, id)?;

        for (i, word) in encoded.words.iter().enumerate() {
            sym.write_word_le(pc as usize + i * 4, *word);
        }
        for reloc in encoded.relocations {
            let mut r = reloc;
            r.offset += pc as usize;
            sym.push_relocation(r);
        }

        expected_pc = Some(pc + list.get(id).size);
        cursor = next;
    }
    Ok(())
}
