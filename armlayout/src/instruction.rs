//! The instruction list: an arena of [`Instruction`] records threaded by
//! integer next-indices, standing in for the original's singly linked
//! `*Prog` chain (`splice` becomes swapping `next` fields -- no raw
//! pointers, no cyclic ownership).

use crate::operand::{Operand, OperandClass};
use crate::opcode::PseudoOp;
use crate::symbol::SymbolId;
use crate::types::{Cond, RegisterId, Scond};

/// Index into an [`InstrList`]'s arena.
pub type InstrId = usize;

#[derive(Debug, Clone)]
pub struct Instruction {
    pub op: PseudoOp,
    pub cond: Cond,
    pub scond: Scond,
    pub from: Operand,
    pub to: Operand,
    /// The "extra" register some three-operand forms carry (`op Rm, Rn,
    /// Rd`'s middle register, or a jump-table base for `CASE`).
    pub reg: Option<RegisterId>,
    pub line: Option<u32>,

    /// Filled in by the layout driver.
    pub pc: i32,
    pub size: i32,

    /// Cached operand classes, set the first time this instruction is
    /// classified so repeated lookups are O(1).
    pub(crate) from_class: Option<OperandClass>,
    pub(crate) to_class: Option<OperandClass>,
    /// Cached winning index into the opcode table.
    pub(crate) optab_index: Option<usize>,

    /// A back-pointer to whatever this instruction's PC-relative field
    /// resolves against: a branch's target instruction, or a literal pool
    /// entry's requesting instruction. Set once, read only during emission.
    pub pcond: Option<InstrId>,

    next: Option<InstrId>,
}

impl Instruction {
    pub fn new(op: PseudoOp, from: Operand, to: Operand) -> Self {
        Instruction {
            op,
            cond: Cond::Al,
            scond: Scond::NONE,
            from,
            to,
            reg: None,
            line: None,
            pc: 0,
            size: 0,
            from_class: None,
            to_class: None,
            optab_index: None,
            pcond: None,
            next: None,
        }
    }

    pub fn with_reg(mut self, reg: RegisterId) -> Self {
        self.reg = Some(reg);
        self
    }

    pub fn with_cond(mut self, cond: Cond) -> Self {
        self.cond = cond;
        self
    }

    pub fn with_scond(mut self, scond: Scond) -> Self {
        self.scond = scond;
        self
    }

    /// Resets the classification cache. Used by the fixed-point pass when
    /// an operand's resolved offset may have changed.
    pub fn invalidate_cache(&mut self) {
        self.from_class = None;
        self.to_class = None;
        self.optab_index = None;
    }
}

/// An arena-backed singly linked instruction list, owned by one output
/// symbol.
#[derive(Debug, Default)]
pub struct InstrList {
    arena: Vec<Instruction>,
    head: Option<InstrId>,
    symbol: Option<SymbolId>,
}

impl InstrList {
    pub fn new(symbol: SymbolId) -> Self {
        InstrList {
            arena: Vec::new(),
            head: None,
            symbol: Some(symbol),
        }
    }

    pub fn symbol(&self) -> Option<SymbolId> {
        self.symbol
    }

    pub fn head(&self) -> Option<InstrId> {
        self.head
    }

    pub fn get(&self, id: InstrId) -> &Instruction {
        &self.arena[id]
    }

    pub fn get_mut(&mut self, id: InstrId) -> &mut Instruction {
        &mut self.arena[id]
    }

    pub fn next(&self, id: InstrId) -> Option<InstrId> {
        self.arena[id].next
    }

    /// Appends `instr` to the end of the list, building it up from a plain
    /// `Vec` the same way a parser would push instructions one at a time.
    pub fn push(&mut self, instr: Instruction) -> InstrId {
        let id = self.arena.len();
        self.arena.push(instr);
        if self.head.is_none() {
            self.head = Some(id);
        } else {
            let mut tail = self.head.unwrap();
            while let Some(next) = self.arena[tail].next {
                tail = next;
            }
            self.arena[tail].next = Some(id);
        }
        id
    }

    /// Inserts `new_instr` before everything else in the list, returning its
    /// id. Used when a pass needs to splice something in ahead of the very
    /// first instruction (a NaCl guard on a list that opens with an
    /// indirect branch or an SP writeback), where there's no preceding node
    /// to `splice_after`.
    pub fn push_front(&mut self, new_instr: Instruction) -> InstrId {
        let id = self.arena.len();
        self.arena.push(new_instr);
        self.arena[id].next = self.head;
        self.head = Some(id);
        id
    }

    /// Splices `new_instr` in directly after `after`, returning its id.
    /// Used to insert literal-pool entries into the code stream without
    /// shifting anything else.
    pub fn splice_after(&mut self, after: InstrId, new_instr: Instruction) -> InstrId {
        let id = self.arena.len();
        let rest = self.arena[after].next;
        self.arena.push(new_instr);
        self.arena[id].next = rest;
        self.arena[after].next = Some(id);
        id
    }

    /// Splices an entire chain (`first..=last`, already linked to each
    /// other) in directly after `after`.
    pub fn splice_chain_after(&mut self, after: InstrId, first: InstrId, last: InstrId) {
        let rest = self.arena[after].next;
        self.arena[after].next = Some(first);
        self.arena[last].next = rest;
    }

    pub fn iter(&self) -> InstrIter<'_> {
        InstrIter {
            list: self,
            cur: self.head,
        }
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }
}

pub struct InstrIter<'a> {
    list: &'a InstrList,
    cur: Option<InstrId>,
}

impl<'a> Iterator for InstrIter<'a> {
    type Item = (InstrId, &'a Instruction);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.cur?;
        self.cur = self.list.arena[id].next;
        Some((id, &self.list.arena[id]))
    }
}
