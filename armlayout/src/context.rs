//! Layout-wide mutable state threaded through a single run: the current
//! program counter, the literal pool, the active function's frame size, and
//! the diagnostics sink. Stands in for the original's `Ctxt` + per-function
//! globals (`autosize`, `instoffset`, `pool`) bundled into one struct
//! instead of package-level mutable statics.

use crate::diag::Diagnostic;
use crate::instruction::InstrId;
use crate::symbol::SymbolId;

/// A single literal pool entry: a 32-bit constant (or symbol address) that
/// still needs a slot written into the instruction stream and the
/// requesting instruction patched to point at it.
#[derive(Debug, Clone, Copy)]
pub struct PoolEntry {
    pub value: u32,
    pub symbol: Option<SymbolId>,
    /// The instruction whose `Mem`/`ConstOffset` operand asked for this
    /// constant; its offset gets patched once the pool entry's own address
    /// is known.
    pub requester: InstrId,
}

/// Target configuration that changes which encodings are legal: the ARM
/// architecture revision (affects VFP float-immediate availability) and
/// whether NaCl's sandboxing constraints apply.
#[derive(Debug, Clone, Copy)]
pub struct TargetConfig {
    pub goarm: u8,
    pub nacl: bool,
}

impl Default for TargetConfig {
    fn default() -> Self {
        TargetConfig {
            goarm: 7,
            nacl: false,
        }
    }
}

/// Mutable layout state for one function body. A fresh `Context` is used
/// per symbol being laid out; nothing here survives across symbols except
/// by being explicitly carried over.
pub struct Context {
    pub target: TargetConfig,

    /// Byte offset of the current instruction from the start of its
    /// symbol. Updated by the layout driver between passes.
    pub pc: i32,

    /// The side-channel the classifier leaves a resolved operand offset in
    /// for the emitter to pick back up, mirroring `ctxt->instoffset`.
    pub instoffset: i32,

    /// Current function's stack frame size, used to bias `Auto`/`Param`
    /// operand offsets during classification.
    pub autosize: i32,

    /// Pending literal pool entries not yet flushed into the instruction
    /// stream.
    pub pool: Vec<PoolEntry>,
    /// Running byte size of the pending pool, used by `checkpool` to decide
    /// when a flush is mandatory.
    pub pool_size: i32,
    /// PC of the earliest instruction that referenced the current pool
    /// contents; once `pc - pool_start` approaches the 12-bit PC-relative
    /// reach, the pool must flush before this distance overflows.
    pub pool_start: i32,

    pub diagnostics: Vec<Diagnostic>,
}

impl Context {
    pub fn new(target: TargetConfig) -> Self {
        Context {
            target,
            pc: 0,
            instoffset: 0,
            autosize: 0,
            pool: Vec::new(),
            pool_size: 0,
            pool_start: 0,
            diagnostics: Vec::new(),
        }
    }

    pub fn diag(&mut self, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::new(message));
    }

    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}
