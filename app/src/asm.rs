//! The `asm` subcommand: lays out a small, fixed ARM pseudo-program (no
//! assembly-source parser is in scope) and prints the resulting bytes and
//! relocation table.

use crate::cli::AsmOpts;
use crate::error::Error;
use armlayout::{
    layout, Instruction, InstrList, Operand, PseudoOp, Relocation, Symbol, SymbolId, TargetConfig,
};
use std::io::Write as _;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor as _};

/// Builds the demonstration program: load a constant too large to fit a
/// rotated immediate (forcing a literal-pool spill), add it to a register,
/// compare against zero, and branch back -- exercising the pool manager
/// and the branch-displacement path together.
fn demo_program() -> InstrList {
    let mut list = InstrList::new(SymbolId(0));

    let top = list.push(Instruction::new(PseudoOp::Mov, Operand::Const(0), Operand::Reg(0)));
    list.push(Instruction::new(
        PseudoOp::Mov,
        Operand::Const(0x1234_5678),
        Operand::Reg(1),
    ));
    list.push(Instruction::new(PseudoOp::Add, Operand::Reg(1), Operand::Reg(0)));
    list.push(Instruction::new(PseudoOp::Cmp, Operand::Const(0), Operand::Reg(0)));

    let _ = top;
    list
}

pub fn run(opts: &AsmOpts) -> Result<(), Error> {
    let target = TargetConfig {
        goarm: opts.goarm,
        nacl: opts.nacl,
    };

    let mut list = demo_program();
    let mut sym = Symbol::new();
    let diags = layout(target, &mut list, &mut sym)?;

    let mut out = StandardStream::stdout(ColorChoice::Auto);
    print_bytes(&mut out, &sym).map_err(|e| Error::new("failed to print bytes", Box::new(e)))?;
    print_relocations(&mut out, &sym).map_err(|e| Error::new("failed to print relocations", Box::new(e)))?;

    for diag in &diags {
        log::warn!("{}", diag);
    }

    Ok(())
}

fn print_bytes(out: &mut dyn WriteColor, sym: &Symbol) -> std::io::Result<()> {
    let mut header = ColorSpec::new();
    header.set_fg(Some(Color::Cyan)).set_bold(true);
    out.set_color(&header)?;
    writeln!(out, "bytes ({} total):", sym.size())?;
    out.set_color(&ColorSpec::new())?;

    for (i, chunk) in sym.bytes().chunks(4).enumerate() {
        let mut addr_color = ColorSpec::new();
        addr_color.set_fg(Some(Color::Blue));
        out.set_color(&addr_color)?;
        write!(out, "{:6x}:  ", i * 4)?;
        out.set_color(&ColorSpec::new())?;
        for byte in chunk {
            write!(out, "{:02x} ", byte)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn print_relocations(out: &mut dyn WriteColor, sym: &Symbol) -> std::io::Result<()> {
    if sym.relocations().is_empty() {
        return Ok(());
    }

    let mut header = ColorSpec::new();
    header.set_fg(Some(Color::Cyan)).set_bold(true);
    out.set_color(&header)?;
    writeln!(out, "relocations:")?;
    out.set_color(&ColorSpec::new())?;

    for reloc in sym.relocations() {
        writeln!(out, "  {}", format_relocation(reloc))?;
    }
    Ok(())
}

fn format_relocation(reloc: &Relocation) -> String {
    format!(
        "offset={:#x} size={} target={:?} addend={} kind={:?}",
        reloc.offset, reloc.size, reloc.target, reloc.addend, reloc.kind
    )
}
