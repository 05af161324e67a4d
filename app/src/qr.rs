//! The `qr` subcommand: encodes text into a QR [`qrgen::Code`] and prints
//! it as a pixel grid, two characters per module so it renders roughly
//! square in a terminal.

use crate::cli::QrOpts;
use crate::error::Error;
use qrgen::{Encoding, Mask, Plan, Version};
use std::io::Write as _;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor as _};

pub fn run(opts: &QrOpts) -> Result<(), Error> {
    let encoding = pick_encoding(opts);

    let version = if opts.version == 0 {
        smallest_fitting_version(opts.level, &encoding)?
    } else {
        Version(opts.version)
    };

    let mask = if opts.mask < 0 {
        auto_mask(version, opts.level, &encoding)?
    } else {
        Mask(opts.mask as u8)
    };

    let plan = Plan::new(version, opts.level, mask)?;
    let code = plan.encode(std::slice::from_ref(&encoding))?;

    log::info!(
        "version={} level={:?} mask={} size={}",
        version.0,
        opts.level,
        mask.0,
        code.size()
    );

    let mut out = StandardStream::stdout(ColorChoice::Auto);
    print_grid(&mut out, &code).map_err(|e| Error::new("failed to print grid", Box::new(e)))?;
    Ok(())
}

fn pick_encoding(opts: &QrOpts) -> Encoding {
    match opts.mode.as_deref() {
        Some("num") => Encoding::Num(opts.text.clone()),
        Some("alpha") => Encoding::Alpha(opts.text.clone()),
        Some("bytes") => Encoding::Bytes(opts.text.clone().into_bytes()),
        Some(other) => {
            log::warn!("unknown mode `{}`, falling back to auto-detection", other);
            auto_mode(&opts.text)
        }
        None => auto_mode(&opts.text),
    }
}

/// Picks the narrowest mode `text` is legal for: numeric, then
/// alphanumeric, then byte.
fn auto_mode(text: &str) -> Encoding {
    let num = Encoding::Num(text.to_string());
    if num.check().is_ok() {
        return num;
    }
    let alpha = Encoding::Alpha(text.to_string());
    if alpha.check().is_ok() {
        return alpha;
    }
    Encoding::Bytes(text.as_bytes().to_vec())
}

fn smallest_fitting_version(level: qrgen::Level, encoding: &Encoding) -> Result<Version, Error> {
    for v in 1..=40u8 {
        let version = Version(v);
        let plan = Plan::new(version, level, Mask(0))?;
        if encoding.bits(version) <= (plan.data_bytes() * 8) as u32 {
            return Ok(version);
        }
    }
    Err(Error::msg("content is too large for any QR version at the requested level"))
}

/// Tries the content against all eight masks and picks the one
/// `qrgen::auto_select`'s penalty heuristic scores lowest, matching what a
/// real QR encoder does instead of leaving the choice to the caller.
fn auto_mask(version: Version, level: qrgen::Level, encoding: &Encoding) -> Result<Mask, Error> {
    let codes: Vec<qrgen::Code> = Mask::all()
        .map(|m| Plan::new(version, level, m).and_then(|p| p.encode(std::slice::from_ref(encoding))))
        .collect::<Result<_, _>>()?;
    let size = codes[0].size();

    Ok(qrgen::auto_select(size, |mask, row, col| {
        codes[mask.0 as usize].pixel(row, col).is_black()
    }))
}

fn print_grid(out: &mut dyn WriteColor, code: &qrgen::Code) -> std::io::Result<()> {
    let size = code.size();
    let quiet = 2;
    let row_width = ((size + quiet * 2) * 2) as usize;

    let mut black = ColorSpec::new();
    black.set_fg(Some(Color::Black)).set_bg(Some(Color::White));
    let normal = ColorSpec::new();

    for _ in 0..quiet {
        out.set_color(&normal)?;
        writeln!(out, "{}", " ".repeat(row_width))?;
    }

    for row in 0..size {
        out.set_color(&normal)?;
        write!(out, "{}", "  ".repeat(quiet as usize))?;
        for col in 0..size {
            if code.pixel(row, col).is_black() {
                out.set_color(&black)?;
                write!(out, "  ")?;
                out.set_color(&normal)?;
            } else {
                write!(out, "  ")?;
            }
        }
        writeln!(out, "{}", "  ".repeat(quiet as usize))?;
    }

    for _ in 0..quiet {
        writeln!(out, "{}", " ".repeat(row_width))?;
    }

    Ok(())
}
