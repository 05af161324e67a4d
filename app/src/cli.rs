use clap::Clap;
use termcolor::ColorChoice;

#[derive(Clap)]
#[clap(name = "armqr", version = env!("CARGO_PKG_VERSION"), author = "Adolph C.")]
pub struct Opts {
    /// Sets the log level: (default)=+warning, 0=+info, 1=+debug, 2=+trace.
    /// The `quiet` flag turns off logging completely.
    #[clap(short, long, parse(from_occurrences))]
    pub verbose: u32,

    /// Disables logging.
    #[clap(short, long)]
    pub quiet: bool,

    /// Coloring: auto, always, or never.
    #[clap(long = "color", default_value = "auto", parse(try_from_str = parse_colorchoice))]
    pub color_choice: ColorChoice,

    #[clap(subcommand)]
    pub subcmd: SubOpts,
}

impl Opts {
    pub fn log_level_filter(&self) -> log::LevelFilter {
        use log::LevelFilter;

        if self.quiet {
            return LevelFilter::Off;
        }

        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

pub fn parse_colorchoice(s: &str) -> Result<ColorChoice, String> {
    if s.eq_ignore_ascii_case("auto") {
        Ok(ColorChoice::Auto)
    } else if s.eq_ignore_ascii_case("always") {
        Ok(ColorChoice::Always)
    } else if s.eq_ignore_ascii_case("never") {
        Ok(ColorChoice::Never)
    } else {
        Err(format!("{} is not a valid color value", s))
    }
}

#[derive(Clap)]
pub enum SubOpts {
    /// Lay out a small built-in ARM pseudo-program and print its bytes and
    /// relocation table. Takes no input; there is no assembly-source parser
    /// here, only the layout engine driving a fixed demonstration sequence.
    Asm(AsmOpts),
    /// Encode text into a QR code and print it as a pixel grid.
    Qr(QrOpts),
}

#[derive(Clap)]
pub struct AsmOpts {
    /// Target ARM architecture revision (affects VFP float-immediate
    /// availability).
    #[clap(long, default_value = "7")]
    pub goarm: u8,

    /// Apply NaCl sandboxing constraints (bundle alignment, R9 write-guard,
    /// indirect-branch masking) while laying the program out.
    #[clap(long)]
    pub nacl: bool,
}

#[derive(Clap)]
pub struct QrOpts {
    /// Text to encode. Validated against the numeric/alphanumeric alphabet
    /// when `--mode` requests one of those; falls back to byte mode content
    /// that doesn't need validating.
    pub text: String,

    /// Error-correction level: l, m, q, or h.
    #[clap(short, long, default_value = "m", parse(try_from_str = parse_level))]
    pub level: qrgen::Level,

    /// Symbol version, 1-40. 0 auto-picks the smallest version the content
    /// fits in at the requested level.
    #[clap(long, default_value = "0")]
    pub version: u8,

    /// Mask pattern, 0-7. -1 auto-selects the lowest-penalty mask.
    #[clap(long, default_value = "-1", allow_hyphen_values = true)]
    pub mask: i8,

    /// Content mode: num, alpha, or bytes. Defaults to picking the
    /// narrowest mode the text is legal for.
    #[clap(long)]
    pub mode: Option<String>,
}

fn parse_level(s: &str) -> Result<qrgen::Level, String> {
    match s.to_ascii_lowercase().as_str() {
        "l" => Ok(qrgen::Level::L),
        "m" => Ok(qrgen::Level::M),
        "q" => Ok(qrgen::Level::Q),
        "h" => Ok(qrgen::Level::H),
        _ => Err(format!("{} is not a valid level (expected l, m, q, or h)", s)),
    }
}
