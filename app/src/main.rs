mod asm;
mod cli;
mod error;
mod logging;
mod qr;

use clap::Clap as _;
use cli::{Opts, SubOpts};
use error::Error;
use logging::AppLogger;
use std::error::Error as StdError;
use termcolor::ColorChoice;

fn main() {
    log::set_logger(AppLogger::init()).expect("failed to set logger");

    let opts = Opts::parse();
    unsafe { AppLogger::instance().set_level(opts.log_level_filter()) };
    unsafe {
        let choice = match opts.color_choice {
            ColorChoice::Auto if atty::is(atty::Stream::Stdout) => ColorChoice::Always,
            ColorChoice::Auto => ColorChoice::Never,
            choice => choice,
        };
        AppLogger::instance().set_color_choice(choice);
    }

    if let Err(err) = run(&opts) {
        log::error!("{}", err);
        let mut source: &dyn StdError = &err;
        while let Some(cause) = source.source() {
            log::error!("  caused by: {}", cause);
            source = cause;
        }
        log::logger().flush();
        std::process::exit(1);
    }
    log::logger().flush();
}

fn run(opts: &Opts) -> Result<(), Error> {
    match &opts.subcmd {
        SubOpts::Asm(asm_opts) => asm::run(asm_opts),
        SubOpts::Qr(qr_opts) => qr::run(qr_opts),
    }
}
