//! artcache - save, find and expire timestamped cache artifacts
//!
//! Thin binary over the library: parses arguments, sets up logging and runs
//! one cache command.

use std::io::{self, IsTerminal};
use std::process;

use clap::Parser;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use artcache::cli::{execute, Cli, CliError};

/// Exit code when `retrieve` finds nothing actual
const EXIT_MISS: i32 = 1;

/// Exit code for errors
const EXIT_ERROR: i32 = 2;

fn init_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let layer = fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .with_ansi(io::stderr().is_terminal());

    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();
}

fn run(cli: &Cli) -> Result<bool, CliError> {
    let mut index = cli.open_index()?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    execute(&mut index, &cli.command, &mut out)
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match run(&cli) {
        Ok(true) => {}
        Ok(false) => process::exit(EXIT_MISS),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(EXIT_ERROR);
        }
    }
}
