#![allow(clippy::print_stderr)]

use anyhow::Result;
use clap::Parser;
use std::io::{IsTerminal, Write};

use tla_cli::args::CliArgs;
use tla_cli::driver::{self, DriverOptions};
use tla_cli::reporter::Reporter;

fn main() -> Result<()> {
    // Initialize tracing if TLA_LOG or RUST_LOG is set.
    tla_cli::tracing_config::init_tracing();

    let args = CliArgs::parse();
    let options = DriverOptions::from_args(&args)?;

    if args.list {
        let mut stdout = std::io::stdout().lock();
        for input in driver::eligible_inputs(&options)? {
            writeln!(stdout, "{}", input.id())?;
        }
        return Ok(());
    }

    let summary = driver::run(&options)?;

    if args.stdout {
        let mut stdout = std::io::stdout().lock();
        for file in &summary.files {
            if let Some(code) = &file.code {
                write!(stdout, "{code}")?;
                if !code.ends_with('\n') {
                    writeln!(stdout)?;
                }
            }
        }
    }

    let reporter = Reporter::new(std::io::stderr().is_terminal()).verbose(args.verbose);
    eprintln!("{}", reporter.render(&summary));

    Ok(())
}
