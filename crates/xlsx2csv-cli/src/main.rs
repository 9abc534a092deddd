//! xlsx2csv CLI - write the active sheet of a workbook as CSV
//!
//! Prints `OK` on success. Any failure prints a single `ERROR:` line to
//! stderr and exits with status 1.

use anyhow::{Context, Result};
use clap::Parser;
use log::debug;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

const USAGE: &str = "Usage: xlsx2csv <input.xlsx> <output.csv>";

#[derive(Parser, Debug)]
#[command(name = "xlsx2csv", disable_help_flag = true, disable_version_flag = true)]
struct Cli {
    /// Input workbook (xlsx, xlsm)
    input: PathBuf,

    /// Output CSV file, replaced if it exists
    output: PathBuf,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(_) => {
            eprintln!("{}", USAGE);
            return ExitCode::FAILURE;
        }
    };

    // Errors only unless RUST_LOG says otherwise
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("error")).init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let stats = xlsx2csv::convert(&cli.input, &cli.output)?;
    debug!(
        "wrote {} rows x {} columns from sheet '{}' to '{}'",
        stats.rows,
        stats.columns,
        stats.sheet_name,
        cli.output.display()
    );

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "OK").context("Failed to write to stdout")?;
    stdout.flush().context("Failed to write to stdout")?;
    Ok(())
}
