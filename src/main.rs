//! # mirrorsync CLI
//!
//! Binary entry point for the `mirrorsync` command-line tool. It parses the
//! arguments with `clap`, runs the sync, and maps the result to an exit code.
//! The sync logic itself lives in the library crate.

mod cli;
mod commands;

use clap::Parser;
use std::process::ExitCode;

use mirrorsync::exit_codes;

fn main() -> ExitCode {
    let cli = match cli::Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // --help and --version come through here too
            return ExitCode::from(if e.use_stderr() {
                exit_codes::USAGE
            } else {
                exit_codes::SUCCESS
            });
        }
    };
    match cli.execute() {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_codes::FAILURE)
        }
    }
}
