//! CLI argument parsing, logging setup and command dispatch

use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;
use std::fs::OpenOptions;
use std::path::PathBuf;

use crate::commands;
use mirrorsync::filesystem::expand_home;

/// Mirror and update the git repositories declared in a cgit repos file
#[derive(Parser, Debug)]
#[command(name = "mirrorsync")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    sync: commands::sync::SyncArgs,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Verbosity, can be repeated (-v info, -vv debug, -vvv everything)
    #[arg(short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Set log level explicitly (off, error, warn, info, debug, trace)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<LevelFilter>,

    /// Write logs to this file instead of stderr
    #[arg(short, long, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

impl Cli {
    /// Execute the CLI command, returning the process exit code
    pub fn execute(self) -> Result<u8> {
        self.init_logging()?;
        commands::sync::execute(self.sync, &self.color)
    }

    fn init_logging(&self) -> Result<()> {
        let mut builder = env_logger::Builder::from_env(
            env_logger::Env::default().default_filter_or(LevelFilter::Warn.as_str()),
        );

        match (self.log_level, self.verbose) {
            (Some(level), _) => {
                builder.filter_level(level);
            }
            (None, 0) => {}
            (None, 1) => {
                builder.filter_module(env!("CARGO_CRATE_NAME"), LevelFilter::Info);
            }
            (None, 2) => {
                builder.filter_module(env!("CARGO_CRATE_NAME"), LevelFilter::Debug);
            }
            (None, _) => {
                builder.filter_level(LevelFilter::Trace);
            }
        }

        builder.format_timestamp(None).format_target(false);

        if let Some(path) = &self.log_file {
            let path = expand_home(path);
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("Cannot open log file {}", path.display()))?;
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }

        // A logger may already be installed when running under a test harness
        let _ = builder.try_init();
        Ok(())
    }
}
