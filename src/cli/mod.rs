//! The Nestest Command-Line Interface.
//!
//! Parses arguments, installs the log subscriber, runs the sample suite and
//! maps the outcome to a process exit code:
//!
//! - `0`: every allowed test passed
//! - `1`: at least one allowed test failed
//! - `2`: a usage error stopped the run before any test executed

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::args::NestArgs;
use crate::errors::NestError;
use crate::harness::Harness;

pub mod args;
pub mod output;
pub mod sample;

/// Exit code for runs stopped by a [`NestError`].
pub const USAGE_ERROR_EXIT_CODE: i32 = 2;

/// The main entry point for the CLI. Returns the process exit code.
pub fn run() -> i32 {
    let args = NestArgs::parse();
    init_logging(&args.log_level);

    let harness = Harness::new().units(sample::units());
    match harness.run(&args.run_config()) {
        Ok(outcome) => outcome.exit_code(),
        Err(e) => {
            print_error(e);
            USAGE_ERROR_EXIT_CODE
        }
    }
}

/// Installs a stderr subscriber so log output never mixes with the report.
fn init_logging(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|e| {
        eprintln!("Invalid log filter '{}': {}", filter, e);
        EnvFilter::new("warn")
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Renders an error with miette's diagnostic handler.
pub fn print_error(error: NestError) {
    eprintln!("{:?}", miette::Report::new(error));
}
