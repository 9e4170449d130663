//! Defines the command-line arguments for the `nestest` binary.
//!
//! This module uses the `clap` crate with its "derive" feature to create a
//! declarative and type-safe argument parsing structure.

use clap::Parser;

use crate::harness::{ColorMode, RunConfig};

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "nestest",
    version,
    about = "Runs the built-in sample suite of sections, hooks and only-filtered tests."
)]
pub struct NestArgs {
    /// When to color the report.
    #[arg(long, value_enum, default_value_t = ColorMode::Auto)]
    pub color: ColorMode,

    /// Log filter for diagnostics written to stderr (e.g. `warn`, `debug`, `nestest=trace`).
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

impl NestArgs {
    pub fn run_config(&self) -> RunConfig {
        RunConfig { color: self.color }
    }
}
