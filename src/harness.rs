//! Nestest Harness
//!
//! Drives one complete run:
//! 1. **Declaration**: run every [`DeclarationUnit`] in the order it was added
//! 2. **Filtering**: compute which nodes are allowed to run
//! 3. **Execution**: run hooks and bodies depth first
//! 4. **Reporting**: build report records and the tally
//! 5. **Output**: write the styled report
//!
//! A usage error in step 1 stops the run before any test executes.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use nestest::{Harness, NestError, Registry, RunConfig};
//!
//! fn arithmetic(r: &mut Registry) -> Result<(), NestError> {
//!     r.test("Addition", "adds", |ctx| ctx.ensure_eq(1 + 1, 2, "sum"));
//!     Ok(())
//! }
//!
//! let outcome = Harness::new()
//!     .unit("arithmetic", arithmetic)
//!     .run(&RunConfig::default())
//!     .expect("declarations are balanced");
//! std::process::exit(outcome.exit_code());
//! ```

use termcolor::{ColorChoice, StandardStream, WriteColor};
use tracing::{debug, info};

use crate::cli::output::TextFormatter;
use crate::engine::{self, RunSummary};
use crate::errors::NestError;
use crate::filter::{self, FilterMode};
use crate::registry::{DeclarationUnit, DeclareFn, Registry};
use crate::report::Report;
use crate::tree::TestTree;

// =============================================================================
// CONFIGURATION
// =============================================================================

/// When to color the report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ColorMode {
    /// Color when standard output is a terminal.
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorMode {
    pub fn color_choice(self) -> ColorChoice {
        match self {
            ColorMode::Auto if atty::is(atty::Stream::Stdout) => ColorChoice::Auto,
            ColorMode::Auto => ColorChoice::Never,
            ColorMode::Always => ColorChoice::Always,
            ColorMode::Never => ColorChoice::Never,
        }
    }
}

/// Configuration for running and reporting.
#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    pub color: ColorMode,
}

// =============================================================================
// OUTCOME
// =============================================================================

/// Everything a finished run produced.
#[derive(Debug)]
pub struct RunOutcome {
    pub mode: FilterMode,
    pub summary: RunSummary,
    pub report: Report,
    pub tree: TestTree,
}

impl RunOutcome {
    pub fn all_passed(&self) -> bool {
        self.summary.all_passed()
    }

    /// Process exit code: 0 when every allowed test passed, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.all_passed() {
            0
        } else {
            1
        }
    }
}

// =============================================================================
// HARNESS
// =============================================================================

/// Ordered collection of declaration units, run exactly once.
#[derive(Debug, Default)]
pub struct Harness {
    units: Vec<DeclarationUnit>,
}

impl Harness {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a unit; units run in the order they were added.
    pub fn unit(mut self, name: &'static str, declare: DeclareFn) -> Self {
        self.units.push(DeclarationUnit::new(name, declare));
        self
    }

    pub fn units(mut self, units: impl IntoIterator<Item = DeclarationUnit>) -> Self {
        self.units.extend(units);
        self
    }

    /// Runs every unit against a fresh registry and returns the finished tree.
    pub fn declare(&self) -> Result<TestTree, NestError> {
        let mut registry = Registry::new();
        for unit in &self.units {
            unit.apply(&mut registry)?;
        }
        registry.finish()
    }

    /// Runs the whole pipeline and prints the report on standard output.
    pub fn run(self, config: &RunConfig) -> Result<RunOutcome, NestError> {
        let mut stdout = StandardStream::stdout(config.color.color_choice());
        self.run_to(&mut stdout)
    }

    /// Runs the whole pipeline, writing the report to `out`.
    pub fn run_to<W: WriteColor>(self, out: W) -> Result<RunOutcome, NestError> {
        info!(units = self.units.len(), "declaring tests");
        let tree = self.declare()?;
        run_tree(tree, out)
    }
}

/// Filters, executes and reports an already declared tree.
pub fn run_tree<W: WriteColor>(mut tree: TestTree, out: W) -> Result<RunOutcome, NestError> {
    let mode = filter::apply(&mut tree);
    if mode == FilterMode::Only {
        info!("only-marked tests found; running the marked subset");
    }
    let summary = engine::run(&mut tree);
    let report = Report::build(&tree);
    debug!(lines = report.lines.len(), "report built");

    let mut formatter = TextFormatter::new(out);
    formatter.write_report(&report)?;

    Ok(RunOutcome {
        mode,
        summary,
        report,
        tree,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use termcolor::Buffer;

    fn first(r: &mut Registry) -> Result<(), NestError> {
        r.test("First", "declared first", |_| Ok(()));
        Ok(())
    }

    fn second(r: &mut Registry) -> Result<(), NestError> {
        r.section("Second", "declared second", |r| {
            r.test("Inner", "", |ctx| ctx.ensure(false, "expected true"));
            Ok(())
        })?;
        Ok(())
    }

    fn unbalanced(r: &mut Registry) -> Result<(), NestError> {
        r.end_section()?;
        Ok(())
    }

    #[test]
    fn units_run_in_insertion_order() {
        let tree = Harness::new()
            .unit("second", second)
            .unit("first", first)
            .declare()
            .unwrap();
        let root = tree.section(tree.root());
        assert_eq!(tree.section(root.children[0]).title, "Second");
        assert_eq!(tree.test(root.tests[0]).title, "First");
    }

    #[test]
    fn usage_error_aborts_before_any_test_runs() {
        let result = Harness::new()
            .unit("first", first)
            .unit("unbalanced", unbalanced)
            .run_to(Buffer::no_color());
        let err = result.unwrap_err();
        assert!(err.is_usage());
    }

    #[test]
    fn exit_code_follows_zero_means_success() {
        let failing = Harness::new()
            .unit("first", first)
            .unit("second", second)
            .run_to(Buffer::no_color())
            .unwrap();
        assert_eq!(failing.summary, RunSummary { passed: 1, total: 2 });
        assert_eq!(failing.exit_code(), 1);
        assert_eq!(failing.mode, FilterMode::RunAll);

        let passing = Harness::new()
            .unit("first", first)
            .run_to(Buffer::no_color())
            .unwrap();
        assert_eq!(passing.exit_code(), 0);
    }

    #[test]
    fn never_color_mode_disables_color() {
        assert_eq!(ColorMode::Never.color_choice(), ColorChoice::Never);
        assert_eq!(ColorMode::Always.color_choice(), ColorChoice::Always);
    }
}
