//! Nestest: a hierarchical test-declaration and execution engine.
//!
//! Tests are declared into a tree of named sections through a [`Registry`],
//! filtered by only-markers, executed depth first with inherited
//! before-each/after-each hooks, and reported as an indented pass/fail listing
//! with a final tally.

pub use crate::engine::RunSummary;
pub use crate::errors::{Abort, ErrorType, FailureMessage, NestError, Origin, TestResult};
pub use crate::filter::FilterMode;
pub use crate::harness::{run_tree, ColorMode, Harness, RunConfig, RunOutcome};
pub use crate::registry::{DeclarationUnit, DeclareFn, Registry};
pub use crate::report::{Report, ReportLine, Tally};
pub use crate::sink::TestContext;
pub use crate::tree::{Section, SectionId, TestCase, TestId, TestTree};

pub mod cli;
pub mod engine;
pub mod errors;
pub mod filter;
pub mod harness;
pub mod registry;
pub mod report;
pub mod sink;
pub mod tree;
