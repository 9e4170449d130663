//! Nestest Error Handling
//!
//! Two very different kinds of failure exist in a test run:
//!
//! - **Assertion failures** are expected, user-level outcomes. They never leave
//!   the engine: they are recorded as [`FailureMessage`]s on the test that
//!   produced them and signalled to the body through [`Abort`].
//! - **Usage errors** are programmer mistakes in declaration code (unbalanced
//!   sections). They are [`NestError`]s, returned as `Err` from declaration
//!   functions and from [`crate::Harness::run`], and are fatal: no test runs
//!   once one was raised.

use std::fmt;
use std::panic::Location;

use miette::Diagnostic;
use thiserror::Error;

// ============================================================================
// SOURCE ORIGIN - Where an assertion or declaration came from
// ============================================================================

/// Source location captured with `#[track_caller]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Origin {
    pub file: &'static str,
    pub line: u32,
    pub column: u32,
}

impl Origin {
    /// Location of the caller of the enclosing `#[track_caller]` function.
    #[track_caller]
    pub fn caller() -> Self {
        Self::from(Location::caller())
    }
}

impl From<&'static Location<'static>> for Origin {
    fn from(location: &'static Location<'static>) -> Self {
        Self {
            file: location.file(),
            line: location.line(),
            column: location.column(),
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

// ============================================================================
// ASSERTION FAILURES - Recorded per test, never propagated past the body
// ============================================================================

/// One recorded assertion failure: what went wrong and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureMessage {
    pub description: String,
    pub origin: Origin,
}

impl FailureMessage {
    pub fn new(description: impl Into<String>, origin: Origin) -> Self {
        Self {
            description: description.into(),
            origin,
        }
    }
}

impl fmt::Display for FailureMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failed: {} ({})", self.description, self.origin)
    }
}

/// Signal that the current test body must stop.
///
/// Produced only by the assertion primitives on [`crate::TestContext`] after
/// they have recorded a failure. The body returns it with `?` and the engine
/// catches it at the single place that invokes bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Abort;

impl fmt::Display for Abort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("test body aborted by a failed assertion")
    }
}

impl std::error::Error for Abort {}

/// What a test body returns.
pub type TestResult = Result<(), Abort>;

// ============================================================================
// USAGE ERRORS - Fatal declaration-time mistakes
// ============================================================================

/// Type-safe classification of [`NestError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorType {
    /// Unbalanced section begin/end in declaration code.
    Usage,
    /// The report could not be written.
    Output,
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::Usage => "Usage",
            ErrorType::Output => "Output",
        }
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unified error type for everything that can stop a run.
#[derive(Debug, Error, Diagnostic)]
pub enum NestError {
    #[error("Usage error: section end at {origin} has no matching section begin")]
    #[diagnostic(
        code(nestest::usage::unbalanced_section_end),
        help("every `end_section` must close a section opened by `begin_section`; the root section can never be closed")
    )]
    UnbalancedSectionEnd { origin: Origin },

    #[error("Usage error: section '{title}' was never closed{}", unit_suffix(.unit))]
    #[diagnostic(
        code(nestest::usage::unclosed_section),
        help("add the missing `end_section` call, or declare the section with `Registry::section`")
    )]
    UnclosedSection { title: String, unit: Option<String> },

    #[error("Output error: failed to write the report")]
    #[diagnostic(code(nestest::output))]
    Output(#[from] std::io::Error),
}

fn unit_suffix(unit: &Option<String>) -> String {
    match unit {
        Some(name) => format!(" by declaration unit '{}'", name),
        None => String::new(),
    }
}

impl NestError {
    pub fn error_type(&self) -> ErrorType {
        match self {
            NestError::UnbalancedSectionEnd { .. } | NestError::UnclosedSection { .. } => {
                ErrorType::Usage
            }
            NestError::Output(_) => ErrorType::Output,
        }
    }

    /// Whether this error is a declaration-time programmer mistake.
    pub fn is_usage(&self) -> bool {
        self.error_type() == ErrorType::Usage
    }
}
