//! Shared helpers for the integration tests.

use nestest::{run_tree, Registry, RunOutcome, TestContext, TestResult};
use termcolor::Buffer;

pub fn pass(_: &mut TestContext) -> TestResult {
    Ok(())
}

/// Finishes the registry, runs it, and returns the outcome with the plain-text report.
pub fn run_plain(registry: Registry) -> (RunOutcome, String) {
    let tree = registry.finish().expect("declarations are balanced");
    let mut buffer = Buffer::no_color();
    let outcome = run_tree(tree, &mut buffer).expect("report is written");
    let text = String::from_utf8(buffer.into_inner()).expect("report is utf-8");
    (outcome, text)
}

/// Report lines without the trailing tally.
pub fn body_lines(text: &str) -> Vec<&str> {
    text.lines().take_while(|line| !line.is_empty()).collect()
}
