//! Report records for an executed tree.
//!
//! The reporter does no styling. It flattens the allowed part of the tree into
//! [`ReportLine`]s in display order and counts the tally; the formatter in
//! [`crate::cli::output`] decides how they look.

use std::fmt;

use crate::errors::Origin;
use crate::tree::{SectionId, TestTree};

/// One line of the hierarchical report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportLine {
    Section {
        indent: usize,
        passed: bool,
        title: String,
        description: String,
    },
    Test {
        indent: usize,
        passed: bool,
        title: String,
        description: String,
    },
    Failure {
        indent: usize,
        description: String,
        origin: Origin,
    },
}

impl ReportLine {
    pub fn indent(&self) -> usize {
        match self {
            ReportLine::Section { indent, .. }
            | ReportLine::Test { indent, .. }
            | ReportLine::Failure { indent, .. } => *indent,
        }
    }
}

/// Allowed tests that passed, out of all allowed tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub passed: usize,
    pub total: usize,
}

impl Tally {
    pub fn all_passed(&self) -> bool {
        self.passed == self.total
    }
}

impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} out of {} tests passed.", self.passed, self.total)
    }
}

/// Everything the formatter needs to print a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub lines: Vec<ReportLine>,
    pub tally: Tally,
}

impl Report {
    /// Builds the report for a filtered and executed tree.
    pub fn build(tree: &TestTree) -> Self {
        let mut lines = Vec::new();
        collect_lines(tree, tree.root(), 0, &mut lines);
        let mut tally = Tally::default();
        count_tests(tree, tree.root(), &mut tally);
        Self { lines, tally }
    }

    pub fn failures(&self) -> impl Iterator<Item = &ReportLine> {
        self.lines
            .iter()
            .filter(|line| matches!(line, ReportLine::Failure { .. }))
    }
}

fn collect_lines(tree: &TestTree, id: SectionId, depth: usize, lines: &mut Vec<ReportLine>) {
    let section = tree.section(id);
    if !section.is_allowed_to_run {
        return;
    }

    // Root and top-level sections are printed flush left.
    let indent = depth.saturating_sub(1);
    lines.push(ReportLine::Section {
        indent,
        passed: section.passed,
        title: section.title.clone(),
        description: section.description.clone(),
    });

    for &test_id in &section.tests {
        let test = tree.test(test_id);
        if !test.is_allowed_to_run {
            continue;
        }
        lines.push(ReportLine::Test {
            indent: indent + 1,
            passed: test.passed,
            title: test.title.clone(),
            description: test.description.clone(),
        });
        lines.extend(test.failures.iter().map(|failure| ReportLine::Failure {
            indent: indent + 1,
            description: failure.description.clone(),
            origin: failure.origin,
        }));
    }

    for &child in &section.children {
        collect_lines(tree, child, depth + 1, lines);
    }
}

fn count_tests(tree: &TestTree, id: SectionId, tally: &mut Tally) {
    let section = tree.section(id);
    if !section.is_allowed_to_run {
        return;
    }
    for &child in &section.children {
        count_tests(tree, child, tally);
    }
    for &test_id in &section.tests {
        let test = tree.test(test_id);
        if !test.is_allowed_to_run {
            continue;
        }
        tally.total += 1;
        if test.passed {
            tally.passed += 1;
        }
    }
}
