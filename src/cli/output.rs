//! Handles all user-facing output for a run.
//!
//! The reporter produces plain [`ReportLine`] records; this module is the only
//! place that knows about labels, indentation markers and colors. Everything is
//! written through `termcolor::WriteColor`, so the same code drives a colored
//! terminal and an uncolored in-memory buffer.

use std::io::{self, Write};

use termcolor::{Color, ColorSpec, WriteColor};

use crate::report::{Report, ReportLine};

// ============================================================================
// LABELS
// ============================================================================

pub const SECTION_LABEL: &str = "[--------] ";
pub const PASSED_LABEL: &str = "[   ok   ] ";
pub const FAILED_LABEL: &str = "[ FAILED ] ";
pub const ASSERT_LABEL: &str = "[ ASSERT ] ";

/// Marker repeated once per indentation level.
pub const INDENT_MARKER: &str = "|--";

// ============================================================================
// TEXT FORMATTER
// ============================================================================

/// Writes a [`Report`] as indented, optionally colored text.
pub struct TextFormatter<W> {
    out: W,
}

impl<W: WriteColor> TextFormatter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Writes every line of the report followed by the tally.
    pub fn write_report(&mut self, report: &Report) -> io::Result<()> {
        for line in &report.lines {
            self.write_line(line)?;
        }
        writeln!(self.out)?;
        writeln!(self.out)?;
        writeln!(self.out, "{}", report.tally)?;
        self.out.flush()
    }

    fn write_line(&mut self, line: &ReportLine) -> io::Result<()> {
        let indent = INDENT_MARKER.repeat(line.indent());
        match line {
            ReportLine::Section {
                passed,
                title,
                description,
                ..
            } => {
                self.out.set_color(ColorSpec::new().set_fg(Some(status_color(*passed))))?;
                write!(self.out, "{}", SECTION_LABEL)?;
                self.out.reset()?;
                self.out.set_color(ColorSpec::new().set_bold(true))?;
                write!(self.out, "{}{}", indent, titled(title, description))?;
                self.out.reset()?;
                writeln!(self.out)
            }
            ReportLine::Test {
                passed: true,
                title,
                description,
                ..
            } => {
                self.out
                    .set_color(ColorSpec::new().set_fg(Some(Color::Green)).set_bold(true))?;
                write!(self.out, "{}", PASSED_LABEL)?;
                self.out.reset()?;
                writeln!(self.out, "{}{}", indent, titled(title, description))
            }
            ReportLine::Test {
                passed: false,
                title,
                description,
                ..
            } => {
                self.out
                    .set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true))?;
                write!(self.out, "{}", FAILED_LABEL)?;
                self.out.set_color(ColorSpec::new().set_fg(Some(Color::Red)))?;
                write!(self.out, "{}{}", indent, titled(title, description))?;
                self.out.reset()?;
                writeln!(self.out)
            }
            ReportLine::Failure {
                description,
                origin,
                ..
            } => {
                self.out.set_color(ColorSpec::new().set_fg(Some(Color::Red)))?;
                write!(
                    self.out,
                    "{}{}Failed: {} ({})",
                    ASSERT_LABEL, indent, description, origin
                )?;
                self.out.reset()?;
                writeln!(self.out)
            }
        }
    }
}

/// `title: description`, or just the title when there is no description.
fn titled(title: &str, description: &str) -> String {
    if description.is_empty() {
        title.to_string()
    } else {
        format!("{}: {}", title, description)
    }
}

fn status_color(passed: bool) -> Color {
    if passed {
        Color::Green
    } else {
        Color::Red
    }
}
