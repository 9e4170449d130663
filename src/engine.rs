//! Nestest Execution Engine
//!
//! Walks a filtered [`TestTree`] depth first, tests before subsections, in
//! declaration order. For every allowed test it runs:
//!
//! 1. the before-each hooks of the sections on the current path, outermost
//!    first;
//! 2. the body, with the run's [`TestContext`];
//! 3. the after-each hooks, innermost first;
//!
//! then drains the sink into the test's failure list.
//!
//! If a before-each hook panics, the remaining before-each hooks and the body
//! are skipped, and only sections whose before-each completed are torn down.
//!
//! A failed assertion stops only the body that raised it. A panic in a body or
//! hook is caught here and recorded as a failure of the current test; the run
//! always continues.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::{debug, debug_span, trace, warn};

use crate::errors::{Abort, Origin};
use crate::sink::TestContext;
use crate::tree::{SectionId, TestId, TestTree};

/// Tally of allowed tests after a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub passed: usize,
    pub total: usize,
}

impl RunSummary {
    pub fn failed(&self) -> usize {
        self.total - self.passed
    }

    pub fn all_passed(&self) -> bool {
        self.passed == self.total
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HookKind {
    BeforeEach,
    AfterEach,
}

impl HookKind {
    fn label(self) -> &'static str {
        match self {
            HookKind::BeforeEach => "before-each",
            HookKind::AfterEach => "after-each",
        }
    }
}

/// Executes every allowed test of `tree` and returns the tally.
///
/// Results of a previous run are discarded first. The tree must already have
/// been through [`crate::filter::apply`]; nodes that were never allowed do
/// not run.
pub fn run(tree: &mut TestTree) -> RunSummary {
    tree.reset_results();
    let mut engine = Engine::default();
    let root = tree.root();
    engine.run_section(tree, root);
    debug!(
        passed = engine.summary.passed,
        total = engine.summary.total,
        "run finished"
    );
    engine.summary
}

#[derive(Default)]
struct Engine {
    sink: TestContext,
    /// Sections from the root down to the one being executed.
    path: Vec<SectionId>,
    summary: RunSummary,
}

impl Engine {
    fn run_section(&mut self, tree: &mut TestTree, id: SectionId) -> bool {
        if !tree.section(id).is_allowed_to_run {
            return true;
        }
        let span = debug_span!("section", title = %tree.section(id).title);
        let _guard = span.enter();

        self.path.push(id);
        let mut passed = true;

        let tests = tree.section(id).tests.clone();
        for test in tests {
            if tree.test(test).is_allowed_to_run {
                passed &= self.run_test(tree, test);
            }
        }

        let children = tree.section(id).children.clone();
        for child in children {
            passed &= self.run_section(tree, child);
        }

        self.path.pop();
        tree.section_mut(id).passed = passed;
        passed
    }

    fn run_test(&mut self, tree: &mut TestTree, id: TestId) -> bool {
        let span = debug_span!("test", title = %tree.test(id).title);
        let _guard = span.enter();
        let origin = tree.test(id).origin;

        // Sections whose before-each completed; only these get torn down.
        let mut ready = 0;
        for &section in &self.path {
            if !run_hook(tree, &mut self.sink, section, HookKind::BeforeEach, origin) {
                break;
            }
            ready += 1;
        }

        if ready == self.path.len() {
            invoke_body(tree, &mut self.sink, id);
        } else {
            debug!("body skipped after a before-each hook panicked");
        }

        for &section in self.path[..ready].iter().rev() {
            run_hook(tree, &mut self.sink, section, HookKind::AfterEach, origin);
        }

        let failures = self.sink.drain();
        let passed = failures.is_empty();
        let test = tree.test_mut(id);
        test.failures = failures;
        test.passed = passed;

        self.summary.total += 1;
        if passed {
            self.summary.passed += 1;
        }
        trace!(passed, "test finished");
        passed
    }
}

/// The single place a test body is invoked. Assertion aborts stop here.
fn invoke_body(tree: &mut TestTree, sink: &mut TestContext, id: TestId) {
    let test = tree.test_mut(id);
    let origin = test.origin;
    let body = &mut test.body;

    match catch_unwind(AssertUnwindSafe(|| body(&mut *sink))) {
        Ok(Ok(())) => {}
        Ok(Err(Abort)) => {
            if !sink.has_failures() {
                sink.record("test body aborted without a failed assertion", origin);
            }
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            warn!(%message, "test body panicked");
            sink.record(format!("panicked: {}", message), origin);
        }
    }
}

/// Runs one hook of `section` if present. Returns false if it panicked.
fn run_hook(
    tree: &mut TestTree,
    sink: &mut TestContext,
    section: SectionId,
    kind: HookKind,
    origin: Origin,
) -> bool {
    let node = tree.section_mut(section);
    let hook = match kind {
        HookKind::BeforeEach => node.before_each.as_mut(),
        HookKind::AfterEach => node.after_each.as_mut(),
    };
    let Some(hook) = hook else {
        return true;
    };
    trace!(section = %node.title, hook = kind.label(), "running hook");

    match catch_unwind(AssertUnwindSafe(|| hook())) {
        Ok(()) => true,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            warn!(section = %node.title, hook = kind.label(), %message, "hook panicked");
            sink.record(
                format!(
                    "{} hook of '{}' panicked: {}",
                    kind.label(),
                    node.title,
                    message
                ),
                origin,
            );
            false
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
