//! Nestest Tree Model
//!
//! Sections and test cases live in two arenas inside [`TestTree`] and refer to
//! each other through typed indices. Nodes are only ever appended, so an id
//! stays valid for the lifetime of the tree.
//!
//! Index 0 of the section arena is the root section, "Global".

use std::fmt;

use crate::errors::{FailureMessage, Origin, TestResult};
use crate::sink::TestContext;

/// Title of the implicit root section.
pub const ROOT_TITLE: &str = "Global";

/// A test body. Receives the sink of the test being executed.
pub type TestBody = Box<dyn FnMut(&mut TestContext) -> TestResult>;

/// A before-each or after-each hook.
pub type Hook = Box<dyn FnMut()>;

/// Stable index of a section in a [`TestTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SectionId(pub(crate) usize);

/// Stable index of a test case in a [`TestTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TestId(pub(crate) usize);

impl SectionId {
    pub const ROOT: SectionId = SectionId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

impl TestId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A leaf of the tree: one test body and its outcome.
pub struct TestCase {
    pub title: String,
    pub description: String,
    pub(crate) body: TestBody,
    /// Owning section.
    pub section: SectionId,
    /// Where the test was declared.
    pub origin: Origin,
    pub is_only: bool,
    pub is_allowed_to_run: bool,
    pub passed: bool,
    pub failures: Vec<FailureMessage>,
}

impl fmt::Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase")
            .field("title", &self.title)
            .field("description", &self.description)
            .field("section", &self.section)
            .field("is_only", &self.is_only)
            .field("is_allowed_to_run", &self.is_allowed_to_run)
            .field("passed", &self.passed)
            .field("failures", &self.failures)
            .finish_non_exhaustive()
    }
}

/// A named grouping node owning hooks, tests and subsections.
pub struct Section {
    pub title: String,
    pub description: String,
    pub(crate) before_each: Option<Hook>,
    pub(crate) after_each: Option<Hook>,
    pub parent: Option<SectionId>,
    pub tests: Vec<TestId>,
    pub children: Vec<SectionId>,
    pub is_only: bool,
    pub is_allowed_to_run: bool,
    pub passed: bool,
}

impl Section {
    fn new(title: String, description: String, parent: Option<SectionId>, is_only: bool) -> Self {
        Self {
            title,
            description,
            before_each: None,
            after_each: None,
            parent,
            tests: Vec::new(),
            children: Vec::new(),
            is_only,
            is_allowed_to_run: false,
            passed: false,
        }
    }

    pub fn has_before_each(&self) -> bool {
        self.before_each.is_some()
    }

    pub fn has_after_each(&self) -> bool {
        self.after_each.is_some()
    }
}

impl fmt::Debug for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Section")
            .field("title", &self.title)
            .field("description", &self.description)
            .field("before_each", &self.before_each.is_some())
            .field("after_each", &self.after_each.is_some())
            .field("parent", &self.parent)
            .field("tests", &self.tests)
            .field("children", &self.children)
            .field("is_only", &self.is_only)
            .field("is_allowed_to_run", &self.is_allowed_to_run)
            .field("passed", &self.passed)
            .finish()
    }
}

/// Arena holding the whole declared tree.
#[derive(Debug)]
pub struct TestTree {
    sections: Vec<Section>,
    tests: Vec<TestCase>,
}

impl Default for TestTree {
    fn default() -> Self {
        Self::new()
    }
}

impl TestTree {
    /// Creates a tree containing only the root section.
    pub fn new() -> Self {
        Self {
            sections: vec![Section::new(
                ROOT_TITLE.to_string(),
                String::new(),
                None,
                false,
            )],
            tests: Vec::new(),
        }
    }

    pub fn root(&self) -> SectionId {
        SectionId::ROOT
    }

    pub fn section(&self, id: SectionId) -> &Section {
        &self.sections[id.0]
    }

    pub fn section_mut(&mut self, id: SectionId) -> &mut Section {
        &mut self.sections[id.0]
    }

    pub fn test(&self, id: TestId) -> &TestCase {
        &self.tests[id.0]
    }

    pub fn test_mut(&mut self, id: TestId) -> &mut TestCase {
        &mut self.tests[id.0]
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    pub fn test_count(&self) -> usize {
        self.tests.len()
    }

    pub fn sections(&self) -> impl Iterator<Item = (SectionId, &Section)> {
        self.sections
            .iter()
            .enumerate()
            .map(|(i, section)| (SectionId(i), section))
    }

    pub fn tests(&self) -> impl Iterator<Item = (TestId, &TestCase)> {
        self.tests
            .iter()
            .enumerate()
            .map(|(i, test)| (TestId(i), test))
    }

    /// Looks up a section by its chain of titles below the root,
    /// e.g. `["Section2", "Section2_1"]`.
    pub fn find_section(&self, path: &[&str]) -> Option<SectionId> {
        let mut current = self.root();
        for title in path {
            current = self
                .section(current)
                .children
                .iter()
                .copied()
                .find(|&child| self.section(child).title == *title)?;
        }
        Some(current)
    }

    /// Looks up a test by the titles of its enclosing sections and its own title.
    pub fn find_test(&self, sections: &[&str], title: &str) -> Option<TestId> {
        let section = self.find_section(sections)?;
        self.section(section)
            .tests
            .iter()
            .copied()
            .find(|&test| self.test(test).title == title)
    }

    /// Ancestors of `id` from the root down to `id` itself.
    pub fn path_to(&self, id: SectionId) -> Vec<SectionId> {
        let mut path = vec![id];
        let mut current = id;
        while let Some(parent) = self.section(current).parent {
            path.push(parent);
            current = parent;
        }
        path.reverse();
        path
    }

    /// Nesting depth of a section; the root is at depth 0.
    pub fn depth(&self, id: SectionId) -> usize {
        self.path_to(id).len() - 1
    }

    pub(crate) fn add_section(
        &mut self,
        parent: SectionId,
        title: String,
        description: String,
        is_only: bool,
    ) -> SectionId {
        let id = SectionId(self.sections.len());
        self.sections
            .push(Section::new(title, description, Some(parent), is_only));
        self.sections[parent.0].children.push(id);
        id
    }

    pub(crate) fn add_test(
        &mut self,
        section: SectionId,
        title: String,
        description: String,
        body: TestBody,
        is_only: bool,
        origin: Origin,
    ) -> TestId {
        let id = TestId(self.tests.len());
        self.tests.push(TestCase {
            title,
            description,
            body,
            section,
            origin,
            is_only,
            is_allowed_to_run: false,
            passed: false,
            failures: Vec::new(),
        });
        self.sections[section.0].tests.push(id);
        id
    }

    /// Installs a hook, returning whether one was already present.
    pub(crate) fn set_before_each(&mut self, section: SectionId, hook: Hook) -> bool {
        self.sections[section.0].before_each.replace(hook).is_some()
    }

    pub(crate) fn set_after_each(&mut self, section: SectionId, hook: Hook) -> bool {
        self.sections[section.0].after_each.replace(hook).is_some()
    }

    /// Clears every execution result so a new run starts from scratch.
    pub(crate) fn reset_results(&mut self) {
        for section in &mut self.sections {
            section.passed = false;
        }
        for test in &mut self.tests {
            test.passed = false;
            test.failures.clear();
        }
    }
}
