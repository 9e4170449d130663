//! # Nestest Registry & Builder
//!
//! The [`Registry`] is the one object declaration code talks to. It owns the
//! tree under construction and the declaration path: a stack of section ids
//! whose top is the section newly declared tests, subsections and hooks attach
//! to. The path always holds at least the root.
//!
//! Registry Invariant: declarations happen only while the registry exists.
//! [`Registry::finish`] consumes it and hands the tree to the engine, so
//! nothing can be declared once execution has begun.

use tracing::{debug, trace};

use crate::errors::{NestError, Origin, TestResult};
use crate::sink::TestContext;
use crate::tree::{SectionId, TestId, TestTree};

/// Construction-time state: the tree being built and the open-section path.
#[derive(Debug)]
pub struct Registry {
    tree: TestTree,
    path: Vec<SectionId>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        let tree = TestTree::new();
        let path = vec![tree.root()];
        Self { tree, path }
    }

    /// The section declarations currently attach to.
    pub fn current_section(&self) -> SectionId {
        // The path is never empty: `end_section` refuses to pop the root.
        self.path[self.path.len() - 1]
    }

    /// Number of sections currently open, not counting the root.
    pub fn open_sections(&self) -> usize {
        self.path.len() - 1
    }

    pub fn tree(&self) -> &TestTree {
        &self.tree
    }

    // ========================================================================
    // TESTS
    // ========================================================================

    /// Appends a test case to the current section.
    #[track_caller]
    pub fn register_test<F>(
        &mut self,
        title: impl Into<String>,
        description: impl Into<String>,
        body: F,
        is_only: bool,
    ) -> TestId
    where
        F: FnMut(&mut TestContext) -> TestResult + 'static,
    {
        let origin = Origin::caller();
        let section = self.current_section();
        let title = title.into();
        trace!(%title, section = section.index(), is_only, "declaring test");
        self.tree.add_test(
            section,
            title,
            description.into(),
            Box::new(body),
            is_only,
            origin,
        )
    }

    #[track_caller]
    pub fn test<F>(
        &mut self,
        title: impl Into<String>,
        description: impl Into<String>,
        body: F,
    ) -> TestId
    where
        F: FnMut(&mut TestContext) -> TestResult + 'static,
    {
        self.register_test(title, description, body, false)
    }

    /// Declares a test that narrows the run to only-marked nodes.
    #[track_caller]
    pub fn test_only<F>(
        &mut self,
        title: impl Into<String>,
        description: impl Into<String>,
        body: F,
    ) -> TestId
    where
        F: FnMut(&mut TestContext) -> TestResult + 'static,
    {
        self.register_test(title, description, body, true)
    }

    // ========================================================================
    // SECTIONS
    // ========================================================================

    /// Opens a new child of the current section and makes it current.
    pub fn begin_section(
        &mut self,
        title: impl Into<String>,
        description: impl Into<String>,
        is_only: bool,
    ) -> SectionId {
        let parent = self.current_section();
        let title = title.into();
        debug!(%title, depth = self.path.len(), is_only, "begin section");
        let id = self
            .tree
            .add_section(parent, title, description.into(), is_only);
        self.path.push(id);
        id
    }

    /// Closes the current section. Closing the root is a usage error.
    #[track_caller]
    pub fn end_section(&mut self) -> Result<SectionId, NestError> {
        if self.path.len() <= 1 {
            return Err(NestError::UnbalancedSectionEnd {
                origin: Origin::caller(),
            });
        }
        let id = self.current_section();
        self.path.pop();
        debug!(title = %self.tree.section(id).title, "end section");
        Ok(id)
    }

    /// Declares a section whose contents are declared by `declare`.
    ///
    /// The section is closed when `declare` returns, so the path stays
    /// balanced even if `declare` fails.
    #[track_caller]
    pub fn section<F>(
        &mut self,
        title: impl Into<String>,
        description: impl Into<String>,
        declare: F,
    ) -> Result<SectionId, NestError>
    where
        F: FnOnce(&mut Registry) -> Result<(), NestError>,
    {
        self.scoped(title.into(), description.into(), false, declare)
    }

    /// Like [`Registry::section`], marking the whole section only.
    #[track_caller]
    pub fn section_only<F>(
        &mut self,
        title: impl Into<String>,
        description: impl Into<String>,
        declare: F,
    ) -> Result<SectionId, NestError>
    where
        F: FnOnce(&mut Registry) -> Result<(), NestError>,
    {
        self.scoped(title.into(), description.into(), true, declare)
    }

    #[track_caller]
    fn scoped<F>(
        &mut self,
        title: String,
        description: String,
        is_only: bool,
        declare: F,
    ) -> Result<SectionId, NestError>
    where
        F: FnOnce(&mut Registry) -> Result<(), NestError>,
    {
        let origin = Origin::caller();
        let depth = self.path.len();
        let id = self.begin_section(title, description, is_only);
        let result = declare(self);

        // `declare` closed this section itself: too many ends.
        if self.path.get(depth) != Some(&id) {
            self.path.truncate(depth);
            return Err(result.err().unwrap_or(NestError::UnbalancedSectionEnd { origin }));
        }
        if let Err(err) = result {
            self.path.truncate(depth);
            return Err(err);
        }
        if self.path.len() > depth + 1 {
            let open = self.current_section();
            self.path.truncate(depth);
            return Err(NestError::UnclosedSection {
                title: self.tree.section(open).title.clone(),
                unit: None,
            });
        }
        self.path.pop();
        Ok(id)
    }

    // ========================================================================
    // HOOKS
    // ========================================================================

    /// Sets the before-each hook of the current section, replacing any
    /// previous one.
    pub fn register_before_each<F>(&mut self, hook: F)
    where
        F: FnMut() + 'static,
    {
        let section = self.current_section();
        if self.tree.set_before_each(section, Box::new(hook)) {
            debug!(title = %self.tree.section(section).title, "replaced before-each hook");
        }
    }

    /// Sets the after-each hook of the current section, replacing any
    /// previous one.
    pub fn register_after_each<F>(&mut self, hook: F)
    where
        F: FnMut() + 'static,
    {
        let section = self.current_section();
        if self.tree.set_after_each(section, Box::new(hook)) {
            debug!(title = %self.tree.section(section).title, "replaced after-each hook");
        }
    }

    // ========================================================================
    // COMPLETION
    // ========================================================================

    /// Ends the declaration phase and returns the finished tree.
    pub fn finish(self) -> Result<TestTree, NestError> {
        if self.path.len() > 1 {
            return Err(NestError::UnclosedSection {
                title: self.tree.section(self.current_section()).title.clone(),
                unit: None,
            });
        }
        debug!(
            sections = self.tree.section_count(),
            tests = self.tree.test_count(),
            "declaration phase finished"
        );
        Ok(self.tree)
    }
}

// ============================================================================
// DECLARATION UNITS - Explicit, ordered registration pass
// ============================================================================

/// Function that declares tests into a registry.
pub type DeclareFn = fn(&mut Registry) -> Result<(), NestError>;

/// A named group of declarations, typically one per source file.
///
/// Units run in the order they were added to a [`crate::Harness`]; each must
/// leave the declaration path as it found it.
#[derive(Clone, Copy)]
pub struct DeclarationUnit {
    pub name: &'static str,
    pub declare: DeclareFn,
}

impl std::fmt::Debug for DeclarationUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeclarationUnit")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl DeclarationUnit {
    pub const fn new(name: &'static str, declare: DeclareFn) -> Self {
        Self { name, declare }
    }

    /// Runs the unit against `registry`, checking that it closed every
    /// section it opened.
    pub fn apply(&self, registry: &mut Registry) -> Result<(), NestError> {
        let depth = registry.open_sections();
        debug!(unit = self.name, "running declaration unit");
        (self.declare)(registry)?;
        if registry.open_sections() != depth {
            let open = registry.current_section();
            return Err(NestError::UnclosedSection {
                title: registry.tree().section(open).title.clone(),
                unit: Some(self.name.to_string()),
            });
        }
        Ok(())
    }
}
