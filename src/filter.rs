//! Only-filtering.
//!
//! Decides which sections and tests take part in a run. When nothing in the
//! tree is marked only, everything runs. Otherwise only the marked subset runs:
//!
//! - an only-marked test runs, its unmarked siblings do not;
//! - an only-marked section runs every test in its subtree;
//! - every ancestor of something that runs is itself allowed, so its header
//!   stays visible in the report.
//!
//! The result is stored in the `is_allowed_to_run` flags of the tree. Applying
//! the filter again to an unchanged tree yields the same flags.

use tracing::debug;

use crate::tree::{SectionId, TestTree};

/// Which rule the filter applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    /// Nothing was marked only; every node is allowed.
    RunAll,
    /// At least one node was marked only; the run is narrowed.
    Only,
}

/// Runs both filter passes over the whole tree.
pub fn apply(tree: &mut TestTree) -> FilterMode {
    let root = tree.root();
    let mode = if has_only(tree, root) {
        FilterMode::Only
    } else {
        FilterMode::RunAll
    };
    propagate(tree, root, false, mode);
    debug!(?mode, "only-filter applied");
    mode
}

/// First pass: is any section or test below `section` (inclusive) marked only?
pub fn has_only(tree: &TestTree, section: SectionId) -> bool {
    let node = tree.section(section);
    node.is_only
        || node.tests.iter().any(|&test| tree.test(test).is_only)
        || node.children.iter().any(|&child| has_only(tree, child))
}

/// Second pass: computes `is_allowed_to_run` for `section` and its subtree and
/// returns the section's own allowance.
///
/// `parent_only` is true when an enclosing section is marked only.
pub fn propagate(
    tree: &mut TestTree,
    section: SectionId,
    parent_only: bool,
    mode: FilterMode,
) -> bool {
    if mode == FilterMode::RunAll {
        allow_all(tree, section);
        return true;
    }

    let this_only = tree.section(section).is_only || parent_only;

    let mut any_test_allowed = false;
    let tests = tree.section(section).tests.clone();
    for test in tests {
        let test = tree.test_mut(test);
        test.is_allowed_to_run = this_only || test.is_only;
        any_test_allowed |= test.is_allowed_to_run;
    }

    let mut any_child_allowed = false;
    let children = tree.section(section).children.clone();
    for child in children {
        any_child_allowed |= propagate(tree, child, this_only, mode);
    }

    let allowed = this_only || any_test_allowed || any_child_allowed;
    tree.section_mut(section).is_allowed_to_run = allowed;
    allowed
}

fn allow_all(tree: &mut TestTree, section: SectionId) {
    let node = tree.section_mut(section);
    node.is_allowed_to_run = true;
    let tests = node.tests.clone();
    let children = node.children.clone();
    for test in tests {
        tree.test_mut(test).is_allowed_to_run = true;
    }
    for child in children {
        allow_all(tree, child);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TestResult;
    use crate::registry::Registry;
    use crate::sink::TestContext;

    fn pass(_: &mut TestContext) -> TestResult {
        Ok(())
    }

    fn allowance(tree: &TestTree) -> (Vec<bool>, Vec<bool>) {
        (
            tree.sections().map(|(_, s)| s.is_allowed_to_run).collect(),
            tree.tests().map(|(_, t)| t.is_allowed_to_run).collect(),
        )
    }

    #[test]
    fn nothing_marked_allows_everything() {
        let mut registry = Registry::new();
        registry.test("A", "", pass);
        registry
            .section("S", "", |r| {
                r.test("B", "", pass);
                r.section("Empty", "", |_| Ok(()))?;
                Ok(())
            })
            .unwrap();
        let mut tree = registry.finish().unwrap();

        assert_eq!(apply(&mut tree), FilterMode::RunAll);
        assert!(tree.sections().all(|(_, s)| s.is_allowed_to_run));
        assert!(tree.tests().all(|(_, t)| t.is_allowed_to_run));
    }

    #[test]
    fn single_only_test_keeps_ancestors_visible() {
        let mut registry = Registry::new();
        registry.test("Outside", "", pass);
        registry
            .section("Outer", "", |r| {
                r.section("Inner", "", |r| {
                    r.test("Sibling", "", pass);
                    r.test_only("Chosen", "", pass);
                    Ok(())
                })?;
                r.section("Other", "", |r| {
                    r.test("Unrelated", "", pass);
                    Ok(())
                })?;
                Ok(())
            })
            .unwrap();
        let mut tree = registry.finish().unwrap();

        assert_eq!(apply(&mut tree), FilterMode::Only);
        let chosen = tree.find_test(&["Outer", "Inner"], "Chosen").unwrap();
        let sibling = tree.find_test(&["Outer", "Inner"], "Sibling").unwrap();
        let outside = tree.find_test(&[], "Outside").unwrap();
        assert!(tree.test(chosen).is_allowed_to_run);
        assert!(!tree.test(sibling).is_allowed_to_run);
        assert!(!tree.test(outside).is_allowed_to_run);

        for path in [&[][..], &["Outer"][..], &["Outer", "Inner"][..]] {
            let id = tree.find_section(path).unwrap();
            assert!(tree.section(id).is_allowed_to_run, "{:?} hidden", path);
        }
        let other = tree.find_section(&["Outer", "Other"]).unwrap();
        assert!(!tree.section(other).is_allowed_to_run);
    }

    #[test]
    fn only_section_enables_its_whole_subtree() {
        let mut registry = Registry::new();
        registry.test("Outside", "", pass);
        registry
            .section_only("Chosen", "", |r| {
                r.test("Direct", "", pass);
                r.section("Nested", "", |r| {
                    r.test("Deep", "", pass);
                    r.section("Deeper", "", |r| {
                        r.test("Deepest", "", pass);
                        Ok(())
                    })?;
                    Ok(())
                })?;
                Ok(())
            })
            .unwrap();
        let mut tree = registry.finish().unwrap();
        apply(&mut tree);

        let chosen = tree.find_section(&["Chosen"]).unwrap();
        for (_, test) in tree.tests() {
            let inside = tree.path_to(test.section).contains(&chosen);
            assert_eq!(test.is_allowed_to_run, inside, "{}", test.title);
        }
    }

    #[test]
    fn only_section_nested_in_unmarked_section() {
        let mut registry = Registry::new();
        registry
            .section("OnlySubSection", "", |r| {
                r.test("NotInOnly", "", pass);
                r.section_only("OnlySubSubSection", "", |r| {
                    r.test("TestInOnlySubsection", "", pass);
                    Ok(())
                })?;
                Ok(())
            })
            .unwrap();
        let mut tree = registry.finish().unwrap();
        apply(&mut tree);

        let outer = tree.find_section(&["OnlySubSection"]).unwrap();
        assert!(tree.section(outer).is_allowed_to_run);
        let skipped = tree.find_test(&["OnlySubSection"], "NotInOnly").unwrap();
        assert!(!tree.test(skipped).is_allowed_to_run);
        let inner = tree
            .find_test(&["OnlySubSection", "OnlySubSubSection"], "TestInOnlySubsection")
            .unwrap();
        assert!(tree.test(inner).is_allowed_to_run);
    }

    #[test]
    fn empty_unmarked_sections_are_hidden_in_only_mode() {
        let mut registry = Registry::new();
        registry.test_only("Chosen", "", pass);
        registry.section("Empty", "", |_| Ok(())).unwrap();
        let mut tree = registry.finish().unwrap();
        apply(&mut tree);

        let empty = tree.find_section(&["Empty"]).unwrap();
        assert!(!tree.section(empty).is_allowed_to_run);
        assert!(tree.section(tree.root()).is_allowed_to_run);
    }

    #[test]
    fn filtering_is_idempotent() {
        let mut registry = Registry::new();
        registry.test("A", "", pass);
        registry
            .section("S", "", |r| {
                r.test_only("B", "", pass);
                r.test("C", "", pass);
                Ok(())
            })
            .unwrap();
        registry
            .section_only("T", "", |r| {
                r.test("D", "", pass);
                Ok(())
            })
            .unwrap();
        let mut tree = registry.finish().unwrap();

        apply(&mut tree);
        let first = allowance(&tree);
        apply(&mut tree);
        assert_eq!(allowance(&tree), first);
    }
}
