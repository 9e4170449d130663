// End-to-end runs through the public API: declare, filter, execute, report.

mod common;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use common::{body_lines, pass, run_plain};
use nestest::{FilterMode, NestError, Registry, ReportLine, Tally};

#[test]
fn failing_then_passing_sibling() {
    let mut registry = Registry::new();
    registry.test("First", "fails", |ctx| ctx.ensure(false, "expected true"));
    registry.test("Second", "passes", pass);

    let (outcome, text) = run_plain(registry);
    let lines = body_lines(&text);
    assert_eq!(lines[0], "[--------] Global");
    assert_eq!(lines[1], "[ FAILED ] |--First: fails");
    assert!(lines[2].starts_with("[ ASSERT ] |--Failed: expected true ("));
    assert!(lines[2].contains("scenarios.rs:"));
    assert_eq!(lines[3], "[   ok   ] |--Second: passes");
    assert_eq!(lines.len(), 4);
    assert!(text.ends_with("1 out of 2 tests passed.\n"));
    assert_eq!(outcome.exit_code(), 1);
}

#[test]
fn fixture_hooks_do_not_leak_past_their_section() {
    let flag = Rc::new(Cell::new(false));
    let mut registry = Registry::new();

    let f = flag.clone();
    registry
        .section("Fixture", "sets the flag around each test", move |r| {
            let set = f.clone();
            r.register_before_each(move || set.set(true));
            let clear = f.clone();
            r.register_after_each(move || clear.set(false));
            let seen = f.clone();
            r.test("SeesFlag", "", move |ctx| ctx.ensure(seen.get(), "flag is set"));
            Ok(())
        })
        .unwrap();
    let f = flag.clone();
    registry.test("Unrelated", "", move |ctx| ctx.ensure(!f.get(), "flag is clear"));

    let (outcome, text) = run_plain(registry);
    assert!(text.ends_with("2 out of 2 tests passed.\n"));
    assert_eq!(outcome.exit_code(), 0);
    assert!(!flag.get());
}

#[test]
fn one_only_test_in_a_section_of_three() {
    let ran = Rc::new(RefCell::new(Vec::new()));
    let mut registry = Registry::new();
    registry.test("TopLevel", "", |ctx| ctx.ensure(false, "must not run"));

    let r = ran.clone();
    registry
        .section("Trio", "three tests", move |reg| {
            for (title, only) in [("A", false), ("B", true), ("C", false)] {
                let r = r.clone();
                reg.register_test(
                    title,
                    "",
                    move |_| {
                        r.borrow_mut().push(title);
                        Ok(())
                    },
                    only,
                );
            }
            Ok(())
        })
        .unwrap();

    let (outcome, text) = run_plain(registry);
    assert_eq!(outcome.mode, FilterMode::Only);
    assert_eq!(*ran.borrow(), vec!["B"]);
    assert_eq!(
        body_lines(&text),
        vec![
            "[--------] Global",
            "[--------] Trio: three tests",
            "[   ok   ] |--B",
        ]
    );
    assert!(text.ends_with("1 out of 1 tests passed.\n"));
}

#[test]
fn hook_order_across_three_levels() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut registry = Registry::new();

    let push = |log: &Rc<RefCell<Vec<String>>>, entry: &str| {
        let log = log.clone();
        let entry = entry.to_string();
        move || log.borrow_mut().push(entry.clone())
    };

    registry.register_before_each(push(&log, "Global.before"));
    registry.register_after_each(push(&log, "Global.after"));
    registry.begin_section("A", "", false);
    registry.register_before_each(push(&log, "A.before"));
    registry.register_after_each(push(&log, "A.after"));
    registry.begin_section("B", "", false);
    registry.register_before_each(push(&log, "B.before"));
    registry.register_after_each(push(&log, "B.after"));
    let body = push(&log, "X.body");
    registry.test("X", "", move |_| {
        body();
        Ok(())
    });
    registry.end_section().unwrap();
    registry.end_section().unwrap();

    run_plain(registry);
    assert_eq!(
        *log.borrow(),
        vec![
            "Global.before",
            "A.before",
            "B.before",
            "X.body",
            "B.after",
            "A.after",
            "Global.after",
        ]
    );
}

#[test]
fn assertion_abort_skips_later_statements() {
    let side_effect = Rc::new(Cell::new(0));
    let mut registry = Registry::new();
    let s = side_effect.clone();
    registry.test("Aborts", "", move |ctx| {
        ctx.ensure(false, "expected true")?;
        s.set(s.get() + 1);
        ctx.ensure(true, "would pass")?;
        s.set(s.get() + 1);
        Ok(())
    });

    let (outcome, _) = run_plain(registry);
    let failures: Vec<_> = outcome.report.failures().collect();
    assert_eq!(failures.len(), 1);
    assert!(matches!(
        failures[0],
        ReportLine::Failure { description, .. } if description == "expected true"
    ));
    assert_eq!(side_effect.get(), 0);
    assert_eq!(outcome.summary.passed, 0);
}

/// Builds a fixed tree of 7 tests across nested sections; `only` names the
/// single test to mark, if any.
fn seven_tests(only: Option<&'static str>) -> Result<Registry, NestError> {
    let mark = move |title: &str| only.map_or(false, |o| o == title);
    let mut r = Registry::new();
    r.register_test("t0", "", pass, mark("t0"));
    r.section("S1", "", |r| {
        r.register_test("t1", "", pass, mark("t1"));
        r.register_test("t2", "", pass, mark("t2"));
        r.section("S1a", "", |r| {
            r.register_test("t3", "", pass, mark("t3"));
            Ok(())
        })?;
        Ok(())
    })?;
    r.section("S2", "", |r| {
        r.section("S2a", "", |r| {
            r.section("S2b", "", |r| {
                r.register_test("t4", "", pass, mark("t4"));
                r.register_test("t5", "", pass, mark("t5"));
                Ok(())
            })?;
            Ok(())
        })?;
        r.register_test("t6", "", pass, mark("t6"));
        Ok(())
    })?;
    Ok(r)
}

#[test]
fn without_only_markers_everything_is_counted() {
    let (outcome, _) = run_plain(seven_tests(None).unwrap());
    assert_eq!(outcome.mode, FilterMode::RunAll);
    assert_eq!(outcome.report.tally, Tally { passed: 7, total: 7 });
    assert!(outcome.tree.sections().all(|(_, s)| s.is_allowed_to_run));
    assert!(outcome.tree.tests().all(|(_, t)| t.is_allowed_to_run));
}

#[test]
fn any_single_only_test_runs_alone_with_its_ancestors() {
    for chosen in ["t0", "t1", "t2", "t3", "t4", "t5", "t6"] {
        let (outcome, _) = run_plain(seven_tests(Some(chosen)).unwrap());
        let tree = &outcome.tree;
        assert_eq!(outcome.report.tally, Tally { passed: 1, total: 1 }, "{}", chosen);

        for (_, test) in tree.tests() {
            assert_eq!(test.is_allowed_to_run, test.title == chosen, "{}", test.title);
        }
        let (_, test) = tree.tests().find(|(_, t)| t.title == chosen).unwrap();
        for ancestor in tree.path_to(test.section) {
            assert!(tree.section(ancestor).is_allowed_to_run, "{}", chosen);
        }
    }
}

#[test]
fn only_section_runs_every_descendant() {
    let mut registry = Registry::new();
    registry.test("Outside", "", pass);
    registry
        .section("Plain", "", |r| {
            r.test("Excluded", "", pass);
            r.section_only("Focused", "", |r| {
                r.test("Direct", "", pass);
                r.section("Nested", "", |r| {
                    r.test("Deep", "", pass);
                    Ok(())
                })?;
                Ok(())
            })?;
            Ok(())
        })
        .unwrap();

    let (outcome, text) = run_plain(registry);
    assert_eq!(
        body_lines(&text),
        vec![
            "[--------] Global",
            "[--------] Plain",
            "[--------] |--Focused",
            "[   ok   ] |--|--Direct",
            "[--------] |--|--Nested",
            "[   ok   ] |--|--|--Deep",
        ]
    );
    assert_eq!(outcome.report.tally, Tally { passed: 2, total: 2 });
}

#[test]
fn panicking_test_does_not_stop_the_run() {
    let mut registry = Registry::new();
    registry.test("Explodes", "", |_| panic!("index out of range"));
    registry.test("Survives", "", pass);

    let (outcome, text) = run_plain(registry);
    assert!(text.contains("[ FAILED ] |--Explodes"));
    assert!(text.contains("Failed: panicked: index out of range"));
    assert!(text.contains("[   ok   ] |--Survives"));
    assert_eq!(outcome.report.tally, Tally { passed: 1, total: 2 });
}

#[test]
fn unbalanced_declarations_are_rejected() {
    let mut registry = Registry::new();
    registry.begin_section("A", "", false);
    registry.end_section().unwrap();
    let err = registry.end_section().unwrap_err();
    assert!(err.is_usage());
    assert!(err.to_string().contains("has no matching section begin"));

    let mut registry = Registry::new();
    registry.begin_section("Open", "", false);
    assert!(matches!(
        registry.finish(),
        Err(NestError::UnclosedSection { .. })
    ));
}
