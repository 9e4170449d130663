//! Built-in sample suite run by the `nestest` binary.
//!
//! Two declaration units: a pair of top-level tests (one failing on purpose),
//! and a set of nested sections including a fixture section whose hooks
//! toggle shared state that a later top-level test observes.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::errors::NestError;
use crate::registry::{DeclarationUnit, Registry};

static FANCY_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// The sample units, in the order they must run.
pub fn units() -> Vec<DeclarationUnit> {
    vec![
        DeclarationUnit::new("main", declare_main),
        DeclarationUnit::new("sections", declare_sections),
    ]
}

fn declare_main(r: &mut Registry) -> Result<(), NestError> {
    r.test("Test1", "should fail", |ctx| ctx.ensure(false, "assert false"));
    r.test("Test2", "should pass", |ctx| ctx.ensure(true, "assert true"));
    Ok(())
}

fn declare_sections(r: &mut Registry) -> Result<(), NestError> {
    r.section("Section1", "This is the first section", |r| {
        r.test("SomeTestInASection", "should pass", |ctx| ctx.ensure(true, "all good"));
        Ok(())
    })?;

    r.begin_section("Section2", "This is another section, more to come", false);
    {
        r.begin_section("Section2_1", "this is a subsection", false);
        {
            r.test("SomeTestInASubSection", "should fail", |ctx| {
                ctx.ensure(false, "the sub-section check is expected to fail")
            });

            r.section("Section2_1_1", "yet another subsection", |r| {
                r.test("SomeTestInSection2_1_1", "Should pass", |ctx| {
                    ctx.ensure(true, "all good")
                });
                Ok(())
            })?;
        }
        r.end_section()?;
    }
    r.end_section()?;

    r.section("SomeFancySection", "This is the fancy section", |r| {
        r.register_before_each(|| FANCY_INITIALIZED.store(true, Ordering::SeqCst));
        r.test("SomeFancyTest", "Should be initialized", |ctx| {
            ctx.ensure(FANCY_INITIALIZED.load(Ordering::SeqCst), "Should be initialized")
        });
        r.register_after_each(|| FANCY_INITIALIZED.store(false, Ordering::SeqCst));
        Ok(())
    })?;

    r.test("SomeNotFancyTest", "Should not be initialized", |ctx| {
        ctx.ensure(
            !FANCY_INITIALIZED.load(Ordering::SeqCst),
            "Should not be initialized anymore",
        )
    });
    Ok(())
}
