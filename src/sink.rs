//! Assertion sink and the assertion primitives test bodies call.
//!
//! Every test body receives a `&mut TestContext`. A failing assertion pushes a
//! [`FailureMessage`] into the context and returns `Err(Abort)`, which the body
//! propagates with `?`:
//!
//! ```
//! use nestest::{Registry, TestContext};
//!
//! let mut registry = Registry::new();
//! registry.test("Addition", "should add", |ctx: &mut TestContext| {
//!     ctx.ensure_eq(2 + 2, 4, "two plus two")?;
//!     ctx.ensure(true, "all good")
//! });
//! ```

use std::fmt::Debug;

use crate::errors::{Abort, FailureMessage, Origin, TestResult};

/// Pending failure messages for the test that is currently executing.
///
/// The engine owns one sink per run and drains it after every test, so the
/// messages never leak into the next test.
#[derive(Debug, Default)]
pub struct TestContext {
    pending: Vec<FailureMessage>,
}

impl TestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails the test unless `condition` holds.
    #[track_caller]
    pub fn ensure(&mut self, condition: bool, description: impl Into<String>) -> TestResult {
        if condition {
            return Ok(());
        }
        Err(self.record(description, Origin::caller()))
    }

    /// Fails the test unless `left == right`, describing both values.
    #[track_caller]
    pub fn ensure_eq<L, R>(
        &mut self,
        left: L,
        right: R,
        description: impl Into<String>,
    ) -> TestResult
    where
        L: PartialEq<R> + Debug,
        R: Debug,
    {
        if left == right {
            return Ok(());
        }
        let description = format!(
            "{} (expected {:?}, got {:?})",
            description.into(),
            right,
            left
        );
        Err(self.record(description, Origin::caller()))
    }

    /// Fails the test if `left == right`.
    #[track_caller]
    pub fn ensure_ne<L, R>(
        &mut self,
        left: L,
        right: R,
        description: impl Into<String>,
    ) -> TestResult
    where
        L: PartialEq<R> + Debug,
        R: Debug,
    {
        if left != right {
            return Ok(());
        }
        let description = format!("{} (both were {:?})", description.into(), left);
        Err(self.record(description, Origin::caller()))
    }

    /// Fails the test unconditionally.
    #[track_caller]
    pub fn fail(&mut self, description: impl Into<String>) -> Abort {
        self.record(description, Origin::caller())
    }

    /// Records a failure with an explicit origin. Used by [`crate::check!`]
    /// and by the engine when it converts a panic.
    pub fn record(&mut self, description: impl Into<String>, origin: Origin) -> Abort {
        self.pending.push(FailureMessage::new(description, origin));
        Abort
    }

    pub fn has_failures(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Empties the sink, handing its messages to the caller in recording order.
    pub fn drain(&mut self) -> Vec<FailureMessage> {
        std::mem::take(&mut self.pending)
    }
}

/// Asserts a condition inside a test body, returning early on failure.
///
/// Without a description the stringified condition is used. A description
/// is either any `Into<String>` value or a format string with arguments.
///
/// ```
/// use nestest::{check, TestContext, TestResult};
///
/// fn body(ctx: &mut TestContext) -> TestResult {
///     let items = vec![1, 2, 3];
///     check!(ctx, items.len() == 3);
///     check!(ctx, items[0] == 1, "first item is one");
///     check!(ctx, items[2] == 3, "item {} is three", 2);
///     Ok(())
/// }
/// ```
#[macro_export]
macro_rules! check {
    (@record $ctx:expr, $cond:expr, $desc:expr) => {
        if !($cond) {
            let origin = $crate::Origin {
                file: file!(),
                line: line!(),
                column: column!(),
            };
            return Err($ctx.record($desc, origin));
        }
    };
    ($ctx:expr, $cond:expr) => {
        $crate::check!(@record $ctx, $cond, concat!("check!(", stringify!($cond), ")"))
    };
    ($ctx:expr, $cond:expr, $desc:expr) => {
        $crate::check!(@record $ctx, $cond, $desc)
    };
    ($ctx:expr, $cond:expr, $fmt:literal, $($arg:tt)+) => {
        $crate::check!(@record $ctx, $cond, format!($fmt, $($arg)+))
    };
}
