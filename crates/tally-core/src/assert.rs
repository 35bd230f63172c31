//! Assertion helpers on [`Test`]
//!
//! Sugar over `pass` / `fail`; none of these touch scheduling.
//!
//! # API
//!
//! - `ok(value, message)`: passes when `value` is true (default "ok")
//! - `not_ok(value, message)`: passes when `value` is false (default "not ok")
//! - `equal(actual, expected, message)` / `equals`: `PartialEq` (default "equals")
//! - `not_equal(actual, expected, message)` (default "not equal")
//! - `deep_equal(actual, expected, message)`: structural (default "deep equal")
//! - `not_deep_equal(actual, expected, message)` (default "not deep equal")
//!
//! An empty message selects the default. Equality failures carry an
//! actual/expected rendering as failure detail.

use crate::deep_equal::{self, render};
use crate::failure::Failure;
use crate::node::{or_default, Test};
use serde::Serialize;
use std::fmt::Debug;

impl Test {
    /// Pass when `value` is true, fail otherwise
    pub fn ok(&self, value: bool, message: &str) {
        let message = or_default(message, "ok");
        if value {
            self.pass(message);
        } else {
            self.fail(message);
        }
    }

    /// Pass when `value` is false
    pub fn not_ok(&self, value: bool, message: &str) {
        self.ok(!value, or_default(message, "not ok"));
    }

    /// Pass when `actual == expected`
    pub fn equal<A, B>(&self, actual: A, expected: B, message: &str)
    where
        A: PartialEq<B> + Debug,
        B: Debug,
    {
        let message = or_default(message, "equals");
        if actual == expected {
            self.pass(message);
        } else {
            self.report_failure(Failure::assertion(message).with_detail(format!(
                "  Actual:   {:?}\n  Expected: {:?}",
                actual, expected
            )));
        }
    }

    /// Alias of [`Test::equal`]
    pub fn equals<A, B>(&self, actual: A, expected: B, message: &str)
    where
        A: PartialEq<B> + Debug,
        B: Debug,
    {
        self.equal(actual, expected, message);
    }

    /// Pass when `actual != expected`
    pub fn not_equal<A, B>(&self, actual: A, expected: B, message: &str)
    where
        A: PartialEq<B> + Debug,
        B: Debug,
    {
        let message = or_default(message, "not equal");
        if actual != expected {
            self.pass(message);
        } else {
            self.report_failure(
                Failure::assertion(message).with_detail(format!("  Value: {:?}", actual)),
            );
        }
    }

    /// Pass when both values serialize to structurally equal trees.
    ///
    /// A value that cannot be serialized fails the assertion.
    pub fn deep_equal<A, B>(&self, actual: &A, expected: &B, message: &str)
    where
        A: Serialize + ?Sized,
        B: Serialize + ?Sized,
    {
        let message = or_default(message, "deep equal");
        match (deep_equal::to_value(actual), deep_equal::to_value(expected)) {
            (Ok(a), Ok(b)) if deep_equal::deep_equal(&a, &b) => self.pass(message),
            (Ok(a), Ok(b)) => self.report_failure(Failure::assertion(message).with_detail(
                format!("  Actual:   {}\n  Expected: {}", render(&a), render(&b)),
            )),
            (Err(e), _) | (_, Err(e)) => self.report_failure(
                Failure::assertion(message).with_detail(format!("  Not serializable: {}", e)),
            ),
        }
    }

    /// Pass when the values differ structurally
    pub fn not_deep_equal<A, B>(&self, actual: &A, expected: &B, message: &str)
    where
        A: Serialize + ?Sized,
        B: Serialize + ?Sized,
    {
        let message = or_default(message, "not deep equal");
        match (deep_equal::to_value(actual), deep_equal::to_value(expected)) {
            (Ok(a), Ok(b)) if !deep_equal::deep_equal(&a, &b) => self.pass(message),
            (Ok(a), Ok(_)) => self.report_failure(
                Failure::assertion(message).with_detail(format!("  Value: {}", render(&a))),
            ),
            (Err(e), _) | (_, Err(e)) => self.report_failure(
                Failure::assertion(message).with_detail(format!("  Not serializable: {}", e)),
            ),
        }
    }
}
