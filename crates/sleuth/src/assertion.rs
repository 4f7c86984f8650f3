//! Assertions used by page objects.

use crate::pattern::{contains_ignore_case, TextPattern};
use crate::result::{SleuthError, SleuthResult};
use std::fmt::Debug;

/// Result of an assertion
#[derive(Debug, Clone)]
pub struct AssertionResult {
    /// Whether the assertion passed
    pub passed: bool,
    /// Human-readable message
    pub message: String,
}

impl AssertionResult {
    /// Create a passing assertion result
    #[must_use]
    pub const fn pass() -> Self {
        Self {
            passed: true,
            message: String::new(),
        }
    }

    /// Create a failing assertion result
    #[must_use]
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
        }
    }

    /// Convert to a result, failing with [`SleuthError::AssertionFailed`]
    ///
    /// # Errors
    ///
    /// If the assertion did not pass.
    pub fn into_result(self) -> SleuthResult<()> {
        if self.passed {
            Ok(())
        } else {
            Err(SleuthError::assertion(self.message))
        }
    }
}

/// Assertion helpers
pub struct Assertion;

impl Assertion {
    /// Assert two values are equal
    #[must_use]
    pub fn equals<T: PartialEq + Debug>(expected: &T, actual: &T) -> AssertionResult {
        if expected == actual {
            AssertionResult::pass()
        } else {
            AssertionResult::fail(format!("expected {expected:?}, got {actual:?}"))
        }
    }

    /// Assert a string contains a substring, ignoring case
    #[must_use]
    pub fn contains(haystack: &str, needle: &str) -> AssertionResult {
        if contains_ignore_case(haystack, needle) {
            AssertionResult::pass()
        } else {
            AssertionResult::fail(format!("expected '{haystack}' to contain '{needle}'"))
        }
    }

    /// Assert text matches a pattern
    #[must_use]
    pub fn matches(text: &str, pattern: &TextPattern, what: &str) -> AssertionResult {
        if pattern.matches(text) {
            AssertionResult::pass()
        } else {
            AssertionResult::fail(format!("expected {what} '{text}' to match {pattern}"))
        }
    }

    /// Assert every whitespace-separated word of `phrase` appears in `text`
    #[must_use]
    pub fn contains_all_words(text: &str, phrase: &str) -> AssertionResult {
        let missing: Vec<&str> = phrase
            .split_whitespace()
            .filter(|word| !contains_ignore_case(text, word))
            .collect();
        if missing.is_empty() {
            AssertionResult::pass()
        } else {
            AssertionResult::fail(format!(
                "expected '{text}' to contain all words of '{phrase}' (missing: {})",
                missing.join(", ")
            ))
        }
    }

    /// Assert a condition is true
    #[must_use]
    pub fn is_true(condition: bool, message: &str) -> AssertionResult {
        if condition {
            AssertionResult::pass()
        } else {
            AssertionResult::fail(message)
        }
    }
}
