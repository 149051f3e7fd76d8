//! Terminal test outcomes and run-wide tallies.

use std::fmt;

/// Outcome of one execution context, produced exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestResult {
    /// Whether the test passed.
    success: bool,
    /// Failure messages in collection order; empty iff `success`.
    errors: Vec<String>,
}

impl TestResult {
    /// A passing result.
    #[must_use]
    pub fn pass() -> Self {
        Self {
            success: true,
            errors: Vec::new(),
        }
    }

    /// A failing result. An empty message list gets a generic entry so the
    /// `errors` list stays non-empty for failures.
    #[must_use]
    pub fn fail(mut errors: Vec<String>) -> Self {
        if errors.is_empty() {
            errors.push("test failed".to_string());
        }
        Self {
            success: false,
            errors,
        }
    }

    /// True for a passing result.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Collected failure messages.
    #[must_use]
    pub fn errors(&self) -> &[String] {
        &self.errors
    }
}

/// Pass/fail counters for one orchestration cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    /// Tests that passed.
    pub passed: usize,
    /// Tests that failed.
    pub failed: usize,
}

impl Summary {
    /// Tally one result.
    pub fn record(&mut self, result: &TestResult) {
        if result.is_success() {
            self.passed += 1;
        } else {
            self.failed += 1;
        }
    }

    /// Number of concluded tests.
    #[must_use]
    pub fn total(&self) -> usize {
        self.passed + self.failed
    }

    /// Percentage of `count` over the total; zero when nothing ran.
    fn percent(&self, count: usize) -> f64 {
        match self.total() {
            0 => 0.0,
            total => 100.0 * count as f64 / total as f64,
        }
    }

    /// `Failed: n / total (p %)` companion line.
    #[must_use]
    pub fn failed_line(&self) -> String {
        format!(
            "Failed: {} / {} ({:.1} %)",
            self.failed,
            self.total(),
            self.percent(self.failed)
        )
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Passed: {} / {} ({:.1} %)",
            self.passed,
            self.total(),
            self.percent(self.passed)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_lines() {
        let mut s = Summary::default();
        s.record(&TestResult::pass());
        s.record(&TestResult::pass());
        s.record(&TestResult::fail(vec!["nope".into()]));
        assert_eq!(s.to_string(), "Passed: 2 / 3 (66.7 %)");
        assert_eq!(s.failed_line(), "Failed: 1 / 3 (33.3 %)");
    }

    #[test]
    fn empty_summary_has_no_nan() {
        assert_eq!(Summary::default().to_string(), "Passed: 0 / 0 (0.0 %)");
    }

    #[test]
    fn failures_always_carry_a_message() {
        let r = TestResult::fail(Vec::new());
        assert!(!r.is_success());
        assert_eq!(r.errors().len(), 1);
        assert!(TestResult::pass().errors().is_empty());
    }
}
