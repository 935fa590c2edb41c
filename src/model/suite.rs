// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Test suites and their derived counts

use serde::{Deserialize, Serialize};

use super::case::TestCase;

/// A named group of cases as reported by one framework.
///
/// Counts and status flags are computed from the cases on every call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestSuite {
    name: String,
    time: Option<f64>,
    cases: Vec<TestCase>,
}

impl TestSuite {
    /// Create an empty suite
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            time: None,
            cases: Vec::new(),
        }
    }

    /// Build a suite holding one fresh case per name
    pub fn with_cases<I, S>(name: impl Into<String>, case_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut suite = Self::new(name);
        for case_name in case_names {
            suite.add_case(TestCase::new(case_name));
        }
        suite
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn time(&self) -> Option<f64> {
        self.time
    }

    pub fn set_time(&mut self, seconds: f64) {
        self.time = (seconds >= 0.0).then_some(seconds);
    }

    /// Append a case. A case whose name is already present is dropped.
    pub fn add_case(&mut self, case: TestCase) -> bool {
        if self.case_for_name(case.name()).is_some() {
            return false;
        }
        self.cases.push(case);
        true
    }

    /// Cases in listing order
    pub fn cases(&self) -> &[TestCase] {
        &self.cases
    }

    /// Mutable access to the cases
    pub fn cases_mut(&mut self) -> &mut [TestCase] {
        &mut self.cases
    }

    /// Look up a case by name
    pub fn case_for_name(&self, name: &str) -> Option<&TestCase> {
        self.cases.iter().find(|c| c.name() == name)
    }

    pub fn case_for_name_mut(&mut self, name: &str) -> Option<&mut TestCase> {
        self.cases.iter_mut().find(|c| c.name() == name)
    }

    /// Reset the suite time and every case's results
    pub fn clear_results(&mut self) {
        self.time = None;
        for case in &mut self.cases {
            case.clear_results();
        }
    }

    pub fn has_enabled_tests(&self) -> bool {
        self.cases.iter().any(TestCase::is_enabled)
    }

    pub fn has_disabled_tests(&self) -> bool {
        self.cases.iter().any(|c| !c.is_enabled())
    }

    pub fn has_failed_tests(&self) -> bool {
        self.cases.iter().any(TestCase::failed)
    }

    pub fn has_run_tests(&self) -> bool {
        self.cases.iter().any(TestCase::was_run)
    }

    /// Number of listed cases
    pub fn total_test_count(&self) -> usize {
        self.cases.len()
    }

    pub fn run_test_count(&self) -> usize {
        self.cases.iter().filter(|c| c.was_run()).count()
    }

    pub fn passed_test_count(&self) -> usize {
        self.cases
            .iter()
            .filter(|c| c.was_run() && c.passed())
            .count()
    }

    pub fn failed_test_count(&self) -> usize {
        self.cases.iter().filter(|c| c.failed()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TestSuite {
        let mut suite = TestSuite::with_cases("Math", ["Adds", "Subtracts", "Divides"]);
        let cases = suite.cases_mut();
        cases[0].set_was_run(true);
        cases[0].set_passed(true);
        cases[1].set_was_run(true);
        cases[1].set_passed(false);
        suite
    }

    #[test]
    fn test_counts_follow_case_state() {
        let mut suite = sample();
        assert_eq!(suite.total_test_count(), 3);
        assert_eq!(suite.run_test_count(), 2);
        assert_eq!(suite.passed_test_count(), 1);
        assert_eq!(suite.failed_test_count(), 1);
        assert!(suite.has_failed_tests());

        suite.case_for_name_mut("Subtracts").unwrap().set_passed(true);
        assert_eq!(suite.failed_test_count(), 0);
        assert!(!suite.has_failed_tests());
    }

    #[test]
    fn test_duplicate_case_names_are_dropped() {
        let mut suite = TestSuite::with_cases("Math", ["Adds", "Adds"]);
        assert_eq!(suite.total_test_count(), 1);
        assert!(!suite.add_case(TestCase::new("Adds")));
    }

    #[test]
    fn test_clear_results_keeps_structure() {
        let mut suite = sample();
        suite.set_time(0.5);
        suite.clear_results();
        assert_eq!(suite.total_test_count(), 3);
        assert_eq!(suite.run_test_count(), 0);
        assert!(!suite.has_run_tests());
        assert_eq!(suite.time(), None);
    }

    #[test]
    fn test_enabled_tracking() {
        let mut suite = TestSuite::with_cases("Math", ["Adds"]);
        assert!(suite.has_enabled_tests());
        suite.cases_mut()[0].set_enabled(false);
        assert!(!suite.has_enabled_tests());
        assert!(suite.has_disabled_tests());
    }
}
