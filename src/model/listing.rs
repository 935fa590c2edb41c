// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Parsed test listings

use super::suite::TestSuite;

/// Suite and case names as enumerated by a program, in the order they were
/// first seen. Suite names are unique, as are case names within a suite.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    suites: Vec<(String, Vec<String>)>,
}

impl Listing {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a suite, keeping its position if it is already known
    pub fn add_suite(&mut self, suite: &str) {
        if !self.contains_suite(suite) {
            self.suites.push((suite.to_string(), Vec::new()));
        }
    }

    /// Append a case to a suite, registering the suite if needed
    pub fn add_case(&mut self, suite: &str, case: &str) {
        self.add_suite(suite);
        if let Some((_, cases)) = self.suites.iter_mut().find(|(name, _)| name == suite) {
            if !cases.iter().any(|c| c == case) {
                cases.push(case.to_string());
            }
        }
    }

    pub fn contains_suite(&self, suite: &str) -> bool {
        self.suites.iter().any(|(name, _)| name == suite)
    }

    pub fn cases(&self, suite: &str) -> Option<&[String]> {
        self.suites
            .iter()
            .find(|(name, _)| name == suite)
            .map(|(_, cases)| cases.as_slice())
    }

    pub fn suite_names(&self) -> impl Iterator<Item = &str> {
        self.suites.iter().map(|(name, _)| name.as_str())
    }

    pub fn suite_count(&self) -> usize {
        self.suites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.suites.is_empty()
    }

    pub(crate) fn suites_mut(&mut self) -> impl Iterator<Item = &mut Vec<String>> {
        self.suites.iter_mut().map(|(_, cases)| cases)
    }

    /// Turn the listing into a fresh suite tree without results
    pub fn into_suites(self) -> Vec<TestSuite> {
        self.suites
            .into_iter()
            .map(|(name, cases)| TestSuite::with_cases(name, cases))
            .collect()
    }
}
