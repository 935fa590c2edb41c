// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! A single reported test case

use serde::{Deserialize, Serialize};

/// One test case and the outcome of its most recent run.
///
/// `passed` carries no meaning unless `was_run` is set; a case with no
/// recorded result is neither passing nor failing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    name: String,
    time: Option<f64>,
    was_run: bool,
    passed: bool,
    enabled: bool,
    failure_messages: Vec<String>,
    benchmark_messages: Vec<String>,
    other_messages: Vec<String>,
}

impl TestCase {
    /// Create an enabled case with no results
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            time: None,
            was_run: false,
            passed: false,
            enabled: true,
            failure_messages: Vec::new(),
            benchmark_messages: Vec::new(),
            other_messages: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Elapsed time in seconds, if the framework reported one
    pub fn time(&self) -> Option<f64> {
        self.time
    }

    pub fn set_time(&mut self, seconds: f64) {
        self.time = (seconds >= 0.0).then_some(seconds);
    }

    /// Whether the last run reported this case
    pub fn was_run(&self) -> bool {
        self.was_run
    }

    pub fn set_was_run(&mut self, was_run: bool) {
        self.was_run = was_run;
    }

    pub fn passed(&self) -> bool {
        self.passed
    }

    pub fn set_passed(&mut self, passed: bool) {
        self.passed = passed;
    }

    /// Run and failed
    pub fn failed(&self) -> bool {
        self.was_run && !self.passed
    }

    /// Whether the case is selected for the next run
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn failure_messages(&self) -> &[String] {
        &self.failure_messages
    }

    pub fn benchmark_messages(&self) -> &[String] {
        &self.benchmark_messages
    }

    pub fn other_messages(&self) -> &[String] {
        &self.other_messages
    }

    pub fn add_failure_message(&mut self, message: impl Into<String>) {
        self.failure_messages.push(message.into());
    }

    pub fn add_benchmark_message(&mut self, message: impl Into<String>) {
        self.benchmark_messages.push(message.into());
    }

    pub fn add_other_message(&mut self, message: impl Into<String>) {
        self.other_messages.push(message.into());
    }

    /// Forget everything learned from the last run. The name and the enabled
    /// flag belong to the listing and survive.
    pub fn clear_results(&mut self) {
        self.time = None;
        self.was_run = false;
        self.passed = false;
        self.failure_messages.clear();
        self.benchmark_messages.clear();
        self.other_messages.clear();
    }
}
