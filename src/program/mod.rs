// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Test programs and their two-phase list/run protocol

pub mod factory;
pub mod gtest;
pub mod process;
pub mod qtest;
mod xml;

pub use factory::ProgramFactory;
pub use process::{Launcher, OutputChannel, ProcessFinished, ProcessOutput, ProcessTask, ProgramId};

use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::discovery::ProgramType;
use crate::error::{ParseError, ParseResult};
use crate::model::{Listing, TestSuite};
use process::Invocation;

/// Test framework a program speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Framework {
    GoogleTest,
    QtTestLib,
}

impl Framework {
    /// The framework for a classification, `None` for unknown programs
    pub fn from_program_type(program_type: ProgramType) -> Option<Self> {
        match program_type {
            ProgramType::GoogleTest => Some(Framework::GoogleTest),
            ProgramType::QtTestLib => Some(Framework::QtTestLib),
            ProgramType::Unknown => None,
        }
    }

    /// Short tag used in reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Framework::GoogleTest => "gtest",
            Framework::QtTestLib => "qtest",
        }
    }

    /// Arguments that make the program print its listing
    pub fn listing_args(&self) -> Vec<String> {
        match self {
            Framework::GoogleTest => gtest::listing_args(),
            Framework::QtTestLib => qtest::listing_args(),
        }
    }

    /// Stream the listing is printed on
    pub fn listing_channel(&self) -> OutputChannel {
        match self {
            Framework::GoogleTest | Framework::QtTestLib => OutputChannel::Stdout,
        }
    }

    /// Arguments for a run writing results to `result_file`
    pub fn run_args(&self, suites: &[TestSuite], result_file: &Path) -> Vec<String> {
        match self {
            Framework::GoogleTest => gtest::run_args(suites, result_file),
            Framework::QtTestLib => qtest::run_args(suites, result_file),
        }
    }

    /// Parse listing output into suite and case names
    pub fn parse_listing(&self, output: &[u8]) -> ParseResult<Listing> {
        match self {
            Framework::GoogleTest => gtest::parse_listing(output),
            Framework::QtTestLib => qtest::parse_listing(output),
        }
    }

    /// Apply a result document to `suites`, returning the program time when
    /// the framework reports one
    pub fn parse_results(&self, xml: &str, suites: &mut [TestSuite]) -> ParseResult<Option<f64>> {
        match self {
            Framework::GoogleTest => gtest::parse_results(xml, suites),
            Framework::QtTestLib => qtest::parse_results(xml, suites),
        }
    }
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a program's process is currently doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Idle,
    Listing,
    Running,
}

/// Raised by a program when a phase completed successfully
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramEvent {
    ListingReady,
    ResultsReady,
}

/// One test executable and everything learned about it
#[derive(Debug)]
pub struct TestProgram {
    path: PathBuf,
    framework: Framework,
    time: Option<f64>,
    suites: Vec<TestSuite>,
    state: TaskState,
    diagnostics: Vec<String>,
}

impl TestProgram {
    /// Create an idle program with no listing yet
    pub fn new(path: impl Into<PathBuf>, framework: Framework) -> Self {
        Self {
            path: path.into(),
            framework,
            time: None,
            suites: Vec::new(),
            state: TaskState::Idle,
            diagnostics: Vec::new(),
        }
    }

    /// Full path to the executable
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Final path component, e.g. `gtest_math`
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// Framework the program was classified as
    pub fn framework(&self) -> Framework {
        self.framework
    }

    /// Current task state
    pub fn state(&self) -> TaskState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == TaskState::Idle
    }

    /// Total elapsed time of the last run, if reported
    pub fn time(&self) -> Option<f64> {
        self.time
    }

    /// Listed suites, in listing order
    pub fn suites(&self) -> &[TestSuite] {
        &self.suites
    }

    /// Mutable access to the suites, e.g. to enable or disable cases
    pub fn suites_mut(&mut self) -> &mut [TestSuite] {
        &mut self.suites
    }

    /// Look up a suite by name
    pub fn suite_for_name(&self, name: &str) -> Option<&TestSuite> {
        self.suites.iter().find(|s| s.name() == name)
    }

    pub fn suite_for_name_mut(&mut self, name: &str) -> Option<&mut TestSuite> {
        self.suites.iter_mut().find(|s| s.name() == name)
    }

    /// Messages explaining why the last phase attempt produced nothing
    pub fn diagnostics(&self) -> &[String] {
        &self.diagnostics
    }

    /// `<program path>.xml`, next to the executable
    pub fn result_file(&self) -> PathBuf {
        let mut file = OsString::from(self.path.as_os_str());
        file.push(".xml");
        PathBuf::from(file)
    }

    /// Forget an outstanding invocation; its completion will not arrive here
    pub(crate) fn reset_state(&mut self) {
        self.state = TaskState::Idle;
    }

    /// Replace the suite tree with a freshly listed one
    pub fn apply_listing(&mut self, listing: Listing) {
        self.time = None;
        self.suites = listing.into_suites();
    }

    /// Reset time, flags and messages everywhere, keeping the listing
    pub fn clear_results(&mut self) {
        self.time = None;
        for suite in &mut self.suites {
            suite.clear_results();
        }
    }

    /// Start the listing invocation. Ignored unless the program is idle.
    pub fn list_tests(&mut self, launcher: &Launcher) -> bool {
        if !self.is_idle() {
            debug!(program = %self.name(), state = ?self.state, "busy, ignoring list request");
            return false;
        }

        self.diagnostics.clear();
        self.state = TaskState::Listing;
        launcher.launch(Invocation {
            program: self.path.clone(),
            args: self.framework.listing_args(),
            task: ProcessTask::List,
            result_file: None,
        });
        true
    }

    /// Start the run invocation. Ignored unless the program is idle.
    pub fn run_tests(&mut self, launcher: &Launcher) -> bool {
        if !self.is_idle() {
            debug!(program = %self.name(), state = ?self.state, "busy, ignoring run request");
            return false;
        }

        self.clear_results();
        self.diagnostics.clear();
        self.state = TaskState::Running;

        let result_file = self.result_file();
        launcher.launch(Invocation {
            program: self.path.clone(),
            args: self.framework.run_args(&self.suites, &result_file),
            task: ProcessTask::Run,
            result_file: Some(result_file),
        });
        true
    }

    /// Consume a process completion. Returns the event to raise when the
    /// phase succeeded; on failure the reasons are kept in
    /// [`diagnostics`](Self::diagnostics) and nothing is raised. Either way
    /// the program is idle afterwards.
    pub fn finish(&mut self, finished: ProcessFinished) -> Option<ProgramEvent> {
        let state = std::mem::replace(&mut self.state, TaskState::Idle);

        let expected = match state {
            TaskState::Listing => ProcessTask::List,
            TaskState::Running => ProcessTask::Run,
            TaskState::Idle => {
                warn!(program = %self.name(), "completion received while idle");
                return None;
            }
        };
        if finished.task != expected {
            warn!(program = %self.name(), task = ?finished.task, "completion for a different task");
            return None;
        }

        let output = match finished.outcome {
            Ok(output) => output,
            Err(err) => {
                self.fail(state, vec![format!("could not execute {}: {err}", self.path.display())]);
                return None;
            }
        };

        match state {
            TaskState::Listing => {
                let raw = output.channel(self.framework.listing_channel());
                match self.framework.parse_listing(raw) {
                    Ok(listing) => {
                        self.apply_listing(listing);
                        Some(ProgramEvent::ListingReady)
                    }
                    Err(err) => {
                        self.fail(state, vec![err.to_string()]);
                        None
                    }
                }
            }
            TaskState::Running => match self.apply_results(output) {
                Ok(()) => Some(ProgramEvent::ResultsReady),
                Err(err) => {
                    self.fail(state, vec![err.to_string()]);
                    None
                }
            },
            TaskState::Idle => None,
        }
    }

    fn apply_results(&mut self, output: ProcessOutput) -> ParseResult<()> {
        let bytes = match output.result_file {
            Some(Ok(bytes)) => bytes,
            Some(Err(source)) => {
                return Err(ParseError::Io {
                    path: self.result_file().display().to_string(),
                    source,
                })
            }
            None => {
                return Err(ParseError::Io {
                    path: self.result_file().display().to_string(),
                    source: io::Error::new(io::ErrorKind::NotFound, "no result file was collected"),
                })
            }
        };

        let xml = String::from_utf8_lossy(&bytes);
        if let Some(time) = self.framework.parse_results(&xml, &mut self.suites)? {
            self.time = (time >= 0.0).then_some(time);
        }
        Ok(())
    }

    fn fail(&mut self, state: TaskState, errors: Vec<String>) {
        let phase = match state {
            TaskState::Listing => "test listing",
            _ => "test results",
        };
        warn!(program = %self.name(), "could not get {phase}:");
        for error in &errors {
            warn!(program = %self.name(), "  {error}");
        }
        self.diagnostics = errors;
    }

    /// Whether any case in any suite is enabled
    pub fn has_enabled_tests(&self) -> bool {
        self.suites.iter().any(TestSuite::has_enabled_tests)
    }

    pub fn has_failed_tests(&self) -> bool {
        self.suites.iter().any(TestSuite::has_failed_tests)
    }

    pub fn has_run_tests(&self) -> bool {
        self.suites.iter().any(TestSuite::has_run_tests)
    }

    /// Number of listed cases across all suites
    pub fn total_test_count(&self) -> usize {
        self.suites.iter().map(TestSuite::total_test_count).sum()
    }

    pub fn run_test_count(&self) -> usize {
        self.suites.iter().map(TestSuite::run_test_count).sum()
    }

    pub fn passed_test_count(&self) -> usize {
        self.suites.iter().map(TestSuite::passed_test_count).sum()
    }

    pub fn failed_test_count(&self) -> usize {
        self.suites.iter().map(TestSuite::failed_test_count).sum()
    }
}
