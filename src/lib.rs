// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Testscope
//!
//! Discovers GoogleTest and QtTest executables in a directory, lists the
//! suites and cases each one contains, runs them in parallel and collects
//! their XML results into a single pass/fail/time model.

pub mod config;
pub mod discovery;
pub mod error;
pub mod model;
pub mod program;
pub mod report;
pub mod runner;

pub use config::RunnerConfig;
pub use discovery::{ProgramClassifier, ProgramFinder, ProgramInfo, ProgramType};
pub use error::{ParseError, ParseResult};
pub use model::{Listing, TestCase, TestSuite};
pub use program::{Framework, ProgramFactory, TaskState, TestProgram};
pub use report::{Reporter, RunReport};
pub use runner::{Phase, PhaseOutcome, RunnerEvent, RunnerEvents, TestRunner};
