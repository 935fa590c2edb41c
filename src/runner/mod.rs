// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Test runner: owns all discovered programs and drives the list and run
//! phases across them.
//!
//! Programs execute as separate OS processes in parallel. Their completions
//! come back through a single queue and are applied by [`TestRunner::process_next`]
//! on the caller's task, so the program tree and the running map are only
//! ever touched from one place.

pub mod events;

pub use events::{RunnerEvent, RunnerEvents};

use std::collections::BTreeMap;
use std::path::Path;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::discovery::{ProgramClassifier, ProgramFinder};
use crate::program::{
    Launcher, ProcessFinished, ProgramEvent, ProgramFactory, ProgramId, TestProgram,
};

/// The phase currently in progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Listing,
    Running,
}

impl Phase {
    fn as_str(&self) -> &'static str {
        match self {
            Phase::Listing => "list",
            Phase::Running => "run",
        }
    }
}

/// How [`TestRunner::wait`] returned
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseOutcome {
    /// The phase finished (or none was active).
    Finished,
    /// No process is left in flight, yet these programs never reported.
    Stalled(Vec<usize>),
}

pub struct TestRunner {
    classifier: ProgramClassifier,
    programs: Vec<TestProgram>,
    generation: u64,
    phase: Option<Phase>,
    running: BTreeMap<usize, bool>,
    in_flight: usize,
    completions_tx: mpsc::UnboundedSender<ProcessFinished>,
    completions_rx: mpsc::UnboundedReceiver<ProcessFinished>,
    events: mpsc::UnboundedSender<RunnerEvent>,
}

impl TestRunner {
    /// Create a runner and the receiver for its notifications
    pub fn new(classifier: ProgramClassifier) -> (Self, RunnerEvents) {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let (events, events_rx) = mpsc::unbounded_channel();
        let runner = Self {
            classifier,
            programs: Vec::new(),
            generation: 0,
            phase: None,
            running: BTreeMap::new(),
            in_flight: 0,
            completions_tx,
            completions_rx,
            events,
        };
        (runner, events_rx)
    }

    /// Phase in progress, if any
    pub fn phase(&self) -> Option<Phase> {
        self.phase
    }

    /// Whether a list or run phase is in progress
    pub fn is_active(&self) -> bool {
        self.phase.is_some()
    }

    /// Discover programs under `directory` and start listing all of them.
    ///
    /// Ignored while a phase is active. Must be called from within a tokio
    /// runtime.
    pub fn list_tests(&mut self, directory: impl AsRef<Path>, recurse: bool) -> bool {
        if let Some(phase) = self.phase {
            debug!(phase = phase.as_str(), "phase active, ignoring list request");
            return false;
        }

        let directory = directory.as_ref();
        let paths = ProgramFinder::find(directory, recurse);
        let infos = self.classifier.classify(&paths);
        let programs = ProgramFactory::create_programs(infos);
        info!(
            directory = %directory.display(),
            candidates = paths.len(),
            programs = programs.len(),
            "discovered test programs"
        );

        self.begin_listing(programs);
        true
    }

    fn begin_listing(&mut self, programs: Vec<TestProgram>) {
        // A fresh discovery invalidates anything still in flight
        self.generation += 1;
        self.in_flight = 0;
        self.programs = programs;

        self.running = (0..self.programs.len()).map(|index| (index, true)).collect();
        self.phase = Some(Phase::Listing);
        self.emit(RunnerEvent::ListStarted);
        self.emit(RunnerEvent::ProgressRange {
            min: 0,
            max: self.programs.len(),
        });
        self.emit(RunnerEvent::ProgressValue(0));

        for index in 0..self.programs.len() {
            let launcher = self.launcher(index);
            if self.programs[index].list_tests(&launcher) {
                self.in_flight += 1;
            }
        }

        self.finish_phase_if_done();
    }

    /// Run every program that has at least one enabled case.
    ///
    /// Ignored while a phase is active. Must be called from within a tokio
    /// runtime.
    pub fn run_tests(&mut self) -> bool {
        if let Some(phase) = self.phase {
            debug!(phase = phase.as_str(), "phase active, ignoring run request");
            return false;
        }

        self.running = self
            .programs
            .iter()
            .enumerate()
            .filter(|(_, program)| program.has_enabled_tests())
            .map(|(index, _)| (index, true))
            .collect();
        self.phase = Some(Phase::Running);
        info!(programs = self.running.len(), "starting run phase");

        self.emit(RunnerEvent::RunStarted);
        self.emit(RunnerEvent::ProgressRange {
            min: 0,
            max: self.running.len(),
        });
        self.emit(RunnerEvent::ProgressValue(0));

        let eligible: Vec<usize> = self.running.keys().copied().collect();
        for index in eligible {
            let launcher = self.launcher(index);
            if self.programs[index].run_tests(&launcher) {
                self.in_flight += 1;
            }
        }

        self.finish_phase_if_done();
        true
    }

    /// Wait for one process completion and apply it. Returns `false` without
    /// waiting when nothing is in flight.
    pub async fn process_next(&mut self) -> bool {
        if self.in_flight == 0 {
            return false;
        }
        match self.completions_rx.recv().await {
            Some(finished) => {
                self.handle_completion(finished);
                true
            }
            None => false,
        }
    }

    /// Drive completions until the current phase finishes or stalls
    pub async fn wait(&mut self) -> PhaseOutcome {
        while self.phase.is_some() {
            if !self.process_next().await {
                let stalled = self.stalled_programs();
                warn!(
                    phase = self.phase.map(|p| p.as_str()).unwrap_or_default(),
                    programs = stalled.len(),
                    "phase stalled: programs never reported"
                );
                return PhaseOutcome::Stalled(stalled);
            }
        }
        PhaseOutcome::Finished
    }

    /// Apply a completion to its program and update the running map
    pub fn handle_completion(&mut self, finished: ProcessFinished) {
        if finished.id.generation != self.generation {
            debug!(
                generation = finished.id.generation,
                current = self.generation,
                "discarding completion from a previous generation"
            );
            return;
        }
        self.in_flight = self.in_flight.saturating_sub(1);

        let index = finished.id.index;
        let Some(program) = self.programs.get_mut(index) else {
            warn!(index, "completion for unknown program");
            return;
        };

        match (program.finish(finished), self.phase) {
            (Some(ProgramEvent::ListingReady), Some(Phase::Listing)) => {
                self.mark_done(index);
                self.finish_phase_if_done();
            }
            (Some(ProgramEvent::ResultsReady), Some(Phase::Running)) => {
                self.mark_done(index);
                self.emit(RunnerEvent::ResultsReady { program: index });
                self.finish_phase_if_done();
            }
            (Some(event), phase) => {
                debug!(?event, ?phase, "program event outside its phase");
            }
            (None, _) => {}
        }
    }

    /// Programs still marked running in the current phase
    pub fn stalled_programs(&self) -> Vec<usize> {
        self.running
            .iter()
            .filter(|(_, running)| **running)
            .map(|(index, _)| *index)
            .collect()
    }

    /// Give up on the current phase without raising its finished event.
    /// Late completions are discarded.
    pub fn abandon_phase(&mut self) {
        let Some(phase) = self.phase.take() else {
            return;
        };
        warn!(
            phase = phase.as_str(),
            stalled = self.stalled_programs().len(),
            "abandoning phase"
        );
        self.running.clear();
        self.generation += 1;
        self.in_flight = 0;
        for program in &mut self.programs {
            program.reset_state();
        }
    }

    fn mark_done(&mut self, index: usize) {
        match self.running.get_mut(&index) {
            Some(running) if *running => *running = false,
            _ => return,
        }
        let done = self.running.values().filter(|running| !**running).count();
        self.emit(RunnerEvent::ProgressValue(done));
    }

    fn finish_phase_if_done(&mut self) {
        let Some(phase) = self.phase else {
            return;
        };
        if self.running.values().any(|running| *running) {
            return;
        }

        self.running.clear();
        self.phase = None;
        info!(phase = phase.as_str(), "phase finished");
        self.emit(match phase {
            Phase::Listing => RunnerEvent::ListFinished,
            Phase::Running => RunnerEvent::RunFinished,
        });
    }

    fn launcher(&self, index: usize) -> Launcher {
        Launcher::new(
            ProgramId {
                generation: self.generation,
                index,
            },
            self.completions_tx.clone(),
        )
    }

    fn emit(&self, event: RunnerEvent) {
        // Nobody listening is fine
        let _ = self.events.send(event);
    }

    /// Enable exactly the cases whose `suite.case` name contains `pattern`.
    /// Returns the number of enabled cases.
    pub fn set_filter(&mut self, pattern: &str) -> usize {
        let mut enabled = 0;
        for program in &mut self.programs {
            for suite in program.suites_mut() {
                let suite_name = suite.name().to_string();
                for case in suite.cases_mut() {
                    let matches = format!("{}.{}", suite_name, case.name()).contains(pattern);
                    case.set_enabled(matches);
                    enabled += usize::from(matches);
                }
            }
        }
        enabled
    }

    /// All programs from the last discovery
    pub fn programs(&self) -> &[TestProgram] {
        &self.programs
    }

    /// Program at `index`, as carried by runner events
    pub fn program(&self, index: usize) -> Option<&TestProgram> {
        self.programs.get(index)
    }

    pub fn program_mut(&mut self, index: usize) -> Option<&mut TestProgram> {
        self.programs.get_mut(index)
    }

    /// Look up a program by file name
    pub fn program_for_name(&self, name: &str) -> Option<&TestProgram> {
        self.programs.iter().find(|p| p.name() == name)
    }

    pub fn program_for_name_mut(&mut self, name: &str) -> Option<&mut TestProgram> {
        self.programs.iter_mut().find(|p| p.name() == name)
    }

    /// Number of listed cases across all programs
    pub fn total_test_count(&self) -> usize {
        self.programs.iter().map(TestProgram::total_test_count).sum()
    }

    /// Number of cases that ran in the last run phase
    pub fn run_test_count(&self) -> usize {
        self.programs.iter().map(TestProgram::run_test_count).sum()
    }

    /// Number of cases that passed
    pub fn passed_test_count(&self) -> usize {
        self.programs.iter().map(TestProgram::passed_test_count).sum()
    }

    /// Number of cases that failed
    pub fn failed_test_count(&self) -> usize {
        self.programs.iter().map(TestProgram::failed_test_count).sum()
    }
}
