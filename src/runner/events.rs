// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Notifications emitted by the runner

use tokio::sync::mpsc;

/// Outward notifications for presentation layers.
///
/// These are the whole contract a front end relies on; it reads program
/// state through the runner's accessors in response to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerEvent {
    /// A list phase has begun.
    ListStarted,
    /// Every program in the list phase reported its listing.
    ListFinished,
    /// A run phase has begun.
    RunStarted,
    /// Every eligible program in the run phase reported its results.
    RunFinished,
    /// Bounds of the progress indicator for the current phase.
    ProgressRange { min: usize, max: usize },
    /// Number of programs that have completed the current phase.
    ProgressValue(usize),
    /// Results were applied to the program at this index.
    ResultsReady { program: usize },
}

impl RunnerEvent {
    pub fn is_phase_finished(&self) -> bool {
        matches!(self, RunnerEvent::ListFinished | RunnerEvent::RunFinished)
    }
}

/// Receiving end handed out by [`TestRunner::new`](super::TestRunner::new)
pub type RunnerEvents = mpsc::UnboundedReceiver<RunnerEvent>;
