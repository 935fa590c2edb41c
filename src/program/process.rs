// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Subprocess execution for test programs
//!
//! Each invocation runs on its own tokio task. When the process exits, the
//! task reports back with a [`ProcessFinished`] message on the runner's
//! completion channel; nothing else is shared between the task and the
//! controlling side.

use std::io;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use tokio::process::Command;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

/// Identifies a program within one discovery generation of a runner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId {
    pub generation: u64,
    pub index: usize,
}

/// What a spawned process was asked to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessTask {
    List,
    Run,
}

/// Output stream a listing is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputChannel {
    Stdout,
    Stderr,
}

/// Everything captured from a process that ran to completion
#[derive(Debug)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// Contents of the result file, read after exit, for run invocations
    pub result_file: Option<io::Result<Vec<u8>>>,
}

impl ProcessOutput {
    pub fn channel(&self, channel: OutputChannel) -> &[u8] {
        match channel {
            OutputChannel::Stdout => &self.stdout,
            OutputChannel::Stderr => &self.stderr,
        }
    }
}

/// Completion message delivered to the controlling task
#[derive(Debug)]
pub struct ProcessFinished {
    pub id: ProgramId,
    pub task: ProcessTask,
    /// `Err` when the process could not be started or waited on
    pub outcome: io::Result<ProcessOutput>,
}

/// A single invocation of a test executable
#[derive(Debug, Clone)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub task: ProcessTask,
    /// Removed before the process starts and read after it exits
    pub result_file: Option<PathBuf>,
}

/// Spawns invocations for one program and routes their completion
#[derive(Debug, Clone)]
pub struct Launcher {
    id: ProgramId,
    completions: UnboundedSender<ProcessFinished>,
}

impl Launcher {
    pub fn new(id: ProgramId, completions: UnboundedSender<ProcessFinished>) -> Self {
        Self { id, completions }
    }

    /// Start the invocation in the background. Must be called from within a
    /// tokio runtime.
    pub fn launch(&self, invocation: Invocation) {
        let id = self.id;
        let completions = self.completions.clone();

        debug!(
            program = %invocation.program.display(),
            args = ?invocation.args,
            "spawning test program"
        );

        tokio::spawn(async move {
            let task = invocation.task;
            let outcome = execute(&invocation).await;
            if completions.send(ProcessFinished { id, task, outcome }).is_err() {
                debug!(program = %invocation.program.display(), "runner dropped, discarding completion");
            }
        });
    }
}

async fn execute(invocation: &Invocation) -> io::Result<ProcessOutput> {
    // Results from an earlier run must never be mistaken for this one
    if let Some(path) = &invocation.result_file {
        remove_stale(path).await?;
    }

    let mut command = Command::new(&invocation.program);
    command
        .args(&invocation.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    // Run next to the executable so relative data paths resolve
    if let Some(dir) = invocation.program.parent() {
        command.current_dir(dir);
    }

    let output = command.output().await?;
    debug!(
        program = %invocation.program.display(),
        status = %output.status,
        "test program exited"
    );

    let result_file = match &invocation.result_file {
        Some(path) => Some(tokio::fs::read(path).await),
        None => None,
    };

    Ok(ProcessOutput {
        status: output.status,
        stdout: output.stdout,
        stderr: output.stderr,
        result_file,
    })
}

async fn remove_stale(path: &Path) -> io::Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            debug!(file = %path.display(), "removed stale result file");
            Ok(())
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err),
    }
}
