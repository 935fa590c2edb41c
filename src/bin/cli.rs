// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Testscope CLI

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use testscope::report::ProgramReport;
use testscope::{
    PhaseOutcome, Reporter, RunReport, RunnerConfig, RunnerEvent, RunnerEvents, TestRunner,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "testscope")]
#[command(about = "Discover, list and run GoogleTest and QtTest programs", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to ./testscope.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the suites and cases of every test program in a directory
    List {
        /// Directory containing test programs
        directory: Option<PathBuf>,

        /// Search subdirectories too
        #[arg(short, long)]
        recurse: bool,
    },

    /// List, then run every test program in a directory
    Run {
        /// Directory containing test programs
        directory: Option<PathBuf>,

        /// Search subdirectories too
        #[arg(short, long)]
        recurse: bool,

        /// Only run cases whose `suite.case` name contains this
        #[arg(short, long)]
        filter: Option<String>,

        /// Write JSON and Markdown reports into this directory
        #[arg(long)]
        report_dir: Option<PathBuf>,

        /// Print time and messages for every case that ran
        #[arg(long)]
        details: bool,
    },

    /// Render a report written by `run`
    Report {
        /// Input JSON report file
        input: PathBuf,

        /// Output format (markdown, terminal)
        #[arg(long, default_value = "terminal")]
        format: String,

        /// Markdown output file
        #[arg(short, long, default_value = "report.md")]
        output: PathBuf,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => RunnerConfig::from_file(path)?,
        None => RunnerConfig::load()?,
    };
    config.verbose |= cli.verbose;
    init_tracing(config.verbose);

    match cli.command {
        Commands::List { directory, recurse } => {
            if let Some(directory) = directory {
                config.directory = directory;
            }
            config.recurse |= recurse;
            list(&config).await
        }
        Commands::Run {
            directory,
            recurse,
            filter,
            report_dir,
            details,
        } => {
            if let Some(directory) = directory {
                config.directory = directory;
            }
            config.recurse |= recurse;
            if filter.is_some() {
                config.filter = filter;
            }
            if report_dir.is_some() {
                config.report_dir = report_dir;
            }
            run(&config, details).await
        }
        Commands::Report {
            input,
            format,
            output,
        } => generate_report(&input, &format, &output),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

async fn list(config: &RunnerConfig) -> Result<()> {
    let (mut runner, mut events) = TestRunner::new(config.classifier());

    let stalled = list_phase(&mut runner, &mut events, config).await?;
    let programs: Vec<ProgramReport> = runner.programs().iter().map(ProgramReport::from).collect();
    Reporter::print_tree(&programs);

    println!(
        "\n{} {} programs, {} tests",
        "Found".bold(),
        runner.programs().len(),
        runner.total_test_count()
    );
    if !stalled.is_empty() {
        std::process::exit(1);
    }
    Ok(())
}

async fn run(config: &RunnerConfig, details: bool) -> Result<()> {
    let (mut runner, mut events) = TestRunner::new(config.classifier());

    let mut stalled = list_phase(&mut runner, &mut events, config).await?;

    if let Some(filter) = &config.filter {
        let enabled = runner.set_filter(filter);
        if config.verbose {
            println!("  Filter {:?} enabled {} cases", filter, enabled);
        }
    }

    println!("{}", "Running tests...".bold());
    if !runner.run_tests() {
        bail!("a phase is still active");
    }
    let outcome = drive_phase(&mut runner, &mut events, |runner, index| {
        if let Some(program) = runner.program(index) {
            let program = ProgramReport::from(program);
            Reporter::print_program_results(&program);
            if details {
                Reporter::print_details(&program);
            }
        }
    })
    .await;
    stalled.extend(settle(&mut runner, outcome, "run"));

    let mut report = RunReport::from_runner(&runner, &config.directory);
    report.stalled = stalled;

    if let Some(report_dir) = &config.report_dir {
        std::fs::create_dir_all(report_dir)?;

        let json_path = report_dir.join("testscope_report.json");
        Reporter::write_json(&report, &json_path)?;

        let md_path = report_dir.join("testscope_report.md");
        Reporter::write_markdown(&report, &md_path)?;

        if config.verbose {
            println!("  Reports written to {}", report_dir.display());
        }
    }

    Reporter::print_summary(&report);

    if report.has_failures() {
        std::process::exit(1);
    }

    Ok(())
}

/// Discover and list programs. Returns the names of programs whose listing
/// never arrived.
async fn list_phase(
    runner: &mut TestRunner,
    events: &mut RunnerEvents,
    config: &RunnerConfig,
) -> Result<Vec<String>> {
    if !config.directory.is_dir() {
        bail!("Not a directory: {}", config.directory.display());
    }

    if config.verbose {
        println!("{}", "Discovering test programs...".bold());
        println!("  Directory: {}", config.directory.display());
        println!("  Recursive: {}", config.recurse);
    }

    runner.list_tests(&config.directory, config.recurse);
    let outcome = drive_phase(runner, events, |_, _| {}).await;
    Ok(settle(runner, outcome, "list"))
}

/// Apply completions until the phase ends, feeding the progress bar from the
/// runner's events
async fn drive_phase(
    runner: &mut TestRunner,
    events: &mut RunnerEvents,
    mut on_results: impl FnMut(&TestRunner, usize),
) -> PhaseOutcome {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );

    let outcome = loop {
        while let Ok(event) = events.try_recv() {
            match event {
                RunnerEvent::ProgressRange { min, max } => {
                    pb.set_length((max - min) as u64);
                    pb.set_position(0);
                }
                RunnerEvent::ProgressValue(value) => pb.set_position(value as u64),
                RunnerEvent::ResultsReady { program } => {
                    pb.suspend(|| on_results(runner, program));
                }
                RunnerEvent::ListStarted
                | RunnerEvent::ListFinished
                | RunnerEvent::RunStarted
                | RunnerEvent::RunFinished => {}
            }
        }

        if !runner.is_active() {
            break PhaseOutcome::Finished;
        }
        if !runner.process_next().await {
            break PhaseOutcome::Stalled(runner.stalled_programs());
        }
    };

    pb.finish_and_clear();
    outcome
}

/// Report and abandon a stalled phase, returning the programs that stalled
fn settle(runner: &mut TestRunner, outcome: PhaseOutcome, phase: &str) -> Vec<String> {
    let PhaseOutcome::Stalled(indices) = outcome else {
        return Vec::new();
    };

    let names: Vec<String> = indices
        .iter()
        .filter_map(|&index| runner.program(index))
        .map(|program| program.name())
        .collect();

    eprintln!(
        "{} {} phase did not complete; no {} from: {}",
        "Warning:".yellow(),
        phase,
        if phase == "list" { "listing" } else { "results" },
        names.join(", ")
    );
    for &index in &indices {
        if let Some(program) = runner.program(index) {
            for message in program.diagnostics() {
                eprintln!("  {}: {}", program.name().cyan(), message);
            }
        }
    }

    runner.abandon_phase();
    names
}

fn generate_report(input: &Path, format: &str, output: &Path) -> Result<()> {
    let report = Reporter::read_json(input)?;

    match format.to_lowercase().as_str() {
        "markdown" | "md" => {
            Reporter::write_markdown(&report, output)?;
            println!("{} Generated Markdown report: {}", "Success:".green(), output.display());
        }
        "terminal" | "term" => {
            for program in &report.programs {
                Reporter::print_program_results(program);
            }
            Reporter::print_summary(&report);
        }
        _ => {
            bail!("Unknown format: {}. Use markdown or terminal", format);
        }
    }

    Ok(())
}
