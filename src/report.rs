// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Run reports: snapshot, JSON/Markdown writers and terminal rendering

use anyhow::{Context, Result};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::model::{TestCase, TestSuite};
use crate::program::{Framework, TestProgram};
use crate::runner::TestRunner;

/// Snapshot of one program after a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramReport {
    pub name: String,
    pub path: String,
    pub framework: Framework,
    pub time: Option<f64>,
    pub suites: Vec<TestSuite>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<String>,
}

impl ProgramReport {
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

impl From<&TestProgram> for ProgramReport {
    fn from(program: &TestProgram) -> Self {
        Self {
            name: program.name(),
            path: program.path().display().to_string(),
            framework: program.framework(),
            time: program.time(),
            suites: program.suites().to_vec(),
            diagnostics: program.diagnostics().to_vec(),
        }
    }
}

/// Complete run report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub timestamp: String,
    pub directory: String,
    pub total_programs: usize,
    pub total_tests: usize,
    pub total_run: usize,
    pub total_passed: usize,
    pub total_failed: usize,
    /// Programs that never reported back in the last phase
    #[serde(default)]
    pub stalled: Vec<String>,
    pub programs: Vec<ProgramReport>,
}

impl RunReport {
    pub fn new(directory: impl AsRef<Path>) -> Self {
        Self {
            timestamp: chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            directory: directory.as_ref().display().to_string(),
            total_programs: 0,
            total_tests: 0,
            total_run: 0,
            total_passed: 0,
            total_failed: 0,
            stalled: Vec::new(),
            programs: Vec::new(),
        }
    }

    /// Snapshot every program owned by `runner`
    pub fn from_runner(runner: &TestRunner, directory: impl AsRef<Path>) -> Self {
        let mut report = Self::new(directory);
        for program in runner.programs() {
            report.add_program(ProgramReport::from(program));
        }
        report
    }

    pub fn add_program(&mut self, program: ProgramReport) {
        self.total_programs += 1;
        self.total_tests += program.total_test_count();
        self.total_run += program.run_test_count();
        self.total_passed += program.passed_test_count();
        self.total_failed += program.failed_test_count();
        self.programs.push(program);
    }

    pub fn pass_rate(&self) -> f32 {
        if self.total_run == 0 {
            0.0
        } else {
            (self.total_passed as f32 / self.total_run as f32) * 100.0
        }
    }

    pub fn has_failures(&self) -> bool {
        self.total_failed > 0 || !self.stalled.is_empty()
    }
}

/// Report writer and terminal renderer
pub struct Reporter;

impl Reporter {
    /// Write JSON report
    pub fn write_json(report: &RunReport, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(report)?;
        fs::write(path.as_ref(), json)
            .with_context(|| format!("Failed to write report: {:?}", path.as_ref()))?;
        Ok(())
    }

    /// Read a report previously written by [`Reporter::write_json`]
    pub fn read_json(path: impl AsRef<Path>) -> Result<RunReport> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read report: {:?}", path.as_ref()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse report: {:?}", path.as_ref()))
    }

    /// Write Markdown report
    pub fn write_markdown(report: &RunReport, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path.as_ref(), Self::markdown(report))
            .with_context(|| format!("Failed to write report: {:?}", path.as_ref()))?;
        Ok(())
    }

    pub fn markdown(report: &RunReport) -> String {
        let mut md = String::new();

        md.push_str("# Test Run Report\n\n");
        md.push_str(&format!("**Generated:** {}\n\n", report.timestamp));
        md.push_str(&format!("**Directory:** `{}`\n\n", report.directory));
        md.push_str("---\n\n");

        md.push_str("## Summary\n\n");
        md.push_str(&format!("- **Programs:** {}\n", report.total_programs));
        md.push_str(&format!("- **Total Tests:** {}\n", report.total_tests));
        md.push_str(&format!("- **Run:** {}\n", report.total_run));
        md.push_str(&format!("- **Passed:** {} ({:.1}%)\n", report.total_passed, report.pass_rate()));
        md.push_str(&format!("- **Failed:** {}\n", report.total_failed));
        if !report.stalled.is_empty() {
            md.push_str(&format!("- **No results:** {}\n", report.stalled.join(", ")));
        }
        md.push_str("\n---\n\n");

        md.push_str("## Programs\n\n");
        for program in &report.programs {
            md.push_str(&format!("### {} ({})\n\n", program.name, program.framework));
            md.push_str(&format!("- **Passed:** {}\n", program.passed_test_count()));
            md.push_str(&format!("- **Failed:** {}\n", program.failed_test_count()));
            md.push_str(&format!("- **Time:** {}\n\n", format_time(program.time)));

            for message in &program.diagnostics {
                md.push_str(&format!("> {}\n", message));
            }
            if !program.diagnostics.is_empty() {
                md.push('\n');
            }

            let failed: Vec<_> = program
                .suites
                .iter()
                .flat_map(|suite| suite.cases().iter().filter(|c| c.failed()).map(move |c| (suite, c)))
                .collect();

            if !failed.is_empty() {
                md.push_str("#### Failed Tests\n\n");
                for (suite, case) in failed {
                    md.push_str(&format!("- `{}.{}`\n", suite.name(), case.name()));
                    for message in case.failure_messages() {
                        md.push_str(&format!("  - {}\n", message.trim()));
                    }
                }
                md.push('\n');
            }
        }

        md
    }

    /// Print the suite/case tree of every program
    pub fn print_tree(programs: &[ProgramReport]) {
        for program in programs {
            println!(
                "{} {}",
                program.name.bold(),
                format!("[{}]", program.framework).white()
            );
            for suite in &program.suites {
                println!("  {}", suite.name().cyan());
                for case in suite.cases() {
                    if case.is_enabled() {
                        println!("    {}", case.name());
                    } else {
                        println!("    {} {}", case.name().dimmed(), "(disabled)".dimmed());
                    }
                }
            }
        }
    }

    /// One line per program, as its results arrive
    pub fn print_program_results(program: &ProgramReport) {
        let failed = program.failed_test_count();
        let icon = if failed == 0 { "✓".green() } else { "✗".red() };
        println!(
            "  {} {}: {} passed, {} failed ({})",
            icon,
            program.name.cyan(),
            program.passed_test_count().to_string().green(),
            if failed > 0 {
                failed.to_string().red()
            } else {
                failed.to_string().green()
            },
            format_time(program.time)
        );
    }

    /// Full detail for every case that ran
    pub fn print_details(program: &ProgramReport) {
        for suite in &program.suites {
            for case in suite.cases().iter().filter(|c| c.was_run()) {
                Self::print_case_details(suite, case);
            }
        }
    }

    pub fn print_case_details(suite: &TestSuite, case: &TestCase) {
        let status = if case.passed() { "PASSED".green() } else { "FAILED".red() };
        println!("\n  {}.{} {}", suite.name(), case.name().bold(), status);
        println!("    Time: {}", format_time(case.time()));

        for message in case.failure_messages() {
            println!("    {} {}", "Failure:".red(), message.trim());
        }
        for message in case.benchmark_messages() {
            println!("    {}", message.yellow());
        }
        for message in case.other_messages() {
            println!("    {}", message.white());
        }
    }

    /// Print terminal summary
    pub fn print_summary(report: &RunReport) {
        println!("\n{}", "═".repeat(80).white());
        println!("{}", "Test Run Report".bold());
        println!("{}", "═".repeat(80).white());
        println!("  {} {}", "Timestamp:".white(), report.timestamp.cyan());
        println!("  {} {}", "Programs:".white(), report.total_programs.to_string().cyan());
        println!("  {} {}", "Total Tests:".white(), report.total_tests.to_string().cyan());
        println!("  {} {}", "Run:".white(), report.total_run.to_string().cyan());
        println!(
            "  {} {} ({:.1}%)",
            "Passed:".white(),
            report.total_passed.to_string().green(),
            report.pass_rate()
        );
        println!(
            "  {} {}",
            "Failed:".white(),
            if report.total_failed > 0 {
                report.total_failed.to_string().red()
            } else {
                report.total_failed.to_string().green()
            }
        );
        if !report.stalled.is_empty() {
            println!(
                "  {} {}",
                "No results:".white(),
                report.stalled.join(", ").yellow()
            );
        }
        println!("{}", "═".repeat(80).white());
    }
}

/// Seconds with millisecond precision, or "unknown"
pub fn format_time(time: Option<f64>) -> String {
    match time {
        Some(seconds) => format!("{:.3}s", seconds),
        None => "unknown".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_program() -> ProgramReport {
        let mut suite = TestSuite::with_cases("Math", ["Adds", "Divides", "Skipped"]);
        let adds = suite.case_for_name_mut("Adds").unwrap();
        adds.set_was_run(true);
        adds.set_passed(true);
        let divides = suite.case_for_name_mut("Divides").unwrap();
        divides.set_was_run(true);
        divides.add_failure_message("expected 2, got 3\n");

        ProgramReport {
            name: "gtest_math".to_string(),
            path: "/opt/gtest_math".to_string(),
            framework: Framework::GoogleTest,
            time: Some(0.25),
            suites: vec![suite],
            diagnostics: Vec::new(),
        }
    }

    #[test]
    fn test_totals() {
        let mut report = RunReport::new("/opt");
        report.add_program(sample_program());

        assert_eq!(report.total_programs, 1);
        assert_eq!(report.total_tests, 3);
        assert_eq!(report.total_run, 2);
        assert_eq!(report.total_passed, 1);
        assert_eq!(report.total_failed, 1);
        assert!((report.pass_rate() - 50.0).abs() < f32::EPSILON);
        assert!(report.has_failures());
    }

    #[test]
    fn test_markdown_lists_failures() {
        let mut report = RunReport::new("/opt");
        report.add_program(sample_program());
        report.stalled.push("tst_hangs".to_string());

        let md = Reporter::markdown(&report);
        assert!(md.contains("### gtest_math (gtest)"));
        assert!(md.contains("- `Math.Divides`\n  - expected 2, got 3\n"));
        assert!(!md.contains("Math.Adds"));
        assert!(md.contains("**No results:** tst_hangs"));
    }

    #[test]
    fn test_json_file_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let mut report = RunReport::new("/opt");
        report.add_program(sample_program());

        Reporter::write_json(&report, &path).unwrap();
        assert_eq!(Reporter::read_json(&path).unwrap(), report);
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(None), "unknown");
        assert_eq!(format_time(Some(1.5)), "1.500s");
    }
}
