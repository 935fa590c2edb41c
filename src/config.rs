// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Runner configuration

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::discovery::classifier::{default_gtest_prefixes, default_qtest_prefixes};
use crate::discovery::ProgramClassifier;

/// Default configuration file looked up in the working directory
pub const CONFIG_FILE: &str = "testscope.toml";

/// Runner configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Directory scanned for test programs
    pub directory: PathBuf,
    /// Descend into subdirectories
    pub recurse: bool,
    /// Filename prefixes of GoogleTest programs
    pub gtest_prefixes: Vec<String>,
    /// Filename prefixes of QtTest programs
    pub qtest_prefixes: Vec<String>,
    /// Where JSON and Markdown reports are written, if anywhere
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_dir: Option<PathBuf>,
    /// Only run cases whose `suite.case` name contains this
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    /// Verbose output
    pub verbose: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            recurse: false,
            gtest_prefixes: default_gtest_prefixes(),
            qtest_prefixes: default_qtest_prefixes(),
            report_dir: None,
            filter: None,
            verbose: false,
        }
    }
}

impl RunnerConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: RunnerConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;
        Ok(config)
    }

    /// Load `testscope.toml` when present, then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = if Path::new(CONFIG_FILE).exists() {
            Self::from_file(CONFIG_FILE)?
        } else {
            Self::default()
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = var("TESTSCOPE_DIR") {
            self.directory = PathBuf::from(dir);
        }

        if let Some(recurse) = var("TESTSCOPE_RECURSE") {
            self.recurse = recurse.parse().unwrap_or(false);
        }

        if let Some(report_dir) = var("TESTSCOPE_REPORT_DIR") {
            self.report_dir = Some(PathBuf::from(report_dir));
        }

        if let Some(verbose) = var("TESTSCOPE_VERBOSE") {
            self.verbose = verbose.parse().unwrap_or(false);
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }

    pub fn classifier(&self) -> ProgramClassifier {
        ProgramClassifier::new(self.gtest_prefixes.clone(), self.qtest_prefixes.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::ProgramType;
    use std::collections::HashMap;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: RunnerConfig = toml::from_str(
            r#"
            directory = "/opt/build/tests"
            qtest_prefixes = ["check_"]
            "#,
        )
        .unwrap();

        assert_eq!(config.directory, PathBuf::from("/opt/build/tests"));
        assert!(!config.recurse);
        assert_eq!(config.gtest_prefixes, default_gtest_prefixes());

        let classifier = config.classifier();
        assert_eq!(classifier.program_type(Path::new("check_gui")), ProgramType::QtTestLib);
        assert_eq!(classifier.program_type(Path::new("tst_gui")), ProgramType::Unknown);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("TESTSCOPE_DIR", "/tmp/bin"),
            ("TESTSCOPE_RECURSE", "true"),
            ("TESTSCOPE_VERBOSE", "not-a-bool"),
        ]
        .into_iter()
        .collect();

        let mut config = RunnerConfig {
            verbose: true,
            ..RunnerConfig::default()
        };
        config.apply_env(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.directory, PathBuf::from("/tmp/bin"));
        assert!(config.recurse);
        assert!(!config.verbose);
        assert_eq!(config.report_dir, None);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let config = RunnerConfig {
            recurse: true,
            filter: Some("Math.".to_string()),
            report_dir: Some(PathBuf::from("reports")),
            ..RunnerConfig::default()
        };

        config.save(&path).unwrap();
        assert_eq!(RunnerConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = RunnerConfig::from_file("/nonexistent/testscope.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
