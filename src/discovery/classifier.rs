// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Framework detection from executable filenames

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Framework a discovered executable appears to be built with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProgramType {
    Unknown,
    GoogleTest,
    QtTestLib,
}

impl ProgramType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgramType::Unknown => "unknown",
            ProgramType::GoogleTest => "gtest",
            ProgramType::QtTestLib => "qtest",
        }
    }
}

/// A discovered path paired with its classification. Only lives long enough
/// to be handed to the program factory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramInfo {
    pub path: PathBuf,
    pub program_type: ProgramType,
}

/// Filename prefixes recognised for each framework
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramClassifier {
    pub gtest_prefixes: Vec<String>,
    pub qtest_prefixes: Vec<String>,
}

impl Default for ProgramClassifier {
    fn default() -> Self {
        Self {
            gtest_prefixes: default_gtest_prefixes(),
            qtest_prefixes: default_qtest_prefixes(),
        }
    }
}

pub fn default_gtest_prefixes() -> Vec<String> {
    vec!["gtest_".to_string(), "gtst_".to_string()]
}

pub fn default_qtest_prefixes() -> Vec<String> {
    // "tst_" is the usual Qt project convention
    vec!["qtest_".to_string(), "qtst_".to_string(), "tst_".to_string()]
}

impl ProgramClassifier {
    pub fn new(gtest_prefixes: Vec<String>, qtest_prefixes: Vec<String>) -> Self {
        Self {
            gtest_prefixes,
            qtest_prefixes,
        }
    }

    /// Classify by filename only; the directory never matters
    pub fn program_type(&self, path: &Path) -> ProgramType {
        let Some(file_name) = path.file_name() else {
            return ProgramType::Unknown;
        };
        let file_name = file_name.to_string_lossy();

        let matches = |prefixes: &[String]| prefixes.iter().any(|p| file_name.starts_with(p.as_str()));

        if matches(&self.gtest_prefixes) {
            ProgramType::GoogleTest
        } else if matches(&self.qtest_prefixes) {
            ProgramType::QtTestLib
        } else {
            ProgramType::Unknown
        }
    }

    /// One entry per input path, in input order
    pub fn classify(&self, paths: &[PathBuf]) -> Vec<ProgramInfo> {
        paths
            .iter()
            .map(|path| ProgramInfo {
                path: path.clone(),
                program_type: self.program_type(path),
            })
            .collect()
    }
}
