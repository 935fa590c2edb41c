// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Executable lookup in a directory tree

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Filename endings of shared and static libraries. Directory scans report
/// these as executable on most platforms.
const LIBRARY_SUFFIXES: &[&str] = &[".so", ".a", ".dylib", ".dll", ".lib", ".ocx"];

/// Finds candidate test executables
pub struct ProgramFinder;

impl ProgramFinder {
    /// Return the canonical paths of every executable file under `directory`.
    ///
    /// Only the top level is scanned unless `recurse` is set. A path that does
    /// not exist or is not a directory yields an empty list. Duplicates (for
    /// example through symlinks) are reported once and likely libraries are
    /// skipped.
    pub fn find(directory: impl AsRef<Path>, recurse: bool) -> Vec<PathBuf> {
        let directory = directory.as_ref();
        if !directory.is_dir() {
            debug!(directory = %directory.display(), "not a directory, nothing to scan");
            return Vec::new();
        }

        let max_depth = if recurse { usize::MAX } else { 1 };
        let mut seen = HashSet::new();
        let mut found = Vec::new();

        for entry in WalkDir::new(directory)
            .min_depth(1)
            .max_depth(max_depth)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(is_executable_file)
        {
            let Ok(path) = entry.path().canonicalize() else {
                continue;
            };
            if Self::is_probably_library(&path) {
                debug!(path = %path.display(), "skipping library");
                continue;
            }
            if seen.insert(path.clone()) {
                found.push(path);
            }
        }

        found
    }

    /// Whether the filename follows a known library naming convention
    pub fn is_probably_library(path: &Path) -> bool {
        let Some(file_name) = path.file_name() else {
            return false;
        };
        let file_name = file_name.to_string_lossy().to_lowercase();

        file_name.contains(".so.")
            || LIBRARY_SUFFIXES
                .iter()
                .any(|suffix| file_name.ends_with(suffix))
    }
}

#[cfg(unix)]
fn is_executable_file(entry: &DirEntry) -> bool {
    use std::os::unix::fs::PermissionsExt;

    entry
        .metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable_file(entry: &DirEntry) -> bool {
    entry.file_type().is_file()
        && entry
            .path()
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("exe"))
            .unwrap_or(false)
}
