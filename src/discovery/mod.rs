// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Program discovery and classification

pub mod classifier;
pub mod finder;

pub use classifier::{ProgramClassifier, ProgramInfo, ProgramType};
pub use finder::ProgramFinder;
