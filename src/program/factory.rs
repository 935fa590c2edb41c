// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Build test programs from classified discovery results

use tracing::debug;

use super::{Framework, TestProgram};
use crate::discovery::ProgramInfo;

pub struct ProgramFactory;

impl ProgramFactory {
    /// One program per recognised entry, in input order. Unknown entries are
    /// dropped.
    pub fn create_programs(infos: Vec<ProgramInfo>) -> Vec<TestProgram> {
        infos
            .into_iter()
            .filter_map(|info| match Framework::from_program_type(info.program_type) {
                Some(framework) => Some(TestProgram::new(info.path, framework)),
                None => {
                    debug!(path = %info.path.display(), "not a recognised test program");
                    None
                }
            })
            .collect()
    }
}
