// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Result entities shared by every framework

pub mod case;
pub mod listing;
pub mod suite;

pub use case::TestCase;
pub use listing::Listing;
pub use suite::TestSuite;
