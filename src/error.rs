// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Listing and result parse errors

use thiserror::Error;

/// Why a listing or a result file could not be understood.
///
/// Every variant aborts the phase attempt of the program that produced it;
/// the `Display` text is what lands on the diagnostic channel.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed listing: {0}")]
    MalformedListing(String),

    #[error("malformed listing: found test case `{0}` before any test suite name")]
    CaseBeforeSuite(String),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("unexpected end of XML document")]
    UnexpectedEof,

    #[error("file is not readable as a {0} result")]
    NotAResultFile(&'static str),

    #[error("could not find test suite listing for {0}")]
    UnknownSuite(String),

    #[error("could not find test case listing for {0}")]
    UnknownCase(String),

    #[error("unknown incident type {0}")]
    UnknownIncident(String),

    #[error("could not read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl From<quick_xml::events::attributes::AttrError> for ParseError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        ParseError::Xml(err.into())
    }
}

pub type ParseResult<T> = std::result::Result<T, ParseError>;
