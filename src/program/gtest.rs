// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! GoogleTest listing and XML result handling
//!
//! Listing (`--gtest_list_tests`):
//!
//! ```text
//! Math.
//!   Adds
//!   Subtracts
//! Typed/0.  # TypeParam = int
//!   Works
//! ```
//!
//! Results (`--gtest_output=xml:<file>`) use the JUnit-like
//! `testsuites` / `testsuite` / `testcase` / `failure` layout.

use std::path::Path;

use super::xml::{Element, XmlCursor};
use crate::error::{ParseError, ParseResult};
use crate::model::{Listing, TestSuite};

pub const LIST_TESTS_ARG: &str = "--gtest_list_tests";
pub const OUTPUT_ARG: &str = "--gtest_output=xml:";
pub const FILTER_ARG: &str = "--gtest_filter=";

pub fn listing_args() -> Vec<String> {
    vec![LIST_TESTS_ARG.to_string()]
}

pub fn run_args(suites: &[TestSuite], result_file: &Path) -> Vec<String> {
    let mut args = vec![format!("{}{}", OUTPUT_ARG, result_file.display())];

    let filter = filter_arg(suites);
    if !filter.is_empty() {
        args.push(format!("{}{}", FILTER_ARG, filter));
    }

    args
}

/// `Suite.case` for every enabled case, joined with `:`
pub fn filter_arg(suites: &[TestSuite]) -> String {
    suites
        .iter()
        .flat_map(|suite| {
            suite
                .cases()
                .iter()
                .filter(|case| case.is_enabled())
                .map(move |case| format!("{}.{}", suite.name(), case.name()))
        })
        .collect::<Vec<_>>()
        .join(":")
}

pub fn parse_listing(output: &[u8]) -> ParseResult<Listing> {
    let text = String::from_utf8_lossy(output);
    let mut listing = Listing::new();
    let mut current_suite: Option<&str> = None;

    for raw in text.lines() {
        // Parameterized tests annotate lines with "  # GetParam() = ..."
        let line = raw.split_once('#').map_or(raw, |(before, _)| before).trim();
        if line.is_empty() {
            continue;
        }

        if let Some(suite) = line.strip_suffix('.') {
            listing.add_suite(suite);
            current_suite = Some(suite);
        } else {
            let Some(suite) = current_suite else {
                return Err(ParseError::CaseBeforeSuite(line.to_string()));
            };
            listing.add_case(suite, line);
        }
    }

    Ok(listing)
}

/// Apply a result document to the listed suites. Returns the total elapsed
/// time reported for the whole program.
pub fn parse_results(xml: &str, suites: &mut [TestSuite]) -> ParseResult<Option<f64>> {
    let mut cursor = XmlCursor::new(xml);

    let root = match cursor.next_child()? {
        Some(root) if root.is("testsuites") => root,
        _ => return Err(ParseError::NotAResultFile("GoogleTest")),
    };
    let program_time = root.number("time")?;

    if !root.is_empty() {
        while let Some(child) = cursor.next_child()? {
            if child.is("testsuite") {
                read_suite(&mut cursor, &child, suites)?;
            } else {
                cursor.skip(&child)?;
            }
        }
    }

    Ok(program_time)
}

fn read_suite<'a>(
    cursor: &mut XmlCursor<'a>,
    element: &Element<'a>,
    suites: &mut [TestSuite],
) -> ParseResult<()> {
    let name = element.attribute("name")?.unwrap_or_default();
    let suite = suites
        .iter_mut()
        .find(|s| s.name() == name)
        .ok_or(ParseError::UnknownSuite(name))?;

    if let Some(time) = element.number("time")? {
        suite.set_time(time);
    }

    if element.is_empty() {
        return Ok(());
    }

    while let Some(child) = cursor.next_child()? {
        if child.is("testcase") {
            read_case(cursor, &child, suite)?;
        } else {
            cursor.skip(&child)?;
        }
    }

    Ok(())
}

fn read_case<'a>(
    cursor: &mut XmlCursor<'a>,
    element: &Element<'a>,
    suite: &mut TestSuite,
) -> ParseResult<()> {
    let name = element.attribute("name")?.unwrap_or_default();
    let case = suite
        .case_for_name_mut(&name)
        .ok_or(ParseError::UnknownCase(name))?;

    if let Some(time) = element.number("time")? {
        case.set_time(time);
    }

    let not_run = element.attribute("status")?.as_deref() == Some("notrun")
        || element.attribute("result")?.as_deref() == Some("skipped");
    if not_run {
        case.set_was_run(false);
        return cursor.skip(element);
    }

    case.set_was_run(true);
    case.set_passed(true);

    if element.is_empty() {
        return Ok(());
    }

    while let Some(child) = cursor.next_child()? {
        if child.is("failure") {
            let summary = child.attribute("message")?;
            let mut message = cursor.read_text(&child)?;
            if message.is_empty() {
                message = summary.unwrap_or_default();
            }
            case.add_failure_message(message);
            case.set_passed(false);
        } else {
            cursor.skip(&child)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn listed() -> Vec<TestSuite> {
        vec![
            TestSuite::with_cases("Math", ["Adds", "Divides"]),
            TestSuite::with_cases("Strings", ["Trims"]),
        ]
    }

    #[test]
    fn test_parse_listing() {
        let output = b"Math.\n  Adds\n  Divides\nStrings.\n  Trims\n";
        let listing = parse_listing(output).unwrap();
        assert_eq!(listing.suite_names().collect::<Vec<_>>(), ["Math", "Strings"]);
        assert_eq!(listing.cases("Math").unwrap(), ["Adds", "Divides"]);
        assert_eq!(listing.cases("Strings").unwrap(), ["Trims"]);
    }

    #[test]
    fn test_parse_listing_strips_parameter_comments() {
        let output = b"Typed/0.  # TypeParam = int\n  Works\nRanges/Param.\n  Holds/0  # GetParam() = 4\n\n";
        let listing = parse_listing(output).unwrap();
        assert_eq!(listing.cases("Typed/0").unwrap(), ["Works"]);
        assert_eq!(listing.cases("Ranges/Param").unwrap(), ["Holds/0"]);
    }

    #[test]
    fn test_case_before_suite_is_fatal() {
        let err = parse_listing(b"Running main() from gtest_main.cc\nMath.\n  Adds\n").unwrap_err();
        assert!(matches!(err, ParseError::CaseBeforeSuite(_)));
        assert!(err.to_string().contains("malformed listing"));
    }

    #[test]
    fn test_filter_skips_disabled_cases() {
        let mut suites = listed();
        assert_eq!(filter_arg(&suites), "Math.Adds:Math.Divides:Strings.Trims");

        suites[0].case_for_name_mut("Divides").unwrap().set_enabled(false);
        assert_eq!(filter_arg(&suites), "Math.Adds:Strings.Trims");
        assert_eq!(filter_arg(&[]), "");
    }

    #[test]
    fn test_run_args() {
        let args = run_args(&listed(), &PathBuf::from("/tmp/gtest_math.xml"));
        assert_eq!(args[0], "--gtest_output=xml:/tmp/gtest_math.xml");
        assert_eq!(args[1], "--gtest_filter=Math.Adds:Math.Divides:Strings.Trims");

        let args = run_args(&[], &PathBuf::from("/tmp/gtest_math.xml"));
        assert_eq!(args.len(), 1);
    }

    const RESULTS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<testsuites tests="3" failures="1" disabled="0" errors="0" time="0.042" name="AllTests">
  <properties/>
  <testsuite name="Math" tests="2" failures="1" disabled="0" errors="0" time="0.03">
    <testcase name="Adds" status="run" result="completed" time="0.01" classname="Math" />
    <testcase name="Divides" status="run" result="completed" time="0.02" classname="Math">
      <failure message="first" type=""><![CDATA[math.cc:10
Expected: 2]]></failure>
      <failure message="second" type=""><![CDATA[math.cc:11]]></failure>
    </testcase>
  </testsuite>
  <testsuite name="Strings" tests="1" failures="0" disabled="0" errors="0" time="0">
    <testcase name="Trims" status="notrun" time="0" classname="Strings" />
  </testsuite>
</testsuites>"#;

    #[test]
    fn test_parse_results() {
        let mut suites = listed();
        let program_time = parse_results(RESULTS, &mut suites).unwrap();
        assert_eq!(program_time, Some(0.042));

        let math = &suites[0];
        assert_eq!(math.time(), Some(0.03));
        assert_eq!(math.passed_test_count(), 1);
        assert_eq!(math.failed_test_count(), 1);

        let divides = math.case_for_name("Divides").unwrap();
        assert_eq!(divides.time(), Some(0.02));
        assert_eq!(
            divides.failure_messages(),
            ["math.cc:10\nExpected: 2".to_string(), "math.cc:11".to_string()]
        );

        let trims = suites[1].case_for_name("Trims").unwrap();
        assert!(!trims.was_run());
        assert_eq!(suites[1].run_test_count(), 0);
    }

    #[test]
    fn test_skipped_result_counts_as_not_run() {
        let xml = r#"<testsuites time="0"><testsuite name="Math">
            <testcase name="Adds" status="run" result="skipped" time="0"><skipped message="later"/></testcase>
            </testsuite></testsuites>"#;
        let mut suites = listed();
        parse_results(xml, &mut suites).unwrap();
        assert!(!suites[0].case_for_name("Adds").unwrap().was_run());
    }

    #[test]
    fn test_unknown_suite_is_fatal() {
        let xml = r#"<testsuites><testsuite name="Ghost" time="0"/></testsuites>"#;
        let err = parse_results(xml, &mut listed()).unwrap_err();
        assert_eq!(err.to_string(), "could not find test suite listing for Ghost");
    }

    #[test]
    fn test_unknown_case_is_fatal() {
        let xml = r#"<testsuites><testsuite name="Math"><testcase name="Ghost"/></testsuite></testsuites>"#;
        let err = parse_results(xml, &mut listed()).unwrap_err();
        assert!(matches!(err, ParseError::UnknownCase(name) if name == "Ghost"));
    }

    #[test]
    fn test_wrong_root_and_broken_xml() {
        let err = parse_results("<TestCase name=\"x\"/>", &mut listed()).unwrap_err();
        assert!(matches!(err, ParseError::NotAResultFile(_)));

        let err = parse_results("<testsuites><testsuite name=\"Math\"></testsuites>", &mut listed())
            .unwrap_err();
        assert!(matches!(err, ParseError::Xml(_)));
    }
}
