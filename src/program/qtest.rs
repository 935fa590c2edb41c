// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! QtTestLib listing and XML result handling
//!
//! A QtTest executable holds exactly one test class, which becomes the
//! program's single suite. `-datatags` prints one `<Class> <function>` line
//! per test function; results come from `-xml -o <file>`.

use std::path::Path;

use super::xml::{Element, XmlCursor};
use crate::error::{ParseError, ParseResult};
use crate::model::{Listing, TestSuite};

/// Lifecycle hooks every QtTest class runs around its test functions
pub const INIT_TEST_CASE: &str = "initTestCase";
pub const CLEANUP_TEST_CASE: &str = "cleanupTestCase";

pub fn listing_args() -> Vec<String> {
    vec!["-datatags".to_string()]
}

/// `-xml -o <file>`, followed by the enabled function names when only part
/// of the class should run.
pub fn run_args(suites: &[TestSuite], result_file: &Path) -> Vec<String> {
    let mut args = vec![
        "-xml".to_string(),
        "-o".to_string(),
        result_file.display().to_string(),
    ];

    for suite in suites.iter().filter(|s| s.has_disabled_tests()) {
        let functions: Vec<String> = suite
            .cases()
            .iter()
            .filter(|c| c.is_enabled() && !is_lifecycle_hook(c.name()))
            .map(|c| c.name().to_string())
            .collect();

        // Naming no function would run all of them
        if functions.is_empty() {
            args.push(INIT_TEST_CASE.to_string());
        } else {
            args.extend(functions);
        }
    }

    args
}

fn is_lifecycle_hook(name: &str) -> bool {
    name == INIT_TEST_CASE || name == CLEANUP_TEST_CASE
}

pub fn parse_listing(output: &[u8]) -> ParseResult<Listing> {
    let text = String::from_utf8_lossy(output);
    let mut listing = Listing::new();

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        let [suite, case] = fields.as_slice() else {
            return Err(ParseError::MalformedListing(format!(
                "expected `<suite> <case>`, got `{line}`"
            )));
        };

        if !listing.contains_suite(suite) {
            listing.add_case(suite, INIT_TEST_CASE);
        }
        if *case != CLEANUP_TEST_CASE {
            listing.add_case(suite, case);
        }
    }

    for cases in listing.suites_mut() {
        cases.push(CLEANUP_TEST_CASE.to_string());
    }

    Ok(listing)
}

/// Apply a result document to the listed suite. QtTest reports no
/// program-wide time, so this always yields `None` on success.
pub fn parse_results(xml: &str, suites: &mut [TestSuite]) -> ParseResult<Option<f64>> {
    let mut cursor = XmlCursor::new(xml);

    let root = match cursor.next_child()? {
        Some(root) if root.is("TestCase") => root,
        _ => return Err(ParseError::NotAResultFile("QtTestLib")),
    };

    let name = root.attribute("name")?.unwrap_or_default();
    let suite = suites
        .iter_mut()
        .find(|s| s.name() == name)
        .ok_or(ParseError::UnknownSuite(name))?;

    if root.is_empty() {
        return Ok(None);
    }

    while let Some(child) = cursor.next_child()? {
        if child.is("TestFunction") {
            read_function(&mut cursor, &child, suite)?;
        } else if child.is("Duration") {
            if let Some(msecs) = child.number("msecs")? {
                suite.set_time(msecs / 1000.0);
            }
            cursor.skip(&child)?;
        } else {
            cursor.skip(&child)?;
        }
    }

    Ok(None)
}

fn read_function<'a>(
    cursor: &mut XmlCursor<'a>,
    element: &Element<'a>,
    suite: &mut TestSuite,
) -> ParseResult<()> {
    let name = element.attribute("name")?.unwrap_or_default();
    let case = suite
        .case_for_name_mut(&name)
        .ok_or(ParseError::UnknownCase(name))?;

    case.set_was_run(true);
    if element.is_empty() {
        return Ok(());
    }

    // A failing data row keeps the function failed even if later rows pass
    let mut failed = false;

    while let Some(child) = cursor.next_child()? {
        if child.is("BenchmarkResult") {
            if let Some(message) = benchmark_message(&child)? {
                case.add_benchmark_message(message);
            }
            cursor.skip(&child)?;
        } else if child.is("Incident") {
            let kind = child.attribute("type")?.unwrap_or_default();
            match kind.as_str() {
                "pass" => {
                    if !failed {
                        case.set_passed(true);
                    }
                    cursor.skip(&child)?;
                }
                "fail" => {
                    failed = true;
                    case.set_passed(false);
                    for description in read_descriptions(cursor, &child)? {
                        case.add_failure_message(description);
                    }
                }
                _ => return Err(ParseError::UnknownIncident(kind)),
            }
        } else if child.is("Message") {
            let kind = child.attribute("type")?.unwrap_or_default();
            for description in read_descriptions(cursor, &child)? {
                case.add_other_message(format!("{} : {}", kind, description));
            }
        } else if child.is("Duration") {
            if let Some(msecs) = child.number("msecs")? {
                case.set_time(msecs / 1000.0);
            }
            cursor.skip(&child)?;
        } else {
            cursor.skip(&child)?;
        }
    }

    Ok(())
}

fn benchmark_message(element: &Element<'_>) -> ParseResult<Option<String>> {
    let total = element.number("value")?;
    let iterations = element
        .attribute("iterations")?
        .and_then(|i| i.trim().parse::<u64>().ok())
        .filter(|i| *i > 0);

    Ok(match (total, iterations) {
        (Some(total), Some(iterations)) => Some(format!(
            "Benchmark : {} msec per iteration (total: {}, iterations: {})",
            total / iterations as f64,
            total,
            iterations
        )),
        _ => None,
    })
}

/// Text of every `Description` child, consuming the whole element
fn read_descriptions<'a>(
    cursor: &mut XmlCursor<'a>,
    element: &Element<'a>,
) -> ParseResult<Vec<String>> {
    let mut descriptions = Vec::new();
    if element.is_empty() {
        return Ok(descriptions);
    }

    while let Some(child) = cursor.next_child()? {
        if child.is("Description") {
            let text = cursor.read_text(&child)?;
            if !text.is_empty() {
                descriptions.push(text);
            }
        } else {
            cursor.skip(&child)?;
        }
    }

    Ok(descriptions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn listed() -> Vec<TestSuite> {
        parse_listing(b"tst_Parser parsesEmpty\ntst_Parser parsesNested\ntst_Parser benchParse\n")
            .unwrap()
            .into_suites()
    }

    #[test]
    fn test_listing_adds_lifecycle_hooks() {
        let listing = parse_listing(b"S c1\nS c2\n").unwrap();
        assert_eq!(
            listing.cases("S").unwrap(),
            ["initTestCase", "c1", "c2", "cleanupTestCase"]
        );
    }

    #[test]
    fn test_listing_never_duplicates_hooks() {
        let listing = parse_listing(b"S initTestCase\nS c1\nS cleanupTestCase\n").unwrap();
        assert_eq!(
            listing.cases("S").unwrap(),
            ["initTestCase", "c1", "cleanupTestCase"]
        );
    }

    #[test]
    fn test_malformed_listing() {
        let err = parse_listing(b"S c1\nS c2 rowTag\n").unwrap_err();
        assert!(matches!(err, ParseError::MalformedListing(_)));
        assert!(parse_listing(b"lonely\n").is_err());
    }

    #[test]
    fn test_run_args() {
        let path = PathBuf::from("/tmp/tst_parser.xml");
        let mut suites = listed();
        assert_eq!(run_args(&suites, &path), ["-xml", "-o", "/tmp/tst_parser.xml"]);

        suites[0].case_for_name_mut("benchParse").unwrap().set_enabled(false);
        assert_eq!(
            run_args(&suites, &path),
            ["-xml", "-o", "/tmp/tst_parser.xml", "parsesEmpty", "parsesNested"]
        );
    }

    #[test]
    fn test_run_args_with_only_hooks_enabled() {
        let path = PathBuf::from("/tmp/tst_parser.xml");
        let mut suites = listed();
        for case in suites[0].cases_mut() {
            case.set_enabled(is_lifecycle_hook(case.name()));
        }

        assert_eq!(
            run_args(&suites, &path),
            ["-xml", "-o", "/tmp/tst_parser.xml", "initTestCase"]
        );
    }

    const RESULTS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<TestCase name="tst_Parser">
<Environment>
    <QtVersion>5.15.2</QtVersion>
    <QTestVersion>5.15.2</QTestVersion>
</Environment>
<TestFunction name="initTestCase">
<Incident type="pass" file="" line="0" />
    <Duration msecs="0.05"/>
</TestFunction>
<TestFunction name="parsesEmpty">
<Message type="qdebug" file="" line="0">
    <Description><![CDATA[tokens: 0]]></Description>
</Message>
<Incident type="pass" file="" line="0" />
    <Duration msecs="2"/>
</TestFunction>
<TestFunction name="parsesNested">
<Incident type="fail" file="tst_parser.cpp" line="42">
    <DataTag><![CDATA[deep]]></DataTag>
    <Description><![CDATA[Compared values are not the same]]></Description>
</Incident>
<Incident type="pass" file="" line="0">
    <DataTag><![CDATA[shallow]]></DataTag>
</Incident>
</TestFunction>
<TestFunction name="benchParse">
<BenchmarkResult metric="WalltimeMilliseconds" tag="" value="0.5" iterations="1024" />
<Incident type="pass" file="" line="0" />
</TestFunction>
<Duration msecs="12"/>
</TestCase>
"#;

    #[test]
    fn test_parse_results() {
        let mut suites = listed();
        assert_eq!(parse_results(RESULTS, &mut suites).unwrap(), None);

        let suite = &suites[0];
        assert_eq!(suite.time(), Some(0.012));
        assert_eq!(suite.run_test_count(), 4);
        assert_eq!(suite.passed_test_count(), 3);
        assert_eq!(suite.failed_test_count(), 1);

        let empty = suite.case_for_name("parsesEmpty").unwrap();
        assert_eq!(empty.other_messages(), ["qdebug : tokens: 0".to_string()]);
        assert_eq!(empty.time(), Some(0.002));

        let nested = suite.case_for_name("parsesNested").unwrap();
        assert!(nested.failed());
        assert_eq!(
            nested.failure_messages(),
            ["Compared values are not the same".to_string()]
        );

        let bench = suite.case_for_name("benchParse").unwrap();
        assert_eq!(
            bench.benchmark_messages(),
            ["Benchmark : 0.00048828125 msec per iteration (total: 0.5, iterations: 1024)".to_string()]
        );

        let missing: Vec<_> = suite
            .cases()
            .iter()
            .filter(|c| !c.was_run())
            .map(|c| c.name())
            .collect();
        assert_eq!(missing, ["cleanupTestCase"]);
    }

    #[test]
    fn test_unknown_incident_is_fatal() {
        let xml = r#"<TestCase name="tst_Parser"><TestFunction name="parsesEmpty">
            <Incident type="xfail" file="" line="0"/></TestFunction></TestCase>"#;
        let err = parse_results(xml, &mut listed()).unwrap_err();
        assert_eq!(err.to_string(), "unknown incident type xfail");
    }

    #[test]
    fn test_unknown_suite_and_case() {
        let err = parse_results(r#"<TestCase name="tst_Other"/>"#, &mut listed()).unwrap_err();
        assert!(matches!(err, ParseError::UnknownSuite(_)));

        let xml = r#"<TestCase name="tst_Parser"><TestFunction name="ghost"/></TestCase>"#;
        let err = parse_results(xml, &mut listed()).unwrap_err();
        assert!(matches!(err, ParseError::UnknownCase(_)));
    }

    #[test]
    fn test_wrong_root() {
        let err = parse_results("<testsuites/>", &mut listed()).unwrap_err();
        assert!(matches!(err, ParseError::NotAResultFile("QtTestLib")));
    }
}
