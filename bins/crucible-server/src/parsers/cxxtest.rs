//! Parser for the CxxTest error-printer's output.
//!
//! Unlike the Java pipeline there is no harness to emit JSON here: the
//! generated runner is a black box, so this parser works the runner's
//! human-readable report and must stay total against whatever it prints.

use super::{raw_output, TestReport};
use crucible_common::types::{FailureDetail, TestCaseRef};
use regex::Regex;
use std::sync::LazyLock;

static TESTS_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Running cxxtest tests \((\d+) tests?\)").unwrap());
static FAILED_SUMMARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Failed (\d+) and Skipped \d+ of (\d+) tests").unwrap());
static ASSERTION_ERROR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Error: Expected \((.*?)\), found \((.*?)\)").unwrap());
/// The `In Suite::test:` line the error printer emits before each failure.
static TEST_HEADER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^In ([\w:]+):").unwrap());

pub fn parse(stdout: &str, stderr: &str) -> TestReport {
    let mut tests_run = TESTS_RUN
        .captures(stdout)
        .map(|cap| count(&cap[1]))
        .unwrap_or(0);
    let mut failed = 0;

    // The trailer is only printed when something failed, and its counts
    // are authoritative when present.
    if let Some(cap) = FAILED_SUMMARY.captures(stdout) {
        failed = count(&cap[1]);
        tests_run = count(&cap[2]);
    }

    let mut report = TestReport {
        tests_run,
        passed: tests_run.saturating_sub(failed),
        failed,
        ..TestReport::default()
    };

    let headers: Vec<(usize, &str)> = TEST_HEADER
        .captures_iter(stdout)
        .map(|cap| {
            let whole = cap.get(0).unwrap();
            (whole.start(), cap.get(1).unwrap().as_str())
        })
        .collect();

    for (index, cap) in ASSERTION_ERROR.captures_iter(stdout).enumerate() {
        let lhs = cap[1].trim();
        let rhs = cap[2].trim();
        let position = cap.get(0).unwrap().start();

        let expected = lhs
            .split_once("==")
            .map(|(_, r)| r.trim())
            .unwrap_or(lhs)
            .to_string();
        let received = rhs
            .split_once("!=")
            .map(|(l, _)| l.trim())
            .unwrap_or(rhs)
            .to_string();

        // Attribute the error to the nearest preceding `In ...:` header;
        // fall back to the failure ordinal when the header is missing.
        let test_case = headers
            .iter()
            .rev()
            .find(|(start, _)| *start < position)
            .map(|(_, name)| TestCaseRef::Name(name.to_string()))
            .unwrap_or(TestCaseRef::Number(index as u64 + 1));

        report.failure_details.push(FailureDetail {
            test_case,
            expected,
            received,
            error_message: "AssertionError: Output did not match expected result".to_string(),
            rawout: raw_output(stdout, stderr),
        });
    }

    report
}

fn count(digits: &str) -> u32 {
    digits.parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE_FAILURE: &str = "\
Running cxxtest tests (2 tests).
In AddSuite::testAddNegative:
test_program.h:11: Error: Expected (add(-1,1) == 1), found (0 != 1)
Failed 1 and Skipped 0 of 2 tests
Success rate: 50%
";

    #[test]
    fn test_failure_totals_come_from_trailer() {
        let report = parse(ONE_FAILURE, "");
        assert_eq!(report.tests_run, 2);
        assert_eq!(report.passed, 1);
        assert_eq!(report.failed, 1);
    }

    #[test]
    fn test_failure_detail_extraction() {
        let report = parse(ONE_FAILURE, "");
        assert_eq!(report.failure_details.len(), 1);
        let detail = &report.failure_details[0];
        assert_eq!(
            detail.test_case,
            TestCaseRef::Name("AddSuite::testAddNegative".into())
        );
        assert_eq!(detail.expected, "1");
        assert_eq!(detail.received, "0");
        assert_eq!(
            detail.error_message,
            "AssertionError: Output did not match expected result"
        );
        assert!(detail.rawout.starts_with("Running cxxtest tests"));
    }

    #[test]
    fn test_all_passed_has_no_trailer() {
        let report = parse("Running cxxtest tests (3 tests).OK!\n", "");
        assert_eq!(report.tests_run, 3);
        assert_eq!(report.passed, 3);
        assert_eq!(report.failed, 0);
        assert!(report.failure_details.is_empty());
    }

    #[test]
    fn test_single_test_singular_spelling() {
        let report = parse("Running cxxtest tests (1 test).OK!\n", "");
        assert_eq!(report.tests_run, 1);
        assert_eq!(report.passed, 1);
    }

    #[test]
    fn test_expected_without_comparison_keeps_whole_side() {
        let stdout = "\
Running cxxtest tests (1 test).
In Suite::testFlag:
test_program.h:5: Error: Expected (flag()), found (false)
Failed 1 and Skipped 0 of 1 tests
";
        let report = parse(stdout, "");
        let detail = &report.failure_details[0];
        assert_eq!(detail.expected, "flag()");
        assert_eq!(detail.received, "false");
    }

    #[test]
    fn test_multiple_failures_attribute_to_their_own_headers() {
        let stdout = "\
Running cxxtest tests (3 tests).
In MathSuite::testOne:
test_program.h:4: Error: Expected (f(1) == 2), found (1 != 2)
In MathSuite::testTwo:
test_program.h:9: Error: Expected (f(2) == 4), found (3 != 4)
Failed 2 and Skipped 0 of 3 tests
";
        let report = parse(stdout, "");
        assert_eq!(report.failed, 2);
        assert_eq!(report.passed, 1);
        assert_eq!(
            report.failure_details[0].test_case,
            TestCaseRef::Name("MathSuite::testOne".into())
        );
        assert_eq!(
            report.failure_details[1].test_case,
            TestCaseRef::Name("MathSuite::testTwo".into())
        );
        assert_eq!(report.failure_details[1].received, "3");
    }

    #[test]
    fn test_unrecognized_output_yields_zero_counts() {
        let report = parse("Segmentation fault", "");
        assert_eq!(report, TestReport::default());
    }
}
