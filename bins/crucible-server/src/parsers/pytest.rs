//! Parser for pytest's terminal output.
//!
//! pytest's report was written for humans; this parser keys on the stable
//! parts of it: the summary counts, the `FAILURES` section banner, and the
//! `E   assert` lines the assertion rewriter emits.

use super::{raw_output, TestReport};
use crucible_common::types::{FailureDetail, TestCaseRef};
use regex::Regex;
use std::sync::LazyLock;

static PASSED_AND_FAILED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+) passed, (\d+) failed").unwrap());
static PASSED_ONLY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+) passed").unwrap());
static FAILED_ONLY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+) failed").unwrap());

static FAILURES_BANNER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"={10,} FAILURES ={10,}").unwrap());
static SECTION_RULE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^={10,}").unwrap());

/// One failure block: the underscore-framed test name, then (eventually)
/// the rewritten assertion source line, the evaluated `E assert` line,
/// and optionally the `+ where` line naming the evaluated call result.
static FAILURE_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"_{5,}\s*([^\n]+?)\s*_{5,}(?s:.*?)>\s*assert\s+([^\n]+)\nE\s+assert\s+([^\n]+)(?:\nE\s+\+\s+where\s+([^\n]+?)\s+=)?",
    )
    .unwrap()
});

pub fn parse(stdout: &str, stderr: &str) -> TestReport {
    let (passed, failed) = totals(stdout);

    let mut report = TestReport {
        tests_run: passed + failed,
        passed,
        failed,
        ..TestReport::default()
    };

    if let Some(section) = failures_section(stdout) {
        for cap in FAILURE_BLOCK.captures_iter(section) {
            let assertion = cap[2].trim();
            let failed_expr = cap[3].trim();
            let evaluated = cap.get(4).map(|m| m.as_str().trim()).unwrap_or("");

            let expected = right_of(failed_expr, "==").unwrap_or("").to_string();
            let received = if !evaluated.is_empty() {
                evaluated.to_string()
            } else {
                left_of(failed_expr, "==").unwrap_or(failed_expr).to_string()
            };

            report.failure_details.push(FailureDetail {
                test_case: TestCaseRef::Name(cap[1].to_string()),
                expected,
                received,
                error_message: format!("Assertion failed: {}", assertion),
                rawout: raw_output(stdout, stderr),
            });
        }
    }

    report
}

/// Summary counts, in fallback order; anything unmatched stays zero.
fn totals(stdout: &str) -> (u32, u32) {
    if let Some(cap) = PASSED_AND_FAILED.captures(stdout) {
        return (parse_count(&cap[1]), parse_count(&cap[2]));
    }
    let passed = PASSED_ONLY
        .captures(stdout)
        .map(|cap| parse_count(&cap[1]))
        .unwrap_or(0);
    let failed = FAILED_ONLY
        .captures(stdout)
        .map(|cap| parse_count(&cap[1]))
        .unwrap_or(0);
    (passed, failed)
}

/// Text between the FAILURES banner and the next full-width rule.
fn failures_section(stdout: &str) -> Option<&str> {
    let after_banner = FAILURES_BANNER.splitn(stdout, 2).nth(1)?;
    Some(
        SECTION_RULE
            .splitn(after_banner, 2)
            .next()
            .unwrap_or(after_banner),
    )
}

fn parse_count(digits: &str) -> u32 {
    digits.parse().unwrap_or(0)
}

fn left_of<'a>(expr: &'a str, op: &str) -> Option<&'a str> {
    expr.split_once(op).map(|(l, _)| l.trim())
}

fn right_of<'a>(expr: &'a str, op: &str) -> Option<&'a str> {
    expr.split_once(op).map(|(_, r)| r.trim())
}
