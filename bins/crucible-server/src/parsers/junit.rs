//! Recovery of the Java harness's JSON report.
//!
//! The in-workspace TestRunner sidesteps free-text parsing entirely by
//! printing a single JSON document. The JVM is still free to pollute
//! stdout around it (agent banners, -verbose output), so the document is
//! located as the first `{` through the last `}` before being parsed.

use super::TestReport;
use crucible_common::types::FailureDetail;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct HarnessSummary {
    // The harness also reports a `state` string; the failed count alone
    // determines the final state, so it is accepted and ignored here.
    #[serde(default, rename = "state")]
    _state: String,
    #[serde(default)]
    tests_run: u32,
    #[serde(default)]
    passed: u32,
    #[serde(default)]
    failed: u32,
    #[serde(default)]
    failure_details: Vec<FailureDetail>,
}

pub fn parse(stdout: &str, _stderr: &str) -> TestReport {
    let Some(start) = stdout.find('{') else {
        return TestReport::aborted("test harness produced no JSON report");
    };
    let Some(end) = stdout.rfind('}') else {
        return TestReport::aborted("test harness produced no JSON report");
    };
    if end < start {
        return TestReport::aborted("test harness produced no JSON report");
    }

    match serde_json::from_str::<HarnessSummary>(&stdout[start..=end]) {
        Ok(summary) => TestReport {
            tests_run: summary.tests_run,
            passed: summary.passed,
            failed: summary.failed,
            failure_details: summary.failure_details,
            aborted: None,
        },
        Err(e) => TestReport::aborted(format!("malformed test harness report: {}", e)),
    }
}
