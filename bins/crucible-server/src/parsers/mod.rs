//! Framework-output parsers.
//!
//! Each parser reduces one test runner's output to a `TestReport`. All of
//! them are total: unrecognized output yields zero counts or an `aborted`
//! report, never a panic. The patterns live here, isolated from the
//! executor, so a new framework version can be accommodated without
//! touching orchestration.

pub mod cxxtest;
pub mod junit;
pub mod pytest;

use crucible_common::types::FailureDetail;

/// What a parser could recover from a test run's output.
#[derive(Debug, Default, PartialEq)]
pub struct TestReport {
    pub tests_run: u32,
    pub passed: u32,
    pub failed: u32,
    /// One entry per failure that could be parsed; may be shorter than
    /// `failed` when the output resisted extraction.
    pub failure_details: Vec<FailureDetail>,
    /// Set when the harness never produced a usable summary at all, with
    /// the reason. The executor maps this to `execution_error`.
    pub aborted: Option<String>,
}

impl TestReport {
    pub fn aborted(reason: impl Into<String>) -> Self {
        Self {
            aborted: Some(reason.into()),
            ..Self::default()
        }
    }
}

/// stdout and stderr concatenated the way `rawout` wants them.
pub(crate) fn raw_output(stdout: &str, stderr: &str) -> String {
    format!("{}\n{}", stdout, stderr)
}
