//! Top-level orchestration.
//!
//! One request flows straight through: resolve profile, create workspace,
//! build (plain or harness), run under the deadline, then either compare
//! stdout against the expected output or hand the streams to the
//! profile's parser. Every failure is converted to a terminal state here;
//! nothing propagates past this module, and the workspace is torn down on
//! every path.

use crate::languages::{self, BuildError, LanguageProfile};
use crate::parsers::TestReport;
use crate::process::{self, RunFailure};
use crate::workspace::Workspace;
use crucible_common::config::Config;
use crucible_common::types::{
    ExecuteRequest, ExecutionResult, ExecutionState, FailureDetail, Language, TestCaseRef,
};
use tracing::{debug, info, instrument, warn};

#[instrument(skip_all, fields(language = %request.language, run_tests = request.run_tests))]
pub async fn execute(request: &ExecuteRequest, config: &Config) -> ExecutionResult {
    let Some(language) = Language::from_str(&request.language) else {
        return ExecutionResult::execution_error(format!(
            "unsupported language: {}",
            request.language
        ));
    };

    if !config.registry.is_enabled(language) {
        info!(%language, "language is administratively disabled");
        return ExecutionResult::execution_blocked();
    }

    let workspace = match Workspace::create(&config.temp_root).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!(error = %e, "failed to create workspace");
            return ExecutionResult::execution_error(format!("failed to create workspace: {}", e));
        }
    };

    let result = run_pipeline(&workspace, language, request, config).await;
    workspace.destroy().await;

    info!(
        state = ?result.state,
        tests_run = result.tests_run,
        passed = result.passed,
        failed = result.failed,
        "request complete"
    );
    result
}

async fn run_pipeline(
    workspace: &Workspace,
    language: Language,
    request: &ExecuteRequest,
    config: &Config,
) -> ExecutionResult {
    let profile = languages::profile_for(language);

    let spec = if request.run_tests {
        profile
            .build_test_harness(workspace, &request.code, &request.test_code, &config.toolchain)
            .await
    } else {
        profile.build_program(workspace, &request.code, &config.toolchain).await
    };

    let spec = match spec {
        Ok(spec) => spec,
        Err(BuildError::Compile { stderr }) => return ExecutionResult::compile_error(stderr),
        Err(BuildError::Infra(e)) => {
            warn!(error = %e, "build infrastructure failure");
            return ExecutionResult::execution_error(e.to_string());
        }
    };

    let run = process::run(
        &spec.program,
        &spec.args,
        workspace.path(),
        &request.stdin,
        config.run_timeout_ms,
    )
    .await;

    match run {
        Ok(outcome) => {
            debug!(exit_code = outcome.exit_code, "run completed");
            if request.run_tests {
                report_tests(profile, &outcome.stdout, &outcome.stderr)
            } else {
                compare_output(&request.expected_output, &outcome.stdout, &outcome.stderr, false)
            }
        }

        Err(RunFailure::Timeout { timeout_ms }) => {
            let mut result = if profile.run_failure_is_runtime_error() {
                ExecutionResult::runtime_error(format!(
                    "execution timed out after {}ms",
                    timeout_ms
                ))
            } else {
                ExecutionResult::new(ExecutionState::Failed)
            };
            result.execution_time_exceeded = true;
            result
        }

        Err(failure @ (RunFailure::Spawn { .. } | RunFailure::Wait { .. })) => {
            warn!(error = %failure, "run infrastructure failure");
            ExecutionResult::execution_error(failure.to_string())
        }

        Err(RunFailure::NonZeroExit {
            exit_code,
            stdout,
            stderr,
            killed_by_oom,
        }) => {
            if request.run_tests {
                // Test frameworks report failure via nonzero exit; the
                // parser decides what actually happened.
                let mut result = report_tests(profile, &stdout, &stderr);
                if result.state == ExecutionState::Passed {
                    // Nonzero exit with no recovered failures: the runner
                    // died rather than reported. A clean-looking parse of
                    // a dead run must not pass.
                    result = dead_run_result(profile, exit_code, &stderr);
                }
                result.memory_exceeded |= killed_by_oom;
                result
            } else if profile.run_failure_is_runtime_error() {
                let mut result = ExecutionResult::runtime_error(if stderr.trim().is_empty() {
                    format!("process exited with code {}", exit_code)
                } else {
                    stderr
                });
                result.memory_exceeded = killed_by_oom;
                result
            } else {
                // Interpreted code that dies is a failed submission; the
                // comparator records the mismatch with the crash output.
                compare_output(&request.expected_output, &stdout, &stderr, true)
            }
        }
    }
}

/// Plain-run verdict: a single synthetic test that passes iff the run was
/// clean and the trimmed outputs are equal. Trimming both sides is this
/// service's chosen discipline for the byte-exact contract.
fn compare_output(
    expected: &str,
    stdout: &str,
    stderr: &str,
    run_failed: bool,
) -> ExecutionResult {
    let mut result = ExecutionResult::new(ExecutionState::Passed);
    result.tests_run = 1;

    if !run_failed && stdout.trim() == expected.trim() {
        result.passed = 1;
        return result;
    }

    result.state = ExecutionState::Failed;
    result.failed = 1;
    result.failure_details.push(FailureDetail {
        test_case: TestCaseRef::Number(1),
        expected: expected.to_string(),
        received: stdout.to_string(),
        error_message: "Output did not match expected output".to_string(),
        rawout: format!("{}{}", stdout, stderr),
    });
    result
}

/// Fold a parser's report into the canonical result.
fn report_tests(profile: &dyn LanguageProfile, stdout: &str, stderr: &str) -> ExecutionResult {
    let report = profile.parse_test_output(stdout, stderr);
    result_from_report(report)
}

fn result_from_report(report: TestReport) -> ExecutionResult {
    if let Some(reason) = report.aborted {
        return ExecutionResult::execution_error(reason);
    }

    let state = if report.failed == 0 {
        ExecutionState::Passed
    } else {
        ExecutionState::Failed
    };

    let mut result = ExecutionResult::new(state);
    result.tests_run = report.tests_run;
    result.passed = report.passed;
    result.failed = report.failed;
    result.failure_details = report.failure_details;
    result
}

/// A test runner that exited nonzero without reporting a single test.
fn dead_run_result(
    profile: &dyn LanguageProfile,
    exit_code: i32,
    stderr: &str,
) -> ExecutionResult {
    if profile.run_failure_is_runtime_error() {
        ExecutionResult::runtime_error(if stderr.trim().is_empty() {
            format!("test runner exited with code {}", exit_code)
        } else {
            stderr.to_string()
        })
    } else {
        ExecutionResult::new(ExecutionState::Failed)
    }
}
