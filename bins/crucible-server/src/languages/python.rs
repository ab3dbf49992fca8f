//! Python with pytest. No compile steps on either path; the interpreter
//! and pytest are handed absolute file paths and the workspace as cwd, so
//! `import program` resolves inside the test module.

use super::{BuildError, LanguageProfile, RunSpec};
use crate::parsers::{pytest, TestReport};
use crate::workspace::Workspace;
use async_trait::async_trait;
use crucible_common::config::Toolchain;

const SOURCE_FILE: &str = "program.py";
const TEST_FILE: &str = "test_program.py";

pub struct PythonProfile;

#[async_trait]
impl LanguageProfile for PythonProfile {
    async fn build_program(
        &self,
        ws: &Workspace,
        code: &str,
        toolchain: &Toolchain,
    ) -> Result<RunSpec, BuildError> {
        let source = ws.write_file(SOURCE_FILE, code).await?;
        Ok(RunSpec::new(
            toolchain.python.as_str(),
            vec![source.display().to_string()],
        ))
    }

    async fn build_test_harness(
        &self,
        ws: &Workspace,
        code: &str,
        test_code: &str,
        toolchain: &Toolchain,
    ) -> Result<RunSpec, BuildError> {
        ws.write_file(SOURCE_FILE, code).await?;
        let tests = ws.write_file(TEST_FILE, test_code).await?;
        Ok(RunSpec::new(
            toolchain.pytest.as_str(),
            vec![tests.display().to_string()],
        ))
    }

    fn parse_test_output(&self, stdout: &str, stderr: &str) -> TestReport {
        pytest::parse(stdout, stderr)
    }

    // pytest reports ordinary test failure through its exit code, and a
    // hung script is still a failed submission, not an engine defect.
    fn run_failure_is_runtime_error(&self) -> bool {
        false
    }
}
