//! Per-language execution rules.
//!
//! A LanguageProfile bundles everything that distinguishes one supported
//! language from another: source file layout, compile steps, the run
//! command for the plain program, the test-harness build, and the parser
//! for its framework's output. The set is closed; profiles are resolved
//! by a match, never discovered.

mod cpp;
mod java;
mod python;

use crate::parsers::TestReport;
use crate::process::CompileFailure;
use crate::workspace::Workspace;
use async_trait::async_trait;
use crucible_common::config::Toolchain;
use crucible_common::types::Language;
use thiserror::Error;

/// How to launch a built program or harness. The working directory is
/// always the workspace.
#[derive(Debug, Clone)]
pub struct RunSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl RunSpec {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

/// Why a build (plain or harness) did not produce something runnable.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Attributable to the submitted code or tests; the diagnostic goes
    /// to the `compilation_error` field verbatim.
    #[error("compilation failed")]
    Compile { stderr: String },
    /// Infrastructure: filesystem or spawn trouble, never the user's fault.
    #[error(transparent)]
    Infra(#[from] anyhow::Error),
}

impl From<CompileFailure> for BuildError {
    fn from(failure: CompileFailure) -> Self {
        match failure {
            CompileFailure::ToolFailed { stderr, .. } => BuildError::Compile { stderr },
            CompileFailure::Spawn { .. } => BuildError::Infra(failure.into()),
        }
    }
}

impl From<std::io::Error> for BuildError {
    fn from(e: std::io::Error) -> Self {
        BuildError::Infra(e.into())
    }
}

#[async_trait]
pub trait LanguageProfile: Send + Sync {
    /// Write the submitted source, run the plain compile steps (if any),
    /// and return the command that runs the program.
    async fn build_program(
        &self,
        ws: &Workspace,
        code: &str,
        toolchain: &Toolchain,
    ) -> Result<RunSpec, BuildError>;

    /// Produce the test harness: write source and test files, run the
    /// harness compile steps, and return the command that runs the tests.
    async fn build_test_harness(
        &self,
        ws: &Workspace,
        code: &str,
        test_code: &str,
        toolchain: &Toolchain,
    ) -> Result<RunSpec, BuildError>;

    /// Reduce the framework's output to the canonical counts. Total.
    fn parse_test_output(&self, stdout: &str, stderr: &str) -> TestReport;

    /// Whether a failed run (nonzero exit or timeout) is a defect of the
    /// program itself. True for the compiled languages; false for Python,
    /// whose test framework signals ordinary failure via nonzero exit.
    fn run_failure_is_runtime_error(&self) -> bool {
        true
    }
}

/// Resolve the profile for a language. Static dispatch table; the three
/// profiles are stateless.
pub fn profile_for(language: Language) -> &'static dyn LanguageProfile {
    match language {
        Language::Cpp => &cpp::CppProfile,
        Language::Java => &java::JavaProfile,
        Language::Python => &python::PythonProfile,
    }
}
