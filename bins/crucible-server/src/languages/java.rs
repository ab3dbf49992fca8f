//! Java with JUnit.
//!
//! The file name must match the public class, so both the submitted code
//! and the test code have their class names extracted up front. Tests run
//! through the service's own TestRunner (compiled into the workspace with
//! the framework jars on the classpath), which prints a JSON report the
//! parser can trust instead of scraping the launcher's text output.

use super::{BuildError, LanguageProfile, RunSpec};
use crate::parsers::{junit, TestReport};
use crate::process;
use crate::workspace::Workspace;
use async_trait::async_trait;
use crucible_common::config::Toolchain;
use regex::Regex;
use std::sync::LazyLock;

static PUBLIC_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"public\s+class\s+(\w+)").unwrap());

/// The harness template ships with this placeholder test-class symbol;
/// it is rewritten to the submitted test class before compilation.
const DEFAULT_TEST_CLASS: &str = "MainTest";
const TEST_RUNNER_SOURCE: &str = include_str!("../../assets/TestRunner.java");

fn public_class_name(code: &str) -> Option<&str> {
    PUBLIC_CLASS
        .captures(code)
        .map(|cap| cap.get(1).unwrap().as_str())
}

fn workspace_path(ws: &Workspace) -> String {
    ws.path().display().to_string()
}

pub struct JavaProfile;

#[async_trait]
impl LanguageProfile for JavaProfile {
    async fn build_program(
        &self,
        ws: &Workspace,
        code: &str,
        toolchain: &Toolchain,
    ) -> Result<RunSpec, BuildError> {
        let class = public_class_name(code).ok_or_else(|| BuildError::Compile {
            stderr: "error: no public class declaration found".to_string(),
        })?;
        let class = class.to_string();

        let source_file = format!("{}.java", class);
        ws.write_file(&source_file, code).await?;

        let compile = vec!["-d".to_string(), workspace_path(ws), source_file];
        process::compile(&toolchain.javac, &compile, ws.path()).await?;

        Ok(RunSpec::new(
            toolchain.java.as_str(),
            vec!["-cp".to_string(), workspace_path(ws), class],
        ))
    }

    async fn build_test_harness(
        &self,
        ws: &Workspace,
        code: &str,
        test_code: &str,
        toolchain: &Toolchain,
    ) -> Result<RunSpec, BuildError> {
        let class = public_class_name(code).ok_or_else(|| BuildError::Compile {
            stderr: "error: no public class declaration found".to_string(),
        })?;
        let test_class = public_class_name(test_code).ok_or_else(|| BuildError::Compile {
            stderr: "error: no public class declaration found in test code".to_string(),
        })?;

        let source_file = format!("{}.java", class);
        let test_file = format!("{}.java", test_class);
        let runner_source = TEST_RUNNER_SOURCE.replace(DEFAULT_TEST_CLASS, test_class);

        ws.write_file(&source_file, code).await?;
        ws.write_file(&test_file, test_code).await?;
        ws.write_file("TestRunner.java", &runner_source).await?;

        let classpath = format!("{}:{}", workspace_path(ws), toolchain.junit_classpath);
        let compile = vec![
            "-cp".to_string(),
            classpath.clone(),
            "-d".to_string(),
            workspace_path(ws),
            source_file,
            test_file,
            "TestRunner.java".to_string(),
        ];
        process::compile(&toolchain.javac, &compile, ws.path()).await?;

        Ok(RunSpec::new(
            toolchain.java.as_str(),
            vec!["-cp".to_string(), classpath, "TestRunner".to_string()],
        ))
    }

    fn parse_test_output(&self, stdout: &str, stderr: &str) -> TestReport {
        junit::parse(stdout, stderr)
    }
}
