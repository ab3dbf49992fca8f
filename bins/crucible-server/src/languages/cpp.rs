//! C++ with the CxxTest framework.
//!
//! The harness pipeline is generator-driven: the submitted test header is
//! fed to cxxtestgen, which emits a runner translation unit that is then
//! compiled together with the student's code.

use super::{BuildError, LanguageProfile, RunSpec};
use crate::parsers::{cxxtest, TestReport};
use crate::process;
use crate::workspace::Workspace;
use async_trait::async_trait;
use crucible_common::config::Toolchain;
use regex::Regex;
use std::sync::LazyLock;

const SOURCE_FILE: &str = "program.cpp";
const TEST_HEADER: &str = "test_program.h";
const RUNNER_SOURCE: &str = "runner.cpp";

/// A top-level function definition with a scalar return type. Used to
/// synthesize forward declarations so test headers can call into the
/// student code without writing their own externs.
static FUNCTION_DEF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*(int|bool|void|float|double|char|string)\s+(\w+)\s*\(([^)]*)\)\s*\{")
        .unwrap()
});

/// Prototypes for every scalar-typed top-level function in `code`.
fn forward_declarations(code: &str) -> String {
    let mut declarations = String::new();
    for cap in FUNCTION_DEF.captures_iter(code) {
        if &cap[2] == "main" {
            continue;
        }
        declarations.push_str(&format!("{} {}({});\n", &cap[1], &cap[2], cap[3].trim()));
    }
    declarations
}

pub struct CppProfile;

#[async_trait]
impl LanguageProfile for CppProfile {
    async fn build_program(
        &self,
        ws: &Workspace,
        code: &str,
        toolchain: &Toolchain,
    ) -> Result<RunSpec, BuildError> {
        ws.write_file(SOURCE_FILE, code).await?;

        let args = vec![
            "-o".to_string(),
            "program".to_string(),
            SOURCE_FILE.to_string(),
        ];
        process::compile(&toolchain.cxx, &args, ws.path()).await?;

        Ok(RunSpec::new("./program", vec![]))
    }

    async fn build_test_harness(
        &self,
        ws: &Workspace,
        code: &str,
        test_code: &str,
        toolchain: &Toolchain,
    ) -> Result<RunSpec, BuildError> {
        ws.write_file(SOURCE_FILE, code).await?;

        let header = format!("{}{}", forward_declarations(code), test_code);
        ws.write_file(TEST_HEADER, &header).await?;

        let generate = vec![
            "--error-printer".to_string(),
            "-o".to_string(),
            RUNNER_SOURCE.to_string(),
            TEST_HEADER.to_string(),
        ];
        process::compile(&toolchain.cxxtestgen, &generate, ws.path()).await?;

        let build = vec![
            "-o".to_string(),
            "runner".to_string(),
            RUNNER_SOURCE.to_string(),
            SOURCE_FILE.to_string(),
        ];
        process::compile(&toolchain.cxx, &build, ws.path()).await?;

        Ok(RunSpec::new("./runner", vec![]))
    }

    fn parse_test_output(&self, stdout: &str, stderr: &str) -> TestReport {
        cxxtest::parse(stdout, stderr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_declarations_for_scalar_functions() {
        let code = "\
int add(int a, int b) {
    return a + b;
}

bool is_even(int n) {
    return n % 2 == 0;
}
";
        let decls = forward_declarations(code);
        assert_eq!(decls, "int add(int a, int b);\nbool is_even(int n);\n");
    }

    #[test]
    fn test_forward_declarations_skip_main() {
        let code = "int main() {\n    return 0;\n}\n";
        assert_eq!(forward_declarations(code), "");
    }

    #[test]
    fn test_forward_declarations_ignore_unknown_return_types() {
        let code = "std::vector<int> collect() {\n    return {};\n}\n";
        assert_eq!(forward_declarations(code), "");
    }

    #[test]
    fn test_forward_declarations_handle_no_parameters() {
        let code = "void reset() {\n}\n";
        assert_eq!(forward_declarations(code), "void reset();\n");
    }
}
