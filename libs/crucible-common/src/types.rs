use serde::{Deserialize, Serialize};

/// Languages the service knows how to compile and run.
///
/// The set is closed: each variant is backed by a LanguageProfile in the
/// server crate, and nothing is resolved dynamically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Cpp,
    Java,
    Python,
}

impl Language {
    /// Parse a wire-level language tag, case-insensitively.
    ///
    /// Unknown tags are not a protocol error: the executor maps them to an
    /// `execution_error` result rather than rejecting the request outright.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "cpp" => Some(Language::Cpp),
            "java" => Some(Language::Java),
            "python" => Some(Language::Python),
            _ => None,
        }
    }

    pub fn all_variants() -> [Language; 3] {
        [Language::Cpp, Language::Java, Language::Python]
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Language::Cpp => "cpp",
            Language::Java => "java",
            Language::Python => "python",
        };
        write!(f, "{}", name)
    }
}

/// An execution request as it arrives on the wire.
///
/// Only `language` and `code` are mandatory (enforced at the HTTP layer);
/// everything else defaults to its zero value. Field names follow the
/// wire's camelCase convention.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteRequest {
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub stdin: String,
    #[serde(default)]
    pub expected_output: String,
    #[serde(default)]
    pub run_tests: bool,
    #[serde(default)]
    pub test_code: String,
}

/// Terminal classification of a request, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionState {
    Passed,
    Failed,
    CompileError,
    RuntimeError,
    ExecutionError,
    ExecutionBlocked,
}

/// A test case identifier: frameworks report either an ordinal or a
/// display name, and the schema preserves whichever was given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TestCaseRef {
    Number(u64),
    Name(String),
}

impl From<u64> for TestCaseRef {
    fn from(n: u64) -> Self {
        TestCaseRef::Number(n)
    }
}

impl From<&str> for TestCaseRef {
    fn from(s: &str) -> Self {
        TestCaseRef::Name(s.to_string())
    }
}

/// One failed test, as much of it as the framework's output let us recover.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureDetail {
    pub test_case: TestCaseRef,
    #[serde(default)]
    pub expected: String,
    #[serde(default)]
    pub received: String,
    #[serde(default)]
    pub error_message: String,
    #[serde(default)]
    pub rawout: String,
}

/// The canonical result schema, returned for every orderly outcome
/// regardless of language or framework.
///
/// Invariants:
/// - `state == Passed` iff `failed == 0` and both error strings are empty
/// - `state == CompileError` implies `tests_run == 0`
/// - `failure_details.len() == failed` whenever failures could be parsed;
///   unparseable failures are still counted but carry no detail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub state: ExecutionState,
    pub tests_run: u32,
    pub passed: u32,
    pub failed: u32,
    pub failure_details: Vec<FailureDetail>,
    pub compilation_error: String,
    pub runtime_error: String,
    pub execution_time_exceeded: bool,
    pub memory_exceeded: bool,
}

impl ExecutionResult {
    /// A zeroed result in the given state.
    pub fn new(state: ExecutionState) -> Self {
        Self {
            state,
            tests_run: 0,
            passed: 0,
            failed: 0,
            failure_details: Vec::new(),
            compilation_error: String::new(),
            runtime_error: String::new(),
            execution_time_exceeded: false,
            memory_exceeded: false,
        }
    }

    pub fn compile_error(stderr: impl Into<String>) -> Self {
        let mut result = Self::new(ExecutionState::CompileError);
        result.compilation_error = stderr.into();
        result
    }

    pub fn runtime_error(message: impl Into<String>) -> Self {
        let mut result = Self::new(ExecutionState::RuntimeError);
        result.runtime_error = message.into();
        result
    }

    /// An infrastructure failure: filesystem, spawn, or unparseable
    /// harness output. Never attributable to the submitted code.
    pub fn execution_error(message: impl Into<String>) -> Self {
        let mut result = Self::new(ExecutionState::ExecutionError);
        result.runtime_error = message.into();
        result
    }

    pub fn execution_blocked() -> Self {
        Self::new(ExecutionState::ExecutionBlocked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_parsing_is_case_insensitive() {
        assert_eq!(Language::from_str("cpp"), Some(Language::Cpp));
        assert_eq!(Language::from_str("CPP"), Some(Language::Cpp));
        assert_eq!(Language::from_str("Java"), Some(Language::Java));
        assert_eq!(Language::from_str("PYTHON"), Some(Language::Python));
        assert_eq!(Language::from_str("haskell"), None);
        assert_eq!(Language::from_str(""), None);
    }

    #[test]
    fn test_language_display_round_trips() {
        for lang in Language::all_variants() {
            assert_eq!(Language::from_str(&lang.to_string()), Some(lang));
        }
    }

    #[test]
    fn test_request_accepts_camel_case_fields() {
        let raw = r#"{
            "language": "python",
            "code": "print(1)",
            "stdin": "x",
            "expectedOutput": "1",
            "runTests": true,
            "testCode": "def test(): pass"
        }"#;
        let req: ExecuteRequest = serde_json::from_str(raw).unwrap();
        assert_eq!(req.language, "python");
        assert_eq!(req.expected_output, "1");
        assert!(req.run_tests);
        assert_eq!(req.test_code, "def test(): pass");
    }

    #[test]
    fn test_request_fields_default_when_absent() {
        let req: ExecuteRequest = serde_json::from_str(r#"{"language": "cpp"}"#).unwrap();
        assert_eq!(req.language, "cpp");
        assert_eq!(req.code, "");
        assert_eq!(req.stdin, "");
        assert!(!req.run_tests);
    }

    #[test]
    fn test_state_serializes_snake_case() {
        let json = serde_json::to_string(&ExecutionState::CompileError).unwrap();
        assert_eq!(json, "\"compile_error\"");
        let json = serde_json::to_string(&ExecutionState::ExecutionBlocked).unwrap();
        assert_eq!(json, "\"execution_blocked\"");
    }

    #[test]
    fn test_test_case_ref_serializes_untagged() {
        let n = serde_json::to_string(&TestCaseRef::Number(3)).unwrap();
        assert_eq!(n, "3");
        let s = serde_json::to_string(&TestCaseRef::Name("testAdd()".into())).unwrap();
        assert_eq!(s, "\"testAdd()\"");

        let back: TestCaseRef = serde_json::from_str("7").unwrap();
        assert_eq!(back, TestCaseRef::Number(7));
        let back: TestCaseRef = serde_json::from_str("\"t\"").unwrap();
        assert_eq!(back, TestCaseRef::Name("t".into()));
    }

    #[test]
    fn test_result_schema_field_names() {
        let result = ExecutionResult::compile_error("bad.cpp:1: error");
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["state"], "compile_error");
        assert_eq!(value["tests_run"], 0);
        assert_eq!(value["compilation_error"], "bad.cpp:1: error");
        assert_eq!(value["execution_time_exceeded"], false);
        assert_eq!(value["memory_exceeded"], false);
        assert!(value["failure_details"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_execution_error_message_lands_in_runtime_error() {
        let result = ExecutionResult::execution_error("spawn failed");
        assert_eq!(result.state, ExecutionState::ExecutionError);
        assert_eq!(result.runtime_error, "spawn failed");
        assert_eq!(result.compilation_error, "");
    }
}
