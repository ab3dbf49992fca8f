// Service configuration, collected once at startup from the environment.

use crate::types::Language;
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::PathBuf;

/// Paths of the external toolchains the profiles invoke.
///
/// Every entry is overridable so deployments can pin exact binaries; the
/// defaults assume the tools are on PATH (the container image guarantees
/// this in production).
#[derive(Debug, Clone)]
pub struct Toolchain {
    pub cxx: String,
    pub cxxtestgen: String,
    pub javac: String,
    pub java: String,
    pub python: String,
    pub pytest: String,
    /// Test-framework jars, already joined with ':' for -cp.
    pub junit_classpath: String,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            cxx: "g++".to_string(),
            cxxtestgen: "cxxtestgen".to_string(),
            javac: "javac".to_string(),
            java: "java".to_string(),
            python: "python3".to_string(),
            pytest: "pytest".to_string(),
            junit_classpath: "/usr/share/java/junit-platform-console-standalone.jar".to_string(),
        }
    }
}

/// Which languages accept submissions right now.
///
/// This is the authoritative source for administrative disablement: a
/// known language that is not enabled yields `execution_blocked`.
#[derive(Debug, Clone)]
pub struct LanguageRegistry {
    disabled: HashSet<Language>,
}

impl LanguageRegistry {
    /// Build from a comma-separated disable list, e.g. "java,python".
    /// Unknown names in the list are ignored with a best-effort parse;
    /// they cannot disable anything that doesn't exist.
    pub fn from_disable_list(list: &str) -> Self {
        let disabled = list
            .split(',')
            .filter_map(|name| Language::from_str(name.trim()))
            .collect();
        Self { disabled }
    }

    pub fn all_enabled() -> Self {
        Self {
            disabled: HashSet::new(),
        }
    }

    pub fn is_enabled(&self, language: Language) -> bool {
        !self.disabled.contains(&language)
    }

    pub fn enabled_languages(&self) -> Vec<Language> {
        Language::all_variants()
            .into_iter()
            .filter(|l| self.is_enabled(*l))
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub redis_host: String,
    pub redis_port: u16,
    /// Session keys are stored as `<prefix>:<session id>`.
    pub redis_prefix: String,
    /// Wall clock for `run`; compile steps are not bounded.
    pub run_timeout_ms: u64,
    /// Parent directory of all per-request workspaces.
    pub temp_root: PathBuf,
    pub toolchain: Toolchain,
    pub registry: LanguageRegistry,
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let port = env_or("PORT", "3000")
            .parse()
            .context("PORT is not a valid port number")?;
        let redis_port = env_or("REDIS_PORT", "6379")
            .parse()
            .context("REDIS_PORT is not a valid port number")?;
        let run_timeout_ms = env_or("RUN_TIMEOUT_MS", "3000")
            .parse()
            .context("RUN_TIMEOUT_MS is not a valid duration")?;

        let temp_root = std::env::var("TEMP_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| std::env::temp_dir());

        let toolchain = Toolchain {
            cxx: env_or("CXX", "g++"),
            cxxtestgen: env_or("CXXTESTGEN", "cxxtestgen"),
            javac: env_or("JAVAC", "javac"),
            java: env_or("JAVA", "java"),
            python: env_or("PYTHON", "python3"),
            pytest: env_or("PYTEST", "pytest"),
            junit_classpath: env_or(
                "JUNIT_CLASSPATH",
                "/usr/share/java/junit-platform-console-standalone.jar",
            ),
        };

        Ok(Self {
            port,
            redis_host: env_or("REDIS_HOST", "127.0.0.1"),
            redis_port,
            redis_prefix: env_or("REDIS_PREFIX", "sess"),
            run_timeout_ms,
            temp_root,
            toolchain,
            registry: LanguageRegistry::from_disable_list(&env_or("DISABLED_LANGUAGES", "")),
        })
    }

    pub fn redis_url(&self) -> String {
        format!("redis://{}:{}", self.redis_host, self.redis_port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            redis_host: "127.0.0.1".to_string(),
            redis_port: 6379,
            redis_prefix: "sess".to_string(),
            run_timeout_ms: 3000,
            temp_root: std::env::temp_dir(),
            toolchain: Toolchain::default(),
            registry: LanguageRegistry::all_enabled(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_disable_list() {
        let registry = LanguageRegistry::from_disable_list("java, PYTHON");
        assert!(registry.is_enabled(Language::Cpp));
        assert!(!registry.is_enabled(Language::Java));
        assert!(!registry.is_enabled(Language::Python));
        assert_eq!(registry.enabled_languages(), vec![Language::Cpp]);
    }

    #[test]
    fn test_registry_ignores_unknown_names() {
        let registry = LanguageRegistry::from_disable_list("cobol,,  ");
        for lang in Language::all_variants() {
            assert!(registry.is_enabled(lang));
        }
    }

    #[test]
    fn test_redis_url_format() {
        let config = Config::default();
        assert_eq!(config.redis_url(), "redis://127.0.0.1:6379");
    }
}
