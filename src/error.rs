//! Application error types using thiserror
//!
//! Error hierarchy:
//! - PolicyError: failures scoped to a single dependency evaluation
//! - ConfigError: problems with the job file or CLI configuration
//! - AppError: top-level wrapper used by the binary

use std::path::PathBuf;
use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Policy evaluation errors
    #[error(transparent)]
    Policy(#[from] PolicyError),

    /// Configuration related errors
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors raised while evaluating the update policy for one dependency
///
/// None of these abort a batch: the orchestrator records them against the
/// dependency that produced them and moves on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    /// A version string could not be parsed by the ecosystem's scheme
    #[error("invalid version '{version}'")]
    InvalidVersion { version: String },

    /// A range string from an ignore condition or advisory is malformed
    #[error("invalid requirement '{requirement}': {message}")]
    InvalidRequirement {
        requirement: String,
        message: String,
    },

    /// The git host could not be queried for refs
    #[error("git host unreachable for {url}: {message}")]
    GitHostUnreachable { url: String, message: String },

    /// A pinned commit is the head of several branches and none is the default
    #[error("commit {sha} is the head of several branches ({}) and none is the default", .branches.join(", "))]
    AmbiguousGitPin { sha: String, branches: Vec<String> },

    /// A dependency declares more than one distinct source
    #[error("dependency '{dependency}' has multiple sources: {}", .sources.join(", "))]
    MultipleSources {
        dependency: String,
        sources: Vec<String>,
    },

    /// A git-only operation was requested for a registry dependency
    #[error("dependency '{dependency}' is not a git dependency")]
    NotGitDependency { dependency: String },

    /// Every newer version is excluded by ignore conditions
    #[error("all newer versions of '{dependency}' are ignored")]
    AllVersionsIgnored { dependency: String },
}

/// Errors related to configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the job file
    #[error("failed to read job file {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Job file contents could not be deserialized
    #[error("failed to parse job file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    /// Job file extension is neither TOML nor JSON
    #[error("unsupported job file format: {path} (expected .toml or .json)")]
    UnsupportedFormat { path: PathBuf },

    /// An advisory in the job file carries a malformed range
    #[error("invalid security advisory for '{dependency}': {source}")]
    InvalidAdvisory {
        dependency: String,
        #[source]
        source: PolicyError,
    },

    /// Invalid duration format
    #[error("invalid duration format '{value}': expected format like '2w', '10d', '1m'")]
    InvalidDuration { value: String },
}

impl PolicyError {
    /// Creates a new InvalidVersion error
    pub fn invalid_version(version: impl Into<String>) -> Self {
        PolicyError::InvalidVersion {
            version: version.into(),
        }
    }

    /// Creates a new InvalidRequirement error
    pub fn invalid_requirement(requirement: impl Into<String>, message: impl Into<String>) -> Self {
        PolicyError::InvalidRequirement {
            requirement: requirement.into(),
            message: message.into(),
        }
    }

    /// Creates a new GitHostUnreachable error
    pub fn git_host_unreachable(url: impl Into<String>, message: impl Into<String>) -> Self {
        PolicyError::GitHostUnreachable {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Returns true if retrying the evaluation could succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, PolicyError::GitHostUnreachable { .. })
    }
}

impl ConfigError {
    /// Creates a new ReadError
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::ReadError {
            path: path.into(),
            source,
        }
    }

    /// Creates a new ParseError
    pub fn parse_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ConfigError::ParseError {
            path: path.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_version_display() {
        let err = PolicyError::invalid_version("not-a-version");
        assert_eq!(err.to_string(), "invalid version 'not-a-version'");
    }

    #[test]
    fn test_invalid_requirement_display() {
        let err = PolicyError::invalid_requirement(">= banana", "unparseable version 'banana'");
        assert_eq!(
            err.to_string(),
            "invalid requirement '>= banana': unparseable version 'banana'"
        );
    }

    #[test]
    fn test_ambiguous_git_pin_lists_branches() {
        let err = PolicyError::AmbiguousGitPin {
            sha: "abc123".to_string(),
            branches: vec!["release".to_string(), "stable".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "commit abc123 is the head of several branches (release, stable) and none is the default"
        );
    }

    #[test]
    fn test_multiple_sources_display() {
        let err = PolicyError::MultipleSources {
            dependency: "business".to_string(),
            sources: vec![
                "git https://github.com/a/business".to_string(),
                "git https://github.com/b/business".to_string(),
            ],
        };
        assert!(err.to_string().contains("a/business, git https://github.com/b"));
    }

    #[test]
    fn test_is_transient() {
        assert!(PolicyError::git_host_unreachable("https://example.com", "timeout").is_transient());
        assert!(!PolicyError::invalid_version("x").is_transient());
    }

    #[test]
    fn test_app_error_from_policy_error() {
        let app: AppError = PolicyError::invalid_version("x").into();
        assert!(matches!(app, AppError::Policy(_)));
        assert_eq!(app.to_string(), "invalid version 'x'");
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidDuration {
            value: "abc".to_string(),
        };
        assert!(err.to_string().contains("invalid duration format 'abc'"));

        let err = ConfigError::parse_error("job.toml", "missing field `dependencies`");
        assert_eq!(
            err.to_string(),
            "failed to parse job file job.toml: missing field `dependencies`"
        );
    }
}
