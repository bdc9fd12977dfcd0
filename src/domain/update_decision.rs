//! Update decision result types

use super::Dependency;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Reason why no update is proposed for a dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Ignore conditions exclude every version
    AllVersionsIgnored,
    /// The current version is a commit SHA, not a release
    GitCommitVersion,
    /// Security-only run and the current version has no known vulnerability
    NotVulnerable,
    /// Already at the latest version
    AlreadyLatest,
    /// The registry reported no releases
    NoVersionsAvailable,
    /// Newer versions exist but none passes the filters
    NoSuitableVersion,
    /// Vulnerable, but no newer version resolves the advisories
    NoSecurityFix,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::AllVersionsIgnored => write!(f, "all versions ignored"),
            SkipReason::GitCommitVersion => write!(f, "pinned to a git commit"),
            SkipReason::NotVulnerable => write!(f, "not vulnerable"),
            SkipReason::AlreadyLatest => write!(f, "already at latest"),
            SkipReason::NoVersionsAvailable => write!(f, "no versions available"),
            SkipReason::NoSuitableVersion => write!(f, "no suitable version"),
            SkipReason::NoSecurityFix => write!(f, "no security fix available"),
        }
    }
}

/// A range excluded from the candidates, and the ignore condition behind it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExcludedRange {
    pub range: String,
    /// Name pattern of the condition that produced the range
    pub condition: String,
}

impl ExcludedRange {
    pub fn new(range: impl Into<String>, condition: impl Into<String>) -> Self {
        Self {
            range: range.into(),
            condition: condition.into(),
        }
    }
}

/// Result of evaluating the update policy for a single dependency
#[derive(Debug, Clone, Serialize)]
pub struct UpdateDecision {
    /// The dependency evaluated
    pub dependency: Dependency,
    /// Version to update to; `None` when skipped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_version: Option<String>,
    /// Why no update is proposed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<SkipReason>,
    /// Whether the update resolves a security advisory
    pub security_update: bool,
    /// Ranges removed from consideration by ignore conditions
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub excluded: Vec<ExcludedRange>,
    /// Git ref to write for git dependencies (tag, branch or commit)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_ref: Option<String>,
    /// Release date of the target version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub released_at: Option<DateTime<Utc>>,
}

impl UpdateDecision {
    /// Creates an update to `target_version`
    pub fn update(dependency: Dependency, target_version: impl Into<String>) -> Self {
        Self {
            dependency,
            target_version: Some(target_version.into()),
            skip_reason: None,
            security_update: false,
            excluded: Vec::new(),
            resolved_ref: None,
            released_at: None,
        }
    }

    /// Creates a skip
    pub fn skip(dependency: Dependency, reason: SkipReason) -> Self {
        Self {
            dependency,
            target_version: None,
            skip_reason: Some(reason),
            security_update: false,
            excluded: Vec::new(),
            resolved_ref: None,
            released_at: None,
        }
    }

    /// Marks the decision as security-motivated (builder pattern)
    pub fn with_security_update(mut self, security_update: bool) -> Self {
        self.security_update = security_update;
        self
    }

    /// Records the excluded ranges (builder pattern)
    pub fn with_excluded(mut self, excluded: Vec<ExcludedRange>) -> Self {
        self.excluded = excluded;
        self
    }

    /// Sets the git ref to write (builder pattern)
    pub fn with_resolved_ref(mut self, resolved_ref: impl Into<String>) -> Self {
        self.resolved_ref = Some(resolved_ref.into());
        self
    }

    /// Sets the release date of the target version (builder pattern)
    pub fn with_released_at(mut self, released_at: Option<DateTime<Utc>>) -> Self {
        self.released_at = released_at;
        self
    }

    /// Returns true if an update is proposed
    pub fn is_update(&self) -> bool {
        self.target_version.is_some()
    }

    /// Returns true if the dependency was skipped
    pub fn is_skip(&self) -> bool {
        self.target_version.is_none()
    }

    /// Returns the package name
    pub fn package_name(&self) -> &str {
        &self.dependency.name
    }
}

impl fmt::Display for UpdateDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.target_version, self.skip_reason) {
            (Some(target), _) => write!(
                f,
                "{}: {} → {}",
                self.dependency.name,
                self.dependency.version().unwrap_or("unknown"),
                target
            ),
            (None, Some(reason)) => write!(f, "{}: skipped ({})", self.dependency.name, reason),
            (None, None) => write!(f, "{}: skipped", self.dependency.name),
        }
    }
}
