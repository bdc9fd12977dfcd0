//! Configured skip rules

use serde::{Deserialize, Serialize};

use super::semver_range::{self, SemverMode, UpdateType};
use super::wildcard;
use crate::domain::Dependency;

/// The range that matches every version
pub const ALL_VERSIONS: &str = ">= 0";

/// A skip rule from the job configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct IgnoreCondition {
    /// Name pattern, optionally with `*` wildcards
    pub dependency_name: String,
    /// Explicit version ranges to skip
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub versions: Vec<String>,
    /// Update types to skip
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub update_types: Vec<UpdateType>,
    /// Overrides the run's semver mode for this condition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub versioning: Option<SemverMode>,
}

impl IgnoreCondition {
    /// Creates a condition that ignores every version of matching dependencies
    pub fn new(dependency_name: impl Into<String>) -> Self {
        Self {
            dependency_name: dependency_name.into(),
            versions: Vec::new(),
            update_types: Vec::new(),
            versioning: None,
        }
    }

    /// Sets explicit version ranges (builder pattern)
    pub fn with_versions<I, S>(mut self, versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.versions = versions.into_iter().map(Into::into).collect();
        self
    }

    /// Sets update types (builder pattern)
    pub fn with_update_types(mut self, update_types: Vec<UpdateType>) -> Self {
        self.update_types = update_types;
        self
    }

    /// Sets the semver mode for this condition (builder pattern)
    pub fn with_versioning(mut self, mode: SemverMode) -> Self {
        self.versioning = Some(mode);
        self
    }

    /// Returns true if the pattern matches the dependency's normalized name
    pub fn applies_to(&self, dependency: &Dependency) -> bool {
        wildcard::matches(
            &dependency.normalize(&self.dependency_name),
            &dependency.normalized_name(),
        )
    }

    /// Ranges this condition excludes for the dependency
    ///
    /// Security-only runs keep explicit ranges and drop everything derived
    /// from update types. Conditions that need a current version contribute
    /// nothing when it is unknown or unparseable.
    pub fn ignored_ranges(
        &self,
        dependency: &Dependency,
        security_only: bool,
        semver_mode: SemverMode,
    ) -> Vec<String> {
        if security_only {
            return self.versions.clone();
        }
        if self.versions.is_empty() && self.update_types.is_empty() {
            return vec![ALL_VERSIONS.to_string()];
        }

        let mode = self.versioning.unwrap_or(semver_mode);
        let current = dependency.current_version();

        let mut ranges: Vec<String> = Vec::new();
        let by_type = self
            .update_types
            .iter()
            .filter_map(|t| semver_range::compile(current.as_ref(), *t, mode));
        for range in self.versions.iter().cloned().chain(by_type) {
            if !ranges.contains(&range) {
                ranges.push(range);
            }
        }
        ranges
    }
}
