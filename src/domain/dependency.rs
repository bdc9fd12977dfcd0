//! Dependency information structures

use super::Ecosystem;
use crate::error::PolicyError;
use crate::version::{Version, VersionScheme};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a requirement is fetched from (registry, git, path, ...)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RequirementSource {
    /// Source type (`git`, `registry`, `path`, ...)
    #[serde(rename = "type")]
    pub source_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Pinned ref (commit SHA, tag or branch name)
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

impl RequirementSource {
    /// Creates a git source
    pub fn git(url: impl Into<String>) -> Self {
        Self {
            source_type: "git".to_string(),
            url: Some(url.into()),
            git_ref: None,
            branch: None,
        }
    }

    /// Sets the pinned ref (builder pattern)
    pub fn with_ref(mut self, git_ref: impl Into<String>) -> Self {
        self.git_ref = Some(git_ref.into());
        self
    }

    /// Sets the tracked branch (builder pattern)
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    pub fn is_git(&self) -> bool {
        self.source_type == "git"
    }
}

impl fmt::Display for RequirementSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.url {
            Some(url) => write!(f, "{} {}", self.source_type, url),
            None => write!(f, "{}", self.source_type),
        }
    }
}

/// One place a dependency is declared
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ManifestRequirement {
    /// Manifest file that declares the requirement
    pub file: String,
    /// Requirement string as written (`^1.2.0`, `>= 2, < 3`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirement: Option<String>,
    /// Dependency groups (`dev`, `test`, ...)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<RequirementSource>,
}

impl ManifestRequirement {
    /// Creates a requirement declared in `file`
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            requirement: None,
            groups: Vec::new(),
            source: None,
        }
    }

    /// Sets the requirement string (builder pattern)
    pub fn with_requirement(mut self, requirement: impl Into<String>) -> Self {
        self.requirement = Some(requirement.into());
        self
    }

    /// Sets the dependency groups (builder pattern)
    pub fn with_groups(mut self, groups: Vec<String>) -> Self {
        self.groups = groups;
        self
    }

    /// Sets the source (builder pattern)
    pub fn with_source(mut self, source: RequirementSource) -> Self {
        self.source = Some(source);
        self
    }
}

/// The git source a dependency is fetched from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GitSource {
    pub url: String,
    #[serde(rename = "ref", skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

/// Represents a package dependency
#[derive(Debug, Clone, Serialize)]
pub struct Dependency {
    /// Package name as declared
    pub name: String,
    /// Current version, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// The ecosystem this dependency belongs to
    pub ecosystem: Ecosystem,
    /// Declarations of this dependency across manifest files
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub requirements: Vec<ManifestRequirement>,
    #[serde(skip)]
    normalizer: fn(&str) -> String,
}

impl Dependency {
    /// Creates a new dependency using the ecosystem's name normalizer
    pub fn new(name: impl Into<String>, version: Option<&str>, ecosystem: Ecosystem) -> Self {
        Self {
            name: name.into(),
            version: version.map(str::to_string),
            ecosystem,
            requirements: Vec::new(),
            normalizer: ecosystem.name_normalizer(),
        }
    }

    /// Adds a manifest requirement (builder pattern)
    pub fn with_requirement(mut self, requirement: ManifestRequirement) -> Self {
        self.requirements.push(requirement);
        self
    }

    /// Replaces the name normalizer (builder pattern)
    pub fn with_normalizer(mut self, normalizer: fn(&str) -> String) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Returns the name used for matching ignore conditions and advisories
    pub fn normalized_name(&self) -> String {
        (self.normalizer)(&self.name)
    }

    /// Normalize another name the same way as this dependency's name
    pub fn normalize(&self, name: &str) -> String {
        (self.normalizer)(name)
    }

    /// Returns the version scheme of this dependency's ecosystem
    pub fn scheme(&self) -> VersionScheme {
        self.ecosystem.version_scheme()
    }

    /// Returns the current version string
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Returns the current version if it parses under the ecosystem's scheme
    pub fn current_version(&self) -> Option<Version> {
        self.version().and_then(|v| self.scheme().parse(v).ok())
    }

    /// Returns the git source of this dependency, if any
    ///
    /// Several requirements may point at the same repository; differing
    /// repositories are an error.
    pub fn git_source(&self) -> Result<Option<GitSource>, PolicyError> {
        let mut sources: Vec<&RequirementSource> = Vec::new();
        for source in self.requirements.iter().filter_map(|r| r.source.as_ref()) {
            if source.is_git() && !sources.contains(&source) {
                sources.push(source);
            }
        }

        let location = |s: &RequirementSource| (s.source_type.clone(), s.url.clone());
        if let Some(first) = sources.first() {
            if sources.iter().any(|s| location(*s) != location(*first)) {
                return Err(PolicyError::MultipleSources {
                    dependency: self.name.clone(),
                    sources: sources.iter().map(|s| s.to_string()).collect(),
                });
            }
        }

        Ok(sources.first().and_then(|source| {
            source.url.as_ref().map(|url| GitSource {
                url: url.clone(),
                git_ref: source.git_ref.clone(),
                branch: source.branch.clone(),
            })
        }))
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}@{} [{}]", self.name, version, self.ecosystem),
            None => write!(f, "{} [{}]", self.name, self.ecosystem),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::normalize_lowercase;

    fn git_requirement(url: &str, git_ref: &str) -> ManifestRequirement {
        ManifestRequirement::new("Gemfile")
            .with_source(RequirementSource::git(url).with_ref(git_ref))
    }

    #[test]
    fn test_dependency_new() {
        let dep = Dependency::new("lodash", Some("4.17.21"), Ecosystem::NpmAndYarn);
        assert_eq!(dep.name, "lodash");
        assert_eq!(dep.version(), Some("4.17.21"));
        assert_eq!(dep.scheme(), VersionScheme::Semver);
        assert_eq!(dep.current_version().unwrap().release(), &[4, 17, 21]);
    }

    #[test]
    fn test_unknown_or_invalid_current_version() {
        let dep = Dependency::new("lodash", None, Ecosystem::NpmAndYarn);
        assert!(dep.current_version().is_none());

        let dep = Dependency::new("business", Some("df9f605"), Ecosystem::Bundler);
        assert!(dep.current_version().is_none());
    }

    #[test]
    fn test_normalized_name_uses_ecosystem_default() {
        let dep = Dependency::new("Django_Rest", Some("3.0"), Ecosystem::Pip);
        assert_eq!(dep.normalized_name(), "django-rest");

        let dep = Dependency::new("Rails", Some("7.0"), Ecosystem::Bundler);
        assert_eq!(dep.normalized_name(), "Rails");
    }

    #[test]
    fn test_injected_normalizer() {
        let dep = Dependency::new("Rails", Some("7.0"), Ecosystem::Bundler)
            .with_normalizer(normalize_lowercase);
        assert_eq!(dep.normalized_name(), "rails");
        assert_eq!(dep.normalize("ACTIVESUPPORT"), "activesupport");
    }

    #[test]
    fn test_git_source_none_for_registry_dependency() {
        let dep = Dependency::new("rails", Some("7.0"), Ecosystem::Bundler)
            .with_requirement(ManifestRequirement::new("Gemfile").with_requirement("~> 7.0"));
        assert_eq!(dep.git_source().unwrap(), None);
    }

    #[test]
    fn test_git_source_same_url_takes_first() {
        let url = "https://github.com/gocardless/business";
        let dep = Dependency::new("business", Some("df9f605"), Ecosystem::Bundler)
            .with_requirement(git_requirement(url, "df9f605"))
            .with_requirement(git_requirement(url, "v1.0.0"));

        let source = dep.git_source().unwrap().unwrap();
        assert_eq!(source.url, url);
        assert_eq!(source.git_ref.as_deref(), Some("df9f605"));
    }

    #[test]
    fn test_git_source_different_urls_is_error() {
        let dep = Dependency::new("business", Some("df9f605"), Ecosystem::Bundler)
            .with_requirement(git_requirement("https://github.com/a/business", "df9f605"))
            .with_requirement(git_requirement("https://github.com/b/business", "df9f605"));

        assert!(matches!(
            dep.git_source(),
            Err(PolicyError::MultipleSources { .. })
        ));
    }

    #[test]
    fn test_display() {
        let dep = Dependency::new("lodash", Some("4.17.21"), Ecosystem::NpmAndYarn);
        assert_eq!(dep.to_string(), "lodash@4.17.21 [npm_and_yarn]");
        let dep = Dependency::new("lodash", None, Ecosystem::NpmAndYarn);
        assert_eq!(dep.to_string(), "lodash [npm_and_yarn]");
    }

    #[test]
    fn test_serialize_skips_normalizer() {
        let dep = Dependency::new("requests", Some("2.31.0"), Ecosystem::Pip);
        let json = serde_json::to_value(&dep).unwrap();
        assert_eq!(json["name"], "requests");
        assert_eq!(json["ecosystem"], "pip");
        assert!(json.get("normalizer").is_none());
    }

    #[test]
    fn test_requirement_source_deserialize() {
        let source: RequirementSource = serde_json::from_str(
            r#"{"type": "git", "url": "https://github.com/a/b", "ref": "v1.2.0", "branch": null}"#,
        )
        .unwrap();
        assert!(source.is_git());
        assert_eq!(source.git_ref.as_deref(), Some("v1.2.0"));
        assert_eq!(source.branch, None);
    }
}
