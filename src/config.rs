//! Job file loading
//!
//! A job file describes one update run: the package ecosystem, the
//! dependencies with their candidate releases, ignore conditions and
//! security advisories. TOML and JSON are supported, chosen by extension.
//!
//! ```toml
//! package-ecosystem = "npm_and_yarn"
//! security-updates-only = false
//! cooldown = "1w"
//!
//! [[ignore-conditions]]
//! dependency-name = "@types/*"
//! update-types = ["version-update:semver-major"]
//!
//! [[dependencies]]
//! name = "@types/node"
//! version = "12.12.6"
//! available-versions = ["12.20.0", "13.1.0"]
//! ```

use serde::Deserialize;
use std::path::Path;

use crate::cli::parse_duration;
use crate::domain::{Dependency, Ecosystem, ManifestRequirement};
use crate::error::ConfigError;
use crate::git::RefListing;
use crate::policy::{IgnoreCondition, SemverMode, UpdatePolicy};
use crate::security::SecurityAdvisory;
use crate::update::{UpdateFilter, VersionInfo};

/// Supported job file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobFormat {
    Toml,
    Json,
}

impl JobFormat {
    /// Detect the format from the file extension
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Ok(JobFormat::Toml),
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(JobFormat::Json),
            _ => Err(ConfigError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }
}

/// A candidate release, as a bare version string or a table
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum CandidateEntry {
    Version(String),
    Info(VersionInfo),
}

impl From<CandidateEntry> for VersionInfo {
    fn from(entry: CandidateEntry) -> Self {
        match entry {
            CandidateEntry::Version(version) => VersionInfo::new(version),
            CandidateEntry::Info(info) => info,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct DependencyEntry {
    name: String,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    requirements: Vec<ManifestRequirement>,
    #[serde(default)]
    available_versions: Vec<CandidateEntry>,
    #[serde(default)]
    git_refs: Option<RefListing>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct AdvisoryEntry {
    dependency_name: String,
    #[serde(default)]
    affected_versions: Vec<String>,
    #[serde(default)]
    patched_versions: Vec<String>,
    #[serde(default)]
    unaffected_versions: Vec<String>,
}

/// Raw job file contents
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct JobFile {
    package_ecosystem: Ecosystem,
    #[serde(default)]
    security_updates_only: bool,
    #[serde(default)]
    semver_mode: SemverMode,
    #[serde(default)]
    lowest_fix: bool,
    /// Minimum release age, e.g. `10d`
    #[serde(default)]
    cooldown: Option<String>,
    #[serde(default)]
    allow_prerelease: bool,
    #[serde(default)]
    raise_on_ignored: bool,
    #[serde(default)]
    consider_version_branches_pinned: bool,
    #[serde(default)]
    ignore_conditions: Vec<IgnoreCondition>,
    #[serde(default)]
    security_advisories: Vec<AdvisoryEntry>,
    #[serde(default)]
    dependencies: Vec<DependencyEntry>,
}

/// A dependency together with the data needed to decide its update
#[derive(Debug, Clone)]
pub struct DependencyJob {
    pub dependency: Dependency,
    pub available_versions: Vec<VersionInfo>,
    /// Refs of the dependency's git repository; fetched over HTTP when absent
    pub git_refs: Option<RefListing>,
}

impl DependencyJob {
    pub fn new(dependency: Dependency, available_versions: Vec<VersionInfo>) -> Self {
        Self {
            dependency,
            available_versions,
            git_refs: None,
        }
    }

    pub fn with_git_refs(mut self, git_refs: RefListing) -> Self {
        self.git_refs = Some(git_refs);
        self
    }
}

/// A loaded update job
#[derive(Debug, Clone)]
pub struct Job {
    pub ecosystem: Ecosystem,
    pub filter: UpdateFilter,
    pub policy: UpdatePolicy,
    pub advisories: Vec<SecurityAdvisory>,
    pub dependencies: Vec<DependencyJob>,
}

impl Job {
    /// Read and parse a job file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let format = JobFormat::from_path(path)?;
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;
        Self::parse(&content, format, path)
    }

    /// Parse job file contents; `path` is only used in error messages
    pub fn parse(content: &str, format: JobFormat, path: &Path) -> Result<Self, ConfigError> {
        let file: JobFile = match format {
            JobFormat::Toml => {
                toml::from_str(content).map_err(|e| ConfigError::parse_error(path, e.to_string()))?
            }
            JobFormat::Json => serde_json::from_str(content)
                .map_err(|e| ConfigError::parse_error(path, e.to_string()))?,
        };
        file.into_job()
    }
}

impl JobFile {
    /// Validate the raw contents and build the job
    pub fn into_job(self) -> Result<Job, ConfigError> {
        let ecosystem = self.package_ecosystem;

        let mut filter = UpdateFilter::new()
            .with_security_only(self.security_updates_only)
            .with_semver_mode(self.semver_mode)
            .with_lowest_fix(self.lowest_fix)
            .with_allow_prerelease(self.allow_prerelease)
            .with_raise_on_ignored(self.raise_on_ignored)
            .with_consider_version_branches_pinned(self.consider_version_branches_pinned);
        if let Some(cooldown) = self.cooldown.as_deref() {
            filter = filter.with_min_age(parse_duration(cooldown)?);
        }

        let advisories = self
            .security_advisories
            .into_iter()
            .map(|entry| {
                let safe: Vec<String> = entry
                    .patched_versions
                    .into_iter()
                    .chain(entry.unaffected_versions)
                    .collect();
                SecurityAdvisory::new(
                    &entry.dependency_name,
                    ecosystem,
                    &entry.affected_versions,
                    &safe,
                )
                .map_err(|source| ConfigError::InvalidAdvisory {
                    dependency: entry.dependency_name.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let dependencies = self
            .dependencies
            .into_iter()
            .map(|entry| {
                let dependency = entry.requirements.into_iter().fold(
                    Dependency::new(entry.name, entry.version.as_deref(), ecosystem),
                    Dependency::with_requirement,
                );
                DependencyJob {
                    dependency,
                    available_versions: entry
                        .available_versions
                        .into_iter()
                        .map(VersionInfo::from)
                        .collect(),
                    git_refs: entry.git_refs,
                }
            })
            .collect();

        Ok(Job {
            ecosystem,
            filter,
            policy: UpdatePolicy::new(self.ignore_conditions),
            advisories,
            dependencies,
        })
    }
}
