//! Pin resolution for dependencies sourced from git
//!
//! This module provides:
//! - `RefSource`: the capability to list a repository's tags and branches
//! - `RefListing`: an in-memory listing parsed from an upload-pack advertisement
//! - `HttpRefSource`: a `RefSource` that queries the git host over HTTP
//! - `GitRefResolver`: decides how a git dependency is pinned and resolves
//!   pinned commits to version tags

mod http;
mod listing;

pub use http::HttpRefSource;
pub use listing::{GitRef, RefListing};

use async_trait::async_trait;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;
use tracing::debug;

use crate::domain::{Dependency, GitSource};
use crate::error::PolicyError;
use crate::version::{Requirement, Version, VersionScheme};

/// `v1`, `v1-beta` (only right after a leading `v`)
static SHORT_VERSION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^v(?P<version>[0-9]+(?:-[a-z0-9]+)?)$").expect("valid short version regex")
});

/// `1.2`, `1.2.3`, `1.2.3-rc1` at the end of a ref name
static DOTTED_VERSION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?P<version>[0-9]+\.[0-9]+(?:\.[a-z0-9\-]+)*)$")
        .expect("valid dotted version regex")
});

static COMMIT_SHA_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-f]{6,40}$").expect("valid commit SHA regex"));

/// Lists the refs of a git repository
#[async_trait]
pub trait RefSource: Send + Sync {
    async fn tags(&self) -> Result<Vec<GitRef>, PolicyError>;

    async fn branches(&self) -> Result<Vec<GitRef>, PolicyError>;

    /// Returns true if a branch with exactly this name exists
    async fn branch_exists(&self, name: &str) -> Result<bool, PolicyError> {
        Ok(self.branches().await?.iter().any(|b| b.name == name))
    }

    /// The branch `HEAD` points at, when the source knows it
    async fn default_branch(&self) -> Result<Option<String>, PolicyError> {
        Ok(None)
    }
}

/// How a git dependency is pinned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PinState {
    /// The dependency is not sourced from git
    NotGit,
    /// Tracks a branch
    Unpinned,
    /// Pinned to a branch whose name looks like a version
    PinnedToBranch,
    /// Pinned to a commit SHA or a non-version ref
    PinnedToCommit,
    /// Pinned to a version tag
    PinnedToVersionTag,
}

impl PinState {
    pub fn is_pinned(&self) -> bool {
        matches!(
            self,
            PinState::PinnedToBranch | PinState::PinnedToCommit | PinState::PinnedToVersionTag
        )
    }
}

impl fmt::Display for PinState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PinState::NotGit => "not a git dependency",
            PinState::Unpinned => "unpinned",
            PinState::PinnedToBranch => "pinned to branch",
            PinState::PinnedToCommit => "pinned to commit",
            PinState::PinnedToVersionTag => "pinned to version tag",
        };
        write!(f, "{}", label)
    }
}

/// A version tag together with its parsed version
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionTag {
    pub tag: String,
    pub version: Version,
    pub commit_sha: String,
}

/// Extract the version part of a ref name (`module-v1.2.3` -> `1.2.3`)
pub fn scan_version(name: &str) -> Option<&str> {
    SHORT_VERSION_PATTERN
        .captures(name)
        .or_else(|| DOTTED_VERSION_PATTERN.captures(name))
        .and_then(|caps| caps.name("version"))
        .map(|m| m.as_str())
}

/// Returns true if the ref name ends in a version
pub fn is_version_tag(name: &str) -> bool {
    scan_version(name).is_some()
}

/// Returns true if the string looks like an abbreviated or full commit SHA
pub fn looks_like_commit_sha(s: &str) -> bool {
    COMMIT_SHA_PATTERN.is_match(s)
}

/// The ref name with its version and a trailing `v` removed (`module-v1.2` -> `module-`)
fn version_prefix(name: &str) -> String {
    let stripped = match scan_version(name) {
        Some(version) => &name[..name.len() - version.len()],
        None => name,
    };
    stripped
        .strip_suffix(['v', 'V'])
        .unwrap_or(stripped)
        .to_string()
}

fn precision(version: &str) -> usize {
    version.split('.').count()
}

/// Resolves the pin of one git dependency against a ref source
pub struct GitRefResolver<'a> {
    dependency: &'a Dependency,
    source: &'a dyn RefSource,
    ignored: Vec<Requirement>,
    consider_version_branches_pinned: bool,
}

impl<'a> GitRefResolver<'a> {
    pub fn new(dependency: &'a Dependency, source: &'a dyn RefSource) -> Self {
        Self {
            dependency,
            source,
            ignored: Vec::new(),
            consider_version_branches_pinned: false,
        }
    }

    /// Exclude tags whose version satisfies one of these ranges (builder pattern)
    pub fn with_ignored(mut self, ignored: Vec<Requirement>) -> Self {
        self.ignored = ignored;
        self
    }

    /// Treat a branch named like a version as a pin (builder pattern)
    pub fn with_consider_version_branches_pinned(mut self, enabled: bool) -> Self {
        self.consider_version_branches_pinned = enabled;
        self
    }

    fn git_source(&self) -> Result<Option<GitSource>, PolicyError> {
        self.dependency.git_source()
    }

    fn require_git_source(&self) -> Result<GitSource, PolicyError> {
        self.git_source()?.ok_or_else(|| PolicyError::NotGitDependency {
            dependency: self.dependency.name.clone(),
        })
    }

    /// Parse the version out of a ref name with the dependency's scheme
    pub fn version_from_ref(&self, name: &str) -> Option<Version> {
        let raw = scan_version(name)?;
        self.dependency
            .scheme()
            .parse_bound(raw)
            .or_else(|_| VersionScheme::Generic.parse(raw))
            .ok()
    }

    fn is_version_ref(&self, name: &str) -> bool {
        is_version_tag(name) || self.dependency.scheme().is_valid(name)
    }

    /// Determine how the dependency is pinned
    ///
    /// Only an ambiguous ref (no branch given, not a prefix of the current
    /// version) needs the ref source. Lookup failures are returned, never
    /// taken as "not a branch".
    pub async fn pin_state(&self) -> Result<PinState, PolicyError> {
        let Some(source) = self.git_source()? else {
            return Ok(PinState::NotGit);
        };
        let Some(git_ref) = source.git_ref.as_deref() else {
            return Ok(PinState::Unpinned);
        };

        if source.branch.as_deref() == Some(git_ref) {
            return Ok(PinState::Unpinned);
        }
        if source.branch.is_some() {
            return Ok(PinState::PinnedToCommit);
        }
        if self
            .dependency
            .version()
            .is_some_and(|version| version.starts_with(git_ref))
        {
            return Ok(PinState::PinnedToCommit);
        }

        let pinned = if self.is_version_ref(git_ref) {
            PinState::PinnedToVersionTag
        } else {
            PinState::PinnedToCommit
        };

        if self.source.tags().await?.iter().any(|t| t.name == git_ref) {
            debug!(dependency = %self.dependency.name, git_ref, "ref is a tag");
            return Ok(pinned);
        }
        if !self.source.branch_exists(git_ref).await? {
            debug!(dependency = %self.dependency.name, git_ref, "ref is not a branch");
            return Ok(pinned);
        }

        if self.consider_version_branches_pinned && is_version_tag(git_ref) {
            Ok(PinState::PinnedToBranch)
        } else {
            Ok(PinState::Unpinned)
        }
    }

    /// The tag resolving to `sha` whose name has the most version segments
    ///
    /// Ties go to the lexically last tag name.
    pub async fn most_specific_version_tag_for_commit(
        &self,
        sha: &str,
    ) -> Result<Option<String>, PolicyError> {
        let tags = self.source.tags().await?;

        let best = tags
            .into_iter()
            .filter(|t| t.points_at(sha))
            .filter_map(|t| scan_version(&t.name).map(precision).map(|p| (p, t.name)))
            .max();

        Ok(best.map(|(_, name)| name))
    }

    /// The highest allowed version tag for the pinned ref
    ///
    /// Tags must share the pinned ref's prefix (`module-v1.2` only matches
    /// `module-v*`), must not be ignored, and must not be pre-releases unless
    /// the pin is one. With `match_precision`, only tags with as many version
    /// segments as the current version are considered.
    pub async fn latest_version_tag(
        &self,
        match_precision: bool,
    ) -> Result<Option<VersionTag>, PolicyError> {
        let source = self.require_git_source()?;
        let pinned_ref = source.git_ref.as_deref().or(source.branch.as_deref());

        let wants_prerelease = source
            .git_ref
            .as_deref()
            .filter(|r| is_version_tag(r))
            .and_then(|r| self.version_from_ref(r))
            .is_some_and(|v| v.is_prerelease());

        let current_precision = self
            .dependency
            .version()
            .filter(|v| is_version_tag(v) || looks_like_version(v))
            .map(|v| precision(scan_version(v).unwrap_or(v)));

        let tags = self.source.tags().await?;
        let latest = tags
            .into_iter()
            .filter(|t| is_version_tag(&t.name))
            .filter(|t| matches_existing_prefix(pinned_ref, &t.name))
            .filter(|t| {
                !match_precision
                    || current_precision.is_none()
                    || scan_version(&t.name).map(precision) == current_precision
            })
            .filter_map(|t| {
                let version = self.version_from_ref(&t.name)?;
                Some(VersionTag {
                    tag: t.name,
                    version,
                    commit_sha: t.commit_sha,
                })
            })
            .filter(|t| !self.ignored.iter().any(|r| r.satisfied_by(&t.version)))
            .filter(|t| wants_prerelease || !t.version.is_prerelease())
            .max_by(|a, b| a.version.cmp(&b.version).then_with(|| a.tag.cmp(&b.tag)));

        Ok(latest)
    }

    /// The branch whose head is `sha`
    ///
    /// Several matching branches resolve to the default branch when it is
    /// among them and are ambiguous otherwise.
    pub async fn branch_for_commit(
        &self,
        sha: &str,
        default_branch: Option<&str>,
    ) -> Result<Option<String>, PolicyError> {
        let mut names: Vec<String> = self
            .source
            .branches()
            .await?
            .into_iter()
            .filter(|b| b.points_at(sha))
            .map(|b| b.name)
            .collect();

        match names.len() {
            0 => Ok(None),
            1 => Ok(names.pop()),
            _ => match default_branch.filter(|d| names.iter().any(|n| n == d)) {
                Some(default) => Ok(Some(default.to_string())),
                None => {
                    names.sort();
                    Err(PolicyError::AmbiguousGitPin {
                        sha: sha.to_string(),
                        branches: names,
                    })
                }
            },
        }
    }
}

fn looks_like_version(s: &str) -> bool {
    VersionScheme::Generic.is_valid(s)
}

fn matches_existing_prefix(pinned_ref: Option<&str>, tag: &str) -> bool {
    match pinned_ref {
        Some(pinned) if is_version_tag(pinned) => version_prefix(pinned) == version_prefix(tag),
        _ => true,
    }
}
