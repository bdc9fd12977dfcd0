//! Update decision logic for dependencies
//!
//! This module provides:
//! - Update filter configuration from CLI args and the job file
//! - Candidate release info with release date and yank flag
//! - The update checker that picks a target version or a skip reason

mod filter;
mod version_info;

pub use filter::UpdateFilter;
pub use version_info::VersionInfo;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::domain::{Dependency, ExcludedRange, SkipReason, UpdateDecision};
use crate::error::PolicyError;
use crate::git::{looks_like_commit_sha, scan_version, GitRefResolver, PinState, RefSource};
use crate::policy::UpdatePolicy;
use crate::security::{SecurityAdvisory, SecurityAdvisoryMatcher};
use crate::version::{Requirement, Version};

/// Decides whether and where to update a dependency
pub struct UpdateChecker {
    /// Filter configuration
    filter: UpdateFilter,
    /// Current time for age calculations
    now: DateTime<Utc>,
}

impl UpdateChecker {
    /// Create a new UpdateChecker with the given filter
    pub fn new(filter: UpdateFilter) -> Self {
        Self {
            filter,
            now: Utc::now(),
        }
    }

    /// Create a new UpdateChecker with a custom current time (for testing)
    pub fn with_time(filter: UpdateFilter, now: DateTime<Utc>) -> Self {
        Self { filter, now }
    }

    pub fn filter(&self) -> &UpdateFilter {
        &self.filter
    }

    /// Ignored ranges for the dependency, parsed
    fn ignored(
        &self,
        dependency: &Dependency,
        policy: &UpdatePolicy,
    ) -> Result<(Vec<ExcludedRange>, Vec<Requirement>), PolicyError> {
        Ok(policy
            .ignored_requirements(dependency, self.filter.security_only, self.filter.semver_mode)?
            .into_iter()
            .unzip())
    }

    /// Skip, or fail when `raise_on_ignored` is set
    fn all_ignored(
        &self,
        dependency: &Dependency,
        excluded: Vec<ExcludedRange>,
    ) -> Result<UpdateDecision, PolicyError> {
        if self.filter.raise_on_ignored {
            return Err(PolicyError::AllVersionsIgnored {
                dependency: dependency.name.clone(),
            });
        }
        Ok(UpdateDecision::skip(dependency.clone(), SkipReason::AllVersionsIgnored)
            .with_excluded(excluded))
    }

    /// Returns false if the release is too recent for the cooldown
    fn old_enough(&self, info: &VersionInfo) -> bool {
        let cutoff = self
            .filter
            .min_age
            .and_then(|age| chrono::Duration::from_std(age).ok())
            .and_then(|age| self.now.checked_sub_signed(age));

        match (cutoff, info.released_at) {
            (Some(cutoff), Some(released_at)) => released_at <= cutoff,
            _ => true,
        }
    }

    /// Decide the update for a registry dependency
    ///
    /// Candidates that don't parse under the ecosystem's scheme are skipped.
    /// A malformed ignore range is returned as an error rather than skipped.
    pub fn check(
        &self,
        dependency: &Dependency,
        available_versions: &[VersionInfo],
        policy: &UpdatePolicy,
        advisories: &[SecurityAdvisory],
    ) -> Result<UpdateDecision, PolicyError> {
        let (excluded, ignored) = self.ignored(dependency, policy)?;
        if ignored.iter().any(Requirement::matches_all_versions) {
            return self.all_ignored(dependency, excluded);
        }

        let scheme = dependency.scheme();
        let current = dependency.current_version();
        if current.is_none() && dependency.version().is_some_and(looks_like_commit_sha) {
            return Ok(UpdateDecision::skip(dependency.clone(), SkipReason::GitCommitVersion)
                .with_excluded(excluded));
        }

        if available_versions.is_empty() {
            return Ok(
                UpdateDecision::skip(dependency.clone(), SkipReason::NoVersionsAvailable)
                    .with_excluded(excluded),
            );
        }

        let parsed: Vec<(Version, &VersionInfo)> = available_versions
            .iter()
            .filter(|info| !info.yanked)
            .filter_map(|info| match scheme.parse(&info.version) {
                Ok(version) => Some((version, info)),
                Err(_) => {
                    debug!(
                        dependency = %dependency.name,
                        version = %info.version,
                        "skipping unparseable candidate"
                    );
                    None
                }
            })
            .collect();

        let matcher = SecurityAdvisoryMatcher::for_dependency(advisories, dependency);
        let vulnerable = current.as_ref().is_some_and(|c| matcher.vulnerable(c));
        if self.filter.security_only && !vulnerable {
            return Ok(UpdateDecision::skip(dependency.clone(), SkipReason::NotVulnerable)
                .with_excluded(excluded));
        }

        let newer: Vec<&(Version, &VersionInfo)> = parsed
            .iter()
            .filter(|(version, _)| current.as_ref().map_or(true, |c| version > c))
            .collect();
        if newer.is_empty() {
            return Ok(UpdateDecision::skip(dependency.clone(), SkipReason::AlreadyLatest)
                .with_excluded(excluded));
        }

        let allow_prerelease = self.filter.allow_prerelease
            || current.as_ref().is_some_and(Version::is_prerelease);
        let eligible: Vec<&(Version, &VersionInfo)> = newer
            .into_iter()
            .filter(|(version, _)| allow_prerelease || !version.is_prerelease())
            .filter(|(_, info)| self.old_enough(info))
            .collect();

        let no_target = if vulnerable {
            SkipReason::NoSecurityFix
        } else {
            SkipReason::NoSuitableVersion
        };
        if eligible.is_empty() {
            return Ok(UpdateDecision::skip(dependency.clone(), no_target).with_excluded(excluded));
        }

        let allowed: Vec<&(Version, &VersionInfo)> = eligible
            .into_iter()
            .filter(|(version, _)| !ignored.iter().any(|r| r.satisfied_by(version)))
            .collect();
        if allowed.is_empty() {
            return self.all_ignored(dependency, excluded);
        }

        let target = if vulnerable && (self.filter.security_only || self.filter.lowest_fix) {
            let candidates: Vec<Version> = allowed.iter().map(|(v, _)| v.clone()).collect();
            matcher
                .lowest_fixed_version(&candidates, current.as_ref())
                .and_then(|lowest| allowed.iter().find(|(v, _)| *v == lowest).copied())
        } else {
            allowed
                .iter()
                .filter(|(version, _)| !matcher.vulnerable(version))
                .max_by(|a, b| a.0.cmp(&b.0))
                .copied()
        };

        let Some((version, info)) = target else {
            return Ok(UpdateDecision::skip(dependency.clone(), no_target).with_excluded(excluded));
        };

        let security_update = current
            .as_ref()
            .is_some_and(|c| matcher.fixed_by(c, version));

        Ok(UpdateDecision::update(dependency.clone(), &info.version)
            .with_security_update(security_update)
            .with_excluded(excluded)
            .with_released_at(info.released_at))
    }

    /// Decide the update for a git dependency from the refs of its repository
    ///
    /// A branch-tracking dependency moves to the branch head, a version pin to
    /// the highest allowed version tag of the same precision, and a commit pin
    /// to the commit of the highest version tag when the pinned commit is
    /// itself tagged.
    pub async fn check_git(
        &self,
        dependency: &Dependency,
        source: &dyn RefSource,
        policy: &UpdatePolicy,
    ) -> Result<UpdateDecision, PolicyError> {
        let (excluded, ignored) = self.ignored(dependency, policy)?;
        if ignored.iter().any(Requirement::matches_all_versions) {
            return self.all_ignored(dependency, excluded);
        }
        if self.filter.security_only {
            return Ok(UpdateDecision::skip(dependency.clone(), SkipReason::NotVulnerable)
                .with_excluded(excluded));
        }

        let resolver = GitRefResolver::new(dependency, source)
            .with_ignored(ignored)
            .with_consider_version_branches_pinned(self.filter.consider_version_branches_pinned);
        let state = resolver.pin_state().await?;
        debug!(dependency = %dependency.name, state = %state, "resolved git pin");

        let git_source = dependency
            .git_source()?
            .ok_or_else(|| PolicyError::NotGitDependency {
                dependency: dependency.name.clone(),
            })?;

        let decision = match state {
            PinState::NotGit => {
                return Err(PolicyError::NotGitDependency {
                    dependency: dependency.name.clone(),
                })
            }
            PinState::Unpinned => {
                let branch = match git_source.branch.or(git_source.git_ref) {
                    Some(branch) => Some(branch),
                    None => source.default_branch().await?,
                };
                let head = match &branch {
                    Some(name) => source
                        .branches()
                        .await?
                        .into_iter()
                        .find(|b| &b.name == name),
                    None => None,
                };

                match head {
                    None => UpdateDecision::skip(dependency.clone(), SkipReason::NoVersionsAvailable),
                    Some(head) if dependency.version().is_some_and(|v| head.points_at(v)) => {
                        UpdateDecision::skip(dependency.clone(), SkipReason::AlreadyLatest)
                    }
                    Some(head) => {
                        UpdateDecision::update(dependency.clone(), head.commit_sha)
                            .with_resolved_ref(head.name)
                    }
                }
            }
            PinState::PinnedToVersionTag | PinState::PinnedToBranch => {
                let pinned_ref = git_source.git_ref.or(git_source.branch).unwrap_or_default();
                let current = resolver.version_from_ref(&pinned_ref);

                match resolver.latest_version_tag(true).await? {
                    Some(latest) if current.as_ref().map_or(true, |c| &latest.version > c) => {
                        let target = scan_version(&latest.tag).unwrap_or(latest.version.as_str());
                        UpdateDecision::update(dependency.clone(), target)
                            .with_resolved_ref(latest.tag)
                    }
                    Some(_) => UpdateDecision::skip(dependency.clone(), SkipReason::AlreadyLatest),
                    None => UpdateDecision::skip(dependency.clone(), SkipReason::NoSuitableVersion),
                }
            }
            PinState::PinnedToCommit => {
                let sha = git_source.git_ref.unwrap_or_default();
                let Some(tag) = resolver.most_specific_version_tag_for_commit(&sha).await? else {
                    return Ok(
                        UpdateDecision::skip(dependency.clone(), SkipReason::GitCommitVersion)
                            .with_excluded(excluded),
                    );
                };
                let current = resolver.version_from_ref(&tag);

                match resolver.latest_version_tag(false).await? {
                    Some(latest) if current.as_ref().map_or(true, |c| &latest.version > c) => {
                        UpdateDecision::update(dependency.clone(), latest.commit_sha)
                            .with_resolved_ref(latest.tag)
                    }
                    Some(_) => UpdateDecision::skip(dependency.clone(), SkipReason::AlreadyLatest),
                    None => UpdateDecision::skip(dependency.clone(), SkipReason::NoSuitableVersion),
                }
            }
        };

        Ok(decision.with_excluded(excluded))
    }
}
