//! Security advisory matching
//!
//! An advisory names a dependency and two sets of ranges: the vulnerable ones
//! and the safe ones (patched or unaffected). Ranges are parsed with the
//! ecosystem's version scheme once, when the advisory is built.

use tracing::debug;

use crate::domain::{Dependency, Ecosystem};
use crate::error::PolicyError;
use crate::version::{Requirement, Version};

/// A known vulnerability of one dependency
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityAdvisory {
    pub dependency_name: String,
    pub ecosystem: Ecosystem,
    vulnerable_versions: Vec<Requirement>,
    safe_versions: Vec<Requirement>,
}

impl SecurityAdvisory {
    /// Build an advisory, parsing its ranges with the ecosystem's scheme
    pub fn new<S: AsRef<str>>(
        dependency_name: impl Into<String>,
        ecosystem: Ecosystem,
        vulnerable_versions: &[S],
        safe_versions: &[S],
    ) -> Result<Self, PolicyError> {
        let scheme = ecosystem.version_scheme();
        let parse = |ranges: &[S]| {
            ranges
                .iter()
                .map(|r| Requirement::parse(scheme, r.as_ref()))
                .collect::<Result<Vec<_>, _>>()
        };

        Ok(Self {
            dependency_name: dependency_name.into(),
            ecosystem,
            vulnerable_versions: parse(vulnerable_versions)?,
            safe_versions: parse(safe_versions)?,
        })
    }

    pub fn vulnerable_versions(&self) -> &[Requirement] {
        &self.vulnerable_versions
    }

    pub fn safe_versions(&self) -> &[Requirement] {
        &self.safe_versions
    }

    /// Returns true if the version is affected by this advisory
    ///
    /// A version in a safe range is never vulnerable. Without vulnerable
    /// ranges, every version outside the safe ranges is.
    pub fn vulnerable(&self, version: &Version) -> bool {
        if self.safe_versions.iter().any(|r| r.satisfied_by(version)) {
            return false;
        }
        if !self.vulnerable_versions.is_empty() {
            return self.vulnerable_versions.iter().any(|r| r.satisfied_by(version));
        }
        !self.safe_versions.is_empty()
    }

    /// Returns true if this advisory concerns the dependency
    pub fn applies_to(&self, dependency: &Dependency) -> bool {
        self.ecosystem == dependency.ecosystem
            && dependency.normalize(&self.dependency_name) == dependency.normalized_name()
    }

    /// Returns true if moving from `previous` to `updated` resolves this advisory
    pub fn fixed_by(&self, previous: &Version, updated: &Version) -> bool {
        self.vulnerable(previous) && !self.vulnerable(updated)
    }
}

/// The advisories that apply to one dependency
#[derive(Debug, Clone, Default)]
pub struct SecurityAdvisoryMatcher<'a> {
    advisories: Vec<&'a SecurityAdvisory>,
}

impl<'a> SecurityAdvisoryMatcher<'a> {
    /// Select the advisories relevant to the dependency
    pub fn for_dependency(advisories: &'a [SecurityAdvisory], dependency: &Dependency) -> Self {
        Self {
            advisories: advisories
                .iter()
                .filter(|a| a.applies_to(dependency))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.advisories.is_empty()
    }

    /// Returns true if any relevant advisory affects the version
    pub fn vulnerable(&self, version: &Version) -> bool {
        self.advisories.iter().any(|a| a.vulnerable(version))
    }

    /// Returns true if every advisory affecting `previous` is resolved by `updated`
    pub fn fixed_by(&self, previous: &Version, updated: &Version) -> bool {
        self.vulnerable(previous) && !self.vulnerable(updated)
    }

    /// The lowest candidate no advisory applies to
    ///
    /// Candidates on the current version's major line with at least its
    /// precision are preferred; the full set is the fallback.
    pub fn lowest_fixed_version(
        &self,
        candidates: &[Version],
        current: Option<&Version>,
    ) -> Option<Version> {
        let mut fixed: Vec<&Version> = candidates
            .iter()
            .filter(|v| current.map_or(true, |c| *v > c))
            .filter(|v| !self.vulnerable(v))
            .collect();
        fixed.sort();

        let same_line = current.and_then(|current| {
            fixed
                .iter()
                .find(|v| v.major() == current.major() && v.precision() >= current.precision())
        });

        let lowest = same_line.or_else(|| fixed.first()).map(|v| (*v).clone());
        if let Some(version) = &lowest {
            debug!(version = %version, "lowest non-vulnerable version");
        }
        lowest
    }
}
