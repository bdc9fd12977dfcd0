//! Update filter configuration
//!
//! This module provides the UpdateFilter struct that encapsulates
//! the run-wide options of an update decision.

use crate::policy::SemverMode;
use std::time::Duration;

/// Filter configuration for update decisions
#[derive(Debug, Clone, Default)]
pub struct UpdateFilter {
    /// Only propose updates that fix a known vulnerability
    pub security_only: bool,
    /// Semver mode for conditions that don't set their own
    pub semver_mode: SemverMode,
    /// Pick the lowest fixing version instead of the highest for vulnerable dependencies
    pub lowest_fix: bool,
    /// Minimum age for versions to be considered
    pub min_age: Option<Duration>,
    /// Consider pre-releases even when the current version is stable
    pub allow_prerelease: bool,
    /// Fail instead of skipping when ignore conditions exclude every newer version
    pub raise_on_ignored: bool,
    /// Treat git branches named like versions as pins
    pub consider_version_branches_pinned: bool,
}

impl UpdateFilter {
    /// Create a new UpdateFilter with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set security-only mode
    pub fn with_security_only(mut self, security_only: bool) -> Self {
        self.security_only = security_only;
        self
    }

    /// Set the default semver mode
    pub fn with_semver_mode(mut self, mode: SemverMode) -> Self {
        self.semver_mode = mode;
        self
    }

    /// Set the lowest-fix strategy
    pub fn with_lowest_fix(mut self, lowest_fix: bool) -> Self {
        self.lowest_fix = lowest_fix;
        self
    }

    /// Set minimum age for versions
    pub fn with_min_age(mut self, age: Duration) -> Self {
        self.min_age = Some(age);
        self
    }

    /// Set whether pre-releases are allowed
    pub fn with_allow_prerelease(mut self, allow: bool) -> Self {
        self.allow_prerelease = allow;
        self
    }

    /// Set whether fully ignored dependencies are an error
    pub fn with_raise_on_ignored(mut self, raise: bool) -> Self {
        self.raise_on_ignored = raise;
        self
    }

    /// Set whether version-named branches count as pins
    pub fn with_consider_version_branches_pinned(mut self, enabled: bool) -> Self {
        self.consider_version_branches_pinned = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_filter() {
        let filter = UpdateFilter::new();
        assert!(!filter.security_only);
        assert_eq!(filter.semver_mode, SemverMode::Relaxed);
        assert!(!filter.lowest_fix);
        assert!(filter.min_age.is_none());
        assert!(!filter.allow_prerelease);
        assert!(!filter.raise_on_ignored);
        assert!(!filter.consider_version_branches_pinned);
    }

    #[test]
    fn test_chained_builders() {
        let filter = UpdateFilter::new()
            .with_security_only(true)
            .with_semver_mode(SemverMode::Strict)
            .with_lowest_fix(true)
            .with_min_age(Duration::from_secs(86400))
            .with_allow_prerelease(true)
            .with_raise_on_ignored(true)
            .with_consider_version_branches_pinned(true);

        assert!(filter.security_only);
        assert_eq!(filter.semver_mode, SemverMode::Strict);
        assert!(filter.lowest_fix);
        assert_eq!(filter.min_age, Some(Duration::from_secs(86400)));
        assert!(filter.allow_prerelease);
        assert!(filter.raise_on_ignored);
        assert!(filter.consider_version_branches_pinned);
    }
}
