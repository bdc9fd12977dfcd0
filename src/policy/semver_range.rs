//! Ranges excluded by update-type ignore rules
//!
//! Given the current version and an update type, produce the range covering
//! the next bump of that type and everything above it. Bounds use generic
//! notation, with `.a` as the lowest possible pre-release of a release.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::version::Version;

/// Classification of a version bump
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpdateType {
    #[serde(rename = "version-update:semver-major", alias = "semver-major")]
    Major,
    #[serde(rename = "version-update:semver-minor", alias = "semver-minor")]
    Minor,
    #[serde(rename = "version-update:semver-patch", alias = "semver-patch")]
    Patch,
}

impl UpdateType {
    /// Returns the configuration tag for this update type
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateType::Major => "semver-major",
            UpdateType::Minor => "semver-minor",
            UpdateType::Patch => "semver-patch",
        }
    }
}

impl fmt::Display for UpdateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether pre-1.0 versions break at minor/patch bumps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemverMode {
    /// Breaking changes only at the major boundary
    #[default]
    Relaxed,
    /// `0.y.z` breaks at minor, `0.0.z` breaks at patch
    Strict,
}

/// Compile the ignored range for one update type
///
/// Returns `None` when the current version is unknown, has no numeric
/// release part to anchor the range, or the next boundary does not fit
/// in a `u64`.
pub fn compile(current: Option<&Version>, update_type: UpdateType, mode: SemverMode) -> Option<String> {
    let current = current?;
    if current.release().is_empty() {
        return None;
    }

    let (major, minor, patch) = current.semver_parts();
    let strict = mode == SemverMode::Strict && major == 0;
    let next = |n: u64| n.checked_add(1);

    let range = match update_type {
        UpdateType::Patch if strict && minor == 0 => format!(">= 0.0.{}.a", next(patch)?),
        UpdateType::Patch => format!("> {}, < {}.{}", current.base(), major, next(minor)?),
        UpdateType::Minor if strict && minor == 0 => ">= 0.1.a".to_string(),
        UpdateType::Minor if strict => format!(">= 0.{}.a", next(minor)?),
        UpdateType::Minor => format!(">= {}.{}.a, < {}", major, next(minor)?, next(major)?),
        UpdateType::Major if strict && minor == 0 => format!(">= 0.0.{}.a", next(patch)?),
        UpdateType::Major if strict => format!(">= 0.{}.a", next(minor)?),
        UpdateType::Major => format!(">= {}.a", next(major)?),
    };

    Some(range)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::VersionScheme;

    fn compile_for(version: &str, update_type: UpdateType, mode: SemverMode) -> Option<String> {
        let version = VersionScheme::Generic.parse(version).unwrap();
        compile(Some(&version), update_type, mode)
    }

    #[test]
    fn test_relaxed_patch() {
        assert_eq!(
            compile_for("1.2.3", UpdateType::Patch, SemverMode::Relaxed).as_deref(),
            Some("> 1.2.3, < 1.3")
        );
    }

    #[test]
    fn test_relaxed_minor_with_short_version() {
        assert_eq!(
            compile_for("1.2", UpdateType::Minor, SemverMode::Relaxed).as_deref(),
            Some(">= 1.3.a, < 2")
        );
        assert_eq!(
            compile_for("12.12.6", UpdateType::Minor, SemverMode::Relaxed).as_deref(),
            Some(">= 12.13.a, < 13")
        );
    }

    #[test]
    fn test_relaxed_major() {
        assert_eq!(
            compile_for("12.12.6", UpdateType::Major, SemverMode::Relaxed).as_deref(),
            Some(">= 13.a")
        );
        assert_eq!(
            compile_for("0.15.5", UpdateType::Major, SemverMode::Relaxed).as_deref(),
            Some(">= 1.a")
        );
    }

    #[test]
    fn test_strict_zero_minor_collapses_minor_and_major() {
        let major = compile_for("0.15.5", UpdateType::Major, SemverMode::Strict);
        let minor = compile_for("0.15.5", UpdateType::Minor, SemverMode::Strict);
        assert_eq!(major.as_deref(), Some(">= 0.16.a"));
        assert_eq!(major, minor);
        assert_eq!(
            compile_for("0.15.5", UpdateType::Patch, SemverMode::Strict).as_deref(),
            Some("> 0.15.5, < 0.16")
        );
    }

    #[test]
    fn test_strict_zero_zero_collapses_patch_and_major() {
        let patch = compile_for("0.0.3", UpdateType::Patch, SemverMode::Strict);
        let major = compile_for("0.0.3", UpdateType::Major, SemverMode::Strict);
        assert_eq!(patch.as_deref(), Some(">= 0.0.4.a"));
        assert_eq!(patch, major);
        assert_eq!(
            compile_for("0.0.3", UpdateType::Minor, SemverMode::Strict).as_deref(),
            Some(">= 0.1.a")
        );
    }

    #[test]
    fn test_strict_has_no_effect_after_one_zero() {
        for update_type in [UpdateType::Major, UpdateType::Minor, UpdateType::Patch] {
            assert_eq!(
                compile_for("2.3.4", update_type, SemverMode::Strict),
                compile_for("2.3.4", update_type, SemverMode::Relaxed)
            );
        }
    }

    #[test]
    fn test_unknown_version_yields_nothing() {
        assert_eq!(compile(None, UpdateType::Major, SemverMode::Relaxed), None);
    }

    #[test]
    fn test_boundary_past_u64_yields_nothing() {
        let max = "18446744073709551615";
        assert_eq!(
            compile_for(&format!("{}.0.0", max), UpdateType::Major, SemverMode::Relaxed),
            None
        );
        assert_eq!(
            compile_for(&format!("1.{}.0", max), UpdateType::Minor, SemverMode::Relaxed),
            None
        );
        assert_eq!(
            compile_for(&format!("0.0.{}", max), UpdateType::Patch, SemverMode::Strict),
            None
        );
        // Only the boundary that is needed has to fit
        assert_eq!(
            compile_for(&format!("1.{}.0", max), UpdateType::Major, SemverMode::Relaxed).as_deref(),
            Some(">= 2.a")
        );
    }

    #[test]
    fn test_tag_version_uses_base() {
        let version = VersionScheme::Tag.parse("v2.4.1").unwrap();
        assert_eq!(
            compile(Some(&version), UpdateType::Patch, SemverMode::Relaxed).as_deref(),
            Some("> 2.4.1, < 2.5")
        );
    }

    #[test]
    fn test_update_type_serde() {
        let parsed: UpdateType = serde_json::from_str("\"version-update:semver-minor\"").unwrap();
        assert_eq!(parsed, UpdateType::Minor);
        let parsed: UpdateType = serde_json::from_str("\"semver-patch\"").unwrap();
        assert_eq!(parsed, UpdateType::Patch);
        assert_eq!(UpdateType::Major.to_string(), "semver-major");
    }

    #[test]
    fn test_semver_mode_default_is_relaxed() {
        assert_eq!(SemverMode::default(), SemverMode::Relaxed);
        let parsed: SemverMode = serde_json::from_str("\"strict\"").unwrap();
        assert_eq!(parsed, SemverMode::Strict);
    }
}
