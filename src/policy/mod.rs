//! Update policy: which versions of a dependency may not be proposed
//!
//! This module provides:
//! - `wildcard`: case-insensitive name patterns
//! - `semver_range`: ranges derived from update types
//! - `IgnoreCondition`: a single configured skip rule
//! - `UpdatePolicy`: all skip rules of a job, merged per dependency

mod ignore;
pub mod semver_range;
pub mod wildcard;

pub use ignore::{IgnoreCondition, ALL_VERSIONS};
pub use semver_range::{SemverMode, UpdateType};

use tracing::info;

use crate::domain::{Dependency, ExcludedRange};
use crate::error::PolicyError;
use crate::version::Requirement;

/// The skip rules of one job
#[derive(Debug, Clone, Default)]
pub struct UpdatePolicy {
    conditions: Vec<IgnoreCondition>,
}

impl UpdatePolicy {
    /// Create a policy from conditions in configuration order
    pub fn new(conditions: Vec<IgnoreCondition>) -> Self {
        Self { conditions }
    }

    pub fn conditions(&self) -> &[IgnoreCondition] {
        &self.conditions
    }

    /// Ranges ignored for the dependency, deduplicated in condition order
    pub fn ignored_versions_for(
        &self,
        dependency: &Dependency,
        security_only: bool,
        semver_mode: SemverMode,
    ) -> Vec<String> {
        self.excluded_ranges(dependency, security_only, semver_mode)
            .into_iter()
            .map(|excluded| excluded.range)
            .collect()
    }

    /// Like [`ignored_versions_for`](Self::ignored_versions_for), keeping the
    /// pattern of the condition that produced each range
    pub fn excluded_ranges(
        &self,
        dependency: &Dependency,
        security_only: bool,
        semver_mode: SemverMode,
    ) -> Vec<ExcludedRange> {
        let mut excluded: Vec<ExcludedRange> = Vec::new();

        for condition in self.conditions.iter().filter(|c| c.applies_to(dependency)) {
            for range in condition.ignored_ranges(dependency, security_only, semver_mode) {
                if excluded.iter().all(|e| e.range != range) {
                    excluded.push(ExcludedRange::new(range, &condition.dependency_name));
                }
            }
        }

        if !excluded.is_empty() {
            info!(
                dependency = %dependency.name,
                ranges = ?excluded.iter().map(|e| e.range.as_str()).collect::<Vec<_>>(),
                "ignored version ranges"
            );
        }

        excluded
    }

    /// Parse excluded ranges with the dependency's version scheme
    ///
    /// A malformed range is a configuration error and is returned as such.
    pub fn ignored_requirements(
        &self,
        dependency: &Dependency,
        security_only: bool,
        semver_mode: SemverMode,
    ) -> Result<Vec<(ExcludedRange, Requirement)>, PolicyError> {
        let scheme = dependency.scheme();
        self.excluded_ranges(dependency, security_only, semver_mode)
            .into_iter()
            .map(|excluded| {
                let requirement = Requirement::parse(scheme, &excluded.range)?;
                Ok((excluded, requirement))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Ecosystem;

    fn types_node() -> Dependency {
        Dependency::new("@types/node", Some("12.12.6"), Ecosystem::NpmAndYarn)
    }

    #[test]
    fn test_merges_matching_conditions_in_order() {
        let policy = UpdatePolicy::new(vec![
            IgnoreCondition::new("@types/*").with_update_types(vec![UpdateType::Major]),
            IgnoreCondition::new("@types/node").with_update_types(vec![UpdateType::Minor]),
            IgnoreCondition::new("react").with_update_types(vec![UpdateType::Patch]),
        ]);

        assert_eq!(
            policy.ignored_versions_for(&types_node(), false, SemverMode::Relaxed),
            vec![">= 13.a", ">= 12.13.a, < 13"]
        );
    }

    #[test]
    fn test_duplicate_ranges_keep_first_condition() {
        let policy = UpdatePolicy::new(vec![
            IgnoreCondition::new("@types/*").with_update_types(vec![UpdateType::Major]),
            IgnoreCondition::new("@types/node").with_update_types(vec![UpdateType::Major]),
        ]);

        let excluded = policy.excluded_ranges(&types_node(), false, SemverMode::Relaxed);
        assert_eq!(excluded.len(), 1);
        assert_eq!(excluded[0].range, ">= 13.a");
        assert_eq!(excluded[0].condition, "@types/*");
    }

    #[test]
    fn test_security_only_ignores_update_types() {
        let policy = UpdatePolicy::new(vec![
            IgnoreCondition::new("@types/*").with_update_types(vec![UpdateType::Major]),
            IgnoreCondition::new("@types/node").with_update_types(vec![UpdateType::Minor]),
        ]);
        assert!(policy
            .ignored_versions_for(&types_node(), true, SemverMode::Relaxed)
            .is_empty());
    }

    #[test]
    fn test_no_matching_conditions() {
        let policy = UpdatePolicy::new(vec![IgnoreCondition::new("react")]);
        assert!(policy
            .ignored_versions_for(&types_node(), false, SemverMode::Relaxed)
            .is_empty());
        assert!(UpdatePolicy::default()
            .ignored_versions_for(&types_node(), false, SemverMode::Relaxed)
            .is_empty());
    }

    #[test]
    fn test_unknown_version_does_not_fail() {
        let policy = UpdatePolicy::new(vec![
            IgnoreCondition::new("business").with_update_types(vec![UpdateType::Patch]),
            IgnoreCondition::new("business").with_versions(["> 2.0"]),
        ]);
        let dep = Dependency::new("business", None, Ecosystem::Bundler);
        assert_eq!(
            policy.ignored_versions_for(&dep, false, SemverMode::Relaxed),
            vec!["> 2.0"]
        );
    }

    #[test]
    fn test_huge_version_component_drops_only_its_range() {
        let policy = UpdatePolicy::new(vec![IgnoreCondition::new("business")
            .with_update_types(vec![UpdateType::Minor, UpdateType::Major])]);
        let dep = Dependency::new("business", Some("1.18446744073709551615.0"), Ecosystem::Bundler);
        assert_eq!(
            policy.ignored_versions_for(&dep, false, SemverMode::Relaxed),
            vec![">= 2.a"]
        );
    }

    #[test]
    fn test_ignored_requirements_parse_with_scheme() {
        let policy = UpdatePolicy::new(vec![
            IgnoreCondition::new("@types/node").with_update_types(vec![UpdateType::Minor])
        ]);
        let parsed = policy
            .ignored_requirements(&types_node(), false, SemverMode::Relaxed)
            .unwrap();
        let scheme = Ecosystem::NpmAndYarn.version_scheme();
        let (_, requirement) = &parsed[0];
        assert!(requirement.satisfied_by(&scheme.parse("12.13.0").unwrap()));
        assert!(!requirement.satisfied_by(&scheme.parse("13.0.0").unwrap()));
    }

    #[test]
    fn test_ignored_requirements_rejects_malformed_range() {
        let policy =
            UpdatePolicy::new(vec![IgnoreCondition::new("@types/node").with_versions([">= nope"])]);
        assert!(matches!(
            policy.ignored_requirements(&types_node(), false, SemverMode::Relaxed),
            Err(PolicyError::InvalidRequirement { .. })
        ));
    }
}
