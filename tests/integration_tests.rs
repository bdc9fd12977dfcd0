//! Integration tests for depgate
//!
//! These tests exercise the library end to end without spawning the binary:
//! - Job files parsed into a job and evaluated by the orchestrator
//! - Ignore conditions, security advisories and git refs together
//! - Per-dependency failures alongside successful decisions

use depgate::config::{Job, JobFormat};
use depgate::domain::{Dependency, Ecosystem, SkipReason, UpdateDecision};
use depgate::orchestrator::Orchestrator;
use depgate::policy::{IgnoreCondition, SemverMode, UpdatePolicy, UpdateType};
use depgate::security::SecurityAdvisory;
use depgate::update::{UpdateChecker, UpdateFilter, VersionInfo};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const NPM_JOB: &str = r#"
package-ecosystem = "npm_and_yarn"

[[ignore-conditions]]
dependency-name = "@types/*"
update-types = ["version-update:semver-major"]

[[security-advisories]]
dependency-name = "lodash"
affected-versions = ["< 4.17.19"]
patched-versions = [">= 4.17.19"]

[[dependencies]]
name = "@types/node"
version = "12.12.6"
available-versions = ["12.20.0", "13.1.0"]

[[dependencies]]
name = "lodash"
version = "4.17.15"
available-versions = ["4.17.19", "4.17.20", "4.17.21"]

[[dependencies]]
name = "express"
version = "4.18.2"
available-versions = ["4.17.1", "4.18.2"]
"#;

fn parse_toml(content: &str) -> Job {
    Job::parse(content, JobFormat::Toml, Path::new("job.toml")).unwrap()
}

fn decision<'a>(decisions: &[&'a UpdateDecision], name: &str) -> &'a UpdateDecision {
    decisions
        .iter()
        .find(|d| d.package_name() == name)
        .copied()
        .unwrap()
}

mod job_evaluation {
    use super::*;

    #[tokio::test]
    async fn test_evaluate_npm_job() {
        let mut job = parse_toml(NPM_JOB);
        let dependencies = std::mem::take(&mut job.dependencies);

        let summary = Orchestrator::for_job(&job)
            .evaluate_all(dependencies)
            .await;
        let decisions: Vec<_> = summary.decisions().collect();

        let types_node = decision(&decisions, "@types/node");
        assert_eq!(types_node.target_version.as_deref(), Some("12.20.0"));
        assert_eq!(types_node.excluded[0].range, ">= 13.a");
        assert_eq!(types_node.excluded[0].condition, "@types/*");

        let lodash = decision(&decisions, "lodash");
        assert_eq!(lodash.target_version.as_deref(), Some("4.17.21"));
        assert!(lodash.security_update);

        let express = decision(&decisions, "express");
        assert_eq!(express.skip_reason, Some(SkipReason::AlreadyLatest));

        assert_eq!(summary.total_updates(), 2);
        assert_eq!(summary.total_security_updates(), 1);
        assert!(!summary.has_failures());
    }

    #[tokio::test]
    async fn test_evaluate_security_only_job() {
        let content = format!("security-updates-only = true\n{}", NPM_JOB);
        let mut job = parse_toml(&content);
        let dependencies = std::mem::take(&mut job.dependencies);

        let summary = Orchestrator::for_job(&job)
            .evaluate_all(dependencies)
            .await;
        let decisions: Vec<_> = summary.decisions().collect();

        assert!(summary.security_only);
        assert_eq!(
            decision(&decisions, "@types/node").skip_reason,
            Some(SkipReason::NotVulnerable)
        );
        assert_eq!(
            decision(&decisions, "express").skip_reason,
            Some(SkipReason::NotVulnerable)
        );

        // Security-only runs move to the lowest fixed version
        let lodash = decision(&decisions, "lodash");
        assert_eq!(lodash.target_version.as_deref(), Some("4.17.19"));
        assert!(lodash.security_update);
    }

    #[tokio::test]
    async fn test_git_dependency_from_listed_refs() {
        let job = parse_toml(
            r#"
package-ecosystem = "bundler"

[[dependencies]]
name = "business"
version = "df9f605d7111b6814fe493cf8f41de3f9f0b1ac5"

[[dependencies.requirements]]
file = "Gemfile"
source = { type = "git", url = "https://github.com/gocardless/business", ref = "v1.0.0" }

[dependencies.git-refs]
tags = [
    { name = "v1.0.0", commit-sha = "df9f605d7111b6814fe493cf8f41de3f9f0b1ac5" },
    { name = "v1.1.0", commit-sha = "7bb4e41ce5164074a0920d5b5770d196b4d90104" },
]
"#,
        );

        let summary = Orchestrator::for_job(&job)
            .with_offline(true)
            .evaluate_all(job.dependencies.clone())
            .await;

        let update = summary.updates().next().unwrap();
        assert_eq!(update.package_name(), "business");
        assert_eq!(update.target_version.as_deref(), Some("1.1.0"));
        assert_eq!(update.resolved_ref.as_deref(), Some("v1.1.0"));
    }

    #[tokio::test]
    async fn test_malformed_condition_fails_only_its_dependency() {
        let job = parse_toml(
            r#"
package-ecosystem = "cargo"

[[ignore-conditions]]
dependency-name = "serde"
versions = [">= banana!"]

[[dependencies]]
name = "serde"
version = "1.0.100"
available-versions = ["1.0.200"]

[[dependencies]]
name = "tokio"
version = "1.0.0"
available-versions = ["1.49.0"]
"#,
        );

        let summary = Orchestrator::for_job(&job)
            .evaluate_all(job.dependencies.clone())
            .await;

        assert_eq!(summary.total_failures(), 1);
        assert_eq!(summary.failures().next().unwrap().dependency, "serde");
        assert_eq!(
            summary.updates().next().unwrap().target_version.as_deref(),
            Some("1.49.0")
        );
    }

    #[test]
    fn test_load_json_job_from_disk() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("job.json");
        fs::write(
            &path,
            r#"{
  "package-ecosystem": "pip",
  "dependencies": [
    { "name": "requests", "version": "2.28.0", "available-versions": ["2.31.0"] }
  ]
}"#,
        )
        .unwrap();

        let job = Job::load(&path).unwrap();
        assert_eq!(job.ecosystem, Ecosystem::Pip);
        assert_eq!(job.dependencies.len(), 1);
        assert_eq!(job.dependencies[0].dependency.name, "requests");
    }
}

mod policy_evaluation {
    use super::*;

    #[test]
    fn test_python_names_are_normalized() {
        let policy = UpdatePolicy::new(vec![
            IgnoreCondition::new("Requests").with_versions([">= 2.30"])
        ]);
        let dependency = Dependency::new("requests", Some("2.28.0"), Ecosystem::Pip);
        let versions = vec![VersionInfo::new("2.29.0"), VersionInfo::new("2.31.0")];

        let decision = UpdateChecker::new(UpdateFilter::new())
            .check(&dependency, &versions, &policy, &[])
            .unwrap();

        assert_eq!(decision.target_version.as_deref(), Some("2.29.0"));
    }

    #[test]
    fn test_strict_mode_treats_zero_minor_as_major() {
        let policy = UpdatePolicy::new(vec![
            IgnoreCondition::new("*").with_update_types(vec![UpdateType::Major])
        ]);
        let dependency = Dependency::new("rand", Some("0.7.3"), Ecosystem::Cargo);
        let versions = vec![VersionInfo::new("0.7.4"), VersionInfo::new("0.8.5")];

        let relaxed = UpdateChecker::new(UpdateFilter::new())
            .check(&dependency, &versions, &policy, &[])
            .unwrap();
        let strict = UpdateChecker::new(UpdateFilter::new().with_semver_mode(SemverMode::Strict))
            .check(&dependency, &versions, &policy, &[])
            .unwrap();

        assert_eq!(relaxed.target_version.as_deref(), Some("0.8.5"));
        assert_eq!(strict.target_version.as_deref(), Some("0.7.4"));
    }

    #[test]
    fn test_advisory_for_other_dependency_is_ignored() {
        let advisories = vec![SecurityAdvisory::new(
            "lodash",
            Ecosystem::NpmAndYarn,
            &["< 4.17.19"],
            &[">= 4.17.19"],
        )
        .unwrap()];
        let dependency = Dependency::new("express", Some("4.17.1"), Ecosystem::NpmAndYarn);
        let versions = vec![VersionInfo::new("4.18.2")];

        let decision = UpdateChecker::new(UpdateFilter::new().with_security_only(true))
            .check(&dependency, &versions, &UpdatePolicy::default(), &advisories)
            .unwrap();

        assert_eq!(decision.skip_reason, Some(SkipReason::NotVulnerable));
    }
}
