//! Batch orchestrator for evaluating every dependency of a job
//!
//! This module provides:
//! - One tokio task per dependency, bounded by a semaphore
//! - Git ref lookups from the job file or over HTTP
//! - Per-dependency error collection with partial continuation
//! - Results in input order

use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::cli::DEFAULT_CONCURRENCY;
use crate::config::{DependencyJob, Job};
use crate::domain::{DependencyFailure, Evaluation, EvaluationSummary, UpdateDecision};
use crate::error::PolicyError;
use crate::git::HttpRefSource;
use crate::policy::UpdatePolicy;
use crate::progress::Progress;
use crate::security::SecurityAdvisory;
use crate::update::{UpdateChecker, UpdateFilter};

/// State shared by all evaluation tasks
struct Shared {
    checker: UpdateChecker,
    policy: UpdatePolicy,
    advisories: Vec<SecurityAdvisory>,
}

/// Evaluates the dependencies of a job concurrently
pub struct Orchestrator {
    shared: Arc<Shared>,
    /// Semaphore for concurrency control
    semaphore: Arc<Semaphore>,
    offline: bool,
    show_progress: bool,
}

impl Orchestrator {
    /// Create a new orchestrator
    pub fn new(
        filter: UpdateFilter,
        policy: UpdatePolicy,
        advisories: Vec<SecurityAdvisory>,
    ) -> Self {
        Self::with_checker(UpdateChecker::new(filter), policy, advisories)
    }

    /// Create an orchestrator with a prepared checker (for testing)
    pub fn with_checker(
        checker: UpdateChecker,
        policy: UpdatePolicy,
        advisories: Vec<SecurityAdvisory>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                checker,
                policy,
                advisories,
            }),
            semaphore: Arc::new(Semaphore::new(DEFAULT_CONCURRENCY)),
            offline: false,
            show_progress: false,
        }
    }

    /// Create an orchestrator for a loaded job, leaving its dependencies to the caller
    pub fn for_job(job: &Job) -> Self {
        Self::new(job.filter.clone(), job.policy.clone(), job.advisories.clone())
    }

    /// Set the number of dependencies evaluated at once (at least one)
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
        self
    }

    /// Never fetch refs over HTTP
    pub fn with_offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// Show a progress bar on stderr
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Evaluate every dependency
    ///
    /// A failing dependency is recorded and never stops the others.
    pub async fn evaluate_all(&self, jobs: Vec<DependencyJob>) -> EvaluationSummary {
        let mut progress = Progress::new(self.show_progress);
        let mut summary = EvaluationSummary::new(self.shared.checker.filter().security_only);

        progress.start(jobs.len() as u64, "Evaluating dependencies");

        let handles: Vec<_> = jobs
            .into_iter()
            .map(|job| {
                let name = job.dependency.name.clone();
                let ecosystem = job.dependency.ecosystem;
                let shared = Arc::clone(&self.shared);
                let semaphore = Arc::clone(&self.semaphore);
                let offline = self.offline;

                let handle = tokio::spawn(async move {
                    let _permit = semaphore.acquire_owned().await.ok();
                    shared.evaluate(job, offline).await
                });
                (name, ecosystem, handle)
            })
            .collect();

        for (name, ecosystem, handle) in handles {
            let evaluation = match handle.await {
                Ok(Ok(decision)) => {
                    debug!(dependency = %name, decision = %decision, "evaluated");
                    Evaluation::Decided(decision)
                }
                Ok(Err(e)) => {
                    warn!(dependency = %name, error = %e, "dependency evaluation failed");
                    Evaluation::Failed(DependencyFailure::new(
                        &name,
                        ecosystem,
                        e.to_string(),
                        e.is_transient(),
                    ))
                }
                Err(e) => {
                    warn!(dependency = %name, error = %e, "evaluation task aborted");
                    Evaluation::Failed(DependencyFailure::new(
                        &name,
                        ecosystem,
                        format!("evaluation task aborted: {}", e),
                        false,
                    ))
                }
            };
            progress.set_message(&name);
            progress.inc();
            summary.add(evaluation);
        }

        progress.finish_and_clear();
        summary
    }
}

impl Shared {
    async fn evaluate(
        &self,
        job: DependencyJob,
        offline: bool,
    ) -> Result<UpdateDecision, PolicyError> {
        let dependency = &job.dependency;

        let Some(git_source) = dependency.git_source()? else {
            return self.checker.check(
                dependency,
                &job.available_versions,
                &self.policy,
                &self.advisories,
            );
        };

        match &job.git_refs {
            Some(refs) => self.checker.check_git(dependency, refs, &self.policy).await,
            None if offline => Err(PolicyError::git_host_unreachable(
                git_source.url,
                "offline mode and no refs listed in the job file",
            )),
            None => {
                let source = HttpRefSource::new(&git_source.url)?;
                self.checker
                    .check_git(dependency, &source, &self.policy)
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Dependency, Ecosystem, ManifestRequirement, RequirementSource, SkipReason,
    };
    use crate::git::{GitRef, RefListing};
    use crate::policy::{IgnoreCondition, UpdateType};
    use crate::update::VersionInfo;

    fn registry_job(name: &str, version: &str, available: &[&str]) -> DependencyJob {
        DependencyJob::new(
            Dependency::new(name, Some(version), Ecosystem::NpmAndYarn),
            available.iter().map(|v| VersionInfo::new(*v)).collect(),
        )
    }

    const SHA_OLD: &str = "df9f605d7111b6814fe493cf8f41de3f9f0b1ac5";

    fn git_job(git_ref: &str) -> DependencyJob {
        let dependency = Dependency::new("business", Some(SHA_OLD), Ecosystem::Bundler)
            .with_requirement(ManifestRequirement::new("Gemfile").with_source(
                RequirementSource::git("https://github.com/gocardless/business").with_ref(git_ref),
            ));
        DependencyJob::new(dependency, Vec::new())
    }

    fn orchestrator() -> Orchestrator {
        Orchestrator::new(UpdateFilter::new(), UpdatePolicy::default(), Vec::new())
    }

    #[tokio::test]
    async fn test_evaluate_all_preserves_order() {
        let jobs = vec![
            registry_job("a", "1.0.0", &["1.1.0"]),
            registry_job("b", "2.0.0", &["2.0.0"]),
            registry_job("c", "0.1.0", &[]),
        ];

        let summary = orchestrator().with_concurrency(2).evaluate_all(jobs).await;
        let names: Vec<&str> = summary.evaluations.iter().map(|e| e.package_name()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(summary.total_updates(), 1);
        assert_eq!(summary.total_skips(), 2);
        assert!(!summary.has_failures());
    }

    #[tokio::test]
    async fn test_evaluate_all_empty() {
        let summary = orchestrator().evaluate_all(Vec::new()).await;
        assert_eq!(summary.total_dependencies(), 0);
    }

    #[tokio::test]
    async fn test_zero_concurrency_still_runs() {
        let summary = orchestrator()
            .with_concurrency(0)
            .evaluate_all(vec![registry_job("a", "1.0.0", &["1.0.1"])])
            .await;
        assert_eq!(summary.total_updates(), 1);
    }

    #[tokio::test]
    async fn test_failure_does_not_abort_batch() {
        let policy = UpdatePolicy::new(vec![
            IgnoreCondition::new("bad").with_versions(vec![">= banana!".to_string()])
        ]);
        let jobs = vec![
            registry_job("bad", "1.0.0", &["1.1.0"]),
            registry_job("good", "1.0.0", &["1.1.0"]),
        ];

        let summary = Orchestrator::new(UpdateFilter::new(), policy, Vec::new())
            .evaluate_all(jobs)
            .await;

        assert_eq!(summary.total_failures(), 1);
        assert_eq!(summary.total_updates(), 1);
        let failure = summary.failures().next().unwrap();
        assert_eq!(failure.dependency, "bad");
        assert!(!failure.transient);
    }

    #[tokio::test]
    async fn test_offline_git_without_refs_fails() {
        let summary = orchestrator()
            .with_offline(true)
            .evaluate_all(vec![git_job("v1.0.0")])
            .await;

        let failure = summary.failures().next().unwrap();
        assert!(failure.transient);
        assert!(failure.error.contains("offline"));
    }

    #[tokio::test]
    async fn test_git_with_listed_refs() {
        let refs = RefListing::new(
            vec![
                GitRef::new("v1.0.0", SHA_OLD),
                GitRef::new("v1.1.0", "7bb4e41ce5164074a0920d5b5770d196b4d90104"),
            ],
            Vec::new(),
        );
        let job = git_job("v1.0.0").with_git_refs(refs);

        let summary = orchestrator().with_offline(true).evaluate_all(vec![job]).await;
        let decision = summary.updates().next().unwrap();
        assert_eq!(decision.resolved_ref.as_deref(), Some("v1.1.0"));
    }

    #[tokio::test]
    async fn test_policy_applies_to_every_job() {
        let policy = UpdatePolicy::new(vec![
            IgnoreCondition::new("*").with_update_types(vec![UpdateType::Major])
        ]);
        let jobs = vec![
            registry_job("a", "1.0.0", &["2.0.0"]),
            registry_job("b", "1.0.0", &["1.2.0", "2.0.0"]),
        ];

        let summary = Orchestrator::new(UpdateFilter::new(), policy, Vec::new())
            .evaluate_all(jobs)
            .await;

        let decisions: Vec<&UpdateDecision> = summary.decisions().collect();
        assert_eq!(decisions[0].skip_reason, Some(SkipReason::AllVersionsIgnored));
        assert_eq!(decisions[1].target_version.as_deref(), Some("1.2.0"));
    }
}
