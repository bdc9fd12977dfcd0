//! Evaluation summary types
//!
//! Provides structures for collecting per-dependency outcomes of a job.

use super::{Ecosystem, UpdateDecision};
use serde::Serialize;

/// A dependency whose evaluation failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyFailure {
    pub dependency: String,
    pub ecosystem: Ecosystem,
    pub error: String,
    /// Whether a retry could succeed
    pub transient: bool,
}

impl DependencyFailure {
    pub fn new(
        dependency: impl Into<String>,
        ecosystem: Ecosystem,
        error: impl Into<String>,
        transient: bool,
    ) -> Self {
        Self {
            dependency: dependency.into(),
            ecosystem,
            error: error.into(),
            transient,
        }
    }
}

/// Outcome of evaluating one dependency
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Evaluation {
    Decided(UpdateDecision),
    Failed(DependencyFailure),
}

impl Evaluation {
    /// Returns the dependency name
    pub fn package_name(&self) -> &str {
        match self {
            Evaluation::Decided(decision) => decision.package_name(),
            Evaluation::Failed(failure) => &failure.dependency,
        }
    }
}

/// All outcomes of one job, in input order
#[derive(Debug, Clone, Default, Serialize)]
pub struct EvaluationSummary {
    pub evaluations: Vec<Evaluation>,
    /// Whether the job ran in security-only mode
    pub security_only: bool,
}

impl EvaluationSummary {
    /// Creates a new EvaluationSummary
    pub fn new(security_only: bool) -> Self {
        Self {
            evaluations: Vec::new(),
            security_only,
        }
    }

    pub fn add(&mut self, evaluation: Evaluation) {
        self.evaluations.push(evaluation);
    }

    /// Returns all decisions, updates and skips alike
    pub fn decisions(&self) -> impl Iterator<Item = &UpdateDecision> {
        self.evaluations.iter().filter_map(|e| match e {
            Evaluation::Decided(decision) => Some(decision),
            Evaluation::Failed(_) => None,
        })
    }

    /// Returns all proposed updates
    pub fn updates(&self) -> impl Iterator<Item = &UpdateDecision> {
        self.decisions().filter(|d| d.is_update())
    }

    /// Returns all skips
    pub fn skips(&self) -> impl Iterator<Item = &UpdateDecision> {
        self.decisions().filter(|d| d.is_skip())
    }

    /// Returns all failures
    pub fn failures(&self) -> impl Iterator<Item = &DependencyFailure> {
        self.evaluations.iter().filter_map(|e| match e {
            Evaluation::Failed(failure) => Some(failure),
            Evaluation::Decided(_) => None,
        })
    }

    pub fn total_dependencies(&self) -> usize {
        self.evaluations.len()
    }

    pub fn total_updates(&self) -> usize {
        self.updates().count()
    }

    pub fn total_security_updates(&self) -> usize {
        self.updates().filter(|d| d.security_update).count()
    }

    pub fn total_skips(&self) -> usize {
        self.skips().count()
    }

    pub fn total_failures(&self) -> usize {
        self.failures().count()
    }

    /// Returns true if any dependency failed
    pub fn has_failures(&self) -> bool {
        self.total_failures() > 0
    }
}
