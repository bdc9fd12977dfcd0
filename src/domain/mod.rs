//! Core domain models for depgate
//!
//! This module contains the fundamental types used throughout the application:
//! - Ecosystems and their version schemes and name normalizers
//! - Dependency information structures and their git sources
//! - Update decision results
//! - Summary structures

mod dependency;
mod ecosystem;
mod summary;
mod update_decision;

pub use dependency::{Dependency, GitSource, ManifestRequirement, RequirementSource};
pub use ecosystem::{normalize_identity, normalize_lowercase, normalize_python_name, Ecosystem};
pub use summary::{DependencyFailure, Evaluation, EvaluationSummary};
pub use update_decision::{ExcludedRange, SkipReason, UpdateDecision};
