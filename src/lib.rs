//! depgate - dependency update policy and version resolution library
//!
//! This library decides, for each dependency of a project, whether it
//! should be updated and to which version:
//! - Per-ecosystem version schemes and requirement ranges
//! - Ignore conditions with wildcard names and semver update types
//! - Security advisories and lowest-fix resolution
//! - Git dependencies pinned to tags, branches or commits

pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod git;
pub mod orchestrator;
pub mod output;
pub mod policy;
pub mod progress;
pub mod security;
pub mod update;
pub mod version;
