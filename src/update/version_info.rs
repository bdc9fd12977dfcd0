//! Version information from registry
//!
//! This module provides the VersionInfo struct that represents
//! a candidate release with its release date.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A release available from the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct VersionInfo {
    /// The version string (e.g., "1.2.3")
    pub version: String,
    /// When this version was released, if the registry reports it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub released_at: Option<DateTime<Utc>>,
    /// Whether the release was withdrawn
    #[serde(default)]
    pub yanked: bool,
}

impl VersionInfo {
    /// Create a VersionInfo without a release date
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            released_at: None,
            yanked: false,
        }
    }

    /// Create a VersionInfo released at the given time
    pub fn released(version: impl Into<String>, released_at: DateTime<Utc>) -> Self {
        Self::new(version).with_released_at(released_at)
    }

    /// Create a VersionInfo with current time as release date
    pub fn now(version: impl Into<String>) -> Self {
        Self::released(version, Utc::now())
    }

    pub fn with_released_at(mut self, released_at: DateTime<Utc>) -> Self {
        self.released_at = Some(released_at);
        self
    }

    /// Mark the release as yanked
    pub fn yanked(mut self) -> Self {
        self.yanked = true;
        self
    }
}

impl From<&str> for VersionInfo {
    fn from(version: &str) -> Self {
        Self::new(version)
    }
}
