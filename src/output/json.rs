//! JSON output formatter for machine processing
//!
//! This module provides:
//! - JSON serialization of evaluation results
//! - Structured per-dependency update/skip/failure information

use crate::domain::{EvaluationSummary, ExcludedRange, SkipReason, UpdateDecision};
use crate::output::{OutputFormatter, Verbosity};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;

/// JSON formatter for machine-readable output
pub struct JsonFormatter {
    /// Verbosity level affects detail in output
    verbosity: Verbosity,
}

impl JsonFormatter {
    /// Create a new JSON formatter
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }
}

/// JSON representation of the full result
#[derive(Serialize)]
struct JsonOutput<'a> {
    security_only: bool,
    summary: JsonSummary,
    updates: Vec<JsonUpdate<'a>>,
    /// Omitted in quiet mode
    #[serde(skip_serializing_if = "Vec::is_empty")]
    skips: Vec<JsonSkip<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    failures: Vec<JsonFailure<'a>>,
}

/// JSON representation of summary statistics
#[derive(Serialize)]
struct JsonSummary {
    dependencies: usize,
    updates: usize,
    security_updates: usize,
    skips: usize,
    failures: usize,
}

/// JSON representation of an update
#[derive(Serialize)]
struct JsonUpdate<'a> {
    name: &'a str,
    ecosystem: &'static str,
    /// Current version, absent for unversioned dependencies
    #[serde(skip_serializing_if = "Option::is_none")]
    from: Option<&'a str>,
    to: &'a str,
    security: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    resolved_ref: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    released_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "no_ranges")]
    ignored: &'a [ExcludedRange],
}

/// JSON representation of a skip
#[derive(Serialize)]
struct JsonSkip<'a> {
    name: &'a str,
    ecosystem: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<SkipReason>,
}

/// JSON representation of a failed evaluation
#[derive(Serialize)]
struct JsonFailure<'a> {
    name: &'a str,
    ecosystem: &'static str,
    error: &'a str,
    transient: bool,
}

fn no_ranges(ranges: &&[ExcludedRange]) -> bool {
    ranges.is_empty()
}

impl<'a> JsonUpdate<'a> {
    fn from_decision(decision: &'a UpdateDecision) -> Self {
        Self {
            name: decision.package_name(),
            ecosystem: decision.dependency.ecosystem.as_str(),
            from: decision.dependency.version(),
            to: decision.target_version.as_deref().unwrap_or_default(),
            security: decision.security_update,
            resolved_ref: decision.resolved_ref.as_deref(),
            released_at: decision.released_at,
            ignored: &decision.excluded,
        }
    }
}

impl<'a> JsonSkip<'a> {
    fn from_decision(decision: &'a UpdateDecision) -> Self {
        Self {
            name: decision.package_name(),
            ecosystem: decision.dependency.ecosystem.as_str(),
            version: decision.dependency.version(),
            reason: decision.skip_reason,
        }
    }
}

impl JsonFormatter {
    fn summary_to_json(summary: &EvaluationSummary) -> JsonSummary {
        JsonSummary {
            dependencies: summary.total_dependencies(),
            updates: summary.total_updates(),
            security_updates: summary.total_security_updates(),
            skips: summary.total_skips(),
            failures: summary.total_failures(),
        }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format(&self, summary: &EvaluationSummary, writer: &mut dyn Write) -> std::io::Result<()> {
        let skips = if self.verbosity == Verbosity::Quiet {
            Vec::new()
        } else {
            summary.skips().map(JsonSkip::from_decision).collect()
        };

        let output = JsonOutput {
            security_only: summary.security_only,
            summary: Self::summary_to_json(summary),
            updates: summary.updates().map(JsonUpdate::from_decision).collect(),
            skips,
            failures: summary
                .failures()
                .map(|f| JsonFailure {
                    name: &f.dependency,
                    ecosystem: f.ecosystem.as_str(),
                    error: &f.error,
                    transient: f.transient,
                })
                .collect(),
        };

        let json = serde_json::to_string_pretty(&output).map_err(std::io::Error::other)?;

        writeln!(writer, "{}", json)?;

        Ok(())
    }

    fn format_summary(
        &self,
        summary: &EvaluationSummary,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let output = Self::summary_to_json(summary);

        let json = serde_json::to_string_pretty(&output).map_err(std::io::Error::other)?;

        writeln!(writer, "{}", json)?;

        Ok(())
    }
}
