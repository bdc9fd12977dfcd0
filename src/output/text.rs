//! Text output formatter for human-readable display
//!
//! This module provides:
//! - Proposed updates with colors and change type (major/minor/patch)
//! - Security update markers and ignored ranges
//! - Skipped dependencies with reasons (verbose)
//! - Failed dependencies
//! - Summary with detailed breakdown

use crate::domain::{DependencyFailure, EvaluationSummary, SkipReason, UpdateDecision};
use crate::output::{OutputFormatter, Verbosity};
use colored::Colorize;
use std::collections::HashMap;
use std::io::Write;

/// Version change type of a proposed update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionChangeType {
    /// Major version change (breaking)
    Major,
    /// Minor version change (features)
    Minor,
    /// Patch version change (fixes)
    Patch,
    /// Unparseable, e.g. a git commit
    Unknown,
}

impl VersionChangeType {
    /// Determine the change type of a decision using the ecosystem's version scheme
    pub fn of(decision: &UpdateDecision) -> Self {
        let scheme = decision.dependency.scheme();
        let old = decision.dependency.version().map(|v| scheme.parse(v));
        let new = decision.target_version.as_deref().map(|v| scheme.parse(v));

        match (old, new) {
            (Some(Ok(old)), Some(Ok(new))) => {
                let (old_major, old_minor, _) = old.semver_parts();
                let (new_major, new_minor, _) = new.semver_parts();
                if new_major != old_major {
                    VersionChangeType::Major
                } else if new_minor != old_minor {
                    VersionChangeType::Minor
                } else {
                    VersionChangeType::Patch
                }
            }
            _ => VersionChangeType::Unknown,
        }
    }

    /// Get the display label with color
    pub fn colored_label(&self) -> String {
        match self {
            VersionChangeType::Major => "major".red().bold().to_string(),
            VersionChangeType::Minor => "minor".yellow().to_string(),
            VersionChangeType::Patch => "patch".green().to_string(),
            VersionChangeType::Unknown => "?".dimmed().to_string(),
        }
    }

    /// Get the plain label
    pub fn label(&self) -> &'static str {
        match self {
            VersionChangeType::Major => "major",
            VersionChangeType::Minor => "minor",
            VersionChangeType::Patch => "patch",
            VersionChangeType::Unknown => "?",
        }
    }
}

/// Text formatter for human-readable output
pub struct TextFormatter {
    verbosity: Verbosity,
    color: bool,
}

impl TextFormatter {
    /// Create a new text formatter
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            color: true,
        }
    }

    /// Create a new text formatter with color option
    pub fn with_color(verbosity: Verbosity, color: bool) -> Self {
        Self { verbosity, color }
    }

    fn heading(&self, title: &str, count: usize, writer: &mut dyn Write) -> std::io::Result<()> {
        if self.color {
            writeln!(writer, "{} ({})", title.bold(), count)
        } else {
            writeln!(writer, "{} ({})", title, count)
        }
    }

    /// Calculate the name column width for alignment
    fn name_width<'a>(names: impl Iterator<Item = &'a str>) -> usize {
        names.map(str::len).max().unwrap_or(0).max(20)
    }

    /// Format a single update line, plus its ignored ranges in verbose mode
    fn format_update_line(
        &self,
        decision: &UpdateDecision,
        width: usize,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let name = decision.package_name();
        let old_version = decision.dependency.version().unwrap_or("unknown");
        let new_version = decision.target_version.as_deref().unwrap_or_default();
        let change_type = VersionChangeType::of(decision);

        let date = decision
            .released_at
            .map(|d| format!(" ({})", d.format("%Y/%m/%d %H:%M")))
            .unwrap_or_default();
        let git_ref = decision
            .resolved_ref
            .as_deref()
            .filter(|r| *r != new_version)
            .map(|r| format!(" @ {}", r))
            .unwrap_or_default();

        if self.color {
            let security = if decision.security_update {
                format!(" {}", "security".red().bold())
            } else {
                String::new()
            };
            writeln!(
                writer,
                "  {} {} {} {}{} [{}]{}{}",
                format!("{:width$}", name, width = width),
                old_version.dimmed(),
                "→".dimmed(),
                new_version.bright_white().bold(),
                git_ref.cyan(),
                change_type.colored_label(),
                security,
                date.dimmed()
            )?;
        } else {
            let security = if decision.security_update {
                " security"
            } else {
                ""
            };
            writeln!(
                writer,
                "  {:width$} {} -> {}{} [{}]{}{}",
                name,
                old_version,
                new_version,
                git_ref,
                change_type.label(),
                security,
                date,
                width = width
            )?;
        }

        if self.verbosity == Verbosity::Verbose {
            for excluded in &decision.excluded {
                let line = format!(
                    "  {:width$}   ignored {} ({})",
                    "",
                    excluded.range,
                    excluded.condition,
                    width = width
                );
                if self.color {
                    writeln!(writer, "{}", line.dimmed())?;
                } else {
                    writeln!(writer, "{}", line)?;
                }
            }
        }

        Ok(())
    }

    /// Format a single skip line
    fn format_skip_line(
        &self,
        decision: &UpdateDecision,
        width: usize,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let reason = decision
            .skip_reason
            .map(|r| r.to_string())
            .unwrap_or_else(|| "skipped".to_string());
        let line = format!(
            "  {:width$} ({})",
            decision.package_name(),
            reason,
            width = width
        );

        if self.color {
            writeln!(writer, "{}", line.dimmed())
        } else {
            writeln!(writer, "{}", line)
        }
    }

    fn format_failure_line(
        &self,
        failure: &DependencyFailure,
        width: usize,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let transient = if failure.transient { " (transient)" } else { "" };

        if self.color {
            writeln!(
                writer,
                "  {} {} {}{}",
                "✗".red(),
                format!("{:width$}", failure.dependency, width = width),
                failure.error,
                transient.dimmed()
            )
        } else {
            writeln!(
                writer,
                "  - {:width$} {}{}",
                failure.dependency,
                failure.error,
                transient,
                width = width
            )
        }
    }

    /// Count updates by change type
    fn count_by_change_type(summary: &EvaluationSummary) -> (usize, usize, usize, usize) {
        let mut major = 0;
        let mut minor = 0;
        let mut patch = 0;
        let mut unknown = 0;

        for decision in summary.updates() {
            match VersionChangeType::of(decision) {
                VersionChangeType::Major => major += 1,
                VersionChangeType::Minor => minor += 1,
                VersionChangeType::Patch => patch += 1,
                VersionChangeType::Unknown => unknown += 1,
            }
        }

        (major, minor, patch, unknown)
    }

    /// Count skips by reason, most frequent first
    fn count_by_skip_reason(summary: &EvaluationSummary) -> Vec<(SkipReason, usize)> {
        let mut counts: HashMap<SkipReason, usize> = HashMap::new();
        for reason in summary.skips().filter_map(|d| d.skip_reason) {
            *counts.entry(reason).or_insert(0) += 1;
        }

        let mut result: Vec<_> = counts.into_iter().collect();
        result.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.to_string().cmp(&b.0.to_string())));
        result
    }
}

impl OutputFormatter for TextFormatter {
    fn format(&self, summary: &EvaluationSummary, writer: &mut dyn Write) -> std::io::Result<()> {
        // In quiet mode, only show summary
        if self.verbosity == Verbosity::Quiet {
            return self.format_summary(summary, writer);
        }

        let updates: Vec<_> = summary.updates().collect();
        if !updates.is_empty() {
            let width = Self::name_width(updates.iter().map(|d| d.package_name()));
            self.heading("Updates", updates.len(), writer)?;
            for decision in &updates {
                self.format_update_line(decision, width, writer)?;
            }
            writeln!(writer)?;
        }

        let skips: Vec<_> = summary.skips().collect();
        if self.verbosity == Verbosity::Verbose && !skips.is_empty() {
            let width = Self::name_width(skips.iter().map(|d| d.package_name()));
            self.heading("Skipped", skips.len(), writer)?;
            for decision in &skips {
                self.format_skip_line(decision, width, writer)?;
            }
            writeln!(writer)?;
        }

        let failures: Vec<_> = summary.failures().collect();
        if !failures.is_empty() {
            let width = Self::name_width(failures.iter().map(|f| f.dependency.as_str()));
            if self.color {
                writeln!(writer, "{} ({})", "Errors".red().bold(), failures.len())?;
            } else {
                writeln!(writer, "Errors ({})", failures.len())?;
            }
            for failure in &failures {
                self.format_failure_line(failure, width, writer)?;
            }
            writeln!(writer)?;
        }

        self.format_summary(summary, writer)
    }

    fn format_summary(
        &self,
        summary: &EvaluationSummary,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let updates = summary.total_updates();
        let skips = summary.total_skips();
        let failures = summary.total_failures();

        if self.verbosity == Verbosity::Quiet {
            let mut line = if updates > 0 {
                format!("{} update(s)", updates)
            } else {
                "No updates".to_string()
            };
            if failures > 0 {
                line.push_str(&format!(", {} failed", failures));
            }
            return writeln!(writer, "{}", line);
        }

        let (major, minor, patch, unknown) = Self::count_by_change_type(summary);
        let mut parts = Vec::new();
        if major > 0 {
            parts.push(format!("{} major", major));
        }
        if minor > 0 {
            parts.push(format!("{} minor", minor));
        }
        if patch > 0 {
            parts.push(format!("{} patch", patch));
        }
        if unknown > 0 {
            parts.push(format!("{} other", unknown));
        }
        let security = summary.total_security_updates();
        if security > 0 {
            parts.push(format!("{} security", security));
        }

        let title = if summary.security_only {
            "Summary (security updates only)"
        } else {
            "Summary"
        };
        if self.color {
            writeln!(writer, "{}:", title.bold())?;
        } else {
            writeln!(writer, "{}:", title)?;
        }

        if updates > 0 {
            let count = if self.color {
                updates.to_string().green().to_string()
            } else {
                updates.to_string()
            };
            writeln!(
                writer,
                "  {} update(s) proposed ({})",
                count,
                parts.join(", ")
            )?;
        } else {
            writeln!(writer, "  No updates proposed")?;
        }

        write!(writer, "  {} dependency(ies) skipped", skips)?;
        if self.verbosity == Verbosity::Verbose {
            let by_reason = Self::count_by_skip_reason(summary);
            if !by_reason.is_empty() {
                let parts: Vec<_> = by_reason
                    .iter()
                    .map(|(reason, count)| format!("{} {}", count, reason))
                    .collect();
                write!(writer, " ({})", parts.join(", "))?;
            }
        }
        writeln!(writer)?;

        if failures > 0 {
            let count = if self.color {
                failures.to_string().red().to_string()
            } else {
                failures.to_string()
            };
            writeln!(writer, "  {} dependency(ies) failed", count)?;
        }

        Ok(())
    }
}
