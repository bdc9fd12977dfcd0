//! CLI argument parsing module for depgate

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;
use crate::policy::SemverMode;
use crate::update::UpdateFilter;

/// Default number of dependencies evaluated at once
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Parse duration string in format: Nd (days), Nw (weeks), Nm (months)
pub fn parse_duration(s: &str) -> Result<Duration, ConfigError> {
    let invalid = || ConfigError::InvalidDuration {
        value: s.to_string(),
    };
    let trimmed = s.trim();

    let (num_str, days_per_unit) = if let Some(n) = trimmed.strip_suffix('d') {
        (n, 1)
    } else if let Some(n) = trimmed.strip_suffix('w') {
        (n, 7)
    } else if let Some(n) = trimmed.strip_suffix('m') {
        (n, 30) // months (30 days)
    } else {
        return Err(invalid());
    };

    let num: u64 = num_str.parse().map_err(|_| invalid())?;
    let seconds = num
        .checked_mul(days_per_unit * 24 * 60 * 60)
        .ok_or_else(invalid)?;

    Ok(Duration::from_secs(seconds))
}

/// Dependency update policy evaluator
#[derive(Parser, Debug, Clone)]
#[command(
    name = "depgate",
    version,
    about = "Decide dependency updates from ignore conditions and security advisories"
)]
pub struct CliArgs {
    /// Job file describing the dependencies to evaluate (.toml or .json)
    pub job_file: PathBuf,

    // General options
    /// Enable verbose output
    #[arg(long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Enable quiet mode - minimal output
    #[arg(short, long)]
    pub quiet: bool,

    // Policy overrides
    /// Only propose updates that fix a known vulnerability
    #[arg(long)]
    pub security_only: bool,

    /// Update vulnerable dependencies to the lowest fixed version
    #[arg(long)]
    pub lowest_fix: bool,

    /// Treat 0.x minor bumps as major when compiling ignored update types
    #[arg(long)]
    pub strict: bool,

    // Age filter
    /// Only update to versions released at least this long ago (e.g., 2w, 10d, 1m)
    #[arg(long, value_parser = parse_duration)]
    pub age: Option<Duration>,

    // Execution
    /// Number of dependencies evaluated concurrently
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Never contact git hosts; git dependencies without listed refs fail
    #[arg(long)]
    pub offline: bool,

    // Output options
    /// Output results in JSON format
    #[arg(long)]
    pub json: bool,
}

impl CliArgs {
    /// Layer the command-line overrides onto the job's filter
    ///
    /// Flags can only switch options on; a job file setting is never
    /// turned off from the command line.
    pub fn apply_to(&self, mut filter: UpdateFilter) -> UpdateFilter {
        if self.security_only {
            filter.security_only = true;
        }
        if self.lowest_fix {
            filter.lowest_fix = true;
        }
        if self.strict {
            filter.semver_mode = SemverMode::Strict;
        }
        if let Some(age) = self.age {
            filter.min_age = Some(age);
        }
        filter
    }
}
