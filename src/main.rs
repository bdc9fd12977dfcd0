//! depgate - dependency update policy CLI tool
//!
//! Reads a job file listing dependencies, their candidate versions,
//! ignore conditions and security advisories, then reports which
//! version (or git ref) each dependency should move to.

use clap::Parser;
use depgate::cli::CliArgs;
use depgate::config::Job;
use depgate::error::AppError;
use depgate::orchestrator::Orchestrator;
use depgate::output::{create_formatter, OutputConfig};
use std::io::{self, Write};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();
    init_tracing(&args);

    // Run the main logic and handle errors
    match run(args).await {
        Ok(exit_code) => exit_code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr; `RUST_LOG` overrides the level picked from the flags
fn init_tracing(args: &CliArgs) {
    let default_level = if args.verbose {
        "depgate=debug"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Load the job file named on the command line
fn load_job(args: &CliArgs) -> Result<Job, AppError> {
    Ok(Job::load(&args.job_file)?)
}

/// Main application logic
async fn run(args: CliArgs) -> anyhow::Result<ExitCode> {
    let job = load_job(&args)?;
    let filter = args.apply_to(job.filter.clone());

    tracing::debug!(
        job = %args.job_file.display(),
        ecosystem = %job.ecosystem,
        dependencies = job.dependencies.len(),
        security_only = filter.security_only,
        "loaded job"
    );

    let orchestrator = Orchestrator::new(filter, job.policy, job.advisories)
        .with_concurrency(args.concurrency)
        .with_offline(args.offline)
        .with_progress(!args.quiet && !args.json);
    let summary = orchestrator.evaluate_all(job.dependencies).await;

    // Create output formatter based on CLI options
    let output_config = OutputConfig::from_cli(args.json, args.verbose, args.quiet);
    let formatter = create_formatter(output_config);

    // Output results
    let mut stdout = io::stdout().lock();
    formatter.format(&summary, &mut stdout)?;
    stdout.flush()?;

    if summary.has_failures() {
        // Partial success - some dependencies could not be evaluated
        Ok(ExitCode::from(2))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
