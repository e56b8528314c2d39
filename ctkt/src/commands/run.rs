//! Run command implementation.
//!
//! Selects fixtures from a fixture list or by scanning roots, executes them
//! on the worker pool, prints the summary, and optionally exports the report
//! as JSON.

use std::path::{Path, PathBuf};
use std::time::Duration;

use ctk_directive::FilterSet;
use ctk_engine::{
    limit, Catalog, CatalogEntry, ExecMode, ExecutorConfig, Orchestrator, OrchestratorOptions,
    RunReport,
};
use tracing::{debug, info};

use crate::commands::common::{error_messages, load_filters, resolve_classpath};
use crate::commands::traits::Command;
use crate::config::Config;
use crate::error::{CtkError, Result};

/// Arguments for the run command.
#[derive(Debug, Clone, Default)]
pub struct RunArgs {
    /// Fixture root directories to scan.
    pub roots: Vec<PathBuf>,
    /// Fixture list written by `prepare`; takes precedence over roots.
    pub list: Option<PathBuf>,
    /// Execute at most this many randomly chosen fixtures; zero runs all.
    pub limit: Option<usize>,
    /// Seed for the random selection.
    pub seed: Option<u64>,
    /// Per-invocation timeout in seconds.
    pub timeout: Option<u64>,
    /// Compiler binary.
    pub compiler: Option<String>,
    /// Runtime binary.
    pub runtime: Option<String>,
    /// Extra compiler arguments, appended to the configured ones.
    pub compiler_args: Vec<String>,
    /// Extra runtime arguments, appended to the configured ones.
    pub runtime_args: Vec<String>,
    /// Classpath alias or archive path.
    pub classpath: Option<String>,
    /// Stop after compilation.
    pub compile_only: bool,
    /// Do not log successful fixtures.
    pub no_success: bool,
    /// Log captured output of unsuccessful fixtures.
    pub verbose_failures: bool,
    /// Number of parallel workers.
    pub jobs: Option<usize>,
    /// Write the report as JSON to this file.
    pub report: Option<PathBuf>,
    /// Blacklist file.
    pub blacklist: Option<PathBuf>,
    /// Exclude-pattern file.
    pub exclude: Option<PathBuf>,
    /// Directory that sandboxes are created in.
    pub work_dir: Option<PathBuf>,
}

/// Run command handler.
pub struct RunCommand {
    args: RunArgs,
    config: Config,
}

impl RunCommand {
    /// Effective executor configuration: flags over configuration file.
    pub fn executor_config(&self) -> ExecutorConfig {
        let args = &self.args;
        let config = &self.config;

        let mut compiler_args = config.compiler_args.clone();
        compiler_args.extend(args.compiler_args.iter().cloned());
        let mut runtime_args = config.runtime_args.clone();
        runtime_args.extend(args.runtime_args.iter().cloned());

        let classpath = args.classpath.as_deref().unwrap_or(&config.classpath);

        ExecutorConfig {
            compiler: PathBuf::from(args.compiler.as_deref().unwrap_or(&config.compiler)),
            compiler_args,
            runtime: PathBuf::from(args.runtime.as_deref().unwrap_or(&config.runtime)),
            runtime_args,
            archive: resolve_classpath(classpath),
            timeout: Duration::from_secs(args.timeout.unwrap_or(config.timeout_secs)),
            mode: if args.compile_only {
                ExecMode::CompileOnly
            } else {
                ExecMode::CompileAndRun
            },
            work_root: args
                .work_dir
                .clone()
                .or_else(|| config.work_dir.clone())
                .unwrap_or_else(std::env::temp_dir),
            ..ExecutorConfig::default()
        }
    }

    /// Scheduling options: flags over configuration file.
    pub fn orchestrator_options(&self) -> OrchestratorOptions {
        OrchestratorOptions {
            jobs: self.args.jobs.unwrap_or(self.config.jobs),
            log_successes: !self.args.no_success,
            verbose_failures: self.args.verbose_failures,
        }
    }

    fn select_fixtures(&self, filters: &FilterSet) -> Result<Vec<CatalogEntry>> {
        let catalog = Catalog::new(filters);
        if let Some(list) = &self.args.list {
            info!("Reading fixtures from {}...", list.display());
            return Ok(catalog.from_list(list)?);
        }

        let roots = if self.args.roots.is_empty() {
            &self.config.roots
        } else {
            &self.args.roots
        };
        if roots.is_empty() {
            return Err(CtkError::Validation(
                error_messages::NO_FIXTURE_SOURCE.to_string(),
            ));
        }
        info!("Scanning for fixtures to run...");
        Ok(catalog.scan(roots))
    }
}

impl Command for RunCommand {
    type Args = RunArgs;
    type Output = RunReport;

    fn new(args: Self::Args, config: Config) -> Self {
        Self { args, config }
    }

    fn execute(&self) -> Result<Self::Output> {
        debug!(command = Self::name(), "executing");
        let executor = self.executor_config().validate()?;
        match &executor.archive {
            Some(archive) => info!("Using classpath: {}", archive.display()),
            None => info!("Using classpath: none"),
        }

        let filters = load_filters(
            self.args.blacklist.as_deref(),
            self.args.exclude.as_deref(),
            &self.config,
        )?;
        let mut entries = self.select_fixtures(&filters)?;
        // Zero means no limit.
        if let Some(max) = self.args.limit.filter(|&max| max > 0) {
            limit(&mut entries, max, self.args.seed);
            info!("Limiting to {} fixtures.", entries.len());
        }

        info!(
            "Running {} fixtures using {} and {}...",
            entries.len(),
            executor.compiler.display(),
            executor.runtime.display()
        );
        let report = Orchestrator::new(executor, self.orchestrator_options()).run(entries)?;

        print_summary(&report);
        if let Some(path) = &self.args.report {
            write_report(path, &report)?;
        }
        Ok(report)
    }

    fn name() -> &'static str {
        "run"
    }
}

/// Print the end-of-run summary.
fn print_summary(report: &RunReport) {
    println!();
    println!("--- Test Summary ---");
    println!("Total: {}", report.total);
    println!("Success: {}", report.success);
    println!("Failure: {}", report.failure);
    println!("Timeout: {}", report.timeout);
    println!("Crash: {}", report.crash);

    if !report.reasons.is_empty() {
        println!();
        println!("Failure Breakdown:");
        for (reason, count) in report.failure_breakdown() {
            println!("  {}: {}", reason, count);
        }
    }
    println!("Duration: {:.2}s", report.duration_secs);
}

/// Export the report as pretty-printed JSON.
///
/// # Arguments
/// * `path` - Destination file
/// * `report` - Finished run report
fn write_report(path: &Path, report: &RunReport) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)?;
    info!("Report written to {}", path.display());
    Ok(())
}

/// Run the run command.
pub fn run_fixtures(args: RunArgs, config: Config) -> Result<RunReport> {
    RunCommand::new(args, config).execute()
}
