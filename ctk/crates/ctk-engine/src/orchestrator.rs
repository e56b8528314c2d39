//! Concurrent fan-out over the catalog.
//!
//! Fixtures are executed on a fixed-size worker pool. Workers send their
//! outcomes over a channel to the calling thread, which is the only place
//! that touches the [`RunReport`].

use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crossbeam::channel;
use tracing::{debug, info, warn};

use crate::catalog::CatalogEntry;
use crate::error::{EngineError, Result};
use crate::executor::{ExecutorConfig, SandboxExecutor};
use crate::outcome::{reasons, Outcome, RunReport};

/// Scheduling and progress options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorOptions {
    /// Number of worker threads.
    pub jobs: usize,
    /// Log a progress line for successful fixtures too.
    pub log_successes: bool,
    /// Log captured output of unsuccessful fixtures.
    pub verbose_failures: bool,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            jobs: num_cpus::get(),
            log_successes: true,
            verbose_failures: false,
        }
    }
}

/// Runs every catalog entry and aggregates the outcomes.
pub struct Orchestrator {
    executor: Arc<SandboxExecutor>,
    options: OrchestratorOptions,
}

impl Orchestrator {
    /// Create an orchestrator from a validated executor configuration.
    pub fn new(config: ExecutorConfig, options: OrchestratorOptions) -> Self {
        Self {
            executor: Arc::new(SandboxExecutor::new(config)),
            options,
        }
    }

    /// Execute all fixtures and return the finished report.
    ///
    /// # Errors
    /// [`EngineError::WorkerPool`] when the thread pool cannot be built.
    pub fn run(&self, entries: Vec<CatalogEntry>) -> Result<RunReport> {
        let started = Instant::now();
        let total = entries.len();
        let mut report = RunReport::new();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.jobs.max(1))
            .thread_name(|index| format!("ctk-worker-{index}"))
            .build()
            .map_err(|err| EngineError::WorkerPool(err.to_string()))?;

        let config = self.executor.config();
        debug!(
            fixtures = total,
            jobs = self.options.jobs,
            timeout_secs = config.timeout.as_secs(),
            mode = ?config.mode,
            "starting run"
        );

        let (tx, rx) = channel::unbounded::<(PathBuf, Outcome)>();
        for entry in entries {
            let tx = tx.clone();
            let executor = Arc::clone(&self.executor);
            pool.spawn(move || {
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                    executor.execute(&entry.fixture, &entry.instructions)
                }))
                .unwrap_or_else(|_| Outcome::crash(reasons::HARNESS_CRASHED));
                // Receiver outlives every sender.
                let _ = tx.send((entry.fixture.path().to_path_buf(), outcome));
            });
        }
        drop(tx);

        for (index, (path, outcome)) in rx.iter().enumerate() {
            self.log_progress(index + 1, total, &path, &outcome);
            report.record(path, &outcome);
        }

        report.finish(started.elapsed());
        Ok(report)
    }

    fn log_progress(&self, index: usize, total: usize, path: &Path, outcome: &Outcome) {
        if outcome.is_success() && !self.options.log_successes {
            return;
        }
        let sandbox = outcome
            .sandbox
            .as_ref()
            .map(|sandbox| sandbox.display().to_string())
            .unwrap_or_else(|| "removed".to_string());
        let line = format!(
            "[{index}/{total}] {} ({sandbox}): {} ({})",
            path.display(),
            outcome.kind,
            outcome.reason
        );
        if outcome.is_success() {
            info!("{line}");
            return;
        }
        warn!("{line}");
        if self.options.verbose_failures {
            if !outcome.stdout.is_empty() {
                info!("stdout:\n{}", outcome.stdout);
            }
            if !outcome.stderr.is_empty() {
                info!("stderr:\n{}", outcome.stderr);
            }
        }
    }
}
