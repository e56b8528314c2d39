//! Fixture outcomes and the aggregated run report.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use indexmap::IndexMap;
use serde::Serialize;

/// Machine-stable outcome reasons.
pub mod reasons {
    /// Compilation succeeded and nothing had to run.
    pub const COMPILED: &str = "compiled";
    /// Every run invocation exited with zero.
    pub const EXIT_CODE_ZERO: &str = "exit code 0";
    /// Every run was satisfied and at least one by an expected failure.
    pub const EXPECTED_FAILURE: &str = "expected failure";
    /// Compiler exited with a nonzero code.
    pub const COMPILER_FAILED: &str = "compiler failed (exit code not 0)";
    /// Compiler exceeded the step timeout.
    pub const COMPILER_TIMED_OUT: &str = "compiler timed out";
    /// Compiler could not be launched.
    pub const COMPILER_CRASHED: &str = "compiler crashed";
    /// The sandbox root held no source file to compile.
    pub const NOTHING_TO_COMPILE: &str = "nothing to compile";
    /// A run invocation exited with a nonzero code.
    pub const EXIT_CODE_NOT_ZERO: &str = "exit code not 0";
    /// A run invocation expected to fail exited with zero.
    pub const EXPECTED_FAILURE_SUCCEEDED: &str = "expected failure but succeeded";
    /// A run invocation exceeded the step timeout.
    pub const TEST_TIMED_OUT: &str = "test timed out";
    /// Runtime could not be launched.
    pub const TEST_CRASHED: &str = "test crashed";
    /// The engine itself failed while handling the fixture.
    pub const HARNESS_CRASHED: &str = "harness crashed";
}

/// Classification of one fixture execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OutcomeKind {
    /// Every stage passed.
    Success,
    /// A tool reported a failure.
    Failure,
    /// A tool exceeded the timeout and was killed.
    Timeout,
    /// A tool could not be launched or the engine failed.
    Crash,
}

impl OutcomeKind {
    /// Upper-case label used in progress lines and summaries.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Failure => "FAILURE",
            Self::Timeout => "TIMEOUT",
            Self::Crash => "CRASH",
        }
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of executing one fixture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Outcome classification.
    pub kind: OutcomeKind,
    /// One of the [`reasons`] constants.
    pub reason: &'static str,
    /// Standard output of the last tool invocation.
    pub stdout: String,
    /// Standard error of the last tool invocation.
    pub stderr: String,
    /// Retained sandbox; `None` once removed.
    pub sandbox: Option<PathBuf>,
}

impl Outcome {
    /// Create an outcome without captured output.
    pub fn new(kind: OutcomeKind, reason: &'static str) -> Self {
        Self {
            kind,
            reason,
            stdout: String::new(),
            stderr: String::new(),
            sandbox: None,
        }
    }

    /// Successful outcome.
    pub fn success(reason: &'static str) -> Self {
        Self::new(OutcomeKind::Success, reason)
    }

    /// Failed outcome.
    pub fn failure(reason: &'static str) -> Self {
        Self::new(OutcomeKind::Failure, reason)
    }

    /// Timed out outcome.
    pub fn timeout(reason: &'static str) -> Self {
        Self::new(OutcomeKind::Timeout, reason)
    }

    /// Crashed outcome.
    pub fn crash(reason: &'static str) -> Self {
        Self::new(OutcomeKind::Crash, reason)
    }

    /// Attach captured output.
    pub fn with_output(mut self, stdout: String, stderr: String) -> Self {
        self.stdout = stdout;
        self.stderr = stderr;
        self
    }

    /// Whether the fixture passed.
    pub fn is_success(&self) -> bool {
        self.kind == OutcomeKind::Success
    }
}

// ============================================================================
// RUN REPORT
// ============================================================================

/// Per-fixture line of a [`RunReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FixtureResult {
    /// Fixture path.
    pub path: PathBuf,
    /// Outcome classification.
    pub kind: OutcomeKind,
    /// Outcome reason.
    pub reason: String,
    /// Retained sandbox, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sandbox: Option<PathBuf>,
}

/// Aggregated results of one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunReport {
    /// Fixtures executed.
    pub total: usize,
    /// Successful fixtures.
    pub success: usize,
    /// Failed fixtures.
    pub failure: usize,
    /// Timed out fixtures.
    pub timeout: usize,
    /// Crashed fixtures.
    pub crash: usize,
    /// Frequency of reasons among non-success outcomes.
    pub reasons: IndexMap<String, usize>,
    /// Per-fixture results, sorted by path once finished.
    pub results: Vec<FixtureResult>,
    /// Wall-clock duration in seconds.
    pub duration_secs: f64,
}

impl RunReport {
    /// Create an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for one fixture outcome.
    pub fn record(&mut self, path: PathBuf, outcome: &Outcome) {
        self.total += 1;
        match outcome.kind {
            OutcomeKind::Success => self.success += 1,
            OutcomeKind::Failure => self.failure += 1,
            OutcomeKind::Timeout => self.timeout += 1,
            OutcomeKind::Crash => self.crash += 1,
        }
        if !outcome.is_success() {
            *self.reasons.entry(outcome.reason.to_string()).or_insert(0) += 1;
        }
        self.results.push(FixtureResult {
            path,
            kind: outcome.kind,
            reason: outcome.reason.to_string(),
            sandbox: outcome.sandbox.clone(),
        });
    }

    /// Stamp the duration and put results into a deterministic order.
    pub fn finish(&mut self, duration: Duration) {
        self.duration_secs = duration.as_secs_f64();
        self.reasons
            .sort_by(|ra, ca, rb, cb| cb.cmp(ca).then_with(|| ra.cmp(rb)));
        self.results.sort_by(|a, b| a.path.cmp(&b.path));
    }

    /// Reasons among non-success outcomes, most frequent first.
    pub fn failure_breakdown(&self) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.reasons
            .iter()
            .map(|(reason, count)| (reason.as_str(), *count))
    }

    /// Whether every fixture succeeded.
    pub fn all_succeeded(&self) -> bool {
        self.success == self.total
    }
}
