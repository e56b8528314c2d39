//! Sandbox executor.
//!
//! Runs one fixture's [`Plan`] against the external compiler and runtime and
//! classifies the result. Execution problems never escape as errors: every
//! path through [`SandboxExecutor::execute`] ends in an [`Outcome`].

use std::env;
use std::ffi::OsString;
use std::io;
use std::ops::ControlFlow;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::time::Duration;

use ctk_directive::{Instructions, RunInvocation};
use tracing::debug;

use crate::catalog::Fixture;
use crate::error::{EngineError, Result};
use crate::outcome::{reasons, Outcome};
use crate::plan::{CompileSet, Plan, PlanStage};
use crate::process::{run_tool, ToolCommand, ToolOutput};
use crate::sandbox::Sandbox;

// ============================================================================
// CONFIGURATION
// ============================================================================

/// How far a fixture is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecMode {
    /// Stop after compilation.
    CompileOnly,
    /// Compile, then execute every run invocation.
    #[default]
    CompileAndRun,
}

/// Toolchain and sandbox settings shared read-only by every worker.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Compiler binary.
    pub compiler: PathBuf,
    /// Extra arguments passed to every compiler invocation.
    pub compiler_args: Vec<String>,
    /// Runtime binary.
    pub runtime: PathBuf,
    /// Extra arguments passed to every runtime invocation before the classpath.
    pub runtime_args: Vec<String>,
    /// Bootclasspath archive for the compiler and runtime.
    pub archive: Option<PathBuf>,
    /// Wall-clock limit for each tool invocation.
    pub timeout: Duration,
    /// Compile-only or compile-and-run.
    pub mode: ExecMode,
    /// Directory that sandboxes are created in.
    pub work_root: PathBuf,
    /// System property telling a running fixture where its sources are.
    pub sandbox_property: String,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            compiler: PathBuf::from("javac"),
            compiler_args: Vec::new(),
            runtime: PathBuf::from("java"),
            runtime_args: Vec::new(),
            archive: None,
            timeout: Duration::from_secs(5),
            mode: ExecMode::default(),
            work_root: env::temp_dir(),
            sandbox_property: "test.src".to_string(),
        }
    }
}

impl ExecutorConfig {
    /// Resolve tool binaries and check the archive before anything is
    /// scheduled.
    ///
    /// Relative locations are made absolute because tools run with the
    /// sandbox as working directory.
    ///
    /// # Errors
    /// [`EngineError::ToolNotFound`] or [`EngineError::ArchiveMissing`].
    pub fn validate(mut self) -> Result<Self> {
        self.compiler = resolve_tool(&self.compiler)?;
        if self.mode == ExecMode::CompileAndRun {
            self.runtime = resolve_tool(&self.runtime)?;
        }
        if let Some(archive) = self.archive.take() {
            if !archive.is_file() {
                return Err(EngineError::ArchiveMissing(archive));
            }
            self.archive = Some(absolute(&archive)?);
        }
        self.work_root = absolute(&self.work_root)?;
        Ok(self)
    }
}

/// Locate a binary given as a path or as a bare name on `PATH`.
pub fn resolve_tool(tool: &Path) -> Result<PathBuf> {
    let not_found = || EngineError::ToolNotFound(tool.display().to_string());
    if tool.components().count() > 1 {
        return if tool.is_file() {
            Ok(absolute(tool)?)
        } else {
            Err(not_found())
        };
    }
    let path = env::var_os("PATH").ok_or_else(not_found)?;
    env::split_paths(&path)
        .map(|dir| dir.join(tool))
        .find(|candidate| candidate.is_file())
        .ok_or_else(not_found)
}

fn absolute(path: &Path) -> io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(env::current_dir()?.join(path))
    }
}

// ============================================================================
// EXECUTOR
// ============================================================================

/// Executes fixtures one at a time; shared by all workers.
#[derive(Debug, Clone)]
pub struct SandboxExecutor {
    config: ExecutorConfig,
}

impl SandboxExecutor {
    /// Create an executor from a validated configuration.
    pub fn new(config: ExecutorConfig) -> Self {
        Self { config }
    }

    /// Active configuration.
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Execute a fixture in a fresh sandbox and finalize the sandbox.
    pub fn execute(&self, fixture: &Fixture, instructions: &Instructions) -> Outcome {
        let plan = Plan::build(fixture, instructions);
        let sandbox = match Sandbox::create(&self.config.work_root) {
            Ok(sandbox) => sandbox,
            Err(err) => return harness_crash(&err),
        };
        debug!(
            fixture = %fixture.path().display(),
            sandbox = %sandbox.root().display(),
            stepped = plan.stepped,
            compiles = plan.compile_count(),
            runs = plan.runs.len(),
            "executing plan"
        );
        finalize_guarded(sandbox, |sandbox| self.execute_plan(sandbox, &plan))
    }

    fn execute_plan(&self, sandbox: &Sandbox, plan: &Plan) -> Outcome {
        if let Err(err) = sandbox.materialize(&plan.copies) {
            return harness_crash(&err);
        }

        let mut last = None;
        let mut compile_index = 0;
        for stage in &plan.stages {
            match stage {
                PlanStage::Compile(set) => {
                    let files = match set {
                        CompileSet::Files(files) => files.clone(),
                        CompileSet::AllRootSources => match sandbox.root_sources() {
                            Ok(files) => files,
                            Err(err) => return harness_crash(&err),
                        },
                    };
                    if files.is_empty() {
                        return with_last(Outcome::failure(reasons::NOTHING_TO_COMPILE), last);
                    }
                    match self.compile(sandbox, compile_index, &files) {
                        ControlFlow::Continue(output) => last = Some(output),
                        ControlFlow::Break(outcome) => return outcome,
                    }
                    compile_index += 1;
                }
                PlanStage::Clean(types) => sandbox.clean_types(types),
            }
        }

        if self.config.mode == ExecMode::CompileOnly || plan.runs.is_empty() {
            return with_last(Outcome::success(reasons::COMPILED), last);
        }

        let mut expected_failure_seen = false;
        for (index, run) in plan.runs.iter().enumerate() {
            match self.run(sandbox, index, run) {
                ControlFlow::Continue(output) => {
                    expected_failure_seen |= run.expect_failure;
                    last = Some(output);
                }
                ControlFlow::Break(outcome) => return outcome,
            }
        }

        let reason = if expected_failure_seen {
            reasons::EXPECTED_FAILURE
        } else {
            reasons::EXIT_CODE_ZERO
        };
        with_last(Outcome::success(reason), last)
    }

    fn compile(
        &self,
        sandbox: &Sandbox,
        index: usize,
        files: &[PathBuf],
    ) -> ControlFlow<Outcome, ToolOutput> {
        let mut args: Vec<OsString> = self.config.compiler_args.iter().map(OsString::from).collect();
        if let Some(archive) = &self.config.archive {
            args.push("-bootclasspath".into());
            args.push(archive.clone().into_os_string());
        }
        args.push("-d".into());
        args.push(sandbox.root().as_os_str().to_os_string());
        args.extend(files.iter().map(|file| file.clone().into_os_string()));

        match self.invoke(sandbox, "compile", index, &self.config.compiler, args) {
            Err(err) => ControlFlow::Break(
                Outcome::crash(reasons::COMPILER_CRASHED).with_output(String::new(), err.to_string()),
            ),
            Ok(output) if output.timed_out => ControlFlow::Break(
                Outcome::timeout(reasons::COMPILER_TIMED_OUT).with_output(output.stdout, output.stderr),
            ),
            Ok(output) if output.exit_code != 0 => ControlFlow::Break(
                Outcome::failure(reasons::COMPILER_FAILED).with_output(output.stdout, output.stderr),
            ),
            Ok(output) => ControlFlow::Continue(output),
        }
    }

    fn run(
        &self,
        sandbox: &Sandbox,
        index: usize,
        run: &RunInvocation,
    ) -> ControlFlow<Outcome, ToolOutput> {
        let root = sandbox.root();
        let classpath = match &self.config.archive {
            Some(archive) => env::join_paths([root, archive.as_path()]),
            None => env::join_paths([root]),
        };
        let classpath = match classpath {
            Ok(classpath) => classpath,
            Err(err) => {
                return ControlFlow::Break(
                    Outcome::crash(reasons::HARNESS_CRASHED)
                        .with_output(String::new(), err.to_string()),
                )
            }
        };

        let mut property = OsString::from(format!("-D{}=", self.config.sandbox_property));
        property.push(root.as_os_str());

        let mut args: Vec<OsString> = self.config.runtime_args.iter().map(OsString::from).collect();
        args.extend(["-cp".into(), classpath, property]);
        args.push(OsString::from(&run.entry_point));
        args.extend(run.args.iter().map(OsString::from));

        match self.invoke(sandbox, "run", index, &self.config.runtime, args) {
            Err(err) => ControlFlow::Break(
                Outcome::crash(reasons::TEST_CRASHED).with_output(String::new(), err.to_string()),
            ),
            Ok(output) if output.timed_out => ControlFlow::Break(
                Outcome::timeout(reasons::TEST_TIMED_OUT).with_output(output.stdout, output.stderr),
            ),
            Ok(output) if output.exit_code != 0 && !run.expect_failure => ControlFlow::Break(
                Outcome::failure(reasons::EXIT_CODE_NOT_ZERO)
                    .with_output(output.stdout, output.stderr),
            ),
            Ok(output) if output.exit_code == 0 && run.expect_failure => ControlFlow::Break(
                Outcome::failure(reasons::EXPECTED_FAILURE_SUCCEEDED)
                    .with_output(output.stdout, output.stderr),
            ),
            Ok(output) => ControlFlow::Continue(output),
        }
    }

    fn invoke(
        &self,
        sandbox: &Sandbox,
        stage: &str,
        index: usize,
        program: &Path,
        args: Vec<OsString>,
    ) -> io::Result<ToolOutput> {
        let output = run_tool(&ToolCommand {
            program,
            args,
            cwd: sandbox.root(),
            stdout_log: sandbox.log_path(stage, index, "stdout"),
            stderr_log: sandbox.log_path(stage, index, "stderr"),
            timeout: self.config.timeout,
        })?;
        debug!(
            stage,
            index,
            exit_code = output.exit_code,
            timed_out = output.timed_out,
            "tool finished"
        );
        Ok(output)
    }
}

fn with_last(outcome: Outcome, last: Option<ToolOutput>) -> Outcome {
    match last {
        Some(output) => outcome.with_output(output.stdout, output.stderr),
        None => outcome,
    }
}

/// Run `body` and finalize the sandbox even when it panics, so a crashed
/// fixture keeps its sandbox and reports where it is.
fn finalize_guarded(sandbox: Sandbox, body: impl FnOnce(&Sandbox) -> Outcome) -> Outcome {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| body(&sandbox)))
        .unwrap_or_else(|_| Outcome::crash(reasons::HARNESS_CRASHED));
    sandbox.finalize(outcome)
}

fn harness_crash(err: &io::Error) -> Outcome {
    Outcome::crash(reasons::HARNESS_CRASHED).with_output(String::new(), err.to_string())
}
