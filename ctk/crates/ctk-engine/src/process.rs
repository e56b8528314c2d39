//! Timeout-bounded external tool invocation.
//!
//! Tools run with a cleared environment, the sandbox as working directory,
//! and their output streams redirected straight into log files.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

const POLL_INTERVAL: Duration = Duration::from_millis(10);
const DEFAULT_PATH: &str = "/usr/bin:/bin";

/// One external tool invocation.
#[derive(Debug, Clone)]
pub struct ToolCommand<'a> {
    /// Binary to launch.
    pub program: &'a Path,
    /// Arguments in order.
    pub args: Vec<OsString>,
    /// Working directory and `HOME`.
    pub cwd: &'a Path,
    /// File receiving standard output.
    pub stdout_log: PathBuf,
    /// File receiving standard error.
    pub stderr_log: PathBuf,
    /// Wall-clock limit.
    pub timeout: Duration,
}

/// What a finished (or killed) tool left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code; `128 + signal` when killed by a signal.
    pub exit_code: i32,
    /// The tool was killed after exceeding its timeout.
    pub timed_out: bool,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl ToolOutput {
    /// Finished in time with exit code zero.
    pub fn succeeded(&self) -> bool {
        !self.timed_out && self.exit_code == 0
    }
}

/// Run a tool to completion or until its timeout expires.
///
/// # Errors
/// Returns an error when the log files cannot be created or the tool cannot
/// be launched.
pub fn run_tool(command: &ToolCommand<'_>) -> io::Result<ToolOutput> {
    let stdout = File::create(&command.stdout_log)?;
    let stderr = File::create(&command.stderr_log)?;

    debug!(
        program = %command.program.display(),
        args = ?command.args,
        cwd = %command.cwd.display(),
        "launching tool"
    );

    let mut child = Command::new(command.program)
        .args(&command.args)
        .current_dir(command.cwd)
        .env_clear()
        .envs(minimal_env(command.cwd))
        .stdin(Stdio::null())
        .stdout(Stdio::from(stdout))
        .stderr(Stdio::from(stderr))
        .spawn()?;

    let (status, timed_out) = wait_with_timeout(&mut child, command.timeout)?;

    Ok(ToolOutput {
        exit_code: exit_code(status),
        timed_out,
        stdout: read_log(&command.stdout_log),
        stderr: read_log(&command.stderr_log),
    })
}

/// The only variables a tool sees.
fn minimal_env(home: &Path) -> Vec<(&'static str, OsString)> {
    let path = std::env::var_os("PATH").unwrap_or_else(|| OsString::from(DEFAULT_PATH));
    vec![
        ("PATH", path),
        ("HOME", home.as_os_str().to_os_string()),
        ("LANG", OsString::from("C")),
        ("LC_ALL", OsString::from("C")),
        ("TMPDIR", std::env::temp_dir().into_os_string()),
    ]
}

fn wait_with_timeout(child: &mut Child, timeout: Duration) -> io::Result<(ExitStatus, bool)> {
    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok((status, false));
        }
        if start.elapsed() >= timeout {
            // The child may exit between try_wait and kill.
            let _ = child.kill();
            let status = child.wait()?;
            return Ok((status, true));
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    -1
}

fn read_log(path: &Path) -> String {
    fs::read(path)
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}
