//! Per-fixture working directories.
//!
//! A [`Sandbox`] is owned by exactly one executing fixture. It is never
//! removed on drop; [`Sandbox::finalize`] is the single place that decides
//! between removal and retention.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use ctk_directive::SOURCE_EXTENSION;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::outcome::Outcome;
use crate::plan::CopyEntry;

/// Directory under the sandbox root holding tool output logs.
pub const LOG_DIR: &str = ".ctk-logs";

const COMPILED_EXTENSION: &str = "class";

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Exclusively owned working directory for one fixture execution.
#[derive(Debug)]
pub struct Sandbox {
    root: PathBuf,
}

impl Sandbox {
    /// Create a fresh, uniquely named sandbox under `work_root`.
    pub fn create(work_root: &Path) -> io::Result<Self> {
        fs::create_dir_all(work_root)?;
        let root = work_root.join(format!(
            "test_run_{}_{}_{}",
            std::process::id(),
            SEQUENCE.fetch_add(1, Ordering::Relaxed),
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ));
        fs::create_dir(&root)?;
        fs::create_dir(root.join(LOG_DIR))?;
        debug!(sandbox = %root.display(), "created sandbox");
        Ok(Self { root })
    }

    /// Sandbox root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of a tool output log.
    ///
    /// # Arguments
    /// * `stage` - Stage label such as `compile` or `run`
    /// * `index` - Invocation number within the stage
    /// * `stream` - `stdout` or `stderr`
    pub fn log_path(&self, stage: &str, index: usize, stream: &str) -> PathBuf {
        self.root
            .join(LOG_DIR)
            .join(format!("{stage}-{index}.{stream}.log"))
    }

    /// Copy the planned files and directories into the sandbox.
    ///
    /// Missing sources are tolerated; the compiler reports what it lacks.
    pub fn materialize(&self, copies: &[CopyEntry]) -> io::Result<()> {
        for copy in copies {
            let dest = self.root.join(&copy.dest);
            if copy.source.is_dir() {
                merge_dir(&copy.source, &dest)?;
            } else if copy.source.is_file() {
                if let Some(parent) = dest.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::copy(&copy.source, &dest)?;
            } else {
                debug!(resource = %copy.source.display(), "referenced resource missing");
            }
        }
        Ok(())
    }

    /// Source files directly in the sandbox root, sorted, relative to it.
    pub fn root_sources(&self) -> io::Result<Vec<PathBuf>> {
        let mut sources = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let path = entry.path();
            let is_source = path.extension().is_some_and(|ext| ext == SOURCE_EXTENSION);
            if is_source && entry.file_type()?.is_file() {
                sources.push(PathBuf::from(entry.file_name()));
            }
        }
        sources.sort();
        Ok(sources)
    }

    /// Delete the compiled artifacts of fully-qualified type names.
    ///
    /// For `p.q.T` both `p/q/T.class` and the nested form `p/q$T.class` are
    /// removed when present.
    pub fn clean_types(&self, types: &[String]) {
        for name in types {
            for artifact in artifact_paths(name) {
                let path = self.root.join(&artifact);
                match fs::remove_file(&path) {
                    Ok(()) => debug!(artifact = %path.display(), "cleaned"),
                    Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                    Err(err) => debug!(artifact = %path.display(), error = %err, "clean failed"),
                }
            }
        }
    }

    /// Remove the sandbox after a success, retain it otherwise.
    ///
    /// The returned outcome carries the retained path, or `None` once the
    /// directory is gone.
    pub fn finalize(self, mut outcome: Outcome) -> Outcome {
        if outcome.is_success() {
            match fs::remove_dir_all(&self.root) {
                Ok(()) => {
                    outcome.sandbox = None;
                    return outcome;
                }
                Err(err) => {
                    warn!(sandbox = %self.root.display(), error = %err, "cannot remove sandbox");
                }
            }
        }
        outcome.sandbox = Some(self.root);
        outcome
    }
}

/// Artifact locations of a fully-qualified type, primary form first.
fn artifact_paths(name: &str) -> Vec<PathBuf> {
    let primary = PathBuf::from(format!(
        "{}.{COMPILED_EXTENSION}",
        name.replace('.', "/")
    ));
    match name.rsplit_once('.') {
        Some((outer, inner)) => {
            let nested = PathBuf::from(format!(
                "{}${inner}.{COMPILED_EXTENSION}",
                outer.replace('.', "/")
            ));
            vec![primary, nested]
        }
        None => vec![primary],
    }
}

/// Recursively copy `source` into `dest`, overwriting files already present.
fn merge_dir(source: &Path, dest: &Path) -> io::Result<()> {
    for entry in WalkDir::new(source).sort_by_file_name() {
        let entry = entry.map_err(io::Error::from)?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
        let target = dest.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
