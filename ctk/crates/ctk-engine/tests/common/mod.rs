//! Shared helpers for execution tests.
//!
//! The fake compiler "compiles" `X.java` by copying it to `X.class` under the
//! `-d` directory and appends a sorted listing of existing artifacts to a
//! trace file before each invocation. The fake runtime loads the class file
//! named by the entry point, prints what it received, and exits with the code
//! given by an `exit=N` argument or an `EXIT=N` marker in the class.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ctk_directive::{DirectiveParser, FilterSet, Instructions};
use ctk_engine::{ExecMode, ExecutorConfig, Fixture};
use tempfile::TempDir;

const FAKE_COMPILER: &str = r#"#!/bin/sh
trace='@TRACE@'
out=.
while [ $# -gt 0 ]; do
  case "$1" in
    -d) out="$2"; shift 2 ;;
    -bootclasspath) echo "bootclasspath: $2"; shift 2 ;;
    -*) echo "option: $1"; shift ;;
    *) break ;;
  esac
done
(cd "$out" && find . -name '*.class' | sort | tr '\n' ' '; echo) >> "$trace"
for src in "$@"; do
  if [ ! -f "$src" ]; then
    echo "error: file not found: $src" >&2
    exit 2
  fi
  if grep -q COMPILE_ERROR "$src"; then
    echo "$src: error: cannot find symbol" >&2
    exit 1
  fi
  if grep -q COMPILE_HANG "$src"; then
    exec sleep 5
  fi
  mkdir -p "$out/$(dirname "$src")"
  cp "$src" "$out/${src%.java}.class"
  echo "compiled: $src"
done
exit 0
"#;

const FAKE_RUNTIME: &str = r#"#!/bin/sh
cp=
while [ $# -gt 0 ]; do
  case "$1" in
    -cp) cp="$2"; shift 2 ;;
    -D*) echo "property: $1"; shift ;;
    -*) shift ;;
    *) break ;;
  esac
done
echo "classpath: $cp"
root="${cp%%:*}"
main="$1"
shift
class="$root/$(echo "$main" | tr . /).class"
if [ ! -f "$class" ]; then
  echo "Error: Could not find or load main class $main" >&2
  exit 1
fi
echo "args: $*"
echo "env: HOME=$HOME LANG=$LANG LC_ALL=$LC_ALL"
if grep -q RUNTIME_HANG "$class"; then
  exec sleep 5
fi
code=$(sed -n 's/.*EXIT=\([0-9]*\).*/\1/p' "$class" | head -n 1)
for arg in "$@"; do
  case "$arg" in
    exit=*) code="${arg#exit=}" ;;
  esac
done
exit "${code:-0}"
"#;

/// Fake toolchain and scratch directories for one test.
pub struct Toolchain {
    dir: TempDir,
    pub compiler: PathBuf,
    pub runtime: PathBuf,
    pub trace: PathBuf,
    pub fixtures: PathBuf,
    pub work: PathBuf,
}

impl Toolchain {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let bin = dir.path().join("bin");
        let fixtures = dir.path().join("fixtures");
        let work = dir.path().join("work");
        for path in [&bin, &fixtures, &work] {
            fs::create_dir_all(path).unwrap();
        }

        let trace = dir.path().join("compile-trace.txt");
        let compiler = bin.join("fake-javac");
        let runtime = bin.join("fake-java");
        write_script(
            &compiler,
            &FAKE_COMPILER.replace("@TRACE@", &trace.display().to_string()),
        );
        write_script(&runtime, FAKE_RUNTIME);

        Self {
            dir,
            compiler,
            runtime,
            trace,
            fixtures,
            work,
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Scripts are run through the shell so that no freshly written file is
    /// ever executed directly.
    pub fn config(&self) -> ExecutorConfig {
        ExecutorConfig {
            compiler: PathBuf::from("/bin/sh"),
            compiler_args: vec![self.compiler.display().to_string()],
            runtime: PathBuf::from("/bin/sh"),
            runtime_args: vec![self.runtime.display().to_string()],
            timeout: Duration::from_secs(5),
            mode: ExecMode::CompileAndRun,
            work_root: self.work.clone(),
            ..ExecutorConfig::default()
        }
    }

    /// Write a file relative to the fixture directory.
    pub fn write(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.fixtures.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    /// Write a fixture and parse its directives.
    pub fn fixture(&self, rel: &str, content: &str) -> (Fixture, Instructions) {
        let path = self.write(rel, content);
        let fixture = Fixture::new(&path);
        let stem = path.file_stem().and_then(|s| s.to_str());
        let filters = FilterSet::default();
        let instructions = DirectiveParser::new(&filters)
            .parse_source(content, stem)
            .expect("fixture should be positive");
        (fixture, instructions)
    }

    /// Artifact listings recorded before each compiler invocation.
    pub fn trace_lines(&self) -> Vec<String> {
        fs::read_to_string(&self.trace)
            .unwrap_or_default()
            .lines()
            .map(|line| line.trim().to_string())
            .collect()
    }

    /// Sandboxes left in the work root.
    pub fn retained_sandboxes(&self) -> usize {
        fs::read_dir(&self.work).unwrap().count()
    }
}

fn write_script(path: &Path, content: &str) {
    fs::write(path, content).unwrap();
}
