//! Execution planning.
//!
//! A [`Plan`] is the ordered list of things the executor does for one fixture:
//! which files to copy into the sandbox, which compile and clean stages to run,
//! and which run invocations follow.
//!
//! File resolution:
//! - When compile directives name explicit sources, only those are compiled.
//!   The fixture itself is added only when it was not named and a run
//!   directive needs its entry point.
//! - Without any explicit source, every source file in the sandbox root is
//!   compiled in one invocation.
//! - Clean steps switch to stepped compilation so that a type can be compiled,
//!   deleted, and replaced in declaration order.

use std::path::{Component, Path, PathBuf};

use ctk_directive::{Instructions, RunInvocation, Step};
use indexmap::IndexSet;

use crate::catalog::Fixture;

/// One file or directory copied into the sandbox.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CopyEntry {
    /// Source location on disk.
    pub source: PathBuf,
    /// Destination relative to the sandbox root.
    pub dest: PathBuf,
}

/// Files handed to one compiler invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileSet {
    /// Explicit files, relative to the sandbox root.
    Files(Vec<PathBuf>),
    /// Every source file found in the sandbox root at compile time.
    AllRootSources,
}

/// One compile or clean stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanStage {
    /// Invoke the compiler.
    Compile(CompileSet),
    /// Delete the compiled artifacts of fully-qualified types.
    Clean(Vec<String>),
}

/// Ordered execution plan for one fixture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    /// Files and directories to materialize, in copy order.
    pub copies: Vec<CopyEntry>,
    /// Compile and clean stages in execution order.
    pub stages: Vec<PlanStage>,
    /// Run invocations executed after every stage succeeded.
    pub runs: Vec<RunInvocation>,
    /// Whether compilation was split around clean steps.
    pub stepped: bool,
}

impl Plan {
    /// Build the plan for a fixture.
    pub fn build(fixture: &Fixture, instructions: &Instructions) -> Self {
        let fixture_dir = fixture.directory();
        let fixture_file = PathBuf::from(fixture.name());

        let explicit: Vec<PathBuf> = instructions
            .explicit_sources()
            .into_iter()
            .map(sandbox_relative)
            .collect();
        let fixture_named = explicit.contains(&fixture_file);
        let add_fixture = !explicit.is_empty() && !fixture_named && instructions.has_runs();

        let stepped =
            instructions.has_clean_steps() && instructions.compile_steps().next().is_some();
        // An empty compile step in stepped mode compiles the fixture file.
        let empty_step = stepped
            && instructions
                .compile_steps()
                .any(|compile| compile.files.is_empty());
        let needs_fixture = explicit.is_empty() || add_fixture || empty_step;

        let mut copies = IndexSet::new();
        if needs_fixture {
            copies.insert(CopyEntry {
                source: fixture.path().to_path_buf(),
                dest: fixture_file.clone(),
            });
        }
        for file in instructions.explicit_sources() {
            copies.insert(copy_for_source(fixture_dir, file));
        }
        for library in instructions.library_paths() {
            copies.insert(CopyEntry {
                source: fixture_dir.join(library),
                dest: sandbox_relative(library),
            });
        }

        let stages = if stepped {
            stepped_stages(instructions, &fixture_file, add_fixture)
        } else {
            single_stage(instructions, explicit, &fixture_file, add_fixture)
        };

        Self {
            copies: copies.into_iter().collect(),
            stages,
            runs: instructions.runs().to_vec(),
            stepped,
        }
    }

    /// Number of compiler invocations in the plan.
    pub fn compile_count(&self) -> usize {
        self.stages
            .iter()
            .filter(|stage| matches!(stage, PlanStage::Compile(_)))
            .count()
    }
}

fn single_stage(
    instructions: &Instructions,
    explicit: Vec<PathBuf>,
    fixture_file: &Path,
    add_fixture: bool,
) -> Vec<PlanStage> {
    let compile = if explicit.is_empty() {
        CompileSet::AllRootSources
    } else if add_fixture {
        let mut files = vec![fixture_file.to_path_buf()];
        files.extend(explicit);
        CompileSet::Files(files)
    } else {
        CompileSet::Files(explicit)
    };

    // Clean steps without any compile step only trail the single compile.
    let mut stages = vec![PlanStage::Compile(compile)];
    stages.extend(
        instructions
            .clean_steps()
            .map(|clean| PlanStage::Clean(clean.types.clone())),
    );
    stages
}

fn stepped_stages(
    instructions: &Instructions,
    fixture_file: &Path,
    add_fixture: bool,
) -> Vec<PlanStage> {
    let mut pending_fixture = add_fixture;
    instructions
        .steps()
        .iter()
        .map(|step| match step {
            Step::Compile(compile) => {
                let mut files: Vec<PathBuf> =
                    compile.files.iter().map(|f| sandbox_relative(f)).collect();
                if files.is_empty() {
                    files.push(fixture_file.to_path_buf());
                } else if pending_fixture {
                    files.insert(0, fixture_file.to_path_buf());
                }
                pending_fixture = false;
                PlanStage::Compile(CompileSet::Files(files))
            }
            Step::Clean(clean) => PlanStage::Clean(clean.types.clone()),
        })
        .collect()
}

/// Where a directive-relative path lands inside the sandbox.
///
/// Plain relative paths keep their layout; absolute paths and paths that
/// climb out of the fixture directory land in the sandbox root by file name.
pub fn sandbox_relative(path: &str) -> PathBuf {
    let path = Path::new(path);
    let escapes = path.is_absolute()
        || path
            .components()
            .any(|component| matches!(component, Component::ParentDir));
    if escapes {
        return path.file_name().map(PathBuf::from).unwrap_or_default();
    }
    path.components()
        .filter(|component| matches!(component, Component::Normal(_)))
        .collect()
}

/// Copy entry for an explicit source: nested files pull in their whole
/// top-level directory so sibling sources are available too.
fn copy_for_source(fixture_dir: &Path, file: &str) -> CopyEntry {
    let dest = sandbox_relative(file);
    let mut components = dest.components();
    match (components.next(), components.next()) {
        (Some(top), Some(_)) if !Path::new(file).is_absolute() => {
            let top = PathBuf::from(top.as_os_str());
            CopyEntry {
                source: fixture_dir.join(&top),
                dest: top,
            }
        }
        _ => CopyEntry {
            source: fixture_dir.join(file),
            dest,
        },
    }
}
