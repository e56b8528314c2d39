//! Parsed directive set for a single fixture.
//!
//! An [`Instructions`] value is produced once by the parser and never mutated
//! afterwards. The interleaved [`Step`] sequence is the authoritative execution
//! order; [`Instructions::compile_steps`] and [`Instructions::clean_steps`] are
//! views for callers that do not care about interleaving.

use std::fmt;

use rustc_hash::FxHashSet;

// ============================================================================
// STEPS
// ============================================================================

/// Directive flavour that made a fixture worth executing.
///
/// Used for diagnostics only; it never changes how a fixture is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// At least one `@run main` directive was found.
    Run,
    /// Only `@compile` directives were found.
    Compile,
}

impl Classification {
    /// Directive text this classification stands for.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Run => "@run main",
            Self::Compile => "@compile",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source files named by one `@compile` directive, relative to the fixture's
/// directory, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileStep {
    /// Relative source file names.
    pub files: Vec<String>,
}

/// Fully-qualified type names named by one `@clean` directive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanStep {
    /// Types whose compiled artifacts are deleted.
    pub types: Vec<String>,
}

/// One entry of the interleaved compile/clean sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Compile a set of files.
    Compile(CompileStep),
    /// Delete the artifacts of a set of types.
    Clean(CleanStep),
}

/// One `@run main` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunInvocation {
    /// Name of the type whose entry point is executed.
    pub entry_point: String,
    /// Positional arguments passed after the entry point.
    pub args: Vec<String>,
    /// A nonzero exit is this invocation's success condition.
    ///
    /// Scoped to this invocation only; sibling invocations keep ordinary
    /// zero-exit semantics.
    pub expect_failure: bool,
}

// ============================================================================
// INSTRUCTIONS
// ============================================================================

/// Immutable directive set owned by one fixture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instructions {
    pub(crate) steps: Vec<Step>,
    pub(crate) runs: Vec<RunInvocation>,
    pub(crate) library_paths: Vec<String>,
    pub(crate) classification: Classification,
}

impl Instructions {
    /// Interleaved compile/clean steps in declaration order.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Run invocations in declaration order.
    pub fn runs(&self) -> &[RunInvocation] {
        &self.runs
    }

    /// Extra relative paths copied into the sandbox before compiling.
    pub fn library_paths(&self) -> &[String] {
        &self.library_paths
    }

    /// Directive flavour that produced the positive match.
    pub fn classification(&self) -> Classification {
        self.classification
    }

    /// Compile steps without the interleaved clean steps.
    pub fn compile_steps(&self) -> impl Iterator<Item = &CompileStep> + '_ {
        self.steps.iter().filter_map(|step| match step {
            Step::Compile(compile) => Some(compile),
            Step::Clean(_) => None,
        })
    }

    /// Clean steps without the interleaved compile steps.
    pub fn clean_steps(&self) -> impl Iterator<Item = &CleanStep> + '_ {
        self.steps.iter().filter_map(|step| match step {
            Step::Clean(clean) => Some(clean),
            Step::Compile(_) => None,
        })
    }

    /// Whether compilation has to be split into ordered steps.
    pub fn has_clean_steps(&self) -> bool {
        self.clean_steps().next().is_some()
    }

    /// Whether any run directive was found.
    pub fn has_runs(&self) -> bool {
        !self.runs.is_empty()
    }

    /// Every file named by a compile directive, deduplicated, first
    /// occurrence wins.
    pub fn explicit_sources(&self) -> Vec<&str> {
        let mut seen = FxHashSet::default();
        self.compile_steps()
            .flat_map(|step| step.files.iter())
            .map(String::as_str)
            .filter(|file| seen.insert(*file))
            .collect()
    }
}
