//! Fixture discovery.
//!
//! The catalog walks root directories (or a saved fixture list), drops
//! excluded paths before parsing them, and keeps the fixtures whose
//! directives make them worth executing. Traversal is sorted by file name so
//! a saved list is reproducible from identical inputs.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use ctk_directive::{DirectiveParser, FilterSet, Instructions, SOURCE_EXTENSION};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{EngineError, Result};

// ============================================================================
// FIXTURE
// ============================================================================

/// One source file under test.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fixture {
    path: PathBuf,
    name: String,
}

impl Fixture {
    /// Create a fixture from its path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { path, name }
    }

    /// Location of the fixture.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Base file name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Directory that relative directive paths are resolved against.
    pub fn directory(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

/// A fixture paired with its parsed directives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// The fixture.
    pub fixture: Fixture,
    /// Its immutable directive set.
    pub instructions: Instructions,
}

// ============================================================================
// CATALOG
// ============================================================================

/// Produces the ordered set of fixtures worth scheduling.
#[derive(Debug, Clone, Copy)]
pub struct Catalog<'f> {
    filters: &'f FilterSet,
}

impl<'f> Catalog<'f> {
    /// Create a catalog applying the given filters.
    pub fn new(filters: &'f FilterSet) -> Self {
        Self { filters }
    }

    /// Recursively scan root directories.
    ///
    /// Missing roots are skipped with a warning.
    pub fn scan<P: AsRef<Path>>(&self, roots: &[P]) -> Vec<CatalogEntry> {
        let mut entries = Vec::new();
        for root in roots {
            let root = root.as_ref();
            if !root.exists() {
                warn!(root = %root.display(), "root does not exist, skipping");
                continue;
            }

            let walker = WalkDir::new(root).sort_by_file_name().into_iter();
            for entry in walker {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(err) => {
                        warn!(error = %err, "cannot read directory entry");
                        continue;
                    }
                };
                if !entry.file_type().is_file() || !has_source_extension(entry.path()) {
                    continue;
                }
                if let Some(admitted) = self.admit(entry.path()) {
                    entries.push(admitted);
                }
            }
        }
        entries
    }

    /// Re-parse the fixtures named by a fixture list.
    ///
    /// Paths that no longer exist are skipped with a warning.
    pub fn from_paths<P: AsRef<Path>>(&self, paths: &[P]) -> Vec<CatalogEntry> {
        paths
            .iter()
            .map(AsRef::as_ref)
            .filter(|path| {
                let exists = path.exists();
                if !exists {
                    warn!(fixture = %path.display(), "listed fixture does not exist, skipping");
                }
                exists
            })
            .filter_map(|path| self.admit(path))
            .collect()
    }

    /// Re-parse the fixtures of a fixture-list file.
    ///
    /// # Errors
    /// [`EngineError::FixtureListMissing`] when the list does not exist.
    pub fn from_list(&self, list: &Path) -> Result<Vec<CatalogEntry>> {
        let paths = FixtureList::read(list)?;
        Ok(self.from_paths(&paths))
    }

    fn admit(&self, path: &Path) -> Option<CatalogEntry> {
        if self.filters.is_excluded(path) {
            debug!(fixture = %path.display(), "excluded by pattern");
            return None;
        }
        let instructions = DirectiveParser::new(self.filters).parse_file(path)?;
        Some(CatalogEntry {
            fixture: Fixture::new(path),
            instructions,
        })
    }
}

fn has_source_extension(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext == SOURCE_EXTENSION)
}

/// Shuffle and keep at most `max` entries.
///
/// A seed makes the selection reproducible.
pub fn limit(entries: &mut Vec<CatalogEntry>, max: usize, seed: Option<u64>) {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    entries.shuffle(&mut rng);
    entries.truncate(max);
}

/// Counts printed after a discovery pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogSummary {
    /// Fixtures found.
    pub total: usize,
    /// Fixtures with at least one run directive.
    pub runnable: usize,
    /// Fixtures that are only compiled.
    pub compile_only: usize,
}

impl CatalogSummary {
    /// Summarize a set of entries.
    pub fn of(entries: &[CatalogEntry]) -> Self {
        let runnable = entries
            .iter()
            .filter(|entry| entry.instructions.has_runs())
            .count();
        Self {
            total: entries.len(),
            runnable,
            compile_only: entries.len() - runnable,
        }
    }
}

// ============================================================================
// FIXTURE LIST
// ============================================================================

/// Newline-delimited fixture path file shared between a discovery pass and
/// later execution passes.
pub struct FixtureList;

impl FixtureList {
    /// Write one fixture path per line.
    pub fn write(path: &Path, entries: &[CatalogEntry]) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut file = std::io::BufWriter::new(fs::File::create(path)?);
        for entry in entries {
            writeln!(file, "{}", entry.fixture.path().display())?;
        }
        file.flush()?;
        Ok(())
    }

    /// Read fixture paths, skipping blank lines.
    ///
    /// # Errors
    /// [`EngineError::FixtureListMissing`] when the list does not exist.
    pub fn read(path: &Path) -> Result<Vec<PathBuf>> {
        if !path.exists() {
            return Err(EngineError::FixtureListMissing(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(PathBuf::from)
            .collect())
    }
}
