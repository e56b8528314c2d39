//! Common types and utilities for ctkt commands.

use std::path::{Path, PathBuf};

use ctk_directive::FilterSet;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{CtkError, Result};

// ============================================================================
// Classpath
// ============================================================================

/// Archive selected by the `stub` alias.
pub const STUB_ARCHIVE: &str = "build/runtime/jopa-stub-rt.jar";

/// Archive selected by the `gnucp` alias.
pub const GNU_CLASSPATH_ARCHIVE: &str =
    "build-devjopak/vendor-install/classpath/share/classpath/glibj.zip";

/// Resolve a classpath alias or literal archive path.
///
/// # Arguments
/// * `value` - `stub`, `gnucp`, `none`, or a path
///
/// # Returns
/// * `Option<PathBuf>` - The archive, or `None` when no archive is used
pub fn resolve_classpath(value: &str) -> Option<PathBuf> {
    match value {
        "stub" => Some(PathBuf::from(STUB_ARCHIVE)),
        "gnucp" => Some(PathBuf::from(GNU_CLASSPATH_ARCHIVE)),
        "none" | "" => None,
        path => Some(PathBuf::from(path)),
    }
}

// ============================================================================
// Filters
// ============================================================================

/// Build the filter set from flags, falling back to the configuration.
///
/// Files named on the command line must exist. A configured blacklist that
/// does not exist is skipped.
pub fn load_filters(
    blacklist: Option<&Path>,
    exclude: Option<&Path>,
    config: &Config,
) -> Result<FilterSet> {
    let blacklist = match blacklist {
        Some(path) => Some(require_file(path)?),
        None => config.blacklist.as_deref().filter(|path| {
            let exists = path.is_file();
            if !exists {
                debug!(blacklist = %path.display(), "configured blacklist not found, skipping");
            }
            exists
        }),
    };
    let exclude = match exclude.or(config.exclude.as_deref()) {
        Some(path) => Some(require_file(path)?),
        None => None,
    };

    let filters = FilterSet::load(blacklist, exclude)?;
    if let Some(path) = blacklist {
        info!(
            "Loaded {} blacklist items from {}",
            filters.blacklist().len(),
            path.display()
        );
    }
    Ok(filters)
}

fn require_file(path: &Path) -> Result<&Path> {
    if path.is_file() {
        Ok(path)
    } else {
        Err(CtkError::Validation(format!(
            "{} {}",
            error_messages::FILTER_FILE_MISSING,
            path.display()
        )))
    }
}

// ============================================================================
// Error Messages
// ============================================================================

/// Standard error message templates.
pub mod error_messages {
    /// Error when neither roots nor a fixture list were given.
    pub const NO_FIXTURE_SOURCE: &str = "No fixture roots or fixture list specified";

    /// Error when a blacklist or exclude file does not exist.
    pub const FILTER_FILE_MISSING: &str = "Filter file does not exist:";
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_classpath_aliases() {
        assert_eq!(resolve_classpath("stub"), Some(PathBuf::from(STUB_ARCHIVE)));
        assert_eq!(
            resolve_classpath("gnucp"),
            Some(PathBuf::from(GNU_CLASSPATH_ARCHIVE))
        );
        assert_eq!(resolve_classpath("none"), None);
        assert_eq!(
            resolve_classpath("/opt/rt.jar"),
            Some(PathBuf::from("/opt/rt.jar"))
        );
    }

    #[test]
    fn test_load_filters_from_flags() {
        let temp_dir = TempDir::new().unwrap();
        let blacklist = temp_dir.path().join("blacklist.txt");
        let exclude = temp_dir.path().join("exclude.txt");
        std::fs::write(&blacklist, "# comment\n@ignore\n").unwrap();
        std::fs::write(&exclude, "- /broken/\n").unwrap();

        let filters = load_filters(Some(&blacklist), Some(&exclude), &Config::default()).unwrap();
        assert_eq!(filters.blacklist(), ["@ignore".to_string()]);
        assert_eq!(filters.exclude(), ["/broken/".to_string()]);
    }

    #[test]
    fn test_missing_configured_blacklist_skipped() {
        let config = Config {
            blacklist: Some(PathBuf::from("/nonexistent/blacklist.txt")),
            ..Config::default()
        };
        let filters = load_filters(None, None, &config).unwrap();
        assert!(filters.blacklist().is_empty());
    }

    #[test]
    fn test_missing_flag_file_rejected() {
        let result = load_filters(
            Some(Path::new("/nonexistent/blacklist.txt")),
            None,
            &Config::default(),
        );
        assert!(matches!(result, Err(CtkError::Validation(_))));
    }
}
