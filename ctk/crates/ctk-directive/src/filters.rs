//! Content and path filters applied before fixtures are scheduled.
//!
//! A [`FilterSet`] is built once at startup from the blacklist and exclude
//! files and then passed by reference to the catalog and the parser.

use std::io;
use std::path::Path;

/// Immutable blacklist and exclude-pattern configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    blacklist: Vec<String>,
    exclude: Vec<String>,
}

impl FilterSet {
    /// Create a filter set from already parsed entries.
    pub fn new(blacklist: Vec<String>, exclude: Vec<String>) -> Self {
        Self { blacklist, exclude }
    }

    /// Load both lists from optional files.
    ///
    /// A `None` path leaves the corresponding list empty.
    ///
    /// # Errors
    /// Returns the I/O error of the first file that cannot be read.
    pub fn load(blacklist: Option<&Path>, exclude: Option<&Path>) -> io::Result<Self> {
        let blacklist = match blacklist {
            Some(path) => Self::read_entries(path)?,
            None => Vec::new(),
        };
        let exclude = match exclude {
            Some(path) => Self::read_entries(path)?,
            None => Vec::new(),
        };
        Ok(Self { blacklist, exclude })
    }

    /// Read a newline-delimited entry file.
    pub fn read_entries(path: &Path) -> io::Result<Vec<String>> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::parse_entries(&content))
    }

    /// Parse entry file content.
    ///
    /// Text from the first `#` on a line is a comment. A leading `- ` or `* `
    /// list marker is stripped. Blank lines are skipped.
    pub fn parse_entries(content: &str) -> Vec<String> {
        content
            .lines()
            .map(|line| match line.find('#') {
                Some(idx) => &line[..idx],
                None => line,
            })
            .map(str::trim)
            .map(strip_list_marker)
            .filter(|entry| !entry.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Blacklisted substrings.
    pub fn blacklist(&self) -> &[String] {
        &self.blacklist
    }

    /// Path substrings that exclude a fixture.
    pub fn exclude(&self) -> &[String] {
        &self.exclude
    }

    /// Whether the fixture text contains any blacklisted substring.
    pub fn is_blacklisted(&self, content: &str) -> bool {
        self.blacklist
            .iter()
            .any(|entry| content.contains(entry.as_str()))
    }

    /// Whether any exclude pattern is a substring of the full path.
    pub fn is_excluded(&self, path: &Path) -> bool {
        if self.exclude.is_empty() {
            return false;
        }
        let path = path.to_string_lossy();
        self.exclude
            .iter()
            .any(|pattern| path.contains(pattern.as_str()))
    }
}

fn strip_list_marker(entry: &str) -> &str {
    for marker in ["- ", "* "] {
        if let Some(rest) = entry.strip_prefix(marker) {
            return rest.trim_start();
        }
    }
    entry
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_parse_entries_comments_and_markers() {
        let entries = FilterSet::parse_entries(
            "# header comment\n\
             @ignore   # known unsupported\n\
             \n\
             - com.sun.tools.javac\n\
             * java.lang.invoke\n\
             -XDrawDiagnostics\n",
        );
        assert_eq!(
            entries,
            vec![
                "@ignore",
                "com.sun.tools.javac",
                "java.lang.invoke",
                "-XDrawDiagnostics",
            ]
        );
    }

    #[test]
    fn test_blacklist_substring_match() {
        let filters = FilterSet::new(vec!["@ignore".to_string()], vec![]);
        assert!(filters.is_blacklisted("/* @test\n * @ignore 1234\n */"));
        assert!(!filters.is_blacklisted("/* @test */"));
    }

    #[test]
    fn test_exclude_matches_full_path() {
        let filters = FilterSet::new(vec![], vec!["tools/javac/lambda".to_string()]);
        assert!(filters.is_excluded(&PathBuf::from("/t/tools/javac/lambda/A.java")));
        assert!(!filters.is_excluded(&PathBuf::from("/t/tools/javac/generics/A.java")));
    }

    #[test]
    fn test_load_from_files() {
        let temp_dir = TempDir::new().unwrap();
        let blacklist = temp_dir.path().join("blacklist.txt");
        std::fs::write(&blacklist, "@ignore\n").unwrap();

        let filters = FilterSet::load(Some(&blacklist), None).unwrap();
        assert_eq!(filters.blacklist(), &["@ignore".to_string()]);
        assert!(filters.exclude().is_empty());
    }

    #[test]
    fn test_load_missing_file_is_error() {
        let result = FilterSet::load(Some(Path::new("/nonexistent/blacklist.txt")), None);
        assert!(result.is_err());
    }
}
