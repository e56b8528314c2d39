//! Configuration module for the ctkt CLI.
//!
//! Settings come from an optional `ctk.toml`; command-line flags override
//! them field by field.

use dirs::{config_dir, home_dir};
use num_cpus::get as get_num_cpus;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{CtkError, Result};

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "ctk.toml";

/// Application configuration structure.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Config {
    /// Compiler binary, as a path or a name on `PATH`.
    #[serde(default = "default_compiler")]
    pub compiler: String,

    /// Runtime binary, as a path or a name on `PATH`.
    #[serde(default = "default_runtime")]
    pub runtime: String,

    /// Extra arguments for every compiler invocation.
    #[serde(default)]
    pub compiler_args: Vec<String>,

    /// Extra arguments for every runtime invocation.
    #[serde(default)]
    pub runtime_args: Vec<String>,

    /// Bootclasspath alias (`stub`, `gnucp`, `none`) or archive path.
    #[serde(default = "default_classpath")]
    pub classpath: String,

    /// Per-invocation timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Number of parallel workers.
    #[serde(default = "default_jobs")]
    pub jobs: usize,

    /// Blacklist file; skipped when it does not exist.
    #[serde(default = "default_blacklist")]
    pub blacklist: Option<PathBuf>,

    /// Exclude-pattern file.
    #[serde(default)]
    pub exclude: Option<PathBuf>,

    /// Fixture root directories.
    #[serde(default)]
    pub roots: Vec<PathBuf>,

    /// Directory that sandboxes are created in (default: system temp dir).
    #[serde(default)]
    pub work_dir: Option<PathBuf>,

    /// Fixture list written by `prepare`.
    #[serde(default = "default_list")]
    pub list: PathBuf,
}

fn default_compiler() -> String {
    "javac".to_string()
}

fn default_runtime() -> String {
    "java".to_string()
}

fn default_classpath() -> String {
    "gnucp".to_string()
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_jobs() -> usize {
    get_num_cpus()
}

fn default_blacklist() -> Option<PathBuf> {
    Some(PathBuf::from("./scripts/test-blacklist.txt"))
}

fn default_list() -> PathBuf {
    PathBuf::from("test_whitelist.txt")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            compiler: default_compiler(),
            runtime: default_runtime(),
            compiler_args: Vec::new(),
            runtime_args: Vec::new(),
            classpath: default_classpath(),
            timeout_secs: default_timeout_secs(),
            jobs: default_jobs(),
            blacklist: default_blacklist(),
            exclude: None,
            roots: Vec::new(),
            work_dir: None,
            list: default_list(),
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Searches for configuration in the following order:
    /// 1. Current directory
    /// 2. User's home directory
    /// 3. System configuration directory
    ///
    /// Returns the default configuration if no config file is found.
    pub fn load() -> Result<Self> {
        match Self::find_config_file() {
            Some(path) => Self::load_from_path(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific path.
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    /// * `Result<Config>` - The loaded configuration or an error
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CtkError::Config(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| CtkError::Config(format!("Failed to parse configuration: {}", e)))
    }

    /// Check for config in current directory.
    fn check_current_dir_config() -> Option<PathBuf> {
        let path = PathBuf::from(CONFIG_FILE_NAME);
        path.exists().then_some(path)
    }

    /// Check for config in home directory.
    fn check_home_config() -> Option<PathBuf> {
        home_dir()
            .map(|dir| dir.join(".config").join("ctk").join(CONFIG_FILE_NAME))
            .filter(|path| path.exists())
    }

    /// Check for config in system config directory.
    fn check_system_config() -> Option<PathBuf> {
        config_dir()
            .map(|dir| dir.join("ctk").join(CONFIG_FILE_NAME))
            .filter(|path| path.exists())
    }

    /// Find the configuration file in standard locations.
    fn find_config_file() -> Option<PathBuf> {
        Self::check_current_dir_config()
            .or_else(Self::check_home_config)
            .or_else(Self::check_system_config)
    }
}
