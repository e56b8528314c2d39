//! Prepare command implementation.
//!
//! Scans fixture roots, prints every positive fixture with its
//! classification, and writes the fixture list consumed by `run --list`.

use std::path::PathBuf;

use ctk_engine::{Catalog, CatalogSummary, FixtureList};
use tracing::{debug, info};

use crate::commands::common::{error_messages, load_filters};
use crate::commands::traits::Command;
use crate::config::Config;
use crate::error::{CtkError, Result};

/// Arguments for the prepare command.
#[derive(Debug, Clone, Default)]
pub struct PrepareArgs {
    /// Fixture root directories.
    pub roots: Vec<PathBuf>,
    /// Fixture list to write.
    pub list: Option<PathBuf>,
    /// Blacklist file.
    pub blacklist: Option<PathBuf>,
    /// Exclude-pattern file.
    pub exclude: Option<PathBuf>,
}

/// Prepare command handler.
pub struct PrepareCommand {
    args: PrepareArgs,
    config: Config,
}

impl PrepareCommand {
    /// Roots from the command line, else from the configuration.
    fn roots(&self) -> Result<&[PathBuf]> {
        let roots = if self.args.roots.is_empty() {
            &self.config.roots
        } else {
            &self.args.roots
        };
        if roots.is_empty() {
            return Err(CtkError::Validation(
                error_messages::NO_FIXTURE_SOURCE.to_string(),
            ));
        }
        Ok(roots)
    }

    fn list_path(&self) -> PathBuf {
        self.args
            .list
            .clone()
            .unwrap_or_else(|| self.config.list.clone())
    }
}

impl Command for PrepareCommand {
    type Args = PrepareArgs;
    type Output = CatalogSummary;

    fn new(args: Self::Args, config: Config) -> Self {
        Self { args, config }
    }

    fn execute(&self) -> Result<Self::Output> {
        debug!(command = Self::name(), "executing");
        let roots = self.roots()?;
        let filters = load_filters(
            self.args.blacklist.as_deref(),
            self.args.exclude.as_deref(),
            &self.config,
        )?;

        info!("Scanning for fixtures...");
        let entries = Catalog::new(&filters).scan(roots);
        for entry in &entries {
            println!(
                "{} [{}]",
                entry.fixture.path().display(),
                entry.instructions.classification()
            );
        }

        let list = self.list_path();
        FixtureList::write(&list, &entries)?;

        let summary = CatalogSummary::of(&entries);
        println!("Found {} positive fixtures.", summary.total);
        println!("  Fixtures to run: {}", summary.runnable);
        println!("  Fixtures to compile: {}", summary.compile_only);
        println!("Fixture list written to {}", list.display());
        Ok(summary)
    }

    fn name() -> &'static str {
        "prepare"
    }
}

/// Run the prepare command.
pub fn run_prepare(args: PrepareArgs, config: Config) -> Result<CatalogSummary> {
    PrepareCommand::new(args, config).execute()
}
