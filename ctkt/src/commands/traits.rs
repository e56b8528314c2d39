//! Command trait for the ctkt CLI.

use crate::config::Config;
use crate::error::Result;

/// Standard command trait that all ctkt commands implement.
///
/// # Type Parameters
/// * `Args` - The arguments type for this command
/// * `Output` - The output type returned by this command
pub trait Command {
    /// The arguments type for this command.
    type Args;

    /// The output type returned by this command.
    type Output;

    /// Create a new command instance.
    ///
    /// # Arguments
    /// * `args` - Command arguments
    /// * `config` - Loaded configuration that the arguments override
    fn new(args: Self::Args, config: Config) -> Self;

    /// Execute the command.
    ///
    /// # Returns
    /// * `Result<Self::Output>` - The command output or an error
    fn execute(&self) -> Result<Self::Output>;

    /// Get the command name.
    fn name() -> &'static str;
}
