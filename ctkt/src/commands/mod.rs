//! Command modules for the ctkt CLI.
//!
//! Each subcommand is implemented in its own file following the
//! [`traits::Command`] pattern.

pub mod common;
pub mod traits;

pub mod prepare;
pub mod run;

pub use prepare::{run_prepare, PrepareArgs};
pub use run::{run_fixtures, RunArgs};
