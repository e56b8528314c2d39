//! ctkt - compliance test runner.
//!
//! Entry point for the ctkt CLI. Parses arguments with clap, initializes
//! logging, loads `ctk.toml`, and dispatches to the command handlers.

mod commands;
mod config;
mod error;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{run_fixtures, run_prepare, PrepareArgs, RunArgs};
use config::Config;
use error::{CtkError, Result};

/// ctkt - run compliance test fixtures against a compiler and runtime
///
/// Fixtures carry their own `@test` directive blocks. `prepare` discovers
/// them and writes a fixture list; `run` compiles and executes them in
/// isolated sandboxes and reports the outcomes.
#[derive(Parser, Debug)]
#[command(name = "ctkt")]
#[command(author = "CTK Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Run compliance test fixtures against a compiler and runtime", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true, env = "CTKT_VERBOSE")]
    verbose: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "CTKT_CONFIG")]
    config: Option<PathBuf>,

    /// Disable color output
    #[arg(long, global = true, env = "CTKT_NO_COLOR")]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands for the ctkt CLI.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Discover fixtures and write a fixture list
    ///
    /// Scans the roots for positive fixtures, prints each with its
    /// classification, and writes their paths to the fixture list.
    Prepare(PrepareCommand),

    /// Compile and execute fixtures
    ///
    /// Runs fixtures from a fixture list or from scanned roots and prints a
    /// summary. Exits with status 1 unless every fixture succeeded.
    Run(RunCommand),
}

/// Arguments for the prepare subcommand.
#[derive(Parser, Debug)]
struct PrepareCommand {
    /// Fixture root directory (repeatable; default: from config)
    #[arg(short, long = "root")]
    roots: Vec<PathBuf>,

    /// Fixture list to write (default: test_whitelist.txt)
    #[arg(short, long)]
    list: Option<PathBuf>,

    /// Blacklist file of content substrings
    #[arg(long)]
    blacklist: Option<PathBuf>,

    /// Exclude file of path substrings
    #[arg(long)]
    exclude: Option<PathBuf>,
}

/// Arguments for the run subcommand.
#[derive(Parser, Debug)]
struct RunCommand {
    /// Fixture root directory (repeatable; default: from config)
    #[arg(short, long = "root")]
    roots: Vec<PathBuf>,

    /// Fixture list written by prepare
    #[arg(short, long)]
    list: Option<PathBuf>,

    /// Run at most N randomly chosen fixtures (0: no limit)
    #[arg(long)]
    limit: Option<usize>,

    /// Seed for --limit selection
    #[arg(long, requires = "limit")]
    seed: Option<u64>,

    /// Timeout per compiler or runtime invocation, in seconds
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Compiler binary
    #[arg(long, env = "CTKT_COMPILER")]
    compiler: Option<String>,

    /// Runtime binary
    #[arg(long, env = "CTKT_RUNTIME")]
    runtime: Option<String>,

    /// Extra compiler argument (repeatable)
    #[arg(long = "arg", allow_hyphen_values = true)]
    compiler_args: Vec<String>,

    /// Extra runtime argument (repeatable)
    #[arg(long = "runtime-arg", allow_hyphen_values = true)]
    runtime_args: Vec<String>,

    /// Bootclasspath: stub, gnucp, none, or an archive path
    #[arg(long)]
    classpath: Option<String>,

    /// Only compile fixtures
    #[arg(long)]
    compile_only: bool,

    /// Do not print successful fixtures
    #[arg(long)]
    no_success: bool,

    /// Print captured output of unsuccessful fixtures
    #[arg(long)]
    verbose_failures: bool,

    /// Number of parallel jobs
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Write the run report as JSON
    #[arg(long)]
    report: Option<PathBuf>,

    /// Blacklist file of content substrings
    #[arg(long)]
    blacklist: Option<PathBuf>,

    /// Exclude file of path substrings
    #[arg(long)]
    exclude: Option<PathBuf>,

    /// Directory for fixture sandboxes (default: system temp dir)
    #[arg(long)]
    work_dir: Option<PathBuf>,
}

/// Main entry point for the ctkt CLI.
///
/// # Returns
/// * `Result<ExitCode>` - Success unless a run had unsuccessful fixtures
fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose, cli.no_color)?;

    // Load configuration
    let config = load_config(cli.config.as_deref())?;

    // Execute the selected command
    execute_command(cli.command, config)
}

/// Initialize the logging system.
///
/// # Arguments
/// * `verbose` - Whether to enable verbose logging
/// * `no_color` - Whether to disable colored output
///
/// # Returns
/// * `Result<()>` - Success or an error
fn init_logging(verbose: bool, no_color: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    let subscriber = fmt::layer()
        .with_ansi(!no_color)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(subscriber)
        .try_init()
        .map_err(|e| CtkError::Config(format!("Failed to initialize logging: {}", e)))?;

    Ok(())
}

/// Load configuration from file or use defaults.
///
/// # Arguments
/// * `config_path` - Optional path to configuration file
///
/// # Returns
/// * `Result<Config>` - The loaded configuration or an error
fn load_config(config_path: Option<&std::path::Path>) -> Result<Config> {
    match config_path {
        Some(path) => Config::load_from_path(path),
        None => Config::load(),
    }
}

/// Execute the selected command.
fn execute_command(command: Commands, config: Config) -> Result<ExitCode> {
    match command {
        Commands::Prepare(args) => execute_prepare(args, config),
        Commands::Run(args) => execute_run(args, config),
    }
}

/// Execute the prepare command.
fn execute_prepare(args: PrepareCommand, config: Config) -> Result<ExitCode> {
    let prepare_args = PrepareArgs {
        roots: args.roots,
        list: args.list,
        blacklist: args.blacklist,
        exclude: args.exclude,
    };
    run_prepare(prepare_args, config)?;
    Ok(ExitCode::SUCCESS)
}

/// Execute the run command.
fn execute_run(args: RunCommand, config: Config) -> Result<ExitCode> {
    let run_args = RunArgs {
        roots: args.roots,
        list: args.list,
        limit: args.limit,
        seed: args.seed,
        timeout: args.timeout,
        compiler: args.compiler,
        runtime: args.runtime,
        compiler_args: args.compiler_args,
        runtime_args: args.runtime_args,
        classpath: args.classpath,
        compile_only: args.compile_only,
        no_success: args.no_success,
        verbose_failures: args.verbose_failures,
        jobs: args.jobs,
        report: args.report,
        blacklist: args.blacklist,
        exclude: args.exclude,
        work_dir: args.work_dir,
    };
    let report = run_fixtures(run_args, config)?;
    if report.all_succeeded() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_prepare() {
        let cli = Cli::parse_from(["ctkt", "prepare", "--root", "tests/jdk"]);
        if let Commands::Prepare(args) = cli.command {
            assert_eq!(args.roots, vec![PathBuf::from("tests/jdk")]);
            assert_eq!(args.list, None);
        } else {
            panic!("Expected Prepare command");
        }
    }

    #[test]
    fn test_cli_parse_prepare_multiple_roots() {
        let cli = Cli::parse_from(["ctkt", "prepare", "-r", "a", "-r", "b", "--list", "out.txt"]);
        if let Commands::Prepare(args) = cli.command {
            assert_eq!(args.roots, vec![PathBuf::from("a"), PathBuf::from("b")]);
            assert_eq!(args.list, Some(PathBuf::from("out.txt")));
        } else {
            panic!("Expected Prepare command");
        }
    }

    #[test]
    fn test_cli_parse_run_defaults() {
        let cli = Cli::parse_from(["ctkt", "run"]);
        if let Commands::Run(args) = cli.command {
            assert!(args.roots.is_empty());
            assert!(!args.compile_only);
            assert!(args.compiler_args.is_empty());
        } else {
            panic!("Expected Run command");
        }
    }

    #[test]
    fn test_cli_parse_run_with_limit_and_seed() {
        let cli = Cli::parse_from(["ctkt", "run", "--limit", "10", "--seed", "42"]);
        if let Commands::Run(args) = cli.command {
            assert_eq!(args.limit, Some(10));
            assert_eq!(args.seed, Some(42));
        } else {
            panic!("Expected Run command");
        }
    }

    #[test]
    fn test_cli_seed_requires_limit() {
        assert!(Cli::try_parse_from(["ctkt", "run", "--seed", "42"]).is_err());
    }

    #[test]
    fn test_cli_parse_run_compiler_args_with_hyphens() {
        let cli = Cli::parse_from(["ctkt", "run", "--arg", "-nowarn", "--arg", "-g"]);
        if let Commands::Run(args) = cli.command {
            assert_eq!(args.compiler_args, vec!["-nowarn", "-g"]);
        } else {
            panic!("Expected Run command");
        }
    }

    #[test]
    fn test_cli_parse_run_flags() {
        let cli = Cli::parse_from([
            "ctkt",
            "run",
            "--list",
            "whitelist.txt",
            "--classpath",
            "stub",
            "--compile-only",
            "--no-success",
            "--verbose-failures",
            "--jobs",
            "3",
            "--timeout",
            "9",
        ]);
        if let Commands::Run(args) = cli.command {
            assert_eq!(args.list, Some(PathBuf::from("whitelist.txt")));
            assert_eq!(args.classpath, Some("stub".to_string()));
            assert!(args.compile_only);
            assert!(args.no_success);
            assert!(args.verbose_failures);
            assert_eq!(args.jobs, Some(3));
            assert_eq!(args.timeout, Some(9));
        } else {
            panic!("Expected Run command");
        }
    }

    #[test]
    fn test_cli_parse_global_flags() {
        let cli = Cli::parse_from(["ctkt", "--verbose", "--no-color", "--config", "ctk.toml", "run"]);
        assert!(cli.verbose);
        assert!(cli.no_color);
        assert_eq!(cli.config, Some(PathBuf::from("ctk.toml")));
    }
}
