//! Command-line interface definitions for tickbench.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use logging::LogArgs;

/// Default configuration file, looked up in the working directory.
pub const DEFAULT_CONFIG: &str = "tickbench.ron";

/// Command-line interface for the `tickbench` binary.
#[derive(Parser, Debug)]
#[command(
    name = "tickbench",
    about = "Headless runner for tick-driven spatial integration tests",
    version
)]
pub struct Cli {
    /// Logging controls.
    #[command(flatten)]
    pub log: LogArgs,

    /// What to do with the suite.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level runner commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Verify, set up and run the suite, then exit with the failed count.
    Run(RunArgs),
    /// Print the planned placement slots without running anything.
    Plan(SuiteArgs),
    /// Print the registry in layout order.
    List(SuiteArgs),
}

/// Options shared by every command.
#[derive(Args, Debug, Clone)]
pub struct SuiteArgs {
    /// Engine configuration file (RON); missing files mean defaults.
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,

    /// Extra fixture directory laid out as `<dir>/<namespace>/<path>.ron`.
    #[arg(long, value_name = "DIR")]
    pub fixtures: Option<PathBuf>,

    /// Namespace for derived fixture references (overrides the config).
    #[arg(long, value_name = "NS")]
    pub namespace: Option<String>,
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Shared suite options.
    #[command(flatten)]
    pub suite: SuiteArgs,

    /// Give up after this many ticks (overrides the config).
    #[arg(long, value_name = "N")]
    pub max_ticks: Option<u64>,
}
