#![warn(missing_docs)]

//! Entry point for the `tickbench` headless runner.

mod cases;
mod cli;
mod error;
mod runner;
mod suite;

use std::process;

use clap::Parser;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, registry};

use crate::{
    cli::{Cli, Commands},
    error::Result,
};

fn main() {
    match run() {
        Ok(status) => process::exit(status),
        Err(err) => {
            error!("{err}");
            eprintln!("error: {err}");
            process::exit(1);
        }
    }
}

/// Parse CLI arguments, install logging, and dispatch to the chosen subcommand.
fn run() -> Result<i32> {
    let Cli { log, command } = Cli::parse();
    let env_filter = log.env_filter();
    registry()
        .with(env_filter)
        .with(fmt::layer().without_time())
        .try_init()
        .ok();

    match command {
        Commands::Run(args) => runner::run(&args),
        Commands::Plan(args) => runner::plan(&args).map(|()| 0),
        Commands::List(args) => runner::list(&args).map(|()| 0),
    }
}
