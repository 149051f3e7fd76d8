//! Error handling for the tickbench runner.

use std::result;

use thiserror::Error;

/// Convenient result type for runner operations.
pub type Result<T> = result::Result<T, Error>;

/// Errors that can stop the runner before a summary is printed.
#[derive(Debug, Error)]
pub enum Error {
    /// Engine configuration, discovery or layout errors.
    #[error("Engine error: {0}")]
    Engine(#[from] tickbench_engine::Error),
    /// Fixture loading errors.
    #[error("Fixture error: {0}")]
    Fixture(#[from] tickbench_world::Error),
    /// A trigger command was rejected.
    #[error("Command '{command}' failed: {message}")]
    Command {
        /// Command that failed.
        command: String,
        /// Reply text.
        message: String,
    },
    /// Tests were still running after the configured tick limit.
    #[error("Tests still running after {ticks} ticks ({active} active)")]
    TickLimit {
        /// Ticks pumped.
        ticks: u64,
        /// Contexts that never concluded.
        active: usize,
    },
}
