//! Error handling for the orchestration engine.

use std::{io, path::PathBuf, result};

use thiserror::Error;
use tickbench_world::Extent;

/// Convenient result type for engine operations.
pub type Result<T> = result::Result<T, Error>;

/// Errors surfaced by the engine's fallible, non-orchestration APIs.
///
/// Orchestration itself never returns these to the tick driver; verification
/// problems and invalid transitions are reported through
/// [`CommandReply`](crate::CommandReply) instead.
#[derive(Debug, Error)]
pub enum Error {
    /// Fixture store or world failure.
    #[error(transparent)]
    World(#[from] tickbench_world::Error),
    /// Malformed fixture reference or test name.
    #[error(transparent)]
    Id(#[from] tickbench_ids::Error),
    /// A test definition failed validation during discovery.
    #[error("invalid test definition '{name}': {message}")]
    InvalidDefinition {
        /// Name of the rejected test.
        name: String,
        /// Why it was rejected.
        message: String,
    },
    /// Two definitions share a qualified name.
    #[error("duplicate test name '{0}'")]
    DuplicateTest(String),
    /// Engine configuration could not be read.
    #[error("failed to read config {}: {source}", path.display())]
    ConfigRead {
        /// Config file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Engine configuration could not be parsed.
    #[error("failed to parse config {}: {message}", path.display())]
    ConfigParse {
        /// Config file path.
        path: PathBuf,
        /// Parser message.
        message: String,
    },
    /// Placing a fixture of this size would leave the world's coordinate range.
    #[error("layout overflows world coordinates at fixture size {0}")]
    LayoutOverflow(Extent),
    /// Text did not name a known trigger command.
    #[error("unknown command '{0}' (expected verify, setup or run)")]
    UnknownCommand(String),
}

impl Error {
    /// Helper to build an [`Error::InvalidDefinition`].
    pub fn invalid_definition<N: Into<String>, M: Into<String>>(name: N, message: M) -> Self {
        Self::InvalidDefinition {
            name: name.into(),
            message: message.into(),
        }
    }
}
