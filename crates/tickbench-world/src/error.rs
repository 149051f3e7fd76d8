//! Error handling for the world crate.

use std::{io, path::PathBuf, result};

use thiserror::Error;
use tickbench_ids::FixtureRef;

/// Convenient result type for world operations.
pub type Result<T> = result::Result<T, Error>;

/// Errors raised by fixture stores and world loading.
#[derive(Debug, Error)]
pub enum Error {
    /// No fixture is registered under the reference.
    #[error("no fixture '{0}' found")]
    FixtureNotFound(FixtureRef),
    /// The fixture exists but its contents are unusable.
    #[error("fixture '{fixture}' is invalid: {message}")]
    InvalidFixture {
        /// Offending fixture.
        fixture: FixtureRef,
        /// What is wrong with it.
        message: String,
    },
    /// A fixture file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// File or directory being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// A fixture file could not be parsed.
    #[error("failed to parse {}: {message}", path.display())]
    Parse {
        /// File being parsed.
        path: PathBuf,
        /// Parser message.
        message: String,
    },
    /// A fixture file path does not map to a valid reference.
    #[error(transparent)]
    Id(#[from] tickbench_ids::Error),
}

impl Error {
    /// True for [`Error::FixtureNotFound`].
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::FixtureNotFound(_))
    }
}
