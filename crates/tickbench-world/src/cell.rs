//! Cell contents.
use std::fmt;

use serde::{Deserialize, Serialize};

/// Contents of one cell of the world.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cell {
    /// Nothing; the default for every untouched cell.
    #[default]
    Empty,
    /// A named block, e.g. `"stone"` or `"lamp_lit"`.
    Block(String),
}

impl Cell {
    /// Shorthand for `Cell::Block(name.into())`.
    pub fn block(name: impl Into<String>) -> Self {
        Self::Block(name.into())
    }

    /// True for [`Cell::Empty`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Whether this cell is a block with the given name.
    #[must_use]
    pub fn is(&self, name: &str) -> bool {
        matches!(self, Self::Block(b) if b == name)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("empty"),
            Self::Block(name) => f.write_str(name),
        }
    }
}
