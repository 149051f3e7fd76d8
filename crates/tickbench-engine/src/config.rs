//! Engine configuration: layout constants, definition defaults and runner limits.

use std::{fs, io, path::Path};

use ron::{Options, extensions::Extensions};
use serde::{Deserialize, Serialize};

use crate::{
    definition::Timeout,
    error::{Error, Result},
};

/// Layout planner constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Height of the floor layer every slot is built on.
    pub floor_y: i32,
    /// Cells reserved on each side of a fixture for the border and indicator.
    pub margin: i32,
    /// Empty cells between neighbouring slots and between rows.
    pub gap: i32,
}

/// Default layout: floor at `y = 3`, one-cell margin, three-cell gap.
pub const LAYOUT: LayoutConfig = LayoutConfig {
    floor_y: 3,
    margin: 1,
    gap: 3,
};

impl Default for LayoutConfig {
    fn default() -> Self {
        LAYOUT
    }
}

/// Values applied to definitions that do not set their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefinitionDefaults {
    /// Ticks between assertion evaluations.
    pub refresh_ticks: u32,
    /// Tick budget counted from the last scheduled action.
    pub timeout: Timeout,
}

/// Default refresh of 10 ticks and a 200 tick timeout.
pub const DEFAULTS: DefinitionDefaults = DefinitionDefaults {
    refresh_ticks: 10,
    timeout: Timeout::ticks(200),
};

impl Default for DefinitionDefaults {
    fn default() -> Self {
        DEFAULTS
    }
}

/// Full engine configuration, usually loaded from a RON file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Namespace used when deriving fixture references.
    pub namespace: String,
    /// Layout constants.
    pub layout: LayoutConfig,
    /// Definition defaults.
    pub defaults: DefinitionDefaults,
    /// Upper bound on ticks a headless run may pump before giving up.
    pub max_ticks: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            namespace: tickbench_ids::DEFAULT_NAMESPACE.to_string(),
            layout: LAYOUT,
            defaults: DEFAULTS,
            max_ticks: 20_000,
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from RON text.
    pub fn from_ron(text: &str, origin: &Path) -> Result<Self> {
        let options = Options::default().with_default_extension(Extensions::IMPLICIT_SOME);
        let config: Self = options.from_str(text).map_err(|e| Error::ConfigParse {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })?;
        config.validate(origin)?;
        Ok(config)
    }

    /// Load from `path`, falling back to defaults when the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(text) => Self::from_ron(&text, path),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(Error::ConfigRead {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Reject values the planner and contexts cannot work with.
    fn validate(&self, origin: &Path) -> Result<()> {
        let problem = if self.layout.margin < 1 {
            Some("layout.margin must be at least 1")
        } else if self.layout.gap < 0 {
            Some("layout.gap must not be negative")
        } else if self.defaults.refresh_ticks == 0 {
            Some("defaults.refresh_ticks must be greater than zero")
        } else if self.defaults.timeout == Timeout::Ticks(0) {
            Some("defaults.timeout must be positive or Never")
        } else {
            None
        };
        match problem {
            Some(message) => Err(Error::ConfigParse {
                path: origin.to_path_buf(),
                message: message.to_string(),
            }),
            None => Ok(()),
        }
    }
}
