//! Shared identifiers for tests and the fixtures they are built on.
#![warn(missing_docs)]

use std::{fmt, str::FromStr, sync::OnceLock};

use regex::Regex;
use thiserror::Error;

/// Namespace used when a fixture reference is written without one.
pub const DEFAULT_NAMESPACE: &str = "tickbench";

/// Errors produced while parsing identifiers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// The namespace part contained characters outside `[a-z0-9_.-]`.
    #[error("invalid fixture namespace '{0}' (expected [a-z0-9_.-]+)")]
    Namespace(String),
    /// The path part contained characters outside `[a-z0-9_./-]`.
    #[error("invalid fixture path '{0}' (expected [a-z0-9_./-]+)")]
    Path(String),
    /// A test name was empty after trimming.
    #[error("test names must not be empty")]
    EmptyName,
}

/// Compiled pattern for namespaces.
fn namespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z0-9_.-]+$").expect("static namespace regex"))
}

/// Compiled pattern for paths.
fn path_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z0-9_.-]+(/[a-z0-9_.-]+)*$").expect("static path regex"))
}

/// Reference to a fixture held by a fixture store, written `namespace:path`.
///
/// References are always lowercase. The path may contain `/` separators, which
/// map to directories when fixtures are loaded from disk.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FixtureRef {
    /// Owning namespace, e.g. the crate or suite name.
    namespace: String,
    /// Slash separated path inside the namespace.
    path: String,
}

impl FixtureRef {
    /// Construct a reference after validating both parts.
    pub fn new(namespace: impl Into<String>, path: impl Into<String>) -> Result<Self, Error> {
        let namespace = namespace.into();
        let path = path.into();
        if !namespace_re().is_match(&namespace) {
            return Err(Error::Namespace(namespace));
        }
        if !path_re().is_match(&path) {
            return Err(Error::Path(path));
        }
        Ok(Self { namespace, path })
    }

    /// Derive the conventional reference for a test: `namespace:{group}/{test}`, lowercased.
    pub fn derived(namespace: &str, group: &str, test: &str) -> Result<Self, Error> {
        Self::new(
            namespace.to_lowercase(),
            format!("{group}/{test}").to_lowercase(),
        )
    }

    /// Namespace part.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Path part.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for FixtureRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}

impl FromStr for FixtureRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((ns, path)) => Self::new(ns, path),
            None => Self::new(DEFAULT_NAMESPACE, s),
        }
    }
}

/// Qualified test name, `Group.test` or `Group.factory/instance` for dynamic tests.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TestName(String);

impl TestName {
    /// Qualify `test` with its declaring group.
    pub fn qualified(group: &str, test: &str) -> Result<Self, Error> {
        let test = test.trim();
        if test.is_empty() {
            return Err(Error::EmptyName);
        }
        let group = group.trim();
        if group.is_empty() {
            Ok(Self(test.to_string()))
        } else {
            Ok(Self(format!("{group}.{test}")))
        }
    }

    /// Append a dynamic instance suffix: `name/instance`.
    #[must_use]
    pub fn instance(&self, instance: &str) -> Self {
        Self(format!("{}/{}", self.0, instance))
    }

    /// Borrow the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TestName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TestName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
