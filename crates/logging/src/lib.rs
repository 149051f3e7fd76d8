#![warn(missing_docs)]

//! Logging flags and `tracing` filter construction for tickbench binaries.
//!
//! Level flags are scoped to [`OUR_CRATES`] so dependencies stay quiet unless
//! an explicit filter or `RUST_LOG` asks for them.

use std::env;

use clap::Args;
use tracing_subscriber::EnvFilter;

/// Tracing targets that make up the workspace's own logs.
pub const OUR_CRATES: &[&str] = &[
    "tickbench",
    "tickbench_engine",
    "tickbench_world",
    "tickbench_ids",
    "logging",
];

/// Logging controls shared by tickbench CLIs.
#[derive(Debug, Clone, Default, Args)]
pub struct LogArgs {
    /// Log everything from our crates at trace level
    #[arg(long, conflicts_with_all = ["debug", "log_level", "log_filter"])]
    pub trace: bool,

    /// Log everything from our crates at debug level
    #[arg(long, conflicts_with_all = ["trace", "log_level", "log_filter"])]
    pub debug: bool,

    /// One level for all of our crates (error|warn|info|debug|trace)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Raw filter directive, overriding every other flag,
    /// e.g. "tickbench_engine=trace,tickbench_world=debug"
    #[arg(long)]
    pub log_filter: Option<String>,
}

impl LogArgs {
    /// Filter directive for these flags.
    ///
    /// Precedence: `--log-filter`, then `--trace`/`--debug`/`--log-level`,
    /// then `RUST_LOG`, then `info` for our crates.
    pub fn spec(&self) -> String {
        if let Some(filter) = &self.log_filter {
            return filter.clone();
        }
        let level = if self.trace {
            Some("trace")
        } else if self.debug {
            Some("debug")
        } else {
            self.log_level.as_deref()
        };
        match level {
            Some(level) => scoped(level),
            None => env::var("RUST_LOG").unwrap_or_else(|_| scoped("info")),
        }
    }

    /// `EnvFilter` built from [`LogArgs::spec`].
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::new(self.spec())
    }
}

/// Directive setting `level` on every target in [`OUR_CRATES`].
pub fn scoped(level: &str) -> String {
    let level = level.to_ascii_lowercase();
    OUR_CRATES
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_filter_wins() {
        let args = LogArgs {
            log_level: Some("warn".into()),
            log_filter: Some("tickbench_engine=trace".into()),
            ..LogArgs::default()
        };
        assert_eq!(args.spec(), "tickbench_engine=trace");
    }

    #[test]
    fn levels_are_scoped_to_our_crates() {
        let args = LogArgs {
            debug: true,
            ..LogArgs::default()
        };
        let spec = args.spec();
        assert_eq!(spec.split(',').count(), OUR_CRATES.len());
        assert!(spec.contains("tickbench_engine=debug"));

        let args = LogArgs {
            log_level: Some("WARN".into()),
            ..LogArgs::default()
        };
        assert_eq!(args.spec(), scoped("warn"));
    }

    #[test]
    fn filter_example_names_our_crates() {
        for target in ["tickbench_engine", "tickbench_world"] {
            assert!(OUR_CRATES.contains(&target), "{target}");
        }
    }
}
