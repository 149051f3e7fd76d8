//! tickbench-engine: orchestration of tick-driven spatial integration tests.
//!
//! A [`Registry`] of [`TestDefinition`]s is laid out by the [`LayoutPlanner`]
//! into non-overlapping [`PlacementSlot`]s. The [`Orchestrator`] verifies
//! fixtures, prepares slots, runs each body against its own [`TestContext`],
//! and then advances every context once per tick until all have concluded.
#![warn(missing_docs)]

mod command;
mod config;
mod context;
mod definition;
mod error;
mod feedback;
mod layout;
mod orchestrator;
mod registry;
mod result;

pub use command::{Command, dispatch};
pub use config::{DEFAULTS, DefinitionDefaults, EngineConfig, LAYOUT, LayoutConfig};
pub use context::{Assertion, Probe, TestContext};
pub use definition::{DynamicTest, TestBody, TestDefinition, TestDefinitionBuilder, Timeout};
pub use error::{Error, Result};
pub use feedback::{
    FeedbackSink, Fanout, INDICATOR_FAIL, INDICATOR_PASS, INDICATOR_RUNNING, INDICATOR_SETUP,
    IndicatorFeedback, RecordingFeedback, StatusUpdate, TestStatus, TracingFeedback,
};
pub use layout::{BORDER_BLOCKS, FLOOR_BLOCK, LayoutPlanner, Placement, PlacementSlot};
pub use orchestrator::{CommandReply, OrchestrationState, Orchestrator, TestOutcome};
pub use registry::{DiscoverySource, Group, Registry, RegistryBuilder};
pub use result::{Summary, TestResult};
pub use tickbench_ids::{FixtureRef, TestName};
