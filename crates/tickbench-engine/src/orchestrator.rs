//! The orchestration state machine: verify, set up, run and tick every test.

use std::fmt;

use tickbench_ids::TestName;
use tickbench_world::{FixtureStore, WorldHandle};
use tracing::{debug, info, warn};

use crate::{
    config::{EngineConfig, LayoutConfig},
    context::TestContext,
    error::Result,
    feedback::{FeedbackSink, StatusUpdate, TestStatus, TracingFeedback},
    layout::{LayoutPlanner, Placement, PlacementSlot},
    registry::Registry,
    result::{Summary, TestResult},
};

/// Lifecycle state of an [`Orchestrator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OrchestrationState {
    /// Nothing verified yet.
    #[default]
    Waiting,
    /// Every fixture resolved.
    Verified,
    /// Slots prepared and contexts created.
    Setup,
    /// Bodies ran; contexts are being ticked.
    Running,
    /// Every context concluded.
    Finished,
}

impl fmt::Display for OrchestrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Waiting => "waiting",
            Self::Verified => "verified",
            Self::Setup => "setup",
            Self::Running => "running",
            Self::Finished => "finished",
        })
    }
}

/// Text reply to a triggered operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandReply {
    /// Whether the operation succeeded.
    pub success: bool,
    /// Human-readable lines, in order.
    pub lines: Vec<String>,
}

impl CommandReply {
    /// Successful reply with one line.
    #[must_use]
    pub fn ok(line: impl Into<String>) -> Self {
        Self {
            success: true,
            lines: vec![line.into()],
        }
    }

    /// Failed reply with one line.
    #[must_use]
    pub fn failed(line: impl Into<String>) -> Self {
        Self {
            success: false,
            lines: vec![line.into()],
        }
    }
}

impl fmt::Display for CommandReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lines.join("\n"))
    }
}

/// A concluded test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestOutcome {
    /// Qualified test name.
    pub name: TestName,
    /// Slot the test ran in.
    pub slot: PlacementSlot,
    /// Its terminal result.
    pub result: TestResult,
}

/// Owns the registry, the collaborators and every active context.
///
/// One instance drives one suite; whatever advances the simulation calls
/// [`Orchestrator::tick`] once per step.
pub struct Orchestrator {
    /// Discovered tests.
    registry: Registry,
    /// Fixture sizes and content.
    store: Box<dyn FixtureStore>,
    /// Shared surface.
    world: WorldHandle,
    /// Slot assignment.
    planner: LayoutPlanner,
    /// Status notifications.
    feedback: Box<dyn FeedbackSink>,
    /// Current lifecycle state.
    state: OrchestrationState,
    /// Contexts that have not concluded, in placement order.
    active: Vec<TestContext>,
    /// Concluded tests, in completion order.
    outcomes: Vec<TestOutcome>,
    /// Pass/fail counters for the current cycle.
    summary: Summary,
    /// Ticks pumped while running.
    tick: u64,
}

impl Orchestrator {
    /// Orchestrator with the default layout and tracing feedback.
    pub fn new<S>(registry: Registry, store: S, world: WorldHandle) -> Self
    where
        S: FixtureStore + 'static,
    {
        Self {
            registry,
            store: Box::new(store),
            world,
            planner: LayoutPlanner::default(),
            feedback: Box::new(TracingFeedback),
            state: OrchestrationState::Waiting,
            active: Vec::new(),
            outcomes: Vec::new(),
            summary: Summary::default(),
            tick: 0,
        }
    }

    /// Use these layout constants.
    #[must_use]
    pub fn with_layout(mut self, layout: LayoutConfig) -> Self {
        self.planner = LayoutPlanner::new(layout);
        self
    }

    /// Apply the relevant parts of an engine configuration.
    #[must_use]
    pub fn with_config(self, config: &EngineConfig) -> Self {
        self.with_layout(config.layout)
    }

    /// Replace the feedback sink.
    #[must_use]
    pub fn with_feedback(mut self, sink: impl FeedbackSink + 'static) -> Self {
        self.feedback = Box::new(sink);
        self
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> OrchestrationState {
        self.state
    }

    /// The registry being driven.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The shared surface.
    #[must_use]
    pub fn world(&self) -> &WorldHandle {
        &self.world
    }

    /// Number of contexts still running.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Slots of the contexts still running.
    pub fn active_slots(&self) -> impl Iterator<Item = (&str, PlacementSlot)> {
        self.active.iter().map(|ctx| (ctx.name(), ctx.slot()))
    }

    /// Ticks pumped in the current cycle.
    #[must_use]
    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Counters for the current cycle.
    #[must_use]
    pub fn summary(&self) -> Summary {
        self.summary
    }

    /// Concluded tests, in completion order.
    #[must_use]
    pub fn outcomes(&self) -> &[TestOutcome] {
        &self.outcomes
    }

    /// Outcome of one test, if it has concluded.
    #[must_use]
    pub fn outcome(&self, name: &str) -> Option<&TestOutcome> {
        self.outcomes.iter().find(|o| o.name.as_str() == name)
    }

    /// True once every test has concluded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.state == OrchestrationState::Finished
    }

    /// True when any test in the current cycle failed.
    #[must_use]
    pub fn has_failed_tests(&self) -> bool {
        self.summary.failed > 0
    }

    /// Plan the layout without touching the world.
    pub fn plan(&self) -> Result<Vec<Placement>> {
        self.planner.plan(&self.registry, self.store.as_ref())
    }

    /// Check that every fixture resolves. A no-op success after the first
    /// successful verification.
    pub fn verify(&mut self) -> CommandReply {
        if self.state != OrchestrationState::Waiting {
            return CommandReply::ok(format!("Already verified. Current status = {}", self.state));
        }
        let mut lines = Vec::new();
        for def in self.registry.iter() {
            if let Err(err) = self.store.resolve(def.fixture()) {
                warn!(test = %def.name(), fixture = %def.fixture(), %err, "verification failed");
                lines.push(if err.is_not_found() {
                    format!(
                        "Test '{}' failed verification: No fixture '{}' found.",
                        def.name(),
                        def.fixture()
                    )
                } else {
                    format!("Test '{}' failed verification: {err}", def.name())
                });
            }
        }
        if lines.is_empty() {
            self.state = OrchestrationState::Verified;
            info!(tests = self.registry.len(), "verified all tests");
            return CommandReply::ok("Verified all tests.");
        }
        lines.push("One or more tests failed verification.".to_string());
        CommandReply {
            success: false,
            lines,
        }
    }

    /// Lay out every test, prepare its slot, materialize its fixture and
    /// create its context. Valid from verified, finished or setup.
    pub fn setup_all(&mut self) -> CommandReply {
        if !matches!(
            self.state,
            OrchestrationState::Verified | OrchestrationState::Finished | OrchestrationState::Setup
        ) {
            return CommandReply::failed(format!(
                "Setup not possible - tests may still be running. Current status = {}",
                self.state
            ));
        }

        self.summary = Summary::default();
        self.active.clear();
        self.outcomes.clear();
        self.tick = 0;

        let placements = match self.plan() {
            Ok(placements) => placements,
            Err(err) => {
                warn!(%err, "layout failed");
                self.state = OrchestrationState::Verified;
                return CommandReply::failed(format!("Setup failed: {err}"));
            }
        };

        self.state = OrchestrationState::Setup;
        for Placement { definition, slot } in placements {
            let materialized = self.world.with(|surface| {
                slot.prepare(surface);
                self.store
                    .materialize(definition.fixture(), slot.fixture_origin(), surface)
            });
            if let Err(err) = materialized {
                warn!(test = %definition.name(), %err, "fixture placement failed");
                // Prepared slots stay in the world; mark each of them failed.
                let aborted = format!("setup aborted: {err}");
                let discarded = self
                    .active
                    .drain(..)
                    .map(|ctx| (ctx.definition().name().clone(), ctx.slot()))
                    .chain([(definition.name().clone(), slot)]);
                for (name, slot) in discarded {
                    self.feedback.status(&StatusUpdate {
                        name,
                        slot,
                        status: TestStatus::Failed(vec![aborted.clone()]),
                    });
                }
                self.state = OrchestrationState::Verified;
                return CommandReply::failed(format!(
                    "Setup failed for '{}': {err}",
                    definition.name()
                ));
            }
            debug!(test = %definition.name(), origin = %slot.origin, "slot ready");
            self.feedback.status(&StatusUpdate {
                name: definition.name().clone(),
                slot,
                status: TestStatus::Setup,
            });
            self.active
                .push(TestContext::new(definition, slot, self.world.clone()));
        }

        info!(tests = self.active.len(), "setup finished");
        CommandReply::ok("Setup Finished!")
    }

    /// Run every body once, in placement order. Valid only from setup.
    pub fn run_all(&mut self) -> CommandReply {
        if self.state != OrchestrationState::Setup {
            return CommandReply::failed(format!(
                "Cannot run tests now! Current status = {}",
                self.state
            ));
        }
        if self.active.is_empty() {
            self.state = OrchestrationState::Finished;
            info!("no tests to run");
            return CommandReply::ok("No tests found.");
        }
        for ctx in &mut self.active {
            ctx.run();
            self.feedback.status(&StatusUpdate {
                name: ctx.definition().name().clone(),
                slot: ctx.slot(),
                status: TestStatus::Running,
            });
        }
        self.state = OrchestrationState::Running;
        info!(tests = self.active.len(), "running tests");
        CommandReply::ok("Running Tests...")
    }

    /// Advance every active context by one tick.
    ///
    /// A no-op unless running. Returns the final summary on the tick the last
    /// context concludes.
    pub fn tick(&mut self) -> Option<Summary> {
        if self.state != OrchestrationState::Running {
            return None;
        }
        self.tick += 1;

        let Self {
            active,
            feedback,
            outcomes,
            summary,
            ..
        } = self;
        active.retain_mut(|ctx| {
            let Some(result) = ctx.advance() else {
                return true;
            };
            summary.record(&result);
            let status = if result.is_success() {
                TestStatus::Passed
            } else {
                TestStatus::Failed(result.errors().to_vec())
            };
            let name = ctx.definition().name().clone();
            feedback.status(&StatusUpdate {
                name: name.clone(),
                slot: ctx.slot(),
                status,
            });
            outcomes.push(TestOutcome {
                name,
                slot: ctx.slot(),
                result,
            });
            false
        });

        if !self.active.is_empty() {
            return None;
        }
        self.state = OrchestrationState::Finished;
        info!(ticks = self.tick, "Integration Testing Complete!");
        info!("{}", self.summary);
        info!("{}", self.summary.failed_line());
        Some(self.summary)
    }

    /// Pump [`Orchestrator::tick`] until finished or `max_ticks` have passed.
    pub fn run_until_complete(&mut self, max_ticks: u64) -> Option<Summary> {
        if self.is_complete() {
            return Some(self.summary);
        }
        for _ in 0..max_ticks {
            if let Some(summary) = self.tick() {
                return Some(summary);
            }
            if self.state != OrchestrationState::Running {
                return None;
            }
        }
        None
    }
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("state", &self.state)
            .field("tests", &self.registry.len())
            .field("active", &self.active.len())
            .field("summary", &self.summary)
            .field("tick", &self.tick)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use tickbench_world::{Extent, Fixture, FixtureRef, MemoryFixtureStore};

    use super::*;
    use crate::definition::TestDefinition;

    fn store_with(refs: &[&str]) -> MemoryFixtureStore {
        let mut store = MemoryFixtureStore::new();
        for r in refs {
            let r: FixtureRef = r.parse().unwrap();
            store.insert(r, Fixture::empty(Extent::new(2, 2, 2))).unwrap();
        }
        store
    }

    fn registry() -> Registry {
        let defs = vec![TestDefinition::builder("G", "t").body(|_| {}).build().unwrap()];
        Registry::from_source(&defs).unwrap()
    }

    #[test]
    fn state_names_are_lowercase() {
        assert_eq!(OrchestrationState::Waiting.to_string(), "waiting");
        assert_eq!(OrchestrationState::Finished.to_string(), "finished");
    }

    #[test]
    fn missing_fixture_blocks_setup() {
        let mut orch = Orchestrator::new(registry(), store_with(&[]), WorldHandle::grid());
        let reply = orch.verify();
        assert!(!reply.success);
        assert!(reply.lines[0].contains("No fixture 'tickbench:g/t' found"), "{reply}");
        assert_eq!(orch.state(), OrchestrationState::Waiting);
        assert!(!orch.setup_all().success);
        assert_eq!(orch.active_count(), 0);
    }

    #[test]
    fn lifecycle_runs_to_finished() {
        let mut orch =
            Orchestrator::new(registry(), store_with(&["tickbench:g/t"]), WorldHandle::grid());
        assert!(orch.verify().success);
        assert!(orch.verify().success);
        assert!(orch.setup_all().success);
        assert_eq!(orch.active_count(), 1);
        assert!(orch.run_all().success);
        assert_eq!(orch.state(), OrchestrationState::Running);
        let summary = orch.tick().unwrap();
        assert_eq!(summary.passed, 1);
        assert!(orch.is_complete());
        assert!(!orch.has_failed_tests());
        assert!(orch.tick().is_none());

        assert!(orch.setup_all().success);
        assert_eq!(orch.summary(), Summary::default());
        assert!(orch.outcomes().is_empty());
    }
}
