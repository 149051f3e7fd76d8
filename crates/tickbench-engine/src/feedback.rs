//! Write-only status notifications for human-visible reporting.

use std::{cell::RefCell, fmt, rc::Rc};

use tickbench_ids::TestName;
use tickbench_world::{Cell, WorldHandle};
use tracing::{info, warn};

use crate::layout::PlacementSlot;

/// Indicator block shown while a slot is set up but not yet running.
pub const INDICATOR_SETUP: &str = "indicator_setup";
/// Indicator block shown while a test is running.
pub const INDICATOR_RUNNING: &str = "indicator_running";
/// Indicator block for a passed test.
pub const INDICATOR_PASS: &str = "indicator_pass";
/// Indicator block for a failed test.
pub const INDICATOR_FAIL: &str = "indicator_fail";

/// Lifecycle status of one test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestStatus {
    /// Fixture placed, body not yet run.
    Setup,
    /// Body ran; waiting for a result.
    Running,
    /// Concluded successfully.
    Passed,
    /// Concluded with these errors.
    Failed(Vec<String>),
}

impl TestStatus {
    /// Indicator block for this status.
    #[must_use]
    pub fn indicator_block(&self) -> &'static str {
        match self {
            Self::Setup => INDICATOR_SETUP,
            Self::Running => INDICATOR_RUNNING,
            Self::Passed => INDICATOR_PASS,
            Self::Failed(_) => INDICATOR_FAIL,
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Setup => "Setup",
            Self::Running => "Running",
            Self::Passed => "Pass",
            Self::Failed(_) => "Fail",
        })
    }
}

/// One status transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    /// Test the update is about.
    pub name: TestName,
    /// The test's reserved region.
    pub slot: PlacementSlot,
    /// New status.
    pub status: TestStatus,
}

/// Receives status transitions. Nothing is returned to the engine.
pub trait FeedbackSink {
    /// Deliver one update.
    fn status(&mut self, update: &StatusUpdate);
}

impl<S: FeedbackSink + ?Sized> FeedbackSink for Box<S> {
    fn status(&mut self, update: &StatusUpdate) {
        (**self).status(update);
    }
}

/// Logs every transition through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingFeedback;

impl FeedbackSink for TracingFeedback {
    fn status(&mut self, update: &StatusUpdate) {
        match &update.status {
            TestStatus::Failed(errors) => {
                warn!(test = %update.name, "Test Failed {}", update.name);
                for error in errors {
                    warn!(test = %update.name, "{error}");
                }
            }
            status => info!(test = %update.name, %status, "test status"),
        }
    }
}

/// Writes a marker block into each slot's indicator cell.
#[derive(Debug, Clone)]
pub struct IndicatorFeedback {
    /// Surface the markers are written to.
    world: WorldHandle,
}

impl IndicatorFeedback {
    /// Indicator sink over `world`.
    #[must_use]
    pub fn new(world: WorldHandle) -> Self {
        Self { world }
    }
}

impl FeedbackSink for IndicatorFeedback {
    fn status(&mut self, update: &StatusUpdate) {
        self.world.set(
            update.slot.indicator(),
            Cell::block(update.status.indicator_block()),
        );
    }
}

/// Collects updates in memory. Clones share the same log.
#[derive(Debug, Default, Clone)]
pub struct RecordingFeedback {
    /// Shared log of everything delivered.
    updates: Rc<RefCell<Vec<StatusUpdate>>>,
}

impl RecordingFeedback {
    /// Empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all updates so far.
    #[must_use]
    pub fn updates(&self) -> Vec<StatusUpdate> {
        self.updates.borrow().clone()
    }

    /// Status sequence recorded for one test.
    #[must_use]
    pub fn statuses_for(&self, name: &str) -> Vec<TestStatus> {
        self.updates
            .borrow()
            .iter()
            .filter(|u| u.name.as_str() == name)
            .map(|u| u.status.clone())
            .collect()
    }
}

impl FeedbackSink for RecordingFeedback {
    fn status(&mut self, update: &StatusUpdate) {
        self.updates.borrow_mut().push(update.clone());
    }
}

/// Forwards every update to each inner sink, in order.
#[derive(Default)]
pub struct Fanout {
    /// Inner sinks.
    sinks: Vec<Box<dyn FeedbackSink>>,
}

impl Fanout {
    /// Empty fanout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sink.
    #[must_use]
    pub fn with(mut self, sink: impl FeedbackSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }
}

impl fmt::Debug for Fanout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fanout")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

impl FeedbackSink for Fanout {
    fn status(&mut self, update: &StatusUpdate) {
        for sink in &mut self.sinks {
            sink.status(update);
        }
    }
}

#[cfg(test)]
mod tests {
    use tickbench_world::{CellPos, Extent};

    use super::*;

    fn update(status: TestStatus) -> StatusUpdate {
        StatusUpdate {
            name: TestName::qualified("G", "t").unwrap(),
            slot: PlacementSlot {
                origin: CellPos::new(4, 3, 8),
                extent: Extent::new(2, 2, 2),
                margin: 1,
            },
            status,
        }
    }

    #[test]
    fn fanout_reaches_every_sink() {
        let world = WorldHandle::grid();
        let recorder = RecordingFeedback::new();
        let mut sink = Fanout::new()
            .with(recorder.clone())
            .with(IndicatorFeedback::new(world.clone()))
            .with(TracingFeedback);
        sink.status(&update(TestStatus::Running));
        sink.status(&update(TestStatus::Failed(vec!["bad".into()])));

        assert_eq!(
            recorder.statuses_for("G.t"),
            [TestStatus::Running, TestStatus::Failed(vec!["bad".into()])]
        );
        assert!(world.get(CellPos::new(4, 3, 8)).is(INDICATOR_FAIL));
    }
}
