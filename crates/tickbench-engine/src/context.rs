//! Per-test execution context: assertions, the scheduled-action timeline,
//! fail-fast and timeout handling, and bounds-checked world access.

use std::{
    any::Any,
    fmt, mem,
    panic::{self, AssertUnwindSafe},
    rc::Rc,
};

use tickbench_world::{BoundingBox, Cell, CellPos, WorldHandle};
use tracing::{debug, warn};

use crate::{definition::TestDefinition, layout::PlacementSlot, result::TestResult};

/// A registered check, re-evaluated at every refresh boundary.
pub type Assertion = Box<dyn FnMut(&Probe<'_>) -> Result<(), String>>;

/// Box a closure as an [`Assertion`] with the higher-ranked signature.
fn assertion<F>(f: F) -> Assertion
where
    F: FnMut(&Probe<'_>) -> Result<(), String> + 'static,
{
    Box::new(f)
}

/// A deferred action, fired once when its tick is reached.
type Action = Box<dyn FnOnce(&mut TestContext)>;

/// Pending entry on the timeline.
struct Scheduled {
    /// Tick, counted from context creation, at which the action becomes due.
    fire_tick: u64,
    /// The action itself.
    action: Action,
}

/// Read-only, bounds-checked view of a test's fixture handed to assertions.
pub struct Probe<'a> {
    /// Surface being observed.
    world: &'a WorldHandle,
    /// World position of the fixture's local origin.
    origin: CellPos,
    /// Valid local positions.
    bounds: BoundingBox,
}

impl Probe<'_> {
    /// Whether a local position lies inside the test area.
    #[must_use]
    pub fn contains(&self, pos: CellPos) -> bool {
        self.bounds.contains(pos)
    }

    /// Read a cell by local position. Positions outside the test area read
    /// as empty.
    #[must_use]
    pub fn cell(&self, pos: CellPos) -> Cell {
        if self.contains(pos) {
            self.world.get(self.origin + pos)
        } else {
            Cell::Empty
        }
    }
}

/// Mutable state of one running test.
///
/// Created at setup time, advanced once per tick, and dropped as soon as it
/// yields its [`TestResult`].
pub struct TestContext {
    /// Shared definition.
    definition: Rc<TestDefinition>,
    /// Surface all world access goes through.
    world: WorldHandle,
    /// Reserved region.
    slot: PlacementSlot,
    /// World position of local `(0, 0, 0)`.
    origin: CellPos,
    /// Valid local positions.
    bounds: BoundingBox,
    /// Registered assertions, in registration order.
    assertions: Vec<Assertion>,
    /// Actions not yet fired.
    scheduled: Vec<Scheduled>,
    /// Ticks advanced so far.
    current_tick: u64,
    /// Highest tick any action was scheduled for.
    last_scheduled_tick: u64,
    /// Set by unconditional failures and bounds violations.
    fail_fast: bool,
    /// Set once a terminal result has been returned.
    finished: bool,
}

impl TestContext {
    /// Context for `definition` placed at `slot`.
    #[must_use]
    pub fn new(definition: Rc<TestDefinition>, slot: PlacementSlot, world: WorldHandle) -> Self {
        Self {
            definition,
            world,
            origin: slot.fixture_origin(),
            bounds: slot.extent.local_bounds(),
            slot,
            assertions: Vec::new(),
            scheduled: Vec::new(),
            current_tick: 0,
            last_scheduled_tick: 0,
            fail_fast: false,
            finished: false,
        }
    }

    /// The test's definition.
    #[must_use]
    pub fn definition(&self) -> &Rc<TestDefinition> {
        &self.definition
    }

    /// Qualified test name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.definition.name().as_str()
    }

    /// Reserved region.
    #[must_use]
    pub fn slot(&self) -> PlacementSlot {
        self.slot
    }

    /// Ticks advanced so far.
    #[must_use]
    pub fn current_tick(&self) -> u64 {
        self.current_tick
    }

    /// Whether an unconditional failure has been recorded.
    #[must_use]
    pub fn is_fail_fast(&self) -> bool {
        self.fail_fast
    }

    /// Number of actions still waiting to fire.
    #[must_use]
    pub fn pending_actions(&self) -> usize {
        self.scheduled.len()
    }

    /// Number of registered assertions.
    #[must_use]
    pub fn assertion_count(&self) -> usize {
        self.assertions.len()
    }

    /// Invoke the test body once. A panicking body fails the test.
    pub fn run(&mut self) {
        let body = self.definition.body();
        self.guarded("test body", |ctx| body(ctx));
    }

    /// Fire `action` once `ticks` ticks have passed since context creation.
    ///
    /// Scheduling at or beyond the timeout also records a failure; the action
    /// still runs.
    pub fn schedule_after<F>(&mut self, ticks: u32, action: F)
    where
        F: FnOnce(&mut Self) + 'static,
    {
        let fire_tick = u64::from(ticks);
        self.last_scheduled_tick = self.last_scheduled_tick.max(fire_tick);
        self.scheduled.push(Scheduled {
            fire_tick,
            action: Box::new(action),
        });
        if let Some(timeout) = self.definition.timeout().as_ticks()
            && fire_tick >= timeout
        {
            let message = format!(
                "{}: action scheduled at tick {fire_tick} is not before the timeout of {timeout} ticks",
                self.name()
            );
            warn!(test = self.name(), fire_tick, timeout, "scheduled past timeout");
            self.assertions.push(assertion(move |_| Err(message.clone())));
        }
    }

    /// Register a boolean check.
    pub fn assert_true<F>(&mut self, mut condition: F, message: impl Into<String>)
    where
        F: FnMut(&Probe<'_>) -> bool + 'static,
    {
        let message = message.into();
        self.assertions.push(assertion(move |probe| {
            if condition(probe) {
                Ok(())
            } else {
                Err(message.clone())
            }
        }));
    }

    /// Register a check that supplies its own failure message.
    pub fn assert_that<F>(&mut self, supplier: F)
    where
        F: FnMut(&Probe<'_>) -> Result<(), String> + 'static,
    {
        self.assertions.push(assertion(supplier));
    }

    /// Register a check on one cell. The position is validated now; an
    /// out-of-bounds position fails the test instead of registering anything.
    pub fn assert_cell<F>(&mut self, pos: CellPos, mut predicate: F, message: impl Into<String>)
    where
        F: FnMut(&Cell) -> bool + 'static,
    {
        if self.relative_pos(pos).is_none() {
            return;
        }
        self.assert_true(move |probe| predicate(&probe.cell(pos)), message);
    }

    /// Register a check that the cell at `pos` holds exactly `expected`.
    pub fn assert_cell_is(&mut self, pos: CellPos, expected: Cell, message: impl Into<String>) {
        if self.relative_pos(pos).is_none() {
            return;
        }
        let message = message.into();
        self.assert_that(move |probe| {
            let found = probe.cell(pos);
            if found == expected {
                Ok(())
            } else {
                Err(format!("{message} (expected {expected} at {pos}, found {found})"))
            }
        });
    }

    /// Record a permanent failure and terminate at the next refresh boundary.
    pub fn fail(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!(test = self.name(), %message, "test failure recorded");
        self.fail_fast = true;
        self.assertions.push(assertion(move |_| Err(message.clone())));
    }

    /// Translate a local position into world coordinates.
    ///
    /// Positions outside the fixture fail the test and yield `None`.
    pub fn relative_pos(&mut self, pos: CellPos) -> Option<CellPos> {
        if self.bounds.contains(pos) {
            Some(self.origin + pos)
        } else {
            self.fail(format!(
                "Tried to access the position {pos} which was not inside the test area!"
            ));
            None
        }
    }

    /// Write a cell by local position. Returns whether the write happened.
    pub fn set_cell(&mut self, pos: CellPos, cell: Cell) -> bool {
        match self.relative_pos(pos) {
            Some(world_pos) => {
                self.world.set(world_pos, cell);
                true
            }
            None => false,
        }
    }

    /// Empty a cell by local position.
    pub fn clear_cell(&mut self, pos: CellPos) -> bool {
        self.set_cell(pos, Cell::Empty)
    }

    /// Read a cell by local position; empty when out of bounds.
    pub fn cell(&mut self, pos: CellPos) -> Cell {
        self.relative_pos(pos)
            .map(|world_pos| self.world.get(world_pos))
            .unwrap_or_default()
    }

    /// Read-only view over this test's fixture.
    #[must_use]
    pub fn probe(&self) -> Probe<'_> {
        Probe {
            world: &self.world,
            origin: self.origin,
            bounds: self.bounds,
        }
    }

    /// Advance one tick.
    ///
    /// Due actions run first. Assertions are skipped on a tick where an action
    /// fired or while any action is still scheduled; otherwise they are
    /// evaluated on refresh boundaries. Returns the terminal result exactly
    /// once.
    pub fn advance(&mut self) -> Option<TestResult> {
        if self.finished {
            return None;
        }
        let tick = self.current_tick;
        let fired = self.fire_due_actions(tick);
        let outcome = if fired || !self.scheduled.is_empty() {
            None
        } else if tick % u64::from(self.definition.refresh_ticks()) == 0 {
            self.evaluate(tick)
        } else {
            None
        };
        self.current_tick += 1;
        if outcome.is_some() {
            self.finished = true;
        }
        outcome
    }

    /// Run every action due at `tick`, earliest first. Returns whether any ran.
    fn fire_due_actions(&mut self, tick: u64) -> bool {
        let (mut due, pending): (Vec<_>, Vec<_>) = mem::take(&mut self.scheduled)
            .into_iter()
            .partition(|s| s.fire_tick <= tick);
        self.scheduled = pending;
        if due.is_empty() {
            return false;
        }
        due.sort_by_key(|s| s.fire_tick);
        for Scheduled { fire_tick, action } in due {
            debug!(test = self.name(), tick, fire_tick, "firing scheduled action");
            self.guarded("scheduled action", action);
        }
        true
    }

    /// Evaluate all assertions and decide whether the test has concluded.
    fn evaluate(&mut self, tick: u64) -> Option<TestResult> {
        let mut assertions = mem::take(&mut self.assertions);
        let mut errors = Vec::new();
        {
            let probe = self.probe();
            for check in &mut assertions {
                match panic::catch_unwind(AssertUnwindSafe(|| check(&probe))) {
                    Ok(Ok(())) => {}
                    Ok(Err(message)) => errors.push(message),
                    Err(payload) => errors.push(format!(
                        "assertion panicked: {}",
                        panic_message(payload.as_ref())
                    )),
                }
            }
        }
        self.assertions = assertions;

        if errors.is_empty() {
            debug!(test = self.name(), tick, "assertions passed");
            return Some(TestResult::pass());
        }
        if self.fail_fast {
            return Some(TestResult::fail(errors));
        }
        if let Some(timeout) = self.definition.timeout().as_ticks()
            && tick >= self.last_scheduled_tick + timeout
        {
            let mut message = format!("{} failed after time out at {timeout} ticks", self.name());
            if self.last_scheduled_tick > 0 {
                message.push_str(&format!(
                    " (counted from the last scheduled action at tick {})",
                    self.last_scheduled_tick
                ));
            }
            errors.push(message);
            return Some(TestResult::fail(errors));
        }
        debug!(test = self.name(), tick, failures = errors.len(), "still pending");
        None
    }

    /// Run `f`, turning a panic into a recorded failure.
    fn guarded<F>(&mut self, what: &str, f: F)
    where
        F: FnOnce(&mut Self),
    {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| f(self))) {
            let message = format!("{what} panicked: {}", panic_message(payload.as_ref()));
            self.fail(message);
        }
    }
}

impl fmt::Debug for TestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestContext")
            .field("name", &self.name())
            .field("slot", &self.slot)
            .field("current_tick", &self.current_tick)
            .field("last_scheduled_tick", &self.last_scheduled_tick)
            .field("assertions", &self.assertions.len())
            .field("scheduled", &self.scheduled.len())
            .field("fail_fast", &self.fail_fast)
            .finish_non_exhaustive()
    }
}

/// Best-effort text of a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
