use tickbench_engine::{
    Command, DynamicTest, Fanout, INDICATOR_FAIL, INDICATOR_PASS, IndicatorFeedback,
    OrchestrationState, Orchestrator, RecordingFeedback, Registry, TestContext, TestDefinition,
    TestStatus, Timeout, dispatch,
};
use tickbench_world::{
    Cell, CellPos, Error as WorldError, Extent, Fixture, FixtureRef, FixtureStore,
    MemoryFixtureStore, Result as WorldResult, WorldHandle, WorldSurface,
};

const LAMP: CellPos = CellPos::new(1, 0, 1);

fn store(entries: &[(&str, Fixture)]) -> MemoryFixtureStore {
    let mut store = MemoryFixtureStore::new();
    for (r, fixture) in entries {
        let r: FixtureRef = r.parse().unwrap();
        store.insert(r, fixture.clone()).unwrap();
    }
    store
}

fn lamp_fixture() -> Fixture {
    Fixture::empty(Extent::new(3, 2, 3)).with_cell((1, 1, 1), Cell::block("lever"))
}

fn delayed_lamp() -> TestDefinition {
    TestDefinition::builder("Lamps", "delayed")
        .body(|ctx| {
            ctx.schedule_after(10, |ctx| {
                ctx.set_cell(LAMP, Cell::block("lamp_on"));
            });
            ctx.assert_cell_is(LAMP, Cell::block("lamp_on"), "lamp is off");
        })
        .build()
        .unwrap()
}

#[test]
fn scheduled_action_lets_test_pass() {
    let registry = Registry::from_source(&vec![delayed_lamp()]).unwrap();
    let recorder = RecordingFeedback::new();
    let mut orch = Orchestrator::new(
        registry,
        store(&[("tickbench:lamps/delayed", lamp_fixture())]),
        WorldHandle::grid(),
    )
    .with_feedback(recorder.clone());

    assert!(Command::Setup.execute(&mut orch).success);
    assert!(Command::Run.execute(&mut orch).success);

    assert!(orch.tick().is_none());
    assert_eq!(orch.active_count(), 1);
    let summary = orch.run_until_complete(1_000).unwrap();
    assert_eq!(summary.passed, 1);
    assert_eq!(summary.failed, 0);
    assert!(orch.outcome("Lamps.delayed").unwrap().result.is_success());
    assert_eq!(
        recorder.statuses_for("Lamps.delayed"),
        [TestStatus::Setup, TestStatus::Running, TestStatus::Passed]
    );
}

#[test]
fn run_from_waiting_is_rejected() {
    let registry = Registry::from_source(&vec![delayed_lamp()]).unwrap();
    let mut orch = Orchestrator::new(registry, MemoryFixtureStore::new(), WorldHandle::grid());
    let reply = orch.run_all();
    assert!(!reply.success);
    assert_eq!(reply.lines, ["Cannot run tests now! Current status = waiting"]);
    assert_eq!(orch.state(), OrchestrationState::Waiting);
    assert_eq!(orch.active_count(), 0);
    assert!(orch.tick().is_none());
}

#[test]
fn setup_stops_when_verification_fails() {
    let registry = Registry::from_source(&vec![delayed_lamp()]).unwrap();
    let mut orch = Orchestrator::new(registry, MemoryFixtureStore::new(), WorldHandle::grid());
    let reply = dispatch(&mut orch, "integrationTest setup");
    assert!(!reply.success);
    assert!(reply.lines.iter().any(|l| l.contains("No fixture 'tickbench:lamps/delayed'")));
    assert_eq!(orch.state(), OrchestrationState::Waiting);

    let reply = dispatch(&mut orch, "teardown");
    assert!(!reply.success);
    assert!(reply.lines[0].contains("unknown command"));
}

#[test]
fn out_of_bounds_writes_are_suppressed() {
    let def = TestDefinition::builder("Escape", "attempt")
        .body(|ctx: &mut TestContext| {
            ctx.set_cell(CellPos::new(3, 0, 0), Cell::block("tnt"));
            ctx.set_cell(CellPos::new(0, -1, 0), Cell::block("tnt"));
        })
        .build()
        .unwrap();
    let world = WorldHandle::grid();
    let mut orch = Orchestrator::new(
        Registry::from_source(&vec![def]).unwrap(),
        store(&[("tickbench:escape/attempt", Fixture::empty(Extent::new(3, 3, 3)))]),
        world.clone(),
    );
    assert!(Command::Setup.execute(&mut orch).success);
    let writes_before = snapshot(&world);
    assert!(orch.run_all().success);
    assert_eq!(snapshot(&world), writes_before);

    let summary = orch.run_until_complete(10).unwrap();
    assert_eq!(summary.failed, 1);
    let outcome = orch.outcome("Escape.attempt").unwrap();
    assert_eq!(outcome.result.errors().len(), 2);
    assert!(outcome.result.errors()[0].contains("(3, 0, 0)"));
}

/// Every non-empty cell inside a generous box around the origin.
fn snapshot(world: &WorldHandle) -> Vec<(CellPos, Cell)> {
    let mut cells = Vec::new();
    for x in -2..12 {
        for y in 0..12 {
            for z in -2..12 {
                let pos = CellPos::new(x, y, z);
                let cell = world.get(pos);
                if !cell.is_empty() {
                    cells.push((pos, cell));
                }
            }
        }
    }
    cells
}

#[test]
fn contexts_leave_the_active_set_when_they_conclude() {
    let quick = TestDefinition::builder("Mixed", "quick")
        .body(|_| {})
        .build()
        .unwrap();
    let slow = TestDefinition::builder("Mixed", "slow")
        .refresh_ticks(1)
        .timeout(Timeout::ticks(3))
        .body(|ctx| ctx.assert_true(|_| false, "never"))
        .build()
        .unwrap();
    let mut orch = Orchestrator::new(
        Registry::from_source(&vec![quick, slow]).unwrap(),
        store(&[
            ("tickbench:mixed/quick", Fixture::empty(Extent::new(1, 1, 1))),
            ("tickbench:mixed/slow", Fixture::empty(Extent::new(1, 1, 1))),
        ]),
        WorldHandle::grid(),
    );
    assert!(Command::Setup.execute(&mut orch).success);
    assert!(orch.run_all().success);

    assert!(orch.tick().is_none());
    assert_eq!(orch.active_count(), 1);
    assert_eq!(orch.outcomes().len(), 1);
    assert!(orch.tick().is_none());
    assert!(orch.tick().is_none());
    let summary = orch.tick().unwrap();
    assert_eq!((summary.passed, summary.failed), (1, 1));
    assert_eq!(orch.outcomes().len(), 2);
    assert!(orch.has_failed_tests());
    assert_eq!(summary.to_string(), "Passed: 1 / 2 (50.0 %)");
}

#[test]
fn setup_prepares_slots_and_indicators_stay_inside() {
    let world = WorldHandle::grid();
    let recorder = RecordingFeedback::new();
    let mut orch = Orchestrator::new(
        Registry::from_source(&vec![delayed_lamp()]).unwrap(),
        store(&[("tickbench:lamps/delayed", lamp_fixture())]),
        world.clone(),
    )
    .with_feedback(
        Fanout::new()
            .with(recorder.clone())
            .with(IndicatorFeedback::new(world.clone())),
    );
    assert!(Command::Setup.execute(&mut orch).success);
    let slot = orch.plan().unwrap()[0].slot;
    let volume = slot.volume();
    assert!(world.get(slot.fixture_origin().offset(1, 1, 1)).is("lever"));
    assert!(world.get(slot.origin.offset(1, 0, 1)).is("floor"));

    assert!(orch.run_all().success);
    orch.run_until_complete(1_000).unwrap();
    assert!(world.get(slot.indicator()).is(INDICATOR_PASS));
    assert!(snapshot(&world).iter().all(|(p, _)| volume.contains(*p)));
}

#[test]
fn dynamic_tests_run_side_by_side() {
    let lit = |ctx: &mut TestContext| {
        ctx.set_cell(LAMP, Cell::block("lamp_on"));
        ctx.assert_cell_is(LAMP, Cell::block("lamp_on"), "lamp is off");
    };
    let defs = TestDefinition::builder("Lamps", "grid")
        .build_dynamic([
            DynamicTest::new("lit", lit),
            DynamicTest::new("dark", |ctx| {
                ctx.assert_cell_is(LAMP, Cell::block("lamp_on"), "lamp is off");
            }),
        ])
        .unwrap();
    assert!(defs.iter().all(|d| d.fixture().to_string() == "tickbench:lamps/grid"));
    let mut orch = Orchestrator::new(
        Registry::from_source(&defs).unwrap(),
        store(&[("tickbench:lamps/grid", lamp_fixture())]),
        WorldHandle::grid(),
    );
    assert!(Command::Setup.execute(&mut orch).success);
    assert!(orch.run_all().success);
    let summary = orch.run_until_complete(1_000).unwrap();
    assert_eq!((summary.passed, summary.failed), (1, 1));
    assert!(orch.outcome("Lamps.grid/lit").unwrap().result.is_success());
    assert!(!orch.outcome("Lamps.grid/dark").unwrap().result.is_success());

    // a finished suite can be set up again from scratch
    assert!(Command::Setup.execute(&mut orch).success);
    assert_eq!(orch.state(), OrchestrationState::Setup);
    assert_eq!(orch.active_count(), 2);
    assert!(orch.outcomes().is_empty());
}

#[test]
fn empty_registry_finishes_immediately() {
    let mut orch =
        Orchestrator::new(Registry::default(), MemoryFixtureStore::new(), WorldHandle::grid());
    assert!(Command::Setup.execute(&mut orch).success);
    let reply = orch.run_all();
    assert!(reply.success);
    assert_eq!(reply.lines, ["No tests found."]);
    assert!(orch.is_complete());
}

/// Store whose fixtures resolve but refuse to materialize for one reference.
struct BrokenStore {
    inner: MemoryFixtureStore,
    broken: FixtureRef,
}

impl FixtureStore for BrokenStore {
    fn resolve(&self, fixture: &FixtureRef) -> WorldResult<Extent> {
        self.inner.resolve(fixture)
    }

    fn materialize(
        &self,
        fixture: &FixtureRef,
        origin: CellPos,
        world: &mut dyn WorldSurface,
    ) -> WorldResult<()> {
        if *fixture == self.broken {
            return Err(WorldError::FixtureNotFound(fixture.clone()));
        }
        self.inner.materialize(fixture, origin, world)
    }
}

#[test]
fn failed_setup_marks_prepared_slots_failed() {
    let first = TestDefinition::builder("Partial", "first")
        .body(|_| {})
        .build()
        .unwrap();
    let second = TestDefinition::builder("Partial", "second")
        .body(|_| {})
        .build()
        .unwrap();
    let world = WorldHandle::grid();
    let recorder = RecordingFeedback::new();
    let store = BrokenStore {
        inner: store(&[
            ("tickbench:partial/first", Fixture::empty(Extent::new(2, 2, 2))),
            ("tickbench:partial/second", Fixture::empty(Extent::new(2, 2, 2))),
        ]),
        broken: "tickbench:partial/second".parse().unwrap(),
    };
    let mut orch = Orchestrator::new(
        Registry::from_source(&vec![first, second]).unwrap(),
        store,
        world.clone(),
    )
    .with_feedback(
        Fanout::new()
            .with(recorder.clone())
            .with(IndicatorFeedback::new(world.clone())),
    );

    let reply = Command::Setup.execute(&mut orch);
    assert!(!reply.success);
    assert!(reply.to_string().contains("Partial.second"), "{reply}");
    assert_eq!(orch.state(), OrchestrationState::Verified);
    assert_eq!(orch.active_count(), 0);

    let first_statuses = recorder.statuses_for("Partial.first");
    assert_eq!(first_statuses.len(), 2);
    assert_eq!(first_statuses[0], TestStatus::Setup);
    assert!(matches!(
        &first_statuses[1],
        TestStatus::Failed(errors) if errors[0].starts_with("setup aborted")
    ));
    assert!(matches!(
        recorder.statuses_for("Partial.second").as_slice(),
        [TestStatus::Failed(_)]
    ));
    for placement in orch.plan().unwrap() {
        assert!(world.get(placement.slot.indicator()).is(INDICATOR_FAIL));
    }
}
