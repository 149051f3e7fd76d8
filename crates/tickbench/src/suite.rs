//! The built-in demonstration suite: a static case registry plus the
//! fixtures it runs on.

use std::path::PathBuf;

use tickbench_engine::{
    DefinitionDefaults, DiscoverySource, DynamicTest, Result as EngineResult, TestContext,
    TestDefinition, Timeout,
};
use tickbench_world::{
    DEFAULT_NAMESPACE, Error as WorldError, Fixture, FixtureRef, MemoryFixtureStore,
};

use crate::{cases, error::Result};

/// Registry entry describing one test.
pub struct CaseEntry {
    /// Declaring group.
    pub group: &'static str,
    /// Test name within the group.
    pub name: &'static str,
    /// Short description shown by `list`.
    pub info: &'static str,
    /// Refresh interval override.
    pub refresh_ticks: Option<u32>,
    /// Timeout override.
    pub timeout: Option<Timeout>,
    /// Test body.
    pub run: fn(&mut TestContext),
}

/// Registry entry describing a factory of dynamic tests sharing one fixture.
pub struct FactoryEntry {
    /// Declaring group.
    pub group: &'static str,
    /// Factory name within the group.
    pub name: &'static str,
    /// Short description shown by `list`.
    pub info: &'static str,
    /// Timeout override applied to every instance.
    pub timeout: Option<Timeout>,
    /// Produces the instances.
    pub tests: fn() -> Vec<DynamicTest>,
}

/// Static test cases, in registration order.
static CASES: &[CaseEntry] = &[
    CaseEntry {
        group: "Lamps",
        name: "lever_lights_lamp",
        info: "Signal travels from lever to lamp over two scheduled steps",
        refresh_ticks: None,
        timeout: None,
        run: cases::lever_lights_lamp,
    },
    CaseEntry {
        group: "Pistons",
        name: "push_block",
        info: "Extending piston pushes the block one cell",
        refresh_ticks: Some(5),
        timeout: None,
        run: cases::push_block,
    },
    CaseEntry {
        group: "Lamps",
        name: "lamp_stays_lit",
        info: "Directly powered lamp passes on the first evaluation",
        refresh_ticks: None,
        timeout: Some(Timeout::ticks(20)),
        run: cases::lamp_stays_lit,
    },
    CaseEntry {
        group: "Pistons",
        name: "retract",
        info: "Sticky piston extends, then pulls its block back",
        refresh_ticks: Some(2),
        timeout: Some(Timeout::ticks(40)),
        run: cases::retract,
    },
];

/// Dynamic test factories, registered after the static cases.
static FACTORIES: &[FactoryEntry] = &[FactoryEntry {
    group: "Counters",
    name: "fill",
    info: "Fill the first n cells of a row, one per tick",
    timeout: Some(Timeout::ticks(50)),
    tests: cases::fill_row,
}];

/// Fixtures shipped with the binary, relative to the `tickbench` namespace.
static FIXTURES: &[(&str, &str)] = &[
    (
        "lamps/lever_lights_lamp",
        include_str!("../fixtures/tickbench/lamps/lever_lights_lamp.ron"),
    ),
    (
        "lamps/lamp_stays_lit",
        include_str!("../fixtures/tickbench/lamps/lamp_stays_lit.ron"),
    ),
    (
        "pistons/push_block",
        include_str!("../fixtures/tickbench/pistons/push_block.ron"),
    ),
    (
        "pistons/retract",
        include_str!("../fixtures/tickbench/pistons/retract.ron"),
    ),
    (
        "counters/fill",
        include_str!("../fixtures/tickbench/counters/fill.ron"),
    ),
];

/// Discovery source over the static registries.
#[derive(Debug, Clone)]
pub struct Suite {
    /// Namespace for derived fixture references.
    namespace: String,
    /// Fallbacks for entries without overrides.
    defaults: DefinitionDefaults,
}

impl Suite {
    /// Suite deriving fixtures in `namespace`.
    pub fn new(namespace: impl Into<String>, defaults: DefinitionDefaults) -> Self {
        Self {
            namespace: namespace.into(),
            defaults,
        }
    }

    /// Case and factory descriptions keyed by qualified name prefix.
    pub fn descriptions() -> impl Iterator<Item = (String, &'static str)> {
        let cases = CASES
            .iter()
            .map(|c| (format!("{}.{}", c.group, c.name), c.info));
        let factories = FACTORIES
            .iter()
            .map(|f| (format!("{}.{}", f.group, f.name), f.info));
        cases.chain(factories)
    }
}

impl DiscoverySource for Suite {
    fn discover(&self) -> EngineResult<Vec<TestDefinition>> {
        let mut defs = Vec::new();
        for case in CASES {
            let mut builder = TestDefinition::builder(case.group, case.name)
                .namespace(&self.namespace)
                .defaults(self.defaults)
                .body(case.run);
            if let Some(ticks) = case.refresh_ticks {
                builder = builder.refresh_ticks(ticks);
            }
            if let Some(timeout) = case.timeout {
                builder = builder.timeout(timeout);
            }
            defs.push(builder.build()?);
        }
        for factory in FACTORIES {
            let mut builder = TestDefinition::builder(factory.group, factory.name)
                .namespace(&self.namespace)
                .defaults(self.defaults);
            if let Some(timeout) = factory.timeout {
                builder = builder.timeout(timeout);
            }
            defs.extend(builder.build_dynamic((factory.tests)())?);
        }
        Ok(defs)
    }
}

/// Parse the shipped fixtures into a store.
pub fn builtin_fixtures() -> Result<MemoryFixtureStore> {
    let mut store = MemoryFixtureStore::new();
    for (path, text) in FIXTURES {
        let fixture: Fixture = ron::from_str(text).map_err(|e| WorldError::Parse {
            path: PathBuf::from(format!("{path}.ron")),
            message: e.to_string(),
        })?;
        let fixture_ref =
            FixtureRef::new(DEFAULT_NAMESPACE, *path).map_err(WorldError::from)?;
        store.insert(fixture_ref, fixture)?;
    }
    Ok(store)
}
