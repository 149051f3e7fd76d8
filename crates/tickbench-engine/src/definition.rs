//! Static test metadata produced by discovery.

use std::{fmt, rc::Rc};

use serde::{Deserialize, Serialize};
use tickbench_ids::{FixtureRef, TestName};

use crate::{
    config::{DEFAULTS, DefinitionDefaults},
    context::TestContext,
    error::{Error, Result},
};

/// Executable test body. Invoked once per run with the test's context.
pub type TestBody = Rc<dyn Fn(&mut TestContext)>;

/// Tick budget for a test, counted from its last scheduled action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeout {
    /// Fail once this many ticks have passed with assertions still failing.
    Ticks(u32),
    /// Never time out; the test stays pending until it passes or fails fast.
    Never,
}

impl Timeout {
    /// Const constructor for [`Timeout::Ticks`].
    #[must_use]
    pub const fn ticks(n: u32) -> Self {
        Self::Ticks(n)
    }

    /// The finite budget, if any.
    #[must_use]
    pub const fn as_ticks(self) -> Option<u64> {
        match self {
            Self::Ticks(n) => Some(n as u64),
            Self::Never => None,
        }
    }
}

impl fmt::Display for Timeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ticks(n) => write!(f, "{n} ticks"),
            Self::Never => f.write_str("no timeout"),
        }
    }
}

/// Immutable description of one test.
#[derive(Clone)]
pub struct TestDefinition {
    /// Qualified name, unique within a registry.
    name: TestName,
    /// Declaring group; only affects ordering and layout rows.
    group: String,
    /// Fixture the test runs on.
    fixture: FixtureRef,
    /// Ticks between assertion evaluations, always positive.
    refresh_ticks: u32,
    /// Timeout budget.
    timeout: Timeout,
    /// Test body.
    body: TestBody,
}

impl TestDefinition {
    /// Start building a definition for `test` declared in `group`.
    pub fn builder(group: impl Into<String>, test: impl Into<String>) -> TestDefinitionBuilder {
        TestDefinitionBuilder {
            group: group.into(),
            test: test.into(),
            namespace: tickbench_ids::DEFAULT_NAMESPACE.to_string(),
            fixture: None,
            refresh_ticks: None,
            timeout: None,
            defaults: DEFAULTS,
            body: None,
        }
    }

    /// Qualified test name.
    #[must_use]
    pub fn name(&self) -> &TestName {
        &self.name
    }

    /// Declaring group key.
    #[must_use]
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Fixture reference.
    #[must_use]
    pub fn fixture(&self) -> &FixtureRef {
        &self.fixture
    }

    /// Assertion refresh interval in ticks.
    #[must_use]
    pub fn refresh_ticks(&self) -> u32 {
        self.refresh_ticks
    }

    /// Timeout budget.
    #[must_use]
    pub fn timeout(&self) -> Timeout {
        self.timeout
    }

    /// Shared handle to the body.
    #[must_use]
    pub fn body(&self) -> TestBody {
        Rc::clone(&self.body)
    }
}

impl fmt::Debug for TestDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestDefinition")
            .field("name", &self.name)
            .field("group", &self.group)
            .field("fixture", &self.fixture)
            .field("refresh_ticks", &self.refresh_ticks)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// One instance produced by a test factory.
#[derive(Clone)]
pub struct DynamicTest {
    /// Instance name, appended to the factory name.
    name: String,
    /// Instance body.
    body: TestBody,
}

impl DynamicTest {
    /// A named dynamic test.
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&mut TestContext) + 'static,
    {
        Self {
            name: name.into(),
            body: Rc::new(body),
        }
    }

    /// Number a sequence of bodies `1, 2, 3, ...`.
    pub fn numbered<I, F>(bodies: I) -> Vec<Self>
    where
        I: IntoIterator<Item = F>,
        F: Fn(&mut TestContext) + 'static,
    {
        bodies
            .into_iter()
            .enumerate()
            .map(|(i, body)| Self::new((i + 1).to_string(), body))
            .collect()
    }
}

/// Builder validating a [`TestDefinition`] before it can reach a registry.
pub struct TestDefinitionBuilder {
    /// Declaring group.
    group: String,
    /// Unqualified test (or factory) name.
    test: String,
    /// Namespace for derived fixture references.
    namespace: String,
    /// Explicit fixture, if any.
    fixture: Option<FixtureRef>,
    /// Explicit refresh interval.
    refresh_ticks: Option<u32>,
    /// Explicit timeout.
    timeout: Option<Timeout>,
    /// Fallbacks for unset values.
    defaults: DefinitionDefaults,
    /// Body for single tests.
    body: Option<TestBody>,
}

impl TestDefinitionBuilder {
    /// Set the test body.
    #[must_use]
    pub fn body<F>(mut self, body: F) -> Self
    where
        F: Fn(&mut TestContext) + 'static,
    {
        self.body = Some(Rc::new(body));
        self
    }

    /// Use an explicit fixture instead of the derived `namespace:group/test`.
    #[must_use]
    pub fn fixture(mut self, fixture: FixtureRef) -> Self {
        self.fixture = Some(fixture);
        self
    }

    /// Namespace used for the derived fixture reference.
    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Assertion refresh interval.
    #[must_use]
    pub fn refresh_ticks(mut self, ticks: u32) -> Self {
        self.refresh_ticks = Some(ticks);
        self
    }

    /// Timeout budget.
    #[must_use]
    pub fn timeout(mut self, timeout: Timeout) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Defaults for values not set explicitly.
    #[must_use]
    pub fn defaults(mut self, defaults: DefinitionDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Validate and produce a single definition.
    pub fn build(self) -> Result<TestDefinition> {
        let name = TestName::qualified(&self.group, &self.test)?;
        let Some(body) = self.body.clone() else {
            return Err(Error::invalid_definition(name.as_str(), "missing test body"));
        };
        self.finish(name, body)
    }

    /// Produce one definition per dynamic test, all sharing this builder's
    /// fixture and timing. Instances are named `group.test/instance`.
    pub fn build_dynamic<I>(self, tests: I) -> Result<Vec<TestDefinition>>
    where
        I: IntoIterator<Item = DynamicTest>,
    {
        let base = TestName::qualified(&self.group, &self.test)?;
        tests
            .into_iter()
            .map(|t| self.finish(base.instance(&t.name), t.body))
            .collect()
    }

    /// Apply defaults, validate timing and derive the fixture.
    fn finish(&self, name: TestName, body: TestBody) -> Result<TestDefinition> {
        let refresh_ticks = self.refresh_ticks.unwrap_or(self.defaults.refresh_ticks);
        if refresh_ticks == 0 {
            return Err(Error::invalid_definition(
                name.as_str(),
                "refresh_ticks must be greater than zero",
            ));
        }
        let timeout = self.timeout.unwrap_or(self.defaults.timeout);
        if timeout == Timeout::Ticks(0) {
            return Err(Error::invalid_definition(
                name.as_str(),
                "timeout must be a positive tick count or Never",
            ));
        }
        let fixture = match &self.fixture {
            Some(f) => f.clone(),
            None => FixtureRef::derived(&self.namespace, &self.group, &self.test)?,
        };
        Ok(TestDefinition {
            name,
            group: self.group.clone(),
            fixture,
            refresh_ticks,
            timeout,
            body,
        })
    }
}
