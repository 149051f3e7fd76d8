//! Read-only, grouped collection of discovered test definitions.

use std::{collections::HashSet, rc::Rc};

use crate::{
    definition::TestDefinition,
    error::{Error, Result},
};

/// Anything that can produce test definitions.
///
/// Discovery is plain data: a static list, a factory function, a config file.
pub trait DiscoverySource {
    /// Produce definitions in declaration order.
    fn discover(&self) -> Result<Vec<TestDefinition>>;
}

impl DiscoverySource for [TestDefinition] {
    fn discover(&self) -> Result<Vec<TestDefinition>> {
        Ok(self.to_vec())
    }
}

impl DiscoverySource for Vec<TestDefinition> {
    fn discover(&self) -> Result<Vec<TestDefinition>> {
        Ok(self.clone())
    }
}

impl<F> DiscoverySource for F
where
    F: Fn() -> Result<Vec<TestDefinition>>,
{
    fn discover(&self) -> Result<Vec<TestDefinition>> {
        self()
    }
}

/// Definitions sharing a declaring group, in declaration order.
#[derive(Debug, Clone)]
pub struct Group {
    /// Group key.
    key: String,
    /// Members in declaration order.
    tests: Vec<Rc<TestDefinition>>,
}

impl Group {
    /// Group key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Members in declaration order.
    #[must_use]
    pub fn tests(&self) -> &[Rc<TestDefinition>] {
        &self.tests
    }
}

/// Immutable registry of definitions.
///
/// Groups iterate in the order their first member was registered.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    /// Groups in first-registration order.
    groups: Vec<Group>,
}

impl Registry {
    /// Build a registry from a discovery source.
    pub fn from_source(source: &(impl DiscoverySource + ?Sized)) -> Result<Self> {
        let mut builder = RegistryBuilder::default();
        for def in source.discover()? {
            builder.add(def)?;
        }
        Ok(builder.build())
    }

    /// Start an empty builder.
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Groups in iteration order.
    #[must_use]
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// All definitions in layout order: group by group, declaration order within.
    pub fn iter(&self) -> impl Iterator<Item = &Rc<TestDefinition>> {
        self.groups.iter().flat_map(|g| g.tests.iter())
    }

    /// Total number of definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.iter().map(|g| g.tests.len()).sum()
    }

    /// True when nothing was discovered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up a definition by qualified name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Rc<TestDefinition>> {
        self.iter().find(|d| d.name().as_str() == name)
    }
}

/// Incremental registry construction; consumed by [`RegistryBuilder::build`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    /// Groups collected so far.
    groups: Vec<Group>,
    /// Names already registered.
    names: HashSet<String>,
}

impl RegistryBuilder {
    /// Add one definition. Duplicate names are rejected.
    pub fn add(&mut self, def: TestDefinition) -> Result<&mut Self> {
        let name = def.name().to_string();
        if !self.names.insert(name.clone()) {
            return Err(Error::DuplicateTest(name));
        }
        let def = Rc::new(def);
        match self.groups.iter_mut().find(|g| g.key == def.group()) {
            Some(group) => group.tests.push(def),
            None => self.groups.push(Group {
                key: def.group().to_string(),
                tests: vec![def],
            }),
        }
        Ok(self)
    }

    /// Add many definitions in order.
    pub fn extend<I>(&mut self, defs: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = TestDefinition>,
    {
        for def in defs {
            self.add(def)?;
        }
        Ok(self)
    }

    /// Freeze into a registry.
    #[must_use]
    pub fn build(self) -> Registry {
        Registry {
            groups: self.groups,
        }
    }
}
