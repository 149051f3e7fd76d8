//! Fixtures: pre-authored cell templates and the stores that hold them.
//!
//! A fixture declares its size and a list of cells in fixture-local
//! coordinates. On disk, fixtures are RON files laid out as
//! `<root>/<namespace>/<path>.ron`:
//!
//! ```ron
//! (
//!     size: (width: 3, height: 2, depth: 3),
//!     cells: [
//!         ((x: 1, y: 0, z: 1), Block("lever")),
//!     ],
//! )
//! ```
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tickbench_ids::FixtureRef;
use tracing::debug;

use crate::{
    Cell, CellPos, Extent, WorldSurface,
    error::{Error, Result},
};

/// Largest size a fixture may declare on any axis.
pub const MAX_FIXTURE_SIZE: i32 = 1024;

/// A cell template with a declared footprint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fixture {
    /// Declared size; every cell must lie within `[0, size)`.
    pub size: Extent,
    /// Cells to place, in fixture-local coordinates.
    #[serde(default)]
    pub cells: Vec<(CellPos, Cell)>,
}

impl Fixture {
    /// An empty fixture of the given size.
    #[must_use]
    pub fn empty(size: Extent) -> Self {
        Self {
            size,
            cells: Vec::new(),
        }
    }

    /// Builder-style helper adding one cell.
    #[must_use]
    pub fn with_cell(mut self, pos: impl Into<CellPos>, cell: Cell) -> Self {
        self.cells.push((pos.into(), cell));
        self
    }

    /// Check the declared size and that all cells fit inside it.
    fn validate(&self, fixture: &FixtureRef) -> Result<()> {
        if self.size.is_empty() {
            return Err(Error::InvalidFixture {
                fixture: fixture.clone(),
                message: format!("size {} must be positive on every axis", self.size),
            });
        }
        let Extent {
            width,
            height,
            depth,
        } = self.size;
        if width.max(height).max(depth) > MAX_FIXTURE_SIZE {
            return Err(Error::InvalidFixture {
                fixture: fixture.clone(),
                message: format!(
                    "size {} exceeds {MAX_FIXTURE_SIZE} on some axis",
                    self.size
                ),
            });
        }
        let bounds = self.size.local_bounds();
        if let Some((pos, _)) = self.cells.iter().find(|(p, _)| !bounds.contains(*p)) {
            return Err(Error::InvalidFixture {
                fixture: fixture.clone(),
                message: format!("cell {pos} lies outside size {}", self.size),
            });
        }
        Ok(())
    }
}

/// Source of fixture templates.
pub trait FixtureStore {
    /// Look up the declared size of a fixture.
    ///
    /// Unknown references return [`Error::FixtureNotFound`].
    fn resolve(&self, fixture: &FixtureRef) -> Result<Extent>;

    /// Write the fixture's cells into `world` with fixture-local `(0,0,0)` at `origin`.
    fn materialize(
        &self,
        fixture: &FixtureRef,
        origin: CellPos,
        world: &mut dyn WorldSurface,
    ) -> Result<()>;
}

/// Fixture store backed by an in-memory map.
#[derive(Clone, Debug, Default)]
pub struct MemoryFixtureStore {
    /// Validated fixtures by reference.
    fixtures: BTreeMap<FixtureRef, Fixture>,
}

impl MemoryFixtureStore {
    /// Construct an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fixture, replacing any previous one under the same reference.
    pub fn insert(&mut self, fixture: FixtureRef, template: Fixture) -> Result<()> {
        template.validate(&fixture)?;
        self.fixtures.insert(fixture, template);
        Ok(())
    }

    /// Number of fixtures held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fixtures.len()
    }

    /// True when the store holds no fixtures.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fixtures.is_empty()
    }

    /// Load every `.ron` file below `root` into a new store.
    pub fn load_dir(root: &Path) -> Result<Self> {
        let mut store = Self::new();
        store.extend_from_dir(root)?;
        Ok(store)
    }

    /// Load every `.ron` file below `root`, adding to this store.
    ///
    /// The first directory level is the namespace; the remaining path without
    /// the extension is the fixture path.
    pub fn extend_from_dir(&mut self, root: &Path) -> Result<()> {
        let mut files = Vec::new();
        collect_ron_files(root, &mut files)?;
        files.sort();
        for file in files {
            let fixture = fixture_ref_for(root, &file)?;
            let text = fs::read_to_string(&file).map_err(|source| Error::Read {
                path: file.clone(),
                source,
            })?;
            let template: Fixture = ron::from_str(&text).map_err(|e| Error::Parse {
                path: file.clone(),
                message: e.to_string(),
            })?;
            debug!(fixture = %fixture, size = %template.size, "loaded fixture");
            self.insert(fixture, template)?;
        }
        Ok(())
    }
}

impl FixtureStore for MemoryFixtureStore {
    fn resolve(&self, fixture: &FixtureRef) -> Result<Extent> {
        self.fixtures
            .get(fixture)
            .map(|f| f.size)
            .ok_or_else(|| Error::FixtureNotFound(fixture.clone()))
    }

    fn materialize(
        &self,
        fixture: &FixtureRef,
        origin: CellPos,
        world: &mut dyn WorldSurface,
    ) -> Result<()> {
        let template = self
            .fixtures
            .get(fixture)
            .ok_or_else(|| Error::FixtureNotFound(fixture.clone()))?;
        for (pos, cell) in &template.cells {
            world.set(origin + *pos, cell.clone());
        }
        Ok(())
    }
}

/// Recursively gather `.ron` files.
fn collect_ron_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    let entries = fs::read_dir(dir).map_err(|source| Error::Read {
        path: dir.to_path_buf(),
        source,
    })?;
    for entry in entries {
        let path = entry
            .map_err(|source| Error::Read {
                path: dir.to_path_buf(),
                source,
            })?
            .path();
        if path.is_dir() {
            collect_ron_files(&path, out)?;
        } else if path.extension().is_some_and(|ext| ext == "ron") {
            out.push(path);
        }
    }
    Ok(())
}

/// Map `<root>/<ns>/<a>/<b>.ron` to `ns:a/b`.
fn fixture_ref_for(root: &Path, file: &Path) -> Result<FixtureRef> {
    let rel = file.strip_prefix(root).unwrap_or(file).with_extension("");
    let mut parts = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned());
    let namespace = parts.next().unwrap_or_default();
    let path = parts.collect::<Vec<_>>().join("/");
    if path.is_empty() {
        return Err(Error::Parse {
            path: file.to_path_buf(),
            message: "fixture files must live inside a namespace directory".into(),
        });
    }
    Ok(FixtureRef::new(namespace, path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GridWorld;

    fn fref(s: &str) -> FixtureRef {
        s.parse().unwrap()
    }

    #[test]
    fn resolve_reports_not_found_distinctly() {
        let store = MemoryFixtureStore::new();
        let err = store.resolve(&fref("demo:missing")).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "no fixture 'demo:missing' found");
    }

    #[test]
    fn insert_rejects_cells_outside_size() {
        let mut store = MemoryFixtureStore::new();
        let bad = Fixture::empty(Extent::new(2, 1, 2)).with_cell((2, 0, 0), Cell::block("stone"));
        let err = store.insert(fref("demo:bad"), bad).unwrap_err();
        assert!(matches!(err, Error::InvalidFixture { .. }));
        assert!(store.insert(fref("demo:zero"), Fixture::empty(Extent::new(0, 1, 1))).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn insert_rejects_oversized_fixtures() {
        let mut store = MemoryFixtureStore::new();
        let huge = Fixture::empty(Extent::new(1_500_000_000, 1, 1));
        let err = store.insert(fref("demo:huge"), huge).unwrap_err();
        assert!(err.to_string().contains("exceeds"), "{err}");
        let edge = Fixture::empty(Extent::new(MAX_FIXTURE_SIZE, 1, 1));
        assert!(store.insert(fref("demo:edge"), edge).is_ok());
    }

    #[test]
    fn materialize_offsets_cells() {
        let mut store = MemoryFixtureStore::new();
        let f = Fixture::empty(Extent::new(3, 1, 3)).with_cell((1, 0, 2), Cell::block("lever"));
        store.insert(fref("demo:lever"), f).unwrap();
        let mut world = GridWorld::new();
        store
            .materialize(&fref("demo:lever"), CellPos::new(10, 4, 20), &mut world)
            .unwrap();
        assert!(world.get(CellPos::new(11, 4, 22)).is("lever"));
        assert_eq!(world.len(), 1);
    }

    #[test]
    fn fixture_refs_follow_directory_layout() {
        let root = Path::new("/fx");
        let r = fixture_ref_for(root, Path::new("/fx/demo/doors/open.ron")).unwrap();
        assert_eq!(r.to_string(), "demo:doors/open");
        assert!(fixture_ref_for(root, Path::new("/fx/loose.ron")).is_err());
    }

    #[test]
    fn fixture_parses_from_ron() {
        let text = r#"(
            size: (width: 2, height: 1, depth: 2),
            cells: [((x: 0, y: 0, z: 1), Block("stone"))],
        )"#;
        let f: Fixture = ron::from_str(text).unwrap();
        assert_eq!(f.size, Extent::new(2, 1, 2));
        assert_eq!(f.cells, vec![(CellPos::new(0, 0, 1), Cell::block("stone"))]);
    }
}
