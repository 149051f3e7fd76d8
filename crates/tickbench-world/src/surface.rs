//! The mutable world surface and the shared handle used to reach it.
use std::{collections::HashMap, fmt, sync::Arc};

use parking_lot::Mutex;

use crate::{Cell, CellPos};

/// Minimal set/get capability over world cells.
pub trait WorldSurface {
    /// Replace the contents of the cell at `pos`.
    fn set(&mut self, pos: CellPos, cell: Cell);

    /// Read the contents of the cell at `pos`.
    fn get(&self, pos: CellPos) -> Cell;
}

/// Sparse in-memory grid. Cells that were never written read as [`Cell::Empty`].
#[derive(Clone, Debug, Default)]
pub struct GridWorld {
    /// Non-empty cells.
    cells: HashMap<CellPos, Cell>,
    /// Count of `set` calls, for diagnostics.
    writes: u64,
}

impl GridWorld {
    /// Construct an empty grid.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of non-empty cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// True when no cell holds anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Total number of writes performed.
    #[must_use]
    pub fn writes(&self) -> u64 {
        self.writes
    }

    /// Iterate all non-empty cells in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&CellPos, &Cell)> {
        self.cells.iter()
    }
}

impl WorldSurface for GridWorld {
    fn set(&mut self, pos: CellPos, cell: Cell) {
        self.writes += 1;
        if cell.is_empty() {
            self.cells.remove(&pos);
        } else {
            self.cells.insert(pos, cell);
        }
    }

    fn get(&self, pos: CellPos) -> Cell {
        self.cells.get(&pos).cloned().unwrap_or_default()
    }
}

/// Cheap, clonable handle to a world surface.
///
/// Everything runs on the tick thread; the lock only exists so that assertion
/// closures can hold their own clone of the handle.
#[derive(Clone)]
pub struct WorldHandle {
    /// Shared surface.
    inner: Arc<Mutex<dyn WorldSurface + Send>>,
}

impl WorldHandle {
    /// Wrap a surface in a new handle.
    pub fn new<W>(surface: W) -> Self
    where
        W: WorldSurface + Send + 'static,
    {
        Self {
            inner: Arc::new(Mutex::new(surface)),
        }
    }

    /// Construct a handle to an empty [`GridWorld`].
    #[must_use]
    pub fn grid() -> Self {
        Self::new(GridWorld::new())
    }

    /// Write one cell.
    pub fn set(&self, pos: CellPos, cell: Cell) {
        self.inner.lock().set(pos, cell);
    }

    /// Read one cell.
    #[must_use]
    pub fn get(&self, pos: CellPos) -> Cell {
        self.inner.lock().get(pos)
    }

    /// Run `f` with exclusive access to the surface.
    pub fn with<R>(&self, f: impl FnOnce(&mut dyn WorldSurface) -> R) -> R {
        let mut guard = self.inner.lock();
        f(&mut *guard)
    }
}

impl fmt::Debug for WorldHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorldHandle").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_writes_remove_cells() {
        let mut w = GridWorld::new();
        let p = CellPos::new(1, 2, 3);
        w.set(p, Cell::block("stone"));
        assert_eq!(w.len(), 1);
        assert!(w.get(p).is("stone"));
        w.set(p, Cell::Empty);
        assert!(w.is_empty());
        assert_eq!(w.writes(), 2);
        assert_eq!(w.get(p), Cell::Empty);
    }

    #[test]
    fn handle_clones_share_state() {
        let a = WorldHandle::grid();
        let b = a.clone();
        a.set(CellPos::ZERO, Cell::block("lamp"));
        assert!(b.get(CellPos::ZERO).is("lamp"));
        let n = b.with(|s| {
            s.set(CellPos::new(1, 0, 0), Cell::block("lamp"));
            s.get(CellPos::new(1, 0, 0))
        });
        assert!(n.is("lamp"));
    }
}
