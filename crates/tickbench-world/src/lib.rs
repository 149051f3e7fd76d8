//! tickbench-world: the simulated surface tests run on.
//!
//! Provides integer cell geometry, the [`WorldSurface`] capability with an
//! in-memory [`GridWorld`], the clonable [`WorldHandle`], and fixture stores
//! that know the size of each fixture and how to materialize it.
#![warn(missing_docs)]

mod cell;
mod error;
mod fixture;
mod geom;
mod surface;

pub use cell::Cell;
pub use error::{Error, Result};
pub use fixture::{Fixture, FixtureStore, MAX_FIXTURE_SIZE, MemoryFixtureStore};
pub use geom::{BoundingBox, CellPos, Extent, Rect};
pub use surface::{GridWorld, WorldHandle, WorldSurface};
pub use tickbench_ids::{DEFAULT_NAMESPACE, FixtureRef};
