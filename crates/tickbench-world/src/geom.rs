//! Integer cell-space geometry.
//!
//! The world is a sparse 3-D grid of cells. Layout happens on the horizontal
//! `x`/`z` plane; `y` is height.
use std::{fmt, ops::Add};

use serde::{Deserialize, Serialize};

/// Position of a single cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellPos {
    /// East/west coordinate; the primary layout axis.
    pub x: i32,
    /// Height.
    pub y: i32,
    /// North/south coordinate; the secondary layout axis.
    pub z: i32,
}

impl CellPos {
    /// The origin cell.
    pub const ZERO: Self = Self::new(0, 0, 0);

    /// Construct a position.
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Offset by the given deltas.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }
}

impl Add for CellPos {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        self.offset(rhs.x, rhs.y, rhs.z)
    }
}

impl fmt::Display for CellPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

impl From<(i32, i32, i32)> for CellPos {
    fn from((x, y, z): (i32, i32, i32)) -> Self {
        Self::new(x, y, z)
    }
}

/// Size of a volume in cells.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Extent {
    /// Size along `x`.
    pub width: i32,
    /// Size along `y`.
    pub height: i32,
    /// Size along `z`.
    pub depth: i32,
}

impl Extent {
    /// Construct an extent.
    #[must_use]
    pub const fn new(width: i32, height: i32, depth: i32) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }

    /// True when any dimension is zero or negative.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0 || self.depth <= 0
    }

    /// Local bounding box `[0, size)` on every axis.
    #[must_use]
    pub fn local_bounds(&self) -> BoundingBox {
        BoundingBox::from_origin(CellPos::ZERO, *self)
    }
}

impl fmt::Display for Extent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.width, self.height, self.depth)
    }
}

/// Inclusive axis-aligned box of cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BoundingBox {
    /// Minimum corner, inclusive.
    pub min: CellPos,
    /// Maximum corner, inclusive.
    pub max: CellPos,
}

impl BoundingBox {
    /// Box covering `extent` cells starting at `origin`.
    #[must_use]
    pub fn from_origin(origin: CellPos, extent: Extent) -> Self {
        Self {
            min: origin,
            max: origin.offset(extent.width - 1, extent.height - 1, extent.depth - 1),
        }
    }

    /// Whether `pos` lies inside the box.
    #[must_use]
    pub fn contains(&self, pos: CellPos) -> bool {
        (self.min.x..=self.max.x).contains(&pos.x)
            && (self.min.y..=self.max.y).contains(&pos.y)
            && (self.min.z..=self.max.z).contains(&pos.z)
    }

    /// Iterate every cell in the box, `x` fastest.
    pub fn cells(&self) -> impl Iterator<Item = CellPos> + '_ {
        (self.min.y..=self.max.y).flat_map(move |y| {
            (self.min.z..=self.max.z)
                .flat_map(move |z| (self.min.x..=self.max.x).map(move |x| CellPos::new(x, y, z)))
        })
    }
}

/// Horizontal rectangle on the `x`/`z` plane, half-open.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    /// Minimum `x`.
    pub x: i32,
    /// Minimum `z`.
    pub z: i32,
    /// Size along `x`.
    pub w: i32,
    /// Size along `z`.
    pub d: i32,
}

impl Rect {
    /// Whether two rectangles share at least one cell.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.x < other.x + other.w
            && other.x < self.x + self.w
            && self.z < other.z + other.d
            && other.z < self.z + self.d
    }

    /// Whether the cell column at `(x, z)` lies on the outermost ring.
    #[must_use]
    pub fn on_edge(&self, x: i32, z: i32) -> bool {
        x == self.x || z == self.z || x == self.x + self.w - 1 || z == self.z + self.d - 1
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x={} z={} w={} d={}", self.x, self.z, self.w, self.d)
    }
}
