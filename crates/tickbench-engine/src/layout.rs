//! Deterministic strip packing of fixtures onto the shared surface.
//!
//! Each group gets its own row along `z`; members of a group are laid out
//! left to right along `x`. Every slot reserves a margin ring around its
//! fixture for the floor border and the status indicator.

use std::rc::Rc;

use tickbench_world::{BoundingBox, Cell, CellPos, Extent, FixtureStore, Rect, WorldSurface};
use tracing::debug;

use crate::{
    config::{LAYOUT, LayoutConfig},
    definition::TestDefinition,
    error::{Error, Result},
    registry::Registry,
};

/// Floor cell inside the border ring.
pub const FLOOR_BLOCK: &str = "floor";
/// Border ring cells, alternating.
pub const BORDER_BLOCKS: [&str; 2] = ["border_yellow", "border_black"];

/// Region of the surface reserved for one test.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PlacementSlot {
    /// Minimum corner of the reserved region, on the floor layer.
    pub origin: CellPos,
    /// Declared fixture size.
    pub extent: Extent,
    /// Cells reserved on each side of the fixture.
    pub margin: i32,
}

impl PlacementSlot {
    /// Where the fixture's local `(0, 0, 0)` lands.
    #[must_use]
    pub fn fixture_origin(&self) -> CellPos {
        self.origin.offset(self.margin, self.margin, self.margin)
    }

    /// Horizontal footprint including margins.
    #[must_use]
    pub fn footprint(&self) -> Rect {
        Rect {
            x: self.origin.x,
            z: self.origin.z,
            w: self.extent.width + 2 * self.margin,
            d: self.extent.depth + 2 * self.margin,
        }
    }

    /// Whole reserved volume, floor layer included.
    #[must_use]
    pub fn volume(&self) -> BoundingBox {
        let m2 = 2 * self.margin;
        BoundingBox::from_origin(
            self.origin,
            Extent::new(
                self.extent.width + m2,
                self.extent.height + m2,
                self.extent.depth + m2,
            ),
        )
    }

    /// Cell used for the status indicator: the slot's origin corner.
    #[must_use]
    pub fn indicator(&self) -> CellPos {
        self.origin
    }

    /// Lay the floor with its border ring and clear everything above it.
    pub fn prepare(&self, world: &mut dyn WorldSurface) {
        let rect = self.footprint();
        let floor_y = self.origin.y;
        let top = self.volume().max.y;
        for x in rect.x..rect.x + rect.w {
            for z in rect.z..rect.z + rect.d {
                let floor = if rect.on_edge(x, z) {
                    BORDER_BLOCKS[(x + z).rem_euclid(2) as usize]
                } else {
                    FLOOR_BLOCK
                };
                world.set(CellPos::new(x, floor_y, z), Cell::block(floor));
                for y in floor_y + 1..=top {
                    world.set(CellPos::new(x, y, z), Cell::Empty);
                }
            }
        }
    }
}

/// A definition together with the slot it was assigned.
#[derive(Debug, Clone)]
pub struct Placement {
    /// The placed test.
    pub definition: Rc<TestDefinition>,
    /// Its reserved region.
    pub slot: PlacementSlot,
}

/// Single-pass layout planner.
#[derive(Debug, Clone, Copy)]
pub struct LayoutPlanner {
    /// Origin height, margin and gap.
    config: LayoutConfig,
}

impl Default for LayoutPlanner {
    fn default() -> Self {
        Self::new(LAYOUT)
    }
}

impl LayoutPlanner {
    /// Planner using the given constants.
    #[must_use]
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    /// Constants in use.
    #[must_use]
    pub fn config(&self) -> LayoutConfig {
        self.config
    }

    /// Resolve every fixture size and assign slots in registry order.
    ///
    /// Any resolution failure aborts the whole plan.
    pub fn plan(&self, registry: &Registry, store: &dyn FixtureStore) -> Result<Vec<Placement>> {
        let mut groups = Vec::with_capacity(registry.groups().len());
        for group in registry.groups() {
            let mut members = Vec::with_capacity(group.tests().len());
            for def in group.tests() {
                members.push((Rc::clone(def), store.resolve(def.fixture())?));
            }
            groups.push(members);
        }

        let extents = groups
            .iter()
            .map(|members| members.iter().map(|(_, extent)| *extent));
        let slots = self.plan_extents(extents)?;

        let placements: Vec<Placement> = groups
            .into_iter()
            .flatten()
            .zip(slots.into_iter().flatten())
            .map(|((definition, _), slot)| Placement { definition, slot })
            .collect();
        debug!(count = placements.len(), "planned layout");
        Ok(placements)
    }

    /// Assign slots to already-resolved extents, one inner list per group.
    ///
    /// Fails with [`Error::LayoutOverflow`] when a slot would not fit in
    /// `i32` world coordinates.
    pub fn plan_extents<G, E>(&self, groups: G) -> Result<Vec<Vec<PlacementSlot>>>
    where
        G: IntoIterator<Item = E>,
        E: IntoIterator<Item = Extent>,
    {
        let LayoutConfig {
            floor_y,
            margin,
            gap,
        } = self.config;
        let mut z = 0;
        let mut rows = Vec::new();
        for group in groups {
            let mut x = 0;
            let mut next_z = z;
            let mut row = Vec::new();
            for extent in group {
                let overflow = || Error::LayoutOverflow(extent);
                let next_x = advance(x, extent.width, margin, gap).ok_or_else(overflow)?;
                advance(floor_y, extent.height, margin, 0).ok_or_else(overflow)?;
                let row_end = advance(z, extent.depth, margin, gap).ok_or_else(overflow)?;
                row.push(PlacementSlot {
                    origin: CellPos::new(x, floor_y, z),
                    extent,
                    margin,
                });
                x = next_x;
                next_z = next_z.max(row_end);
            }
            z = next_z;
            rows.push(row);
        }
        Ok(rows)
    }
}

/// `start + len + 2 * margin + gap`, or `None` on overflow.
fn advance(start: i32, len: i32, margin: i32, gap: i32) -> Option<i32> {
    start
        .checked_add(len)?
        .checked_add(margin.checked_mul(2)?)?
        .checked_add(gap)
}

#[cfg(test)]
mod tests {
    use tickbench_world::GridWorld;

    use super::*;

    #[test]
    fn rows_per_group() {
        let planner = LayoutPlanner::default();
        let rows = planner
            .plan_extents([
                vec![Extent::new(3, 3, 3), Extent::new(3, 3, 3)],
                vec![],
                vec![Extent::new(5, 5, 5)],
            ])
            .unwrap();
        assert_eq!(rows[0][0].origin, CellPos::new(0, 3, 0));
        assert_eq!(rows[0][1].origin, CellPos::new(8, 3, 0));
        assert!(rows[1].is_empty());
        assert_eq!(rows[2][0].origin, CellPos::new(0, 3, 8));
        assert_eq!(rows[0][0].fixture_origin(), CellPos::new(1, 4, 1));
    }

    #[test]
    fn oversized_extents_are_an_error() {
        let planner = LayoutPlanner::default();
        let wide = Extent::new(1_500_000_000, 1, 1);
        let err = planner.plan_extents([vec![wide; 2]]).unwrap_err();
        assert!(matches!(err, Error::LayoutOverflow(e) if e == wide), "{err}");

        let tall = Extent::new(1, i32::MAX - 2, 1);
        assert!(planner.plan_extents([vec![tall]]).is_err());
        let deep = Extent::new(1, 1, i32::MAX - 2);
        assert!(planner.plan_extents([vec![deep]]).is_err());
    }

    #[test]
    fn prepare_stays_inside_volume() {
        let slot = PlacementSlot {
            origin: CellPos::new(10, 3, 20),
            extent: Extent::new(2, 2, 3),
            margin: 1,
        };
        let mut world = GridWorld::new();
        world.set(CellPos::new(11, 4, 21), Cell::block("junk"));
        slot.prepare(&mut world);
        let volume = slot.volume();
        assert!(world.iter().all(|(p, _)| volume.contains(*p)));
        assert!(world.get(CellPos::new(11, 4, 21)).is_empty());
        assert!(world.get(CellPos::new(11, 3, 21)).is(FLOOR_BLOCK));
        assert!(world.get(CellPos::new(10, 3, 20)).is(BORDER_BLOCKS[0]));
        assert!(world.get(CellPos::new(11, 3, 20)).is(BORDER_BLOCKS[1]));
        assert_eq!(world.len(), 4 * 5);
    }
}
