//! Bodies of the built-in demonstration suite.

use std::{cell::Cell as Counter, rc::Rc};

use tickbench_engine::{DynamicTest, TestContext};
use tickbench_world::{Cell, CellPos};

/// Lever position in the lamp fixtures.
const LEVER: CellPos = CellPos::new(0, 0, 0);
/// Wire between lever and lamp.
const WIRE: CellPos = CellPos::new(1, 0, 0);
/// Lamp position.
const LAMP: CellPos = CellPos::new(2, 0, 0);

/// Piston base in the piston fixtures.
const PISTON: CellPos = CellPos::new(0, 0, 1);
/// Cell directly in front of the piston.
const FRONT: CellPos = CellPos::new(1, 0, 1);
/// Cell a pushed block ends up in.
const PUSHED: CellPos = CellPos::new(2, 0, 1);

/// Width of the counter fixture row.
const ROW: i32 = 4;

/// Flip the lever; the signal reaches the wire and then the lamp.
pub fn lever_lights_lamp(ctx: &mut TestContext) {
    ctx.set_cell(LEVER, Cell::block("lever_on"));
    ctx.schedule_after(2, |ctx| {
        ctx.set_cell(WIRE, Cell::block("wire_powered"));
    });
    ctx.schedule_after(4, |ctx| {
        ctx.set_cell(LAMP, Cell::block("lamp_on"));
    });
    ctx.assert_cell_is(WIRE, Cell::block("wire_powered"), "wire carries no signal");
    ctx.assert_cell_is(LAMP, Cell::block("lamp_on"), "lamp did not light");
}

/// A lamp switched on directly stays lit.
pub fn lamp_stays_lit(ctx: &mut TestContext) {
    ctx.set_cell(CellPos::ZERO, Cell::block("lamp_on"));
    ctx.assert_cell(CellPos::ZERO, |c| c.is("lamp_on"), "lamp went dark");
}

/// Move whatever is at `from` to `to`.
fn shove(ctx: &mut TestContext, from: CellPos, to: CellPos) {
    let cell = ctx.cell(from);
    ctx.clear_cell(from);
    ctx.set_cell(to, cell);
}

/// Extending the piston pushes the block one cell forward.
pub fn push_block(ctx: &mut TestContext) {
    ctx.schedule_after(3, |ctx| {
        shove(ctx, FRONT, PUSHED);
        ctx.set_cell(FRONT, Cell::block("piston_head"));
        ctx.set_cell(PISTON, Cell::block("piston_extended"));
    });
    ctx.assert_that(|probe| {
        let (head, block) = (probe.cell(FRONT), probe.cell(PUSHED));
        if head.is("piston_head") && block.is("stone") {
            Ok(())
        } else {
            Err(format!(
                "expected stone pushed to {PUSHED}, found head {head} and {block}"
            ))
        }
    });
}

/// A sticky piston extends and then pulls its block back.
pub fn retract(ctx: &mut TestContext) {
    let strokes = Rc::new(Counter::new(0));
    let extend = Rc::clone(&strokes);
    ctx.schedule_after(3, move |ctx| {
        shove(ctx, FRONT, PUSHED);
        ctx.set_cell(FRONT, Cell::block("piston_head"));
        extend.set(extend.get() + 1);
    });
    let pull = Rc::clone(&strokes);
    ctx.schedule_after(8, move |ctx| {
        ctx.clear_cell(FRONT);
        shove(ctx, PUSHED, FRONT);
        pull.set(pull.get() + 1);
    });
    ctx.assert_true(move |_| strokes.get() == 2, "piston did not complete both strokes");
    ctx.assert_cell_is(FRONT, Cell::block("stone"), "block was not pulled back");
    ctx.assert_cell_is(PUSHED, Cell::Empty, "block left behind");
}

/// Light the first `n` cells of the row, one per tick.
fn fill(ctx: &mut TestContext, n: i32) {
    for i in 0..n {
        let tick = u32::try_from(i + 1).unwrap_or(u32::MAX);
        ctx.schedule_after(tick, move |ctx| {
            ctx.set_cell(CellPos::new(i, 0, 0), Cell::block("lamp_on"));
        });
    }
    ctx.assert_that(move |probe| {
        let lit = (0..ROW)
            .filter(|x| probe.cell(CellPos::new(*x, 0, 0)).is("lamp_on"))
            .count();
        if lit == usize::try_from(n).unwrap_or_default() {
            Ok(())
        } else {
            Err(format!("expected {n} lit cells, found {lit}"))
        }
    });
}

/// One counter test per fill level, sharing a fixture.
pub fn fill_row() -> Vec<DynamicTest> {
    DynamicTest::numbered((1..ROW).map(|n| move |ctx: &mut TestContext| fill(ctx, n)))
}
