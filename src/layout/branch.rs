use super::cursor::{branch_offset, side_offset};
use super::text::wrap_label;
use super::traverse::traverse;
use super::{Anchor, Frame, LayoutContext};
use crate::ast::{If, Stmt};
use crate::ir::{Endpoint, NodeId, NodeShape, Port};

fn place_decision(ctx: &mut LayoutContext<'_>, stmt: &If, x: f32) -> NodeId {
    let config = ctx.config;
    let label = format!("if {}", stmt.condition.to_label());
    ctx.place(
        wrap_label(&label, config.width_factor),
        NodeShape::Diamond,
        config.special_shape_width,
        x,
    )
}

/// `if` without an effective `else`. The false path leaves the decision to
/// the east, runs down a side column and rejoins below the branch. The side
/// column moves out with depth, so a nested `if` ending on the same merge row
/// keeps its own column.
pub(super) fn layout_single_branch(
    ctx: &mut LayoutContext<'_>,
    stmt: &If,
    from: Anchor,
    label: Option<&'static str>,
    frame: Frame,
) -> Anchor {
    let config = ctx.config;
    let decision_row = ctx.cursor.y();
    let decision = place_decision(ctx, stmt, frame.x);
    ctx.flow(from, decision, label);

    let entry = Anchor::south(decision);
    let tail = traverse(ctx, &stmt.then_branch, entry, Some("True"), frame.nested(frame.x));

    let merge_y = ctx.cursor.y() + config.half_row();
    let side_x = frame.x + side_offset(config, frame.depth);
    let corner = ctx.point(side_x, decision_row);
    let drop = ctx.point(side_x, merge_y);
    ctx.route(
        Endpoint::new(decision, Port::East),
        Endpoint::new(corner, Port::West),
    );
    ctx.route(
        Endpoint::new(corner, Port::South),
        Endpoint::new(drop, Port::North),
    );

    let merge = ctx.merge_point(tail, frame.x, merge_y, (tail == entry).then_some("True"));
    ctx.flow_between(
        Endpoint::new(drop, Port::West),
        Endpoint::new(merge, Port::East),
        None,
    );
    Anchor::south(merge)
}

/// `if`/`else`: both branches hang side by side below the decision and merge
/// on the construct's column.
pub(super) fn layout_double_branch(
    ctx: &mut LayoutContext<'_>,
    stmt: &If,
    else_branch: &Stmt,
    from: Anchor,
    label: Option<&'static str>,
    frame: Frame,
) -> Anchor {
    let config = ctx.config;
    let decision_row = ctx.cursor.y();
    let decision = place_decision(ctx, stmt, frame.x);
    ctx.flow(from, decision, label);
    let branch_row = ctx.cursor.y();

    let offset = branch_offset(config, frame.depth);
    let true_x = frame.x - offset;
    let false_x = frame.x + offset;
    let true_bend = ctx.point(true_x, decision_row);
    let false_bend = ctx.point(false_x, decision_row);
    ctx.route(
        Endpoint::new(decision, Port::West),
        Endpoint::new(true_bend, Port::East),
    );
    ctx.route(
        Endpoint::new(decision, Port::East),
        Endpoint::new(false_bend, Port::West),
    );

    ctx.cursor.move_to(branch_row);
    let true_tail = traverse(
        ctx,
        &stmt.then_branch,
        Anchor::south(true_bend),
        Some("True"),
        frame.nested(true_x),
    );
    let true_row = ctx.cursor.y();

    ctx.cursor.move_to(branch_row);
    let false_tail = traverse(
        ctx,
        else_branch,
        Anchor::south(false_bend),
        Some("False"),
        frame.nested(false_x),
    );
    let false_row = ctx.cursor.y();

    let bottom = true_row.min(false_row);
    let merge_y = bottom + config.half_row();
    let true_anchor = branch_anchor(
        ctx,
        &stmt.then_branch,
        true_tail,
        true_bend,
        "True",
        true_x,
        merge_y,
    );
    let false_anchor = branch_anchor(
        ctx,
        else_branch,
        false_tail,
        false_bend,
        "False",
        false_x,
        merge_y,
    );

    ctx.route(
        Endpoint::new(true_anchor, Port::East),
        Endpoint::new(false_anchor, Port::West),
    );
    let central = ctx.point(frame.x, merge_y);
    ctx.route(
        Endpoint::new(true_anchor, Port::East),
        Endpoint::new(central, Port::West),
    );
    ctx.route(
        Endpoint::new(false_anchor, Port::West),
        Endpoint::new(central, Port::East),
    );

    ctx.cursor.move_to(bottom);
    Anchor::south(central)
}

/// Merge anchor for one branch. A branch ending in a conditional already
/// produced one.
fn branch_anchor(
    ctx: &mut LayoutContext<'_>,
    branch: &Stmt,
    tail: Anchor,
    bend: NodeId,
    label: &'static str,
    x: f32,
    merge_y: f32,
) -> NodeId {
    if branch.ends_with_conditional() {
        return tail.node;
    }
    let label = (tail.node == bend).then_some(label);
    ctx.merge_point(tail, x, merge_y, label)
}
