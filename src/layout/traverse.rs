use super::branch::{layout_double_branch, layout_single_branch};
use super::classify::classify;
use super::loops::layout_loop;
use super::switch::layout_switch;
use super::text::{clean_label, wrap_label};
use super::{Anchor, Frame, LayoutContext};
use crate::ast::{Simple, Stmt};
use crate::ir::NodeShape;
use tracing::debug;

/// Lays out one statement below `from` and returns the point the next
/// statement should be attached to. `label` goes on the first edge emitted.
pub(super) fn traverse(
    ctx: &mut LayoutContext<'_>,
    stmt: &Stmt,
    from: Anchor,
    label: Option<&'static str>,
    frame: Frame,
) -> Anchor {
    match stmt {
        Stmt::Block(block) => layout_sequence(ctx, &block.stmts, from, label, frame),
        Stmt::Decl(decl) => layout_declarations(ctx, &[decl], from, label, frame),
        Stmt::Assign(simple) | Stmt::Return(simple) => {
            if clean_label(&simple.raw) == "return 0" {
                debug!(line = simple.line, "skipping `return 0`");
                return from;
            }
            layout_leaf(ctx, &simple.text, None, from, label, frame)
        }
        Stmt::Call(call) => layout_leaf(ctx, &call.text, Some(&call.callee), from, label, frame),
        Stmt::If(stmt) => match stmt.else_branch.as_deref() {
            Some(else_branch) if !else_branch.is_lone_continue() => {
                layout_double_branch(ctx, stmt, else_branch, from, label, frame)
            }
            _ => layout_single_branch(ctx, stmt, from, label, frame),
        },
        Stmt::For(stmt) => layout_loop(ctx, stmt, NodeShape::Hexagon, from, label, frame),
        Stmt::While(stmt) => layout_loop(ctx, stmt, NodeShape::Diamond, from, label, frame),
        Stmt::Switch(stmt) => layout_switch(ctx, stmt, from, label, frame),
        Stmt::Continue { line } => {
            debug!(line, "skipping `continue`");
            from
        }
        Stmt::Unsupported { kind, line } => {
            debug!(line, kind = %kind, "skipping unsupported statement");
            from
        }
    }
}

/// Statements in order on the frame's column. Runs of declarations collapse
/// into one box.
pub(super) fn layout_sequence(
    ctx: &mut LayoutContext<'_>,
    stmts: &[Stmt],
    from: Anchor,
    label: Option<&'static str>,
    frame: Frame,
) -> Anchor {
    let mut tail = from;
    let mut label = label;
    let mut pending: Vec<&Simple> = Vec::new();

    for stmt in stmts {
        if let Stmt::Decl(decl) = stmt {
            pending.push(decl);
            continue;
        }
        if !pending.is_empty() {
            tail = layout_declarations(ctx, &pending, tail, label.take(), frame);
            pending.clear();
        }
        let next = traverse(ctx, stmt, tail, label, frame);
        if next != tail {
            label = None;
        }
        tail = next;
    }
    if !pending.is_empty() {
        tail = layout_declarations(ctx, &pending, tail, label, frame);
    }
    tail
}

fn layout_declarations(
    ctx: &mut LayoutContext<'_>,
    decls: &[&Simple],
    from: Anchor,
    label: Option<&str>,
    frame: Frame,
) -> Anchor {
    let combined = decls
        .iter()
        .map(|decl| clean_label(&decl.text))
        .collect::<Vec<_>>()
        .join(", ");
    let config = ctx.config;
    let node = ctx.place(
        wrap_label(&combined, config.width_factor),
        NodeShape::Rectangle,
        config.node_width,
        frame.x,
    );
    ctx.flow(from, node, label);
    Anchor::south(node)
}

fn layout_leaf(
    ctx: &mut LayoutContext<'_>,
    text: &str,
    callee: Option<&str>,
    from: Anchor,
    label: Option<&str>,
    frame: Frame,
) -> Anchor {
    let classification = classify(text, callee, ctx.names, ctx.config);
    let node = ctx.place(
        classification.label,
        classification.shape,
        classification.width,
        frame.x,
    );
    ctx.flow(from, node, label);
    Anchor::south(node)
}
