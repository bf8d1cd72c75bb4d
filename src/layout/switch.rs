use super::cursor::case_columns;
use super::text::{clean_label, wrap_label};
use super::traverse::layout_sequence;
use super::{Anchor, Frame, LayoutContext};
use crate::ast::{Stmt, Switch};
use crate::ir::{EdgeKind, Endpoint, NodeId, NodeShape, Port};

pub(super) fn layout_switch(
    ctx: &mut LayoutContext<'_>,
    stmt: &Switch,
    from: Anchor,
    label: Option<&'static str>,
    frame: Frame,
) -> Anchor {
    let config = ctx.config;
    let subject = ctx.place(
        wrap_label(&clean_label(&stmt.header), config.width_factor),
        NodeShape::Diamond,
        config.special_shape_width,
        frame.x,
    );
    ctx.flow(from, subject, label);

    if stmt.arms.is_empty() {
        let y = ctx.cursor.next_row();
        let central = ctx.point(frame.x, y);
        ctx.route(
            Endpoint::new(subject, Port::South),
            Endpoint::new(central, Port::North),
        );
        return Anchor::south(central);
    }

    let case_row = ctx.cursor.y();
    let columns = case_columns(config, frame.x, stmt.arms.len());
    let body_row = case_row - config.row_height;
    let mut bottom = body_row;
    let mut staggered = false;
    let mut previous: Option<NodeId> = None;
    let mut tails = Vec::with_capacity(stmt.arms.len());

    for (arm, &column) in stmt.arms.iter().zip(&columns) {
        let arm_node = ctx.pin(
            wrap_label(&arm.label(), config.width_factor),
            NodeShape::Diamond,
            config.node_width,
            column,
            case_row,
        );
        match previous {
            Some(previous) => ctx.connect(
                Endpoint::new(previous, Port::East),
                Endpoint::new(arm_node, Port::West),
                Some("false"),
                EdgeKind::Flow,
            ),
            None => fan_out(ctx, subject, arm_node, frame.x, column, case_row),
        }
        previous = Some(arm_node);

        // Plain arms share rows. Once an arm holds a branch, loop or switch,
        // it and every later arm start below everything laid out so far.
        staggered |= arm.body.iter().any(Stmt::is_construct);
        ctx.cursor.move_to(if staggered { bottom } else { body_row });
        let tail = layout_sequence(
            ctx,
            &arm.body,
            Anchor::south(arm_node),
            Some("true"),
            frame.nested(column),
        );
        bottom = bottom.min(ctx.cursor.y());
        tails.push((arm_node, tail, column));
    }

    // Nested constructs leave their own merge points half a row above the
    // next free row, so staggered arms merge on a full row of their own.
    ctx.cursor.move_to(bottom);
    let merge_y = if staggered {
        ctx.cursor.next_row()
    } else {
        bottom + config.half_row()
    };
    let mut points = Vec::with_capacity(tails.len());
    for (arm_node, tail, column) in tails {
        let label = (tail.node == arm_node).then_some("true");
        points.push(ctx.merge_point(tail, column, merge_y, label));
    }

    // Merge points fold inwards; with an odd arm count the middle one already
    // sits on the construct's column.
    let count = points.len();
    let half = count / 2;
    let (central, right_start) = if count % 2 == 1 {
        (points[half], half + 1)
    } else {
        (ctx.point(frame.x, merge_y), half)
    };
    for index in 0..half {
        let next = if index + 1 < half {
            points[index + 1]
        } else {
            central
        };
        ctx.route(
            Endpoint::new(points[index], Port::East),
            Endpoint::new(next, Port::West),
        );
    }
    for index in (right_start..count).rev() {
        let next = if index > right_start {
            points[index - 1]
        } else {
            central
        };
        ctx.route(
            Endpoint::new(points[index], Port::West),
            Endpoint::new(next, Port::East),
        );
    }

    Anchor::south(central)
}

/// Route from the subject down and across to the first arm.
fn fan_out(
    ctx: &mut LayoutContext<'_>,
    subject: NodeId,
    arm: NodeId,
    x: f32,
    column: f32,
    case_row: f32,
) {
    if column == x {
        ctx.flow(Anchor::south(subject), arm, None);
        return;
    }
    let fan_y = case_row + ctx.config.half_row();
    let split = ctx.point(x, fan_y);
    let turn = ctx.point(column, fan_y);
    ctx.route(
        Endpoint::new(subject, Port::South),
        Endpoint::new(split, Port::North),
    );
    let (out, into) = if column < x {
        (Port::West, Port::East)
    } else {
        (Port::East, Port::West)
    };
    ctx.route(Endpoint::new(split, out), Endpoint::new(turn, into));
    ctx.flow(Anchor::south(turn), arm, None);
}

#[cfg(test)]
mod tests {
    use super::super::tests::layout_source;
    use crate::ir::{EdgeKind, FlowGraph, Node, NodeShape, Port};

    fn arms(graph: &FlowGraph) -> Vec<&Node> {
        graph
            .nodes
            .values()
            .filter(|node| node.shape == NodeShape::Diamond)
            .filter(|node| node.label[0].starts_with("case") || node.label[0] == "default:")
            .collect()
    }

    const THREE_CASES: &str = r#"
int main() {
    int op = 2;
    switch (op) {
        case 1: op = 10; break;
        case 2: op = 20; break;
        case 3: op = 30; break;
    }
}
"#;

    #[test]
    fn arms_are_laid_out_left_to_right() {
        let graph = layout_source(THREE_CASES);
        let found = arms(&graph);
        let labels: Vec<&str> = found.iter().map(|node| node.label[0].as_str()).collect();
        assert_eq!(labels, vec!["case 1:", "case 2:", "case 3:"]);
        let xs: Vec<f32> = found.iter().map(|node| node.x).collect();
        assert_eq!(xs, vec![9.0, 12.0, 15.0]);
        assert!(found.iter().all(|node| node.y == found[0].y));
    }

    #[test]
    fn later_arms_chain_with_false_edges() {
        let graph = layout_source(THREE_CASES);
        let found = arms(&graph);
        for pair in found.windows(2) {
            let edges: Vec<_> = graph.edges_into(pair[1].id).collect();
            assert_eq!(edges.len(), 1);
            assert_eq!(edges[0].from.node, pair[0].id);
            assert_eq!(edges[0].from.port, Some(Port::East));
            assert_eq!(edges[0].to.port, Some(Port::West));
            assert_eq!(edges[0].label.as_deref(), Some("false"));
        }
        let first: Vec<_> = graph.edges_into(found[0].id).collect();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].kind, EdgeKind::Flow);
        assert!(graph.node(first[0].from.node).unwrap().is_point());
    }

    #[test]
    fn arm_bodies_start_with_true_edge() {
        let graph = layout_source(THREE_CASES);
        for arm in arms(&graph) {
            let south: Vec<_> = graph
                .edges_from(arm.id)
                .filter(|edge| edge.from.port == Some(Port::South))
                .collect();
            assert_eq!(south.len(), 1);
            assert_eq!(south[0].label.as_deref(), Some("true"));
            assert_eq!(graph.node(south[0].to.node).unwrap().x, arm.x);
        }
    }

    #[test]
    fn default_arm_and_even_count_merge_on_new_point() {
        let graph = layout_source(
            "int main() { int k = 0; switch (k) { case 0: k = 1; break; default: k = 2; } k = 3; }",
        );
        let found = arms(&graph);
        assert_eq!(found[1].label, vec!["default:"]);
        assert_eq!(found[0].x, 10.5);
        assert_eq!(found[1].x, 13.5);

        let after = graph
            .nodes
            .values()
            .find(|node| node.label == vec!["k = 3"])
            .unwrap();
        let central = graph
            .node(graph.edges_into(after.id).next().unwrap().from.node)
            .unwrap();
        assert!(central.is_point());
        assert_eq!(central.x, 12.0);
        assert_eq!(graph.edges_into(central.id).count(), 2);
    }

    #[test]
    fn single_arm_on_subject_column_is_wired_directly() {
        let graph = layout_source("int main() { int k = 0; switch (k) { default: k = 1; } }");
        let arm = arms(&graph)[0];
        let incoming: Vec<_> = graph.edges_into(arm.id).collect();
        assert_eq!(incoming.len(), 1);
        let source = graph.node(incoming[0].from.node).unwrap();
        assert_eq!(source.label, vec!["switch (k)"]);
    }

    fn assert_unique_positions(graph: &FlowGraph) {
        let mut seen = std::collections::HashMap::new();
        for node in graph.nodes.values() {
            if let Some(other) = seen.insert((node.x.to_bits(), node.y.to_bits()), node.id) {
                panic!("{other} and {} share ({}, {})", node.id, node.x, node.y);
            }
        }
    }

    #[test]
    fn branches_in_adjacent_arms_do_not_overlap() {
        let graph = layout_source(
            r#"
int main() {
    int a = 0, b = 1;
    switch (a) {
        case 1: if (b) { a = 1; } else { a = 2; } break;
        case 2: if (a) { a = 3; } else { a = 4; } break;
    }
}
"#,
        );
        assert_unique_positions(&graph);
        let found = arms(&graph);
        assert_eq!(found[0].y, found[1].y);
        let first = graph.nodes.values().find(|node| node.label == vec!["a = 2"]).unwrap();
        let second = graph.nodes.values().find(|node| node.label == vec!["a = 3"]).unwrap();
        assert!(second.y < first.y);
    }

    #[test]
    fn loops_in_adjacent_arms_do_not_overlap() {
        let graph = layout_source(
            r#"
int main() {
    int a = 3, b = 3;
    switch (a) {
        case 1: while (a > 0) { a--; } break;
        case 2: while (b > 0) { b--; } break;
        default: a = 0;
    }
}
"#,
        );
        assert_unique_positions(&graph);
        let back_edges = graph
            .edges
            .iter()
            .filter(|edge| edge.kind == EdgeKind::LoopBack)
            .count();
        assert_eq!(back_edges, 2);
    }

    #[test]
    fn plain_arms_share_body_rows() {
        let graph = layout_source(THREE_CASES);
        let rows: Vec<f32> = ["op = 10", "op = 20", "op = 30"]
            .iter()
            .map(|label| graph.nodes.values().find(|node| node.label == vec![*label]).unwrap().y)
            .collect();
        assert!(rows.iter().all(|y| *y == rows[0]), "{rows:?}");
    }
}
