use super::cursor::loop_offset;
use super::text::{clean_label, wrap_label};
use super::traverse::traverse;
use super::{Anchor, Frame, LayoutContext};
use crate::ast::Loop;
use crate::ir::{EdgeKind, Endpoint, NodeShape, Port};

/// Shared geometry for `for` (hexagon) and `while` (diamond) loops.
///
/// The body hangs below the header. Its tail drops to a point, runs out to the
/// loop-back column on the left and climbs back to the header row, entering
/// the header from the west. The exit leaves the header to the east on the
/// mirrored right column. Outermost loops bring the exit back onto their own
/// column; nested loops hand the right-column point to the enclosing
/// construct with an east port.
pub(super) fn layout_loop(
    ctx: &mut LayoutContext<'_>,
    stmt: &Loop,
    shape: NodeShape,
    from: Anchor,
    label: Option<&'static str>,
    frame: Frame,
) -> Anchor {
    let config = ctx.config;
    let header_row = ctx.cursor.y();
    let header = ctx.place(
        wrap_label(&clean_label(&stmt.header), config.width_factor),
        shape,
        config.special_shape_width,
        frame.x,
    );
    ctx.flow(from, header, label);

    let body_tail = traverse(
        ctx,
        &stmt.body,
        Anchor::south(header),
        None,
        frame.nested(frame.x),
    );

    let below_y = ctx.cursor.next_row();
    let below = ctx.point(frame.x, below_y);
    ctx.route(body_tail.endpoint(), Endpoint::center(below));

    let offset = loop_offset(config, frame.depth);
    let left = ctx.point(frame.x - offset, below_y);
    let above = ctx.point(frame.x - offset, header_row);
    ctx.route(
        Endpoint::new(below, Port::West),
        Endpoint::new(left, Port::East),
    );
    ctx.route(
        Endpoint::new(left, Port::North),
        Endpoint::new(above, Port::South),
    );
    ctx.connect(
        Endpoint::new(above, Port::East),
        Endpoint::new(header, Port::West),
        None,
        EdgeKind::LoopBack,
    );

    let right = ctx.point(frame.x + offset, header_row);
    ctx.route(
        Endpoint::new(header, Port::East),
        Endpoint::new(right, Port::West),
    );

    if frame.depth == 0 {
        let exit_y = below_y - config.half_row();
        let center = ctx.point(frame.x, exit_y);
        let side = ctx.point(frame.x + offset, exit_y);
        ctx.route(
            Endpoint::new(right, Port::South),
            Endpoint::new(side, Port::North),
        );
        ctx.route(
            Endpoint::new(side, Port::West),
            Endpoint::new(center, Port::East),
        );
        Anchor::south(center)
    } else {
        // The exit takes a row of its own; a following loop or branch would
        // otherwise put its side column on the same spot.
        let exit_y = ctx.cursor.next_row();
        let exit = ctx.point(frame.x + offset, exit_y);
        ctx.route(
            Endpoint::new(right, Port::South),
            Endpoint::new(exit, Port::North),
        );
        Anchor::east(exit)
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::layout_source;
    use crate::ir::{ArrowHead, EdgeKind, FlowGraph, NodeShape, Port};

    fn loop_header(graph: &FlowGraph, shape: NodeShape) -> crate::ir::NodeId {
        graph
            .nodes
            .values()
            .find(|node| node.shape == shape)
            .map(|node| node.id)
            .unwrap()
    }

    #[test]
    fn for_loop_has_forward_entry_and_back_edge() {
        let graph =
            layout_source("int main() { int i, s = 0; for (i = 0; i < 3; i++) { s = s + i; } }");
        let header = loop_header(&graph, NodeShape::Hexagon);
        assert_eq!(graph.node(header).unwrap().label, vec!["for (i = 0; i <", "3; i++)"]);

        let incoming: Vec<_> = graph.edges_into(header).collect();
        assert_eq!(incoming.len(), 2);
        let forward = incoming
            .iter()
            .find(|edge| edge.kind == EdgeKind::Flow)
            .unwrap();
        let back = incoming
            .iter()
            .find(|edge| edge.kind == EdgeKind::LoopBack)
            .unwrap();
        assert_eq!(forward.to.port, Some(Port::North));
        assert_eq!(forward.arrow, ArrowHead::Normal);
        assert_eq!(back.to.port, Some(Port::West));
        assert_eq!(back.arrow, ArrowHead::Vee);
        assert_eq!(back.weight, 55);

        let east: Vec<_> = graph
            .edges_from(header)
            .filter(|edge| edge.from.port == Some(Port::East))
            .collect();
        assert_eq!(east.len(), 1);
    }

    #[test]
    fn outermost_loop_uses_wide_columns_and_recentres() {
        let graph = layout_source("int main() { int n = 3; while (n > 0) { n--; } n = 7; }");
        let header = graph.node(loop_header(&graph, NodeShape::Diamond)).unwrap();
        let back = graph
            .edges_into(header.id)
            .find(|edge| edge.kind == EdgeKind::LoopBack)
            .unwrap();
        let above = graph.node(back.from.node).unwrap();
        assert_eq!(above.x, header.x - 2.0);
        assert_eq!(above.y, header.y);

        let after = graph
            .nodes
            .values()
            .find(|node| node.label == vec!["n = 7"])
            .unwrap();
        let into_after: Vec<_> = graph.edges_into(after.id).collect();
        let exit = graph.node(into_after[0].from.node).unwrap();
        assert_eq!(exit.x, header.x);
        assert_eq!(into_after[0].from.port, Some(Port::South));
    }

    #[test]
    fn nested_loop_exits_east() {
        let graph = layout_source(
            "int main() { int i, j; for (i = 0; i < 2; i++) { for (j = 0; j < 2; j++) { i = j; } } }",
        );
        let headers: Vec<_> = graph
            .nodes
            .values()
            .filter(|node| node.shape == NodeShape::Hexagon)
            .collect();
        assert_eq!(headers.len(), 2);
        let inner = headers[1];
        for header in &headers {
            assert!(
                graph
                    .edges_into(header.id)
                    .any(|edge| edge.kind == EdgeKind::LoopBack && edge.to.port == Some(Port::West))
            );
        }
        let back = graph
            .edges_into(inner.id)
            .find(|edge| edge.kind == EdgeKind::LoopBack)
            .unwrap();
        assert_eq!(graph.node(back.from.node).unwrap().x, inner.x - 1.5);
        assert!(graph.edges.iter().any(|edge| edge.from.port == Some(Port::East)
            && graph.node(edge.from.node).is_some_and(|node| node.is_point() && node.x == inner.x + 1.5)));
    }
}
