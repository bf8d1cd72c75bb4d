//! Pinned flowchart layout.
//!
//! Every statement is given its final coordinates while the function body is
//! walked. A vertical [`cursor::Cursor`] hands out rows from the top down;
//! branches shift the column sideways and merge back onto it below their
//! lowest row. Nothing is moved afterwards, so renderers only have to route
//! edges between fixed positions.

mod branch;
mod classify;
mod cursor;
mod loops;
mod switch;
mod text;
mod traverse;

use crate::ast::{Function, TranslationUnit};
use crate::config::LayoutConfig;
use crate::ir::{ArrowHead, EdgeKind, Endpoint, FlowGraph, GraphBuilder, NodeId, NodeShape, Port};
use cursor::Cursor;
use std::collections::BTreeSet;
use tracing::{debug, info};
use traverse::layout_sequence;

/// Where the next statement attaches: a node and the port control leaves by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Anchor {
    node: NodeId,
    port: Port,
}

impl Anchor {
    fn south(node: NodeId) -> Self {
        Self {
            node,
            port: Port::South,
        }
    }

    fn east(node: NodeId) -> Self {
        Self {
            node,
            port: Port::East,
        }
    }

    fn endpoint(self) -> Endpoint {
        Endpoint::new(self.node, self.port)
    }
}

/// Nesting depth and column of the construct being laid out.
#[derive(Debug, Clone, Copy)]
struct Frame {
    depth: usize,
    x: f32,
}

impl Frame {
    fn root(x: f32) -> Self {
        Self { depth: 0, x }
    }

    fn nested(self, x: f32) -> Self {
        Self {
            depth: self.depth + 1,
            x,
        }
    }
}

/// Mutable state of one generation: the graph being written and the cursor.
/// Config and function names are read-only for the whole walk.
struct LayoutContext<'a> {
    config: &'a LayoutConfig,
    names: &'a BTreeSet<String>,
    builder: GraphBuilder,
    cursor: Cursor,
}

impl<'a> LayoutContext<'a> {
    fn new(config: &'a LayoutConfig, names: &'a BTreeSet<String>) -> Self {
        Self {
            config,
            names,
            builder: GraphBuilder::new(),
            cursor: Cursor::new(0.0, config.row_height),
        }
    }

    /// Places a node on the next free row of column `x`.
    fn place(
        &mut self,
        label: Vec<String>,
        shape: NodeShape,
        width: f32,
        x: f32,
    ) -> NodeId {
        let y = self.cursor.next_row();
        self.builder
            .add_node(label, shape, width, self.config.node_height, x, y)
    }

    /// Places a node at a fixed position without consuming a row.
    fn pin(
        &mut self,
        label: Vec<String>,
        shape: NodeShape,
        width: f32,
        x: f32,
        y: f32,
    ) -> NodeId {
        self.cursor.touch(y);
        self.builder
            .add_node(label, shape, width, self.config.node_height, x, y)
    }

    /// Invisible routing point.
    fn point(&mut self, x: f32, y: f32) -> NodeId {
        self.cursor.touch(y);
        self.builder
            .add_node(Vec::new(), NodeShape::Point, 0.0, 0.0, x, y)
    }

    /// Flow edge from `from` into the top of `to`.
    fn flow(&mut self, from: Anchor, to: NodeId, label: Option<&str>) {
        self.connect(
            from.endpoint(),
            Endpoint::new(to, Port::North),
            label,
            EdgeKind::Flow,
        );
    }

    fn flow_between(&mut self, from: Endpoint, to: Endpoint, label: Option<&str>) {
        self.connect(from, to, label, EdgeKind::Flow);
    }

    fn route(&mut self, from: Endpoint, to: Endpoint) {
        self.connect(from, to, None, EdgeKind::Routing);
    }

    fn connect(
        &mut self,
        from: Endpoint,
        to: Endpoint,
        label: Option<&str>,
        kind: EdgeKind,
    ) {
        let (arrow, weight) = match kind {
            EdgeKind::Flow => (self.config.edge_arrows, self.config.edge_weight),
            EdgeKind::Routing => (ArrowHead::None, self.config.edge_weight),
            EdgeKind::LoopBack => (self.config.loopback_arrows, self.config.loop_edge_weight),
        };
        self.builder.add_edge(from, to, label, kind, arrow, weight);
    }

    /// Point on `(x, y)` that `tail` flows into. A tail that already is a
    /// point at that position is returned as is.
    fn merge_point(
        &mut self,
        tail: Anchor,
        x: f32,
        y: f32,
        label: Option<&str>,
    ) -> NodeId {
        if let Some(node) = self.builder.node(tail.node)
            && node.is_point()
            && node.x == x
            && node.y == y
        {
            return tail.node;
        }
        let point = self.point(x, y);
        self.flow(tail, point, label);
        point
    }
}

/// Lays out every function of `unit` as its own cluster, top to bottom in
/// declaration order.
pub fn build_flowchart(unit: &TranslationUnit, config: &LayoutConfig) -> FlowGraph {
    let names: BTreeSet<String> = unit.function_names().map(str::to_string).collect();
    let mut ctx = LayoutContext::new(config, &names);

    let mut top = 0.0;
    let mut previous = None;
    for function in &unit.functions {
        let cluster = layout_function(&mut ctx, function, top);
        if let Some(previous) = previous {
            ctx.builder.link_clusters(previous, cluster);
        }
        previous = Some(cluster);
        top = ctx.cursor.lowest() - config.function_gap;
    }

    let graph = ctx.builder.finish();
    info!(
        functions = unit.functions.len(),
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        "flowchart laid out"
    );
    graph
}

fn layout_function(ctx: &mut LayoutContext<'_>, function: &Function, top: f32) -> usize {
    debug!(function = %function.name, line = function.line, "laying out function");
    let config = ctx.config;
    let cluster = ctx.builder.begin_cluster(
        format!("cluster_{}", function.name),
        format!("{} {}", config.title_prefix, function.signature),
    );

    ctx.cursor.restart(top);
    let start_y = ctx.cursor.next_row();
    let start = ctx.builder.add_node(
        vec!["Start".to_string()],
        NodeShape::RoundRect,
        config.node_width,
        config.start_end_height,
        config.center_x,
        start_y,
    );

    let tail = layout_sequence(
        ctx,
        &function.body.stmts,
        Anchor::south(start),
        None,
        Frame::root(config.center_x),
    );

    let end = ctx.builder.add_node(
        vec!["End".to_string()],
        NodeShape::RoundRect,
        config.node_width,
        config.start_end_height,
        config.center_x,
        ctx.cursor.lowest(),
    );
    ctx.flow(tail, end, None);
    ctx.builder.end_cluster();
    cluster
}
