//! Graphviz description of a pinned [`FlowGraph`].
//!
//! Every node carries `pin=true` and an absolute `pos`, so `fdp`/`neato` only
//! route edges. Point nodes are invisible zero-size joints.

use crate::config::{Config, RenderConfig};
use crate::ir::{Cluster, Edge, Endpoint, FlowGraph, Node, NodeShape};
use std::fmt::Write;

pub fn write_dot(graph: &FlowGraph, config: &Config) -> String {
    let render = &config.render;
    let mut out = String::new();
    out.push_str("digraph {\n");
    let _ = writeln!(
        out,
        "\tgraph [layout={} overlap={} nodesep={} splines=true]",
        render.engine,
        quote(&render.overlap),
        render.nodesep
    );

    for (index, cluster) in graph.clusters.iter().enumerate() {
        write_cluster(&mut out, graph, index, cluster, render);
    }

    for node in graph.nodes.values().filter(|node| node.cluster.is_none()) {
        write_node(&mut out, node, render, "\t");
    }
    for edge in graph.edges.iter().filter(|edge| edge.cluster.is_none()) {
        write_edge(&mut out, edge, render, "\t");
    }

    for link in &graph.cluster_links {
        let (Some(from), Some(to)) = (graph.clusters.get(link.from), graph.clusters.get(link.to))
        else {
            continue;
        };
        let _ = writeln!(
            out,
            "\t{} -> {} [len=0.1 style=invis]",
            from.name, to.name
        );
    }

    out.push_str("}\n");
    out
}

fn write_cluster(
    out: &mut String,
    graph: &FlowGraph,
    index: usize,
    cluster: &Cluster,
    render: &RenderConfig,
) {
    let _ = writeln!(out, "\tsubgraph {} {{", cluster.name);
    let _ = writeln!(
        out,
        "\t\tlabel=< <B>{}</B> > fontsize={} labelloc=t margin={}",
        html_title(&cluster.title),
        render.cluster_fontsize,
        render.cluster_margin
    );
    out.push_str("\t\toverlap=true\n");
    for node in graph.cluster_nodes(index) {
        write_node(out, node, render, "\t\t");
    }
    for edge in graph.cluster_edges(index) {
        write_edge(out, edge, render, "\t\t");
    }
    out.push_str("\t}\n");
}

fn write_node(out: &mut String, node: &Node, render: &RenderConfig, indent: &str) {
    let pos = format!("{},{}!", node.x, node.y);
    if node.is_point() {
        let _ = writeln!(
            out,
            "{indent}{} [label=\"\" shape=point width=0 height=0 style=invis pin=true pos={}]",
            node.id,
            quote(&pos)
        );
        return;
    }
    let label = match node.shape {
        NodeShape::Subroutine => format!("| {} |", join_lines(&node.label, escape_record)),
        _ => join_lines(&node.label, escape_label),
    };
    let _ = writeln!(
        out,
        "{indent}{} [label=\"{}\" shape={} fixedsize=true width={} height={} fontsize={} penwidth={} pin=true pos={}]",
        node.id,
        label,
        shape_name(node.shape),
        node.width,
        node.height,
        render.node_fontsize,
        render.node_penwidth,
        quote(&pos)
    );
}

fn write_edge(out: &mut String, edge: &Edge, render: &RenderConfig, indent: &str) {
    let _ = write!(
        out,
        "{indent}{} -> {} [arrowhead={} weight={} fontsize={} penwidth={}",
        endpoint(edge.from),
        endpoint(edge.to),
        edge.arrow.as_str(),
        edge.weight,
        render.edge_fontsize,
        render.edge_penwidth
    );
    if let Some(label) = &edge.label {
        let _ = write!(out, " label=\"{}\"", escape_label(label));
    }
    out.push_str("]\n");
}

fn endpoint(endpoint: Endpoint) -> String {
    match endpoint.port {
        Some(port) => format!("{}:{}", endpoint.node, port.as_str()),
        None => endpoint.node.to_string(),
    }
}

fn shape_name(shape: NodeShape) -> &'static str {
    match shape {
        NodeShape::Rectangle => "rectangle",
        NodeShape::Diamond => "diamond",
        NodeShape::Hexagon => "hexagon",
        NodeShape::Parallelogram => "parallelogram",
        NodeShape::Subroutine => "record",
        NodeShape::RoundRect => "Mrecord",
        NodeShape::Point => "point",
    }
}

fn join_lines(lines: &[String], escape: fn(&str) -> String) -> String {
    lines
        .iter()
        .map(|line| escape(line))
        .collect::<Vec<_>>()
        .join("\\n")
}

fn quote(value: &str) -> String {
    format!("\"{}\"", escape_label(value))
}

fn escape_label(input: &str) -> String {
    input.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Record labels additionally treat `{}|<>` as field syntax.
fn escape_record(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in escape_label(input).chars() {
        if matches!(ch, '{' | '}' | '|' | '<' | '>') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Cluster titles are HTML labels; spaces are kept as `&nbsp;` so Graphviz
/// does not collapse them.
fn html_title(title: &str) -> String {
    title
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace(' ', "&nbsp;")
}
