use crate::config::{Config, RenderConfig};
use crate::ir::{ArrowHead, Edge, EdgeKind, Endpoint, FlowGraph, Node, NodeShape, Port};
use crate::theme::Theme;
use anyhow::Result;
use std::collections::HashMap;
use std::path::Path;

const PADDING: f32 = 20.0;
const LINE_HEIGHT: f32 = 1.2;
/// Average glyph advance relative to the font size.
const CHAR_WIDTH_RATIO: f32 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Rect {
    x: f32,
    y: f32,
    width: f32,
    height: f32,
}

impl Rect {
    fn around(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        Self {
            x: cx - width / 2.0,
            y: cy - height / 2.0,
            width,
            height,
        }
    }

    fn right(&self) -> f32 {
        self.x + self.width
    }

    fn bottom(&self) -> f32 {
        self.y + self.height
    }

    fn union(self, other: Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Rect {
            x,
            y,
            width: self.right().max(other.right()) - x,
            height: self.bottom().max(other.bottom()) - y,
        }
    }

    fn inflate(self, dx: f32, dy: f32) -> Rect {
        Rect {
            x: self.x - dx,
            y: self.y - dy,
            width: self.width + dx * 2.0,
            height: self.height + dy * 2.0,
        }
    }

    fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }
}

/// A node in SVG pixel space: layout units scaled, y pointing down.
#[derive(Debug, Clone, Copy)]
struct Placed {
    cx: f32,
    cy: f32,
    width: f32,
    height: f32,
}

impl Placed {
    fn new(node: &Node, scale: f32) -> Self {
        Self {
            cx: node.x * scale,
            cy: -node.y * scale,
            width: node.width * scale,
            height: node.height * scale,
        }
    }

    fn bounds(&self) -> Rect {
        Rect::around(self.cx, self.cy, self.width, self.height)
    }

    fn port(&self, port: Option<Port>) -> (f32, f32) {
        match port {
            Some(Port::North) => (self.cx, self.cy - self.height / 2.0),
            Some(Port::South) => (self.cx, self.cy + self.height / 2.0),
            Some(Port::East) => (self.cx + self.width / 2.0, self.cy),
            Some(Port::West) => (self.cx - self.width / 2.0, self.cy),
            None => (self.cx, self.cy),
        }
    }
}

/// Draws the pinned graph directly, without Graphviz.
pub fn render_svg(graph: &FlowGraph, config: &Config) -> String {
    let theme = &config.theme;
    let render = &config.render;
    let placed: HashMap<_, _> = graph
        .nodes
        .values()
        .map(|node| (node.id, Placed::new(node, render.scale)))
        .collect();

    let frames = cluster_frames(graph, &placed, render);
    let routes: Vec<Vec<(f32, f32)>> = graph
        .edges
        .iter()
        .map(|edge| route_edge(edge, &placed))
        .collect();

    let mut bounds: Option<Rect> = None;
    for rect in placed
        .values()
        .map(Placed::bounds)
        .chain(frames.iter().map(|(frame, _)| *frame))
    {
        bounds = Some(bounds.map_or(rect, |current| current.union(rect)));
    }
    let bounds = bounds.unwrap_or(Rect {
        x: 0.0,
        y: 0.0,
        width: 0.0,
        height: 0.0,
    });
    let width = bounds.width + PADDING * 2.0;
    let height = bounds.height + PADDING * 2.0;
    let shift_x = PADDING - bounds.x;
    let shift_y = PADDING - bounds.y;

    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width:.2}\" height=\"{height:.2}\" viewBox=\"0 0 {width:.2} {height:.2}\">",
    ));
    svg.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        theme.background
    ));
    svg.push_str(&markers(theme));
    svg.push_str(&format!(
        "<g transform=\"translate({shift_x:.2} {shift_y:.2})\">"
    ));

    for ((frame, title_y), cluster) in frames.iter().zip(&graph.clusters) {
        svg.push_str(&format!(
            "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"1.2\"/>",
            frame.x,
            frame.y,
            frame.width,
            frame.height,
            theme.cluster_background,
            theme.cluster_border
        ));
        svg.push_str(&format!(
            "<text x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"middle\" font-family=\"{}\" font-size=\"{}\" font-weight=\"bold\" fill=\"{}\">{}</text>",
            frame.x + frame.width / 2.0,
            title_y,
            escape_xml(&theme.font_family),
            render.cluster_fontsize,
            theme.primary_text_color,
            escape_xml(&cluster.title)
        ));
    }

    for (edge, points) in graph.edges.iter().zip(&routes) {
        let marker = match edge.arrow {
            ArrowHead::None => String::new(),
            arrow => format!(" marker-end=\"url(#arrow-{})\"", arrow.as_str()),
        };
        let dash = if edge.kind == EdgeKind::LoopBack {
            " stroke-dasharray=\"6 3\""
        } else {
            ""
        };
        svg.push_str(&format!(
            "<path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{}\"{}{} />",
            points_to_path(points),
            theme.line_color,
            render.edge_penwidth,
            dash,
            marker
        ));
    }

    for (x, y, label) in edge_label_positions(&graph.edges, &routes, render) {
        let label_width = text_width(label, render.edge_fontsize);
        let label_height = render.edge_fontsize * LINE_HEIGHT;
        svg.push_str(&format!(
            "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"{}\"/>",
            x - label_width / 2.0 - 2.0,
            y - label_height / 2.0,
            label_width + 4.0,
            label_height,
            theme.edge_label_background
        ));
        svg.push_str(&text_block_svg(
            x,
            y,
            std::slice::from_ref(&label.to_string()),
            render.edge_fontsize,
            theme,
        ));
    }

    for node in graph.nodes.values().filter(|node| !node.is_point()) {
        let Some(place) = placed.get(&node.id) else {
            continue;
        };
        svg.push_str(&shape_svg(node.shape, place, theme, render));
        svg.push_str(&text_block_svg(
            place.cx,
            place.cy,
            &node.label,
            render.node_fontsize,
            theme,
        ));
    }

    svg.push_str("</g></svg>");
    svg
}

/// Frame rectangle and title baseline for each cluster, in cluster order.
fn cluster_frames(
    graph: &FlowGraph,
    placed: &HashMap<crate::ir::NodeId, Placed>,
    render: &RenderConfig,
) -> Vec<(Rect, f32)> {
    let title_height = render.cluster_fontsize * LINE_HEIGHT;
    graph
        .clusters
        .iter()
        .enumerate()
        .map(|(index, _)| {
            let mut bounds: Option<Rect> = None;
            for node in graph.cluster_nodes(index) {
                if let Some(place) = placed.get(&node.id) {
                    let rect = place.bounds();
                    bounds = Some(bounds.map_or(rect, |current| current.union(rect)));
                }
            }
            let inner = bounds.unwrap_or(Rect {
                x: 0.0,
                y: 0.0,
                width: 0.0,
                height: 0.0,
            });
            let mut frame = inner.inflate(render.cluster_margin, render.cluster_margin);
            frame.y -= title_height;
            frame.height += title_height;
            let title_y = frame.y + title_height;
            (frame, title_y)
        })
        .collect()
}

/// Port-to-port polyline with at most one elbow. Vertical ports leave
/// vertically, horizontal ports leave horizontally.
fn route_edge(edge: &Edge, placed: &HashMap<crate::ir::NodeId, Placed>) -> Vec<(f32, f32)> {
    let (Some(from), Some(to)) = (placed.get(&edge.from.node), placed.get(&edge.to.node)) else {
        return Vec::new();
    };
    let start = from.port(edge.from.port);
    let end = to.port(edge.to.port);
    if start.0 == end.0 || start.1 == end.1 {
        return vec![start, end];
    }
    let elbow = if leaves_horizontally(edge.from) {
        (end.0, start.1)
    } else {
        (start.0, end.1)
    };
    vec![start, elbow, end]
}

fn leaves_horizontally(endpoint: Endpoint) -> bool {
    matches!(endpoint.port, Some(Port::East) | Some(Port::West))
}

fn points_to_path(points: &[(f32, f32)]) -> String {
    if points.is_empty() {
        return String::new();
    }
    let mut d = String::new();
    d.push_str(&format!("M {:.2} {:.2}", points[0].0, points[0].1));
    for point in points.iter().skip(1) {
        d.push_str(&format!(" L {:.2} {:.2}", point.0, point.1));
    }
    d
}

fn markers(theme: &Theme) -> String {
    let color = &theme.line_color;
    let mut defs = String::from("<defs>");
    defs.push_str(&format!(
        "<marker id=\"arrow-normal\" viewBox=\"0 0 10 10\" refX=\"10\" refY=\"5\" markerWidth=\"6\" markerHeight=\"6\" orient=\"auto\"><path d=\"M 0 0 L 10 5 L 0 10 z\" fill=\"{color}\"/></marker>"
    ));
    defs.push_str(&format!(
        "<marker id=\"arrow-vee\" viewBox=\"0 0 10 10\" refX=\"10\" refY=\"5\" markerWidth=\"7\" markerHeight=\"7\" orient=\"auto\"><path d=\"M 0 0 L 10 5 L 0 10 L 3 5 z\" fill=\"{color}\"/></marker>"
    ));
    defs.push_str(&format!(
        "<marker id=\"arrow-empty\" viewBox=\"0 0 10 10\" refX=\"10\" refY=\"5\" markerWidth=\"6\" markerHeight=\"6\" orient=\"auto\"><path d=\"M 0 0 L 10 5 L 0 10 z\" fill=\"none\" stroke=\"{color}\"/></marker>"
    ));
    defs.push_str(&format!(
        "<marker id=\"arrow-dot\" viewBox=\"0 0 10 10\" refX=\"10\" refY=\"5\" markerWidth=\"5\" markerHeight=\"5\"><circle cx=\"5\" cy=\"5\" r=\"5\" fill=\"{color}\"/></marker>"
    ));
    defs.push_str("</defs>");
    defs
}

fn shape_svg(shape: NodeShape, place: &Placed, theme: &Theme, render: &RenderConfig) -> String {
    let Placed {
        cx,
        cy,
        width: w,
        height: h,
    } = *place;
    let (left, right, top, bottom) = (cx - w / 2.0, cx + w / 2.0, cy - h / 2.0, cy + h / 2.0);
    let fill = match shape {
        NodeShape::Diamond | NodeShape::Hexagon => &theme.decision_color,
        NodeShape::Parallelogram => &theme.io_color,
        NodeShape::RoundRect => &theme.terminator_color,
        _ => &theme.primary_color,
    };
    let style = format!(
        "fill=\"{}\" stroke=\"{}\" stroke-width=\"{}\"",
        fill, theme.primary_border_color, render.node_penwidth
    );
    match shape {
        NodeShape::Rectangle => format!(
            "<rect x=\"{left:.2}\" y=\"{top:.2}\" width=\"{w:.2}\" height=\"{h:.2}\" {style}/>"
        ),
        NodeShape::RoundRect => {
            let radius = h / 2.0;
            format!(
                "<rect x=\"{left:.2}\" y=\"{top:.2}\" width=\"{w:.2}\" height=\"{h:.2}\" rx=\"{radius:.2}\" ry=\"{radius:.2}\" {style}/>"
            )
        }
        NodeShape::Subroutine => {
            let inset = (w * 0.08).min(10.0);
            format!(
                "<rect x=\"{left:.2}\" y=\"{top:.2}\" width=\"{w:.2}\" height=\"{h:.2}\" {style}/><path d=\"M {:.2} {top:.2} L {:.2} {bottom:.2} M {:.2} {top:.2} L {:.2} {bottom:.2}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{}\"/>",
                left + inset,
                left + inset,
                right - inset,
                right - inset,
                theme.primary_border_color,
                render.node_penwidth
            )
        }
        NodeShape::Diamond => polygon(&[(cx, top), (right, cy), (cx, bottom), (left, cy)], &style),
        NodeShape::Hexagon => {
            let inset = (w / 4.0).min(h / 2.0);
            polygon(
                &[
                    (left + inset, top),
                    (right - inset, top),
                    (right, cy),
                    (right - inset, bottom),
                    (left + inset, bottom),
                    (left, cy),
                ],
                &style,
            )
        }
        NodeShape::Parallelogram => {
            let skew = h * 0.3;
            polygon(
                &[
                    (left + skew, top),
                    (right, top),
                    (right - skew, bottom),
                    (left, bottom),
                ],
                &style,
            )
        }
        NodeShape::Point => String::new(),
    }
}

fn polygon(points: &[(f32, f32)], style: &str) -> String {
    let points = points
        .iter()
        .map(|(x, y)| format!("{x:.2},{y:.2}"))
        .collect::<Vec<_>>()
        .join(" ");
    format!("<polygon points=\"{points}\" {style}/>")
}

fn text_block_svg(x: f32, y: f32, lines: &[String], font_size: f32, theme: &Theme) -> String {
    let line_height = font_size * LINE_HEIGHT;
    let total_height = lines.len() as f32 * line_height;
    let start_y = y - total_height / 2.0 + font_size * 0.9;
    let mut text = String::new();
    text.push_str(&format!(
        "<text x=\"{x:.2}\" y=\"{start_y:.2}\" text-anchor=\"middle\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">",
        escape_xml(&theme.font_family),
        font_size,
        theme.primary_text_color
    ));
    for (idx, line) in lines.iter().enumerate() {
        let dy = if idx == 0 { 0.0 } else { line_height };
        text.push_str(&format!(
            "<tspan x=\"{x:.2}\" dy=\"{dy:.2}\">{}</tspan>",
            escape_xml(line)
        ));
    }
    text.push_str("</text>");
    text
}

fn text_width(text: &str, font_size: f32) -> f32 {
    text.chars().count() as f32 * font_size * CHAR_WIDTH_RATIO
}

/// Places each edge label beside the start of its first segment, nudging it
/// down until it clears labels already placed.
fn edge_label_positions<'a>(
    edges: &'a [Edge],
    routes: &[Vec<(f32, f32)>],
    render: &RenderConfig,
) -> Vec<(f32, f32, &'a str)> {
    let mut occupied: Vec<Rect> = Vec::new();
    let mut positions = Vec::new();
    let height = render.edge_fontsize * LINE_HEIGHT;

    for (edge, points) in edges.iter().zip(routes) {
        let Some(label) = edge.label.as_deref() else {
            continue;
        };
        if points.len() < 2 {
            continue;
        }
        let width = text_width(label, render.edge_fontsize);
        let (start, next) = (points[0], points[1]);
        let (base_x, base_y) = if start.0 == next.0 {
            (start.0 + width / 2.0 + 4.0, start.1 + height)
        } else {
            ((start.0 + next.0) / 2.0, start.1 - height / 2.0 - 2.0)
        };

        let mut offset = 0.0;
        let mut placed = (base_x, base_y);
        for _ in 0..6 {
            let rect = Rect::around(base_x, base_y + offset, width + 4.0, height);
            if !occupied.iter().any(|other| rect.overlaps(other)) {
                occupied.push(rect);
                placed = (base_x, base_y + offset);
                break;
            }
            offset += height + 2.0;
        }
        positions.push((placed.0, placed.1, label));
    }
    positions
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, render_cfg: &RenderConfig) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.font_family = "Times New Roman".to_string();
    opt.fontdb_mut().load_system_fonts();
    if let Some(size) = usvg::Size::from_wh(render_cfg.width, render_cfg.height) {
        opt.default_size = size;
    }

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{EdgeKind, GraphBuilder};

    fn two_nodes(from_port: Port) -> (FlowGraph, Config) {
        let mut builder = GraphBuilder::new();
        builder.begin_cluster("cluster_main".into(), "Flowchart of int main()".into());
        let a = builder.add_node(vec!["a < b".into()], NodeShape::Diamond, 2.0, 1.0, 12.0, 0.0);
        let b = builder.add_node(vec!["x = 1".into()], NodeShape::Rectangle, 1.5, 1.0, 15.0, -1.5);
        builder.add_edge(
            Endpoint::new(a, from_port),
            Endpoint::new(b, Port::North),
            Some("True"),
            EdgeKind::Flow,
            ArrowHead::Normal,
            50,
        );
        builder.end_cluster();
        (builder.finish(), Config::default())
    }

    #[test]
    fn render_svg_basic() {
        let (graph, config) = two_nodes(Port::South);
        let svg = render_svg(&graph, &config);
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("a &lt; b"));
        assert!(svg.contains("<polygon"));
        assert!(svg.contains("marker-end=\"url(#arrow-normal)\""));
        assert!(svg.contains("Flowchart of int main()"));
        assert!(svg.ends_with("</g></svg>"));
    }

    #[test]
    fn vertical_port_routes_down_then_across() {
        let (graph, config) = two_nodes(Port::South);
        let placed: HashMap<_, _> = graph
            .nodes
            .values()
            .map(|node| (node.id, Placed::new(node, config.render.scale)))
            .collect();
        let points = route_edge(&graph.edges[0], &placed);
        assert_eq!(points.len(), 3);
        assert_eq!(points[0], (864.0, 36.0));
        assert_eq!(points[1], (864.0, 72.0));
        assert_eq!(points[2], (1080.0, 72.0));
    }

    #[test]
    fn horizontal_port_routes_across_then_down() {
        let (graph, config) = two_nodes(Port::East);
        let placed: HashMap<_, _> = graph
            .nodes
            .values()
            .map(|node| (node.id, Placed::new(node, config.render.scale)))
            .collect();
        let points = route_edge(&graph.edges[0], &placed);
        assert_eq!(points[1], (1080.0, 0.0));
    }

    #[test]
    fn escape_xml_handles_specials() {
        assert_eq!(escape_xml("a<b & \"c\""), "a&lt;b &amp; &quot;c&quot;");
    }
}
