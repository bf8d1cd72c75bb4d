use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeShape {
    /// Plain statement box.
    Rectangle,
    /// Conditions and switch subjects.
    Diamond,
    /// Counted (`for`) loop header.
    Hexagon,
    /// Input/output statement.
    Parallelogram,
    /// Call of a user-defined function (record shape).
    Subroutine,
    /// Start / End terminators.
    RoundRect,
    /// Invisible routing point.
    Point,
}

/// Compass port on a node's border.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Port {
    North,
    South,
    East,
    West,
}

impl Port {
    pub fn as_str(self) -> &'static str {
        match self {
            Port::North => "n",
            Port::South => "s",
            Port::East => "e",
            Port::West => "w",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrowHead {
    Normal,
    Vee,
    Empty,
    Dot,
    None,
}

impl ArrowHead {
    pub fn as_str(self) -> &'static str {
        match self {
            ArrowHead::Normal => "normal",
            ArrowHead::Vee => "vee",
            ArrowHead::Empty => "empty",
            ArrowHead::Dot => "dot",
            ArrowHead::None => "none",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    /// Control flow into a visible node.
    Flow,
    /// Segment between routing points; drawn without an arrowhead.
    Routing,
    /// Loop body back into the loop header.
    LoopBack,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub label: Vec<String>,
    pub shape: NodeShape,
    pub width: f32,
    pub height: f32,
    pub x: f32,
    pub y: f32,
    pub cluster: Option<usize>,
}

impl Node {
    pub fn is_point(&self) -> bool {
        self.shape == NodeShape::Point
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    pub node: NodeId,
    pub port: Option<Port>,
}

impl Endpoint {
    pub fn new(node: NodeId, port: Port) -> Self {
        Self {
            node,
            port: Some(port),
        }
    }

    pub fn center(node: NodeId) -> Self {
        Self { node, port: None }
    }
}

#[derive(Debug, Clone)]
pub struct Edge {
    pub from: Endpoint,
    pub to: Endpoint,
    pub label: Option<String>,
    pub kind: EdgeKind,
    pub arrow: ArrowHead,
    pub weight: u32,
    pub cluster: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct Cluster {
    /// Graph-level identifier, e.g. `cluster_main`.
    pub name: String,
    pub title: String,
    pub nodes: Vec<NodeId>,
}

/// Invisible ordering link between two consecutive clusters.
#[derive(Debug, Clone)]
pub struct ClusterLink {
    pub from: usize,
    pub to: usize,
}

#[derive(Debug, Clone, Default)]
pub struct FlowGraph {
    pub nodes: BTreeMap<NodeId, Node>,
    pub edges: Vec<Edge>,
    pub clusters: Vec<Cluster>,
    pub cluster_links: Vec<ClusterLink>,
}

impl FlowGraph {
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn cluster_nodes(&self, cluster: usize) -> impl Iterator<Item = &Node> {
        self.clusters
            .get(cluster)
            .into_iter()
            .flat_map(|c| c.nodes.iter())
            .filter_map(|id| self.nodes.get(id))
    }

    pub fn cluster_edges(&self, cluster: usize) -> impl Iterator<Item = &Edge> {
        self.edges
            .iter()
            .filter(move |edge| edge.cluster == Some(cluster))
    }

    pub fn edges_into(&self, id: NodeId) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(move |edge| edge.to.node == id)
    }

    pub fn edges_from(&self, id: NodeId) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(move |edge| edge.from.node == id)
    }
}

/// Insertion-only writer for a [`FlowGraph`]. Owns the node counter, so a
/// fresh builder per generation keeps ids independent between calls.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    graph: FlowGraph,
    next_id: usize,
    current_cluster: Option<usize>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_cluster(&mut self, name: String, title: String) -> usize {
        let index = self.graph.clusters.len();
        self.graph.clusters.push(Cluster {
            name,
            title,
            nodes: Vec::new(),
        });
        self.current_cluster = Some(index);
        index
    }

    pub fn end_cluster(&mut self) {
        self.current_cluster = None;
    }

    pub fn add_node(
        &mut self,
        label: Vec<String>,
        shape: NodeShape,
        width: f32,
        height: f32,
        x: f32,
        y: f32,
    ) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        if let Some(cluster) = self.current_cluster {
            self.graph.clusters[cluster].nodes.push(id);
        }
        self.graph.nodes.insert(
            id,
            Node {
                id,
                label,
                shape,
                width,
                height,
                x,
                y,
                cluster: self.current_cluster,
            },
        );
        id
    }

    pub fn add_edge(
        &mut self,
        from: Endpoint,
        to: Endpoint,
        label: Option<&str>,
        kind: EdgeKind,
        arrow: ArrowHead,
        weight: u32,
    ) {
        self.graph.edges.push(Edge {
            from,
            to,
            label: label.map(str::to_string),
            kind,
            arrow,
            weight,
            cluster: self.current_cluster,
        });
    }

    pub fn link_clusters(&mut self, from: usize, to: usize) {
        self.graph.cluster_links.push(ClusterLink { from, to });
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.graph.nodes.get(&id)
    }

    pub fn finish(self) -> FlowGraph {
        self.graph
    }
}
