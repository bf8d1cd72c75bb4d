use crate::ir::{Endpoint, FlowGraph};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
    pub clusters: Vec<ClusterDump>,
    pub cluster_links: Vec<[String; 2]>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: String,
    pub shape: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub label_lines: Vec<String>,
    pub cluster: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct EdgeDump {
    pub from: String,
    pub to: String,
    pub label: Option<String>,
    pub kind: String,
    pub arrow: String,
    pub weight: u32,
}

#[derive(Debug, Serialize)]
pub struct ClusterDump {
    pub index: usize,
    pub name: String,
    pub title: String,
    pub nodes: Vec<String>,
}

fn endpoint_id(endpoint: Endpoint) -> String {
    match endpoint.port {
        Some(port) => format!("{}:{}", endpoint.node, port.as_str()),
        None => endpoint.node.to_string(),
    }
}

impl LayoutDump {
    pub fn from_graph(graph: &FlowGraph) -> Self {
        let nodes = graph
            .nodes
            .values()
            .map(|node| NodeDump {
                id: node.id.to_string(),
                shape: format!("{:?}", node.shape),
                x: node.x,
                y: node.y,
                width: node.width,
                height: node.height,
                label_lines: node.label.clone(),
                cluster: node.cluster,
            })
            .collect();

        let edges = graph
            .edges
            .iter()
            .map(|edge| EdgeDump {
                from: endpoint_id(edge.from),
                to: endpoint_id(edge.to),
                label: edge.label.clone(),
                kind: format!("{:?}", edge.kind),
                arrow: edge.arrow.as_str().to_string(),
                weight: edge.weight,
            })
            .collect();

        let clusters = graph
            .clusters
            .iter()
            .enumerate()
            .map(|(index, cluster)| ClusterDump {
                index,
                name: cluster.name.clone(),
                title: cluster.title.clone(),
                nodes: cluster.nodes.iter().map(ToString::to_string).collect(),
            })
            .collect();

        let cluster_links = graph
            .cluster_links
            .iter()
            .filter_map(|link| {
                let from = graph.clusters.get(link.from)?;
                let to = graph.clusters.get(link.to)?;
                Some([from.name.clone(), to.name.clone()])
            })
            .collect();

        LayoutDump {
            nodes,
            edges,
            clusters,
            cluster_links,
        }
    }
}

pub fn layout_dump_json(graph: &FlowGraph) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(&LayoutDump::from_graph(graph))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{ArrowHead, EdgeKind, GraphBuilder, NodeShape, Port};

    #[test]
    fn dump_lists_ports_and_clusters() {
        let mut builder = GraphBuilder::new();
        builder.begin_cluster("cluster_main".into(), "Flowchart of int main()".into());
        let a = builder.add_node(vec!["Start".into()], NodeShape::RoundRect, 1.5, 0.5, 12.0, 0.0);
        let b = builder.add_node(vec![], NodeShape::Point, 0.0, 0.0, 12.0, -1.5);
        builder.add_edge(
            Endpoint::new(a, Port::South),
            Endpoint::center(b),
            None,
            EdgeKind::Routing,
            ArrowHead::None,
            50,
        );
        builder.end_cluster();

        let json = layout_dump_json(&builder.finish()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["edges"][0]["from"], "node0:s");
        assert_eq!(value["edges"][0]["to"], "node1");
        assert_eq!(value["edges"][0]["kind"], "Routing");
        assert_eq!(value["nodes"][1]["shape"], "Point");
        assert_eq!(value["clusters"][0]["nodes"][1], "node1");
    }
}
