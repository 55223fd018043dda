//! HTML Writer
//!
//! Renders a laid-out evolution graph as a standalone HTML page: absolutely
//! positioned node cards over an SVG layer of edges and condition badges.

use std::fs;
use std::path::Path;

use askama::Template;

use crate::error::Result;
use crate::graph::{EvolutionGraph, GraphEdge};
use crate::labels::trigger_icon;
use crate::layout::{Direction, LayoutConfig, extent};

/// Node card data for the template
#[derive(Debug, Clone)]
pub struct NodeView {
    pub id: String,
    pub label: String,
    /// Empty when the node has no sprite
    pub image: String,
    pub types: Vec<String>,
    pub x: f64,
    pub y: f64,
}

/// Edge line and badge data for the template
#[derive(Debug, Clone)]
pub struct EdgeView {
    pub id: String,
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    /// Empty when the edge has no condition
    pub label: String,
    pub icon: &'static str,
    pub label_x: f64,
    pub label_y: f64,
}

#[derive(Template)]
#[template(path = "graph.html")]
struct GraphTemplate<'a> {
    title: &'a str,
    width: f64,
    height: f64,
    node_width: f64,
    node_height: f64,
    nodes: &'a [NodeView],
    edges: &'a [EdgeView],
}

/// Writer for standalone HTML graph pages
#[derive(Debug, Clone, Default)]
pub struct HtmlWriter {
    layout: LayoutConfig,
}

impl HtmlWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the node box size and direction the graph was laid out with
    pub fn with_layout(layout: LayoutConfig) -> Self {
        Self { layout }
    }

    fn node_views(graph: &EvolutionGraph) -> Vec<NodeView> {
        graph
            .nodes
            .iter()
            .map(|n| NodeView {
                id: n.id.clone(),
                label: n.label.clone(),
                image: n.image.clone().unwrap_or_default(),
                types: n
                    .types
                    .iter()
                    .flatten()
                    .map(|t| t.name.clone())
                    .collect(),
                x: n.position.x,
                y: n.position.y,
            })
            .collect()
    }

    fn edge_view(&self, graph: &EvolutionGraph, edge: &GraphEdge) -> Option<EdgeView> {
        let source = graph.node(&edge.source)?.position;
        let target = graph.node(&edge.target)?.position;
        let (w, h) = (self.layout.node_width, self.layout.node_height);

        let (x1, y1, x2, y2) = match self.layout.direction {
            Direction::LeftToRight => {
                (source.x + w, source.y + h / 2.0, target.x, target.y + h / 2.0)
            }
            Direction::TopToBottom => {
                (source.x + w / 2.0, source.y + h, target.x + w / 2.0, target.y)
            }
        };

        Some(EdgeView {
            id: edge.id.clone(),
            x1,
            y1,
            x2,
            y2,
            label: edge.label.clone().unwrap_or_default(),
            icon: trigger_icon(edge.trigger.as_deref().unwrap_or_default()),
            label_x: (x1 + x2) / 2.0,
            label_y: (y1 + y2) / 2.0,
        })
    }

    /// Render the page to a string
    pub fn render(&self, graph: &EvolutionGraph) -> Result<String> {
        let nodes = Self::node_views(graph);
        let edges: Vec<EdgeView> = graph
            .edges
            .iter()
            .filter_map(|e| self.edge_view(graph, e))
            .collect();
        let (width, height) = extent(&graph.nodes, &self.layout);

        let title = graph
            .node(&graph.root)
            .map(|n| n.label.as_str())
            .unwrap_or(graph.root.as_str());

        let template = GraphTemplate {
            title,
            width,
            height,
            node_width: self.layout.node_width,
            node_height: self.layout.node_height,
            nodes: &nodes,
            edges: &edges,
        };
        Ok(template.render()?)
    }

    /// Render the page into `output`
    pub fn write(&self, graph: &EvolutionGraph, output: &Path) -> Result<()> {
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(output, self.render(graph)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphNode;
    use crate::layout::layout;
    use crate::model::TypeRef;
    use tempfile::TempDir;

    fn pichu_line() -> EvolutionGraph {
        let mut graph = EvolutionGraph::new("pichu");
        let mut pichu = GraphNode::placeholder("pichu", 172);
        pichu.label = "Pichu".to_string();
        pichu.image = Some("https://sprites.test/172.png".to_string());
        pichu.types = Some(vec![TypeRef {
            slot: 1,
            name: "electric".to_string(),
        }]);
        graph.nodes = vec![pichu, GraphNode::placeholder("pikachu", 25)];
        graph.edges = vec![GraphEdge {
            id: "pichu-pikachu".to_string(),
            source: "pichu".to_string(),
            target: "pikachu".to_string(),
            label: Some("Level up friendship 160+".to_string()),
            trigger: Some("level-up".to_string()),
        }];
        layout(&mut graph, &LayoutConfig::default()).unwrap();
        graph
    }

    #[test]
    fn edge_runs_between_facing_sides() {
        let graph = pichu_line();
        let view = HtmlWriter::new().edge_view(&graph, &graph.edges[0]).unwrap();
        assert_eq!((view.x1, view.y1), (200.0, 100.0));
        assert_eq!((view.x2, view.y2), (350.0, 100.0));
        assert_eq!(view.label_x, 275.0);
        assert_eq!(view.icon, "⬆️");
    }

    #[test]
    fn edge_to_missing_node_is_dropped() {
        let graph = pichu_line();
        let dangling = GraphEdge {
            id: "pichu-ghost".to_string(),
            source: "pichu".to_string(),
            target: "ghost".to_string(),
            label: None,
            trigger: None,
        };
        assert!(HtmlWriter::new().edge_view(&graph, &dangling).is_none());
    }

    #[test]
    fn renders_cards_and_edges() {
        let html = HtmlWriter::new().render(&pichu_line()).unwrap();
        assert!(html.contains("<title>Pichu"));
        assert!(html.contains("https://sprites.test/172.png"));
        assert!(html.contains("type-electric"));
        assert!(html.contains("Level up friendship 160+"));
        assert!(html.contains(r#"data-id="pikachu""#));
    }

    #[test]
    fn labels_are_escaped() {
        let mut graph = pichu_line();
        graph.nodes[1].label = "<script>".to_string();
        let html = HtmlWriter::new().render(&graph).unwrap();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&#60;script&#62;"));
    }

    #[test]
    fn write_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("pichu.html");
        HtmlWriter::new().write(&pichu_line(), &path).unwrap();
        assert!(fs::read_to_string(path).unwrap().starts_with("<!DOCTYPE html>"));
    }
}
