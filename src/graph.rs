//! Graph builder: flattens an evolution tree into nodes and labeled edges.
//!
//! Nodes are emitted in the order given by [`Traversal`]; that order is also the
//! initial in-rank order for the layout pass, so it is part of the contract.

use serde::{Deserialize, Serialize};

use crate::labels;
use crate::model::{EvolutionNode, Position, TypeRef};

/// A species in the evolution graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Species slug, unique per graph (e.g. "ivysaur")
    pub id: String,

    /// Numeric species id
    pub species_id: u32,

    /// Display label; the slug until enrichment replaces it
    pub label: String,

    /// Sprite currently selected for display
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_image: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shiny_image: Option<String>,

    /// Type badges; None until enriched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub types: Option<Vec<TypeRef>>,

    #[serde(default)]
    pub position: Position,
}

impl GraphNode {
    /// A node with placeholder display fields
    pub fn placeholder(id: impl Into<String>, species_id: u32) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            species_id,
            image: None,
            default_image: None,
            shiny_image: None,
            types: None,
            position: Position::default(),
        }
    }

    pub fn is_enriched(&self) -> bool {
        self.types.is_some()
    }
}

/// A parent -> child evolution step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    /// "{source}-{target}"
    pub id: String,

    pub source: String,

    pub target: String,

    /// Formatted first condition; None when the upstream lists no condition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Trigger slug of the first condition, for the badge icon
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<String>,
}

/// Complete graph of one evolution chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionGraph {
    /// Id of the base species
    pub root: String,

    pub nodes: Vec<GraphNode>,

    pub edges: Vec<GraphEdge>,

    /// Version of the graph format
    pub format_version: String,
}

impl EvolutionGraph {
    pub const FORMAT_VERSION: &'static str = "1.0";

    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            nodes: Vec::new(),
            edges: Vec::new(),
            format_version: Self::FORMAT_VERSION.to_string(),
        }
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Edges leaving `id`, in insertion order
    pub fn outgoing<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a GraphEdge> + 'a {
        self.edges.iter().filter(move |e| e.source == id)
    }

    /// Point every node's `image` at the shiny or the default sprite
    pub fn select_sprites(&mut self, shiny: bool) {
        for node in &mut self.nodes {
            node.image = if shiny {
                node.shiny_image.clone()
            } else {
                node.default_image.clone()
            };
        }
    }
}

/// Order in which the tree is flattened
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Traversal {
    /// Depth-first, parent before children, children in source order
    #[default]
    PreOrder,
}

/// Builds an [`EvolutionGraph`] from a parsed tree
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    traversal: Traversal,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_traversal(traversal: Traversal) -> Self {
        Self { traversal }
    }

    pub fn build(&self, tree: &EvolutionNode) -> EvolutionGraph {
        let mut graph = EvolutionGraph::new(tree.name.clone());
        match self.traversal {
            Traversal::PreOrder => Self::add_pre_order(tree, None, &mut graph),
        }
        graph
    }

    fn add_pre_order(node: &EvolutionNode, parent: Option<&str>, graph: &mut EvolutionGraph) {
        graph
            .nodes
            .push(GraphNode::placeholder(node.name.clone(), node.species_id));

        if let Some(parent) = parent {
            let condition = node.display_condition();
            graph.edges.push(GraphEdge {
                id: format!("{}-{}", parent, node.name),
                source: parent.to_string(),
                target: node.name.clone(),
                label: condition.map(labels::format_condition),
                trigger: condition.map(|c| c.trigger.slug().to_string()),
            });
        }

        for child in &node.children {
            Self::add_pre_order(child, Some(&node.name), graph);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TransitionCondition;

    fn node(
        name: &str,
        id: u32,
        level: Option<u32>,
        children: Vec<EvolutionNode>,
    ) -> EvolutionNode {
        EvolutionNode {
            name: name.to_string(),
            species_id: id,
            conditions: level.map(TransitionCondition::level_up).into_iter().collect(),
            children,
        }
    }

    // ========== Shape Tests ==========

    #[test]
    fn single_stage_has_no_edges() {
        let graph = GraphBuilder::new().build(&node("tauros", 128, None, vec![]));
        assert_eq!(graph.nodes.len(), 1);
        assert!(graph.edges.is_empty());
        assert_eq!(graph.root, "tauros");
        assert_eq!(graph.format_version, EvolutionGraph::FORMAT_VERSION);
    }

    #[test]
    fn linear_chain_is_a_single_path() {
        let tree = node(
            "bulbasaur",
            1,
            None,
            vec![node("ivysaur", 2, Some(16), vec![node("venusaur", 3, Some(32), vec![])])],
        );
        let graph = GraphBuilder::new().build(&tree);

        assert_eq!(graph.nodes.len(), 3);
        assert_eq!(graph.edges.len(), 2);

        let into_final: Vec<&GraphEdge> =
            graph.edges.iter().filter(|e| e.target == "venusaur").collect();
        assert_eq!(into_final.len(), 1);
        assert_eq!(into_final[0].source, "ivysaur");
        assert_eq!(into_final[0].id, "ivysaur-venusaur");
        assert_eq!(into_final[0].label.as_deref(), Some("Lv. 32"));
        assert_eq!(into_final[0].trigger.as_deref(), Some("level-up"));
    }

    #[test]
    fn branching_chain_shares_source() {
        let tree = node(
            "snorunt",
            361,
            None,
            vec![node("glalie", 362, Some(42), vec![]), node("froslass", 478, None, vec![])],
        );
        let graph = GraphBuilder::new().build(&tree);

        assert_eq!(graph.nodes.len(), 3);
        assert_eq!(graph.edges.len(), 2);
        assert!(graph.edges.iter().all(|e| e.source == "snorunt"));
        // No listed condition means no label
        assert_eq!(graph.edges[1].label, None);
    }

    // ========== Ordering Tests ==========

    #[test]
    fn nodes_are_pre_order() {
        let tree = node(
            "a",
            1,
            None,
            vec![
                node("b", 2, Some(1), vec![node("d", 4, Some(1), vec![])]),
                node("c", 3, Some(1), vec![node("e", 5, Some(1), vec![])]),
            ],
        );
        let graph = GraphBuilder::with_traversal(Traversal::PreOrder).build(&tree);
        let ids: Vec<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "d", "c", "e"]);

        let edge_ids: Vec<&str> = graph.edges.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(edge_ids, ["a-b", "b-d", "a-c", "c-e"]);
    }

    #[test]
    fn edge_count_is_node_count_minus_one() {
        let tree = node(
            "eevee",
            133,
            None,
            ["vaporeon", "jolteon", "flareon", "espeon", "umbreon", "leafeon", "glaceon", "sylveon"]
                .iter()
                .enumerate()
                .map(|(i, n)| node(n, 134 + i as u32, None, vec![]))
                .collect(),
        );
        let graph = GraphBuilder::new().build(&tree);
        assert_eq!(graph.edges.len(), graph.nodes.len() - 1);
        for edge in &graph.edges {
            assert!(graph.node(&edge.source).is_some());
            assert!(graph.node(&edge.target).is_some());
        }
        assert_eq!(graph.outgoing("eevee").count(), 8);
    }

    // ========== Display Toggle ==========

    #[test]
    fn select_sprites_switches_image() {
        let mut graph = GraphBuilder::new().build(&node("pichu", 172, None, vec![]));
        graph.nodes[0].default_image = Some("default.png".to_string());
        graph.nodes[0].shiny_image = Some("shiny.png".to_string());

        graph.select_sprites(true);
        assert_eq!(graph.nodes[0].image.as_deref(), Some("shiny.png"));
        graph.select_sprites(false);
        assert_eq!(graph.nodes[0].image.as_deref(), Some("default.png"));
    }

    #[test]
    fn graph_json_skips_empty_fields() {
        let graph = GraphBuilder::new().build(&node("ditto", 132, None, vec![]));
        let json = serde_json::to_value(&graph).unwrap();
        let node = &json["nodes"][0];
        assert_eq!(node["id"], "ditto");
        assert!(node.get("image").is_none());
        assert!(node.get("types").is_none());
        assert_eq!(node["position"]["x"], 0.0);
    }
}
