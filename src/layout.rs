//! Layered layout for evolution graphs, delegated to dagre.
//!
//! A fresh dagre graph is built from the node and edge lists on every call.
//! Edges with a missing endpoint are skipped and cycles are rejected before
//! dagre sees the graph. Dagre reports box centers; they are turned into
//! top-left corners and shifted so the drawing starts at the origin.

use std::collections::{HashMap, HashSet, VecDeque};

use dagre_rust::{
    GraphConfig as DagreConfig, GraphEdge as DagreEdge, GraphNode as DagreNode,
    layout as dagre_layout,
};
use graphlib_rust::{Graph as DagreGraph, GraphOption};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::graph::{EvolutionGraph, GraphEdge, GraphNode};
use crate::model::Position;

/// Reading direction of the ranks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Ancestors on the left, descendants to the right
    #[default]
    LeftToRight,
    TopToBottom,
}

impl Direction {
    fn rankdir(self) -> &'static str {
        match self {
            Direction::LeftToRight => "lr",
            Direction::TopToBottom => "tb",
        }
    }
}

/// Layout tuning
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutConfig {
    pub direction: Direction,
    /// Node bounding box width
    pub node_width: f64,
    /// Node bounding box height
    pub node_height: f64,
    /// Gap between consecutive ranks
    pub rank_sep: f64,
    /// Gap between neighbours in the same rank
    pub node_sep: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            direction: Direction::LeftToRight,
            node_width: 200.0,
            node_height: 200.0,
            rank_sep: 150.0,
            node_sep: 50.0,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("evolution graph has a cycle through {0:?}")]
    Cycle(String),

    #[error("layout left {0:?} without a position")]
    Unplaced(String),
}

/// Assign a position to every node of `graph`
pub fn layout(graph: &mut EvolutionGraph, config: &LayoutConfig) -> Result<(), LayoutError> {
    let positions = compute_positions(&graph.nodes, &graph.edges, config)?;
    for (node, position) in graph.nodes.iter_mut().zip(positions) {
        node.position = position;
    }
    Ok(())
}

/// Top-left positions for `nodes`, index-aligned with the input
pub fn compute_positions(
    nodes: &[GraphNode],
    edges: &[GraphEdge],
    config: &LayoutConfig,
) -> Result<Vec<Position>, LayoutError> {
    if nodes.is_empty() {
        return Ok(Vec::new());
    }
    let links = usable_edges(nodes, edges);
    check_acyclic(nodes, &links)?;

    let mut dagre_graph: DagreGraph<DagreConfig, DagreNode, DagreEdge> =
        DagreGraph::new(Some(GraphOption {
            directed: Some(true),
            multigraph: Some(false),
            compound: Some(false),
        }));

    let mut graph_config = DagreConfig::default();
    graph_config.rankdir = Some(config.direction.rankdir().to_string());
    graph_config.nodesep = Some(config.node_sep as f32);
    graph_config.ranksep = Some(config.rank_sep as f32);
    dagre_graph.set_graph(graph_config);

    for node in nodes {
        let mut dagre_node = DagreNode::default();
        dagre_node.width = config.node_width as f32;
        dagre_node.height = config.node_height as f32;
        dagre_graph.set_node(node.id.clone(), Some(dagre_node));
    }
    for (source, target) in &links {
        let _ = dagre_graph.set_edge(source, target, Some(DagreEdge::default()), None);
    }

    dagre_layout::run_layout(&mut dagre_graph);

    let corners = nodes
        .iter()
        .map(|node| {
            let placed = dagre_graph
                .node(&node.id)
                .ok_or_else(|| LayoutError::Unplaced(node.id.clone()))?;
            Ok((
                f64::from(placed.x) - config.node_width / 2.0,
                f64::from(placed.y) - config.node_height / 2.0,
            ))
        })
        .collect::<Result<Vec<_>, LayoutError>>()?;

    debug!(nodes = nodes.len(), edges = links.len(), "laid out graph");
    Ok(normalize(&corners))
}

/// Width and height of the laid-out drawing
pub fn extent(nodes: &[GraphNode], config: &LayoutConfig) -> (f64, f64) {
    if nodes.is_empty() {
        return (0.0, 0.0);
    }
    let max_x = nodes.iter().map(|n| n.position.x).fold(f64::MIN, f64::max);
    let max_y = nodes.iter().map(|n| n.position.y).fold(f64::MIN, f64::max);
    (max_x + config.node_width, max_y + config.node_height)
}

/// Deduplicated `(source, target)` pairs whose endpoints both exist
fn usable_edges(nodes: &[GraphNode], edges: &[GraphEdge]) -> Vec<(String, String)> {
    let known: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
    let mut seen = HashSet::new();
    let mut links = Vec::new();
    for edge in edges {
        if !known.contains(edge.source.as_str()) || !known.contains(edge.target.as_str()) {
            warn!(edge = %edge.id, "skipping edge with a missing endpoint");
            continue;
        }
        let link = (edge.source.clone(), edge.target.clone());
        if seen.insert(link.clone()) {
            links.push(link);
        }
    }
    links
}

/// Dagre would quietly reverse a back edge; reject cycles instead
fn check_acyclic(nodes: &[GraphNode], links: &[(String, String)]) -> Result<(), LayoutError> {
    let mut indegree: HashMap<&str, usize> = nodes.iter().map(|n| (n.id.as_str(), 0)).collect();
    let mut successors: HashMap<&str, Vec<&str>> = HashMap::new();
    for (source, target) in links {
        *indegree.entry(target.as_str()).or_default() += 1;
        successors.entry(source.as_str()).or_default().push(target.as_str());
    }

    let mut queue: VecDeque<&str> = nodes
        .iter()
        .map(|n| n.id.as_str())
        .filter(|id| indegree.get(id) == Some(&0))
        .collect();
    let mut visited = 0;
    while let Some(id) = queue.pop_front() {
        visited += 1;
        for &next in successors.get(id).into_iter().flatten() {
            if let Some(count) = indegree.get_mut(next) {
                *count -= 1;
                if *count == 0 {
                    queue.push_back(next);
                }
            }
        }
    }

    if visited < indegree.len() {
        let stuck = nodes
            .iter()
            .find(|n| indegree.get(n.id.as_str()).is_some_and(|&c| c > 0))
            .map_or_else(String::new, |n| n.id.clone());
        return Err(LayoutError::Cycle(stuck));
    }
    Ok(())
}

/// Shift corners so the drawing starts at (0, 0), snapped to whole pixels
fn normalize(corners: &[(f64, f64)]) -> Vec<Position> {
    let min_x = corners.iter().map(|c| c.0).fold(f64::INFINITY, f64::min);
    let min_y = corners.iter().map(|c| c.1).fold(f64::INFINITY, f64::min);
    corners
        .iter()
        .map(|&(x, y)| Position {
            x: (x - min_x).round(),
            y: (y - min_y).round(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphNode;

    fn graph(ids: &[&str], edges: &[(&str, &str)]) -> EvolutionGraph {
        let mut graph = EvolutionGraph::new(ids[0]);
        graph.nodes = ids
            .iter()
            .enumerate()
            .map(|(i, id)| GraphNode::placeholder(*id, i as u32 + 1))
            .collect();
        graph.edges = edges
            .iter()
            .map(|(s, t)| GraphEdge {
                id: format!("{s}-{t}"),
                source: s.to_string(),
                target: t.to_string(),
                label: None,
                trigger: None,
            })
            .collect();
        graph
    }

    fn position(graph: &EvolutionGraph, id: &str) -> Position {
        graph.node(id).unwrap().position
    }

    // ========== Ranking ==========

    #[test]
    fn linear_chain_runs_left_to_right() {
        let mut g = graph(
            &["bulbasaur", "ivysaur", "venusaur"],
            &[("bulbasaur", "ivysaur"), ("ivysaur", "venusaur")],
        );
        layout(&mut g, &LayoutConfig::default()).unwrap();

        assert_eq!(position(&g, "bulbasaur"), Position { x: 0.0, y: 0.0 });
        assert_eq!(position(&g, "ivysaur"), Position { x: 350.0, y: 0.0 });
        assert_eq!(position(&g, "venusaur"), Position { x: 700.0, y: 0.0 });
    }

    #[test]
    fn siblings_share_a_rank_and_are_spaced() {
        let mut g = graph(
            &["snorunt", "glalie", "froslass"],
            &[("snorunt", "glalie"), ("snorunt", "froslass")],
        );
        layout(&mut g, &LayoutConfig::default()).unwrap();

        let glalie = position(&g, "glalie");
        let froslass = position(&g, "froslass");
        assert_eq!(glalie.x, 350.0);
        assert_eq!(froslass.x, 350.0);
        assert_eq!((froslass.y - glalie.y).abs(), 250.0);

        let parent = position(&g, "snorunt");
        assert_eq!(parent.x, 0.0);
        assert!(parent.y >= glalie.y.min(froslass.y));
        assert!(parent.y <= glalie.y.max(froslass.y));
    }

    #[test]
    fn ancestors_precede_descendants() {
        let mut g = graph(
            &["wurmple", "silcoon", "beautifly", "cascoon", "dustox"],
            &[
                ("wurmple", "silcoon"),
                ("silcoon", "beautifly"),
                ("wurmple", "cascoon"),
                ("cascoon", "dustox"),
            ],
        );
        layout(&mut g, &LayoutConfig::default()).unwrap();
        for edge in &g.edges {
            assert!(position(&g, &edge.source).x < position(&g, &edge.target).x);
        }
        // Single-child branches run straight
        assert_eq!(position(&g, "silcoon").y, position(&g, "beautifly").y);
        assert_eq!(position(&g, "cascoon").y, position(&g, "dustox").y);
    }

    #[test]
    fn nodes_in_a_rank_never_overlap() {
        let children = [
            "vaporeon", "jolteon", "flareon", "espeon", "umbreon", "leafeon", "glaceon", "sylveon",
        ];
        let mut ids = vec!["eevee"];
        ids.extend(children);
        let edges: Vec<(&str, &str)> = children.iter().map(|c| ("eevee", *c)).collect();
        let mut g = graph(&ids, &edges);
        let config = LayoutConfig::default();
        layout(&mut g, &config).unwrap();

        let mut ys: Vec<f64> = children.iter().map(|c| position(&g, c).y).collect();
        ys.sort_by(f64::total_cmp);
        for pair in ys.windows(2) {
            assert!(pair[1] - pair[0] >= config.node_height + config.node_sep);
        }
        assert!(children.iter().all(|c| position(&g, c).x == 350.0));
    }

    // ========== Determinism ==========

    #[test]
    fn identical_inputs_give_identical_positions() {
        let build = || {
            graph(
                &["a", "b", "c", "d", "e", "f"],
                &[("a", "b"), ("a", "c"), ("b", "d"), ("b", "e"), ("c", "f")],
            )
        };
        let config = LayoutConfig::default();
        let first = compute_positions(&build().nodes, &build().edges, &config).unwrap();
        for _ in 0..10 {
            let again = compute_positions(&build().nodes, &build().edges, &config).unwrap();
            assert_eq!(first, again);
        }
    }

    #[test]
    fn shiny_toggle_does_not_move_nodes() {
        let mut g = graph(
            &["snorunt", "glalie", "froslass"],
            &[("snorunt", "glalie"), ("snorunt", "froslass")],
        );
        let config = LayoutConfig::default();
        layout(&mut g, &config).unwrap();
        let before: Vec<Position> = g.nodes.iter().map(|n| n.position).collect();

        g.select_sprites(true);
        layout(&mut g, &config).unwrap();
        let after: Vec<Position> = g.nodes.iter().map(|n| n.position).collect();
        assert_eq!(before, after);
    }

    // ========== Configuration ==========

    #[test]
    fn top_to_bottom_swaps_axes() {
        let mut g = graph(&["a", "b"], &[("a", "b")]);
        let config = LayoutConfig {
            direction: Direction::TopToBottom,
            ..LayoutConfig::default()
        };
        layout(&mut g, &config).unwrap();
        assert_eq!(position(&g, "a"), Position { x: 0.0, y: 0.0 });
        assert_eq!(position(&g, "b"), Position { x: 0.0, y: 350.0 });
    }

    #[test]
    fn extent_covers_all_boxes() {
        let mut g = graph(&["a", "b", "c"], &[("a", "b"), ("a", "c")]);
        let config = LayoutConfig::default();
        layout(&mut g, &config).unwrap();
        assert_eq!(extent(&g.nodes, &config), (550.0, 450.0));
        assert_eq!(extent(&[], &config), (0.0, 0.0));
    }

    // ========== Degenerate Input ==========

    #[test]
    fn missing_endpoints_are_skipped() {
        let mut g = graph(&["a", "b"], &[("a", "b"), ("a", "ghost")]);
        layout(&mut g, &LayoutConfig::default()).unwrap();
        assert_eq!(position(&g, "b").x, 350.0);
    }

    #[test]
    fn duplicate_edges_are_collapsed() {
        let nodes = graph(&["a", "b"], &[]).nodes;
        let edge = graph(&["a", "b"], &[("a", "b")]).edges.remove(0);
        let links = usable_edges(&nodes, &[edge.clone(), edge]);
        assert_eq!(links, [("a".to_string(), "b".to_string())]);
    }

    #[test]
    fn cycles_are_rejected() {
        let mut g = graph(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("c", "b")]);
        assert_eq!(
            layout(&mut g, &LayoutConfig::default()),
            Err(LayoutError::Cycle("b".to_string()))
        );
    }

    #[test]
    fn empty_graph_is_fine() {
        let positions = compute_positions(&[], &[], &LayoutConfig::default()).unwrap();
        assert!(positions.is_empty());
    }
}
