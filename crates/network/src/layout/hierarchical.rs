//! Layered (top-to-bottom) layout
//!
//! 1. Break cycles by reversing DFS back edges
//! 2. Longest-path ranking honouring each edge's minimum rank span
//! 3. Barycenter sweeps to reduce crossings between consecutive layers
//! 4. Coordinates: rank -> y, slot -> x, each layer centered on x = 0

use super::LayoutStrategy;
use citemap_common::config::LayoutConfig;
use citemap_common::models::{NetworkGraph, NetworkNode};
use std::cmp::Ordering;
use std::collections::{BTreeMap, VecDeque};

/// Shortest drawn edge, for the most similar papers
pub const MIN_EDGE_LENGTH: f64 = 80.0;
/// Longest drawn edge, for unrelated papers
pub const MAX_EDGE_LENGTH: f64 = 300.0;

const ORDERING_SWEEPS: usize = 8;

#[derive(Debug, Clone, PartialEq)]
pub struct HierarchicalConfig {
    pub node_width: f64,
    pub node_separation: f64,
    pub rank_separation: f64,
    pub min_edge_length: f64,
    pub max_edge_length: f64,
}

impl Default for HierarchicalConfig {
    fn default() -> Self {
        Self {
            node_width: 60.0,
            node_separation: 50.0,
            rank_separation: 100.0,
            min_edge_length: MIN_EDGE_LENGTH,
            max_edge_length: MAX_EDGE_LENGTH,
        }
    }
}

impl From<&LayoutConfig> for HierarchicalConfig {
    fn from(config: &LayoutConfig) -> Self {
        Self {
            node_separation: config.node_separation,
            rank_separation: config.rank_separation.max(1.0),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct HierarchicalLayout {
    config: HierarchicalConfig,
}

/// Edge between node indices with its minimum rank span
#[derive(Debug, Clone, Copy)]
struct RankedEdge {
    from: usize,
    to: usize,
    min_len: usize,
}

impl HierarchicalLayout {
    pub fn new(config: HierarchicalConfig) -> Self {
        Self { config }
    }

    /// Desired drawn length: similar papers sit closer together
    fn edge_length(&self, similarity: f64) -> f64 {
        let c = &self.config;
        c.max_edge_length - similarity.clamp(0.0, 1.0) * (c.max_edge_length - c.min_edge_length)
    }

    fn rank_span(&self, similarity: f64) -> usize {
        let span = (self.edge_length(similarity) / self.config.rank_separation).ceil();
        (span as usize).max(1)
    }

    fn collect_edges(&self, graph: &NetworkGraph) -> Vec<RankedEdge> {
        let index = graph.node_index();
        graph
            .edges
            .iter()
            .filter_map(|e| {
                let from = *index.get(e.source.as_str())?;
                let to = *index.get(e.target.as_str())?;
                if from == to {
                    return None;
                }
                let similarity = e
                    .semantic_similarity
                    .or(graph.nodes[to].paper.similarity_to_origin)
                    .unwrap_or(0.0);
                Some(RankedEdge {
                    from,
                    to,
                    min_len: self.rank_span(similarity),
                })
            })
            .collect()
    }
}

/// Reverse every edge that closes a cycle in a DFS over nodes in index order
fn break_cycles(n: usize, edges: &mut [RankedEdge]) {
    let mut out: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (i, e) in edges.iter().enumerate() {
        out[e.from].push(i);
    }

    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Unvisited,
        OnStack,
        Done,
    }
    let mut mark = vec![Mark::Unvisited; n];
    let mut reversed = vec![false; edges.len()];

    for root in 0..n {
        if mark[root] != Mark::Unvisited {
            continue;
        }
        let mut stack: Vec<(usize, usize)> = vec![(root, 0)];
        mark[root] = Mark::OnStack;

        while let Some((node, next)) = stack.last_mut() {
            let node = *node;
            if let Some(&edge) = out[node].get(*next) {
                *next += 1;
                let to = edges[edge].to;
                match mark[to] {
                    Mark::Unvisited => {
                        mark[to] = Mark::OnStack;
                        stack.push((to, 0));
                    }
                    Mark::OnStack => reversed[edge] = true,
                    Mark::Done => {}
                }
            } else {
                mark[node] = Mark::Done;
                stack.pop();
            }
        }
    }

    for (edge, flip) in edges.iter_mut().zip(reversed) {
        if flip {
            std::mem::swap(&mut edge.from, &mut edge.to);
        }
    }
}

/// Longest-path ranks over an acyclic edge set
fn assign_ranks(n: usize, edges: &[RankedEdge]) -> Vec<usize> {
    let mut out: Vec<Vec<&RankedEdge>> = vec![Vec::new(); n];
    let mut in_degree = vec![0usize; n];
    for e in edges {
        out[e.from].push(e);
        in_degree[e.to] += 1;
    }

    let mut ranks = vec![0usize; n];
    let mut queue: VecDeque<usize> = (0..n).filter(|&v| in_degree[v] == 0).collect();
    while let Some(u) = queue.pop_front() {
        for e in &out[u] {
            ranks[e.to] = ranks[e.to].max(ranks[u] + e.min_len);
            in_degree[e.to] -= 1;
            if in_degree[e.to] == 0 {
                queue.push_back(e.to);
            }
        }
    }
    ranks
}

/// Mean slot of `neighbours` in their layers; `None` when there are none
fn barycenter(neighbours: &[usize], slot: &[usize]) -> Option<f64> {
    if neighbours.is_empty() {
        return None;
    }
    let sum: usize = neighbours.iter().map(|&v| slot[v]).sum();
    Some(sum as f64 / neighbours.len() as f64)
}

fn reorder_layer(layer: &mut Vec<usize>, neighbours: &[Vec<usize>], slot: &mut [usize]) {
    let mut scored: Vec<(usize, f64)> = layer
        .iter()
        .map(|&v| (v, barycenter(&neighbours[v], slot).unwrap_or(slot[v] as f64)))
        .collect();
    scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal).then(a.0.cmp(&b.0)));

    *layer = scored.into_iter().map(|(v, _)| v).collect();
    for (i, &v) in layer.iter().enumerate() {
        slot[v] = i;
    }
}

/// Crossings between edges joining the same pair of consecutive layers
fn count_crossings(layer_of: &[usize], slot: &[usize], edges: &[RankedEdge]) -> usize {
    let mut by_layer: BTreeMap<usize, Vec<(usize, usize)>> = BTreeMap::new();
    for e in edges {
        if layer_of[e.to] == layer_of[e.from] + 1 {
            by_layer.entry(layer_of[e.from]).or_default().push((slot[e.from], slot[e.to]));
        }
    }

    by_layer
        .values()
        .map(|pairs| {
            let mut crossings = 0usize;
            for i in 0..pairs.len() {
                for j in (i + 1)..pairs.len() {
                    let (a1, b1) = pairs[i];
                    let (a2, b2) = pairs[j];
                    if (a1 < a2 && b1 > b2) || (a1 > a2 && b1 < b2) {
                        crossings += 1;
                    }
                }
            }
            crossings
        })
        .sum()
}

/// Layers (nodes sharing a rank) ordered to reduce crossings
fn order_layers(n: usize, ranks: &[usize], edges: &[RankedEdge]) -> Vec<Vec<usize>> {
    let mut by_rank: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (v, &r) in ranks.iter().enumerate() {
        by_rank.entry(r).or_default().push(v);
    }
    let mut layers: Vec<Vec<usize>> = by_rank.into_values().collect();

    let mut layer_of = vec![0usize; n];
    let mut slot = vec![0usize; n];
    for (l, layer) in layers.iter().enumerate() {
        for (i, &v) in layer.iter().enumerate() {
            layer_of[v] = l;
            slot[v] = i;
        }
    }

    let mut preds: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut succs: Vec<Vec<usize>> = vec![Vec::new(); n];
    for e in edges {
        preds[e.to].push(e.from);
        succs[e.from].push(e.to);
    }

    let mut best = layers.clone();
    let mut best_crossings = count_crossings(&layer_of, &slot, edges);

    for _ in 0..ORDERING_SWEEPS {
        if best_crossings == 0 {
            break;
        }
        for layer in layers.iter_mut().skip(1) {
            reorder_layer(layer, &preds, &mut slot);
        }
        for layer in layers.iter_mut().rev().skip(1) {
            reorder_layer(layer, &succs, &mut slot);
        }

        let crossings = count_crossings(&layer_of, &slot, edges);
        if crossings < best_crossings {
            best_crossings = crossings;
            best = layers.clone();
        } else {
            break;
        }
    }
    best
}

impl LayoutStrategy for HierarchicalLayout {
    fn layout(&self, graph: &NetworkGraph) -> NetworkGraph {
        let n = graph.node_count();
        let mut edges = self.collect_edges(graph);
        break_cycles(n, &mut edges);

        let ranks = assign_ranks(n, &edges);
        let layers = order_layers(n, &ranks, &edges);

        let step = self.config.node_width + self.config.node_separation;
        let mut positions = vec![(0.0, 0.0); n];
        for layer in &layers {
            let center = (layer.len() as f64 - 1.0) / 2.0;
            for (slot, &v) in layer.iter().enumerate() {
                positions[v] = (
                    (slot as f64 - center) * step,
                    ranks[v] as f64 * self.config.rank_separation,
                );
            }
        }

        let nodes = graph
            .nodes
            .iter()
            .zip(positions)
            .map(|(node, (x, y))| NetworkNode {
                x,
                y,
                vx: 0.0,
                vy: 0.0,
                ..node.clone()
            })
            .collect();
        graph.with_nodes(nodes)
    }

    fn name(&self) -> &'static str {
        "hierarchical"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use citemap_common::models::{EdgeType, NetworkEdge, Paper};

    fn node(id: &str, similarity: Option<f64>) -> NetworkNode {
        NetworkNode::new(Paper {
            similarity_to_origin: similarity,
            ..Paper::new(id, id)
        })
    }

    fn edge(s: &str, t: &str) -> NetworkEdge {
        NetworkEdge::cites(s, t, EdgeType::Citation, 1.0)
    }

    fn layout(graph: &NetworkGraph) -> NetworkGraph {
        HierarchicalLayout::default().layout(graph)
    }

    #[test]
    fn test_chain_flows_top_to_bottom() {
        let graph = NetworkGraph::new(
            vec![node("a", Some(1.0)), node("b", Some(1.0)), node("c", Some(1.0))],
            vec![edge("a", "b"), edge("b", "c")],
            "a",
        );
        let out = layout(&graph);
        let y = |id: &str| out.node(id).unwrap().y;

        assert_eq!(y("a"), 0.0);
        assert_eq!(y("b"), 100.0);
        assert_eq!(y("c"), 200.0);
        assert!(out.nodes.iter().all(|n| n.x == 0.0));
    }

    #[test]
    fn test_dissimilar_edges_span_more_ranks() {
        let graph = NetworkGraph::new(
            vec![node("o", None), node("near", Some(1.0)), node("far", Some(0.0))],
            vec![edge("o", "near"), edge("o", "far")],
            "o",
        );
        let out = layout(&graph);

        assert_eq!(out.node("near").unwrap().y, 100.0);
        assert_eq!(out.node("far").unwrap().y, 300.0);
    }

    #[test]
    fn test_cycles_are_laid_out() {
        let graph = NetworkGraph::new(
            vec![node("a", Some(1.0)), node("b", Some(1.0)), node("c", Some(1.0))],
            vec![edge("a", "b"), edge("b", "c"), edge("c", "a")],
            "a",
        );
        let out = layout(&graph);
        let mut ys: Vec<f64> = out.nodes.iter().map(|n| n.y).collect();
        ys.sort_by(|a, b| a.partial_cmp(b).unwrap());

        assert_eq!(ys, vec![0.0, 100.0, 200.0]);
    }

    #[test]
    fn test_layers_are_centered() {
        let graph = NetworkGraph::new(
            vec![node("o", None), node("a", Some(1.0)), node("b", Some(1.0)), node("c", Some(1.0))],
            vec![edge("o", "a"), edge("o", "b"), edge("o", "c")],
            "o",
        );
        let out = layout(&graph);
        let row: Vec<f64> = out.nodes.iter().filter(|n| n.y == 100.0).map(|n| n.x).collect();

        assert_eq!(row.len(), 3);
        assert!(row.iter().sum::<f64>().abs() < 1e-9);
        assert!(row.contains(&110.0) && row.contains(&-110.0));
    }

    #[test]
    fn test_barycenter_removes_crossing() {
        // a1 -> b2, a2 -> b1 crosses in index order
        let graph = NetworkGraph::new(
            vec![
                node("a1", Some(1.0)),
                node("a2", Some(1.0)),
                node("b1", Some(1.0)),
                node("b2", Some(1.0)),
            ],
            vec![edge("a1", "b2"), edge("a2", "b1")],
            "a1",
        );
        let out = layout(&graph);
        let x = |id: &str| out.node(id).unwrap().x;

        assert_eq!(x("a1") < x("a2"), x("b2") < x("b1"));
    }

    #[test]
    fn test_edge_length_interpolates() {
        let layout = HierarchicalLayout::default();
        assert_eq!(layout.edge_length(1.0), 80.0);
        assert_eq!(layout.edge_length(0.0), 300.0);
        assert_eq!(layout.rank_span(0.5), 2);
    }
}
