//! Graph and paper-map union

use super::recompute_derived;
use crate::PaperMap;
use citemap_common::models::{NetworkEdge, NetworkGraph, NetworkNode};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A graph together with the paper records backing it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedNetwork {
    pub graph: NetworkGraph,
    pub papers: PaperMap,
}

/// Union of two paper maps; records from `incoming` replace existing ones
pub fn merge_papers(papers: &PaperMap, incoming: &PaperMap) -> PaperMap {
    let mut merged = papers.clone();
    merged.extend(incoming.iter().map(|(id, p)| (id.clone(), p.clone())));
    merged
}

/// Union of two graphs keyed by id.
///
/// Nodes and edges already in `existing` win; papers from `incoming_papers`
/// win. The origin stays the one of `existing` and origin flags carried by
/// `incoming` are cleared.
pub fn merge_graph(
    existing: &NetworkGraph,
    incoming: &NetworkGraph,
    papers: &PaperMap,
    incoming_papers: &PaperMap,
) -> MergedNetwork {
    let origin_id = existing.origin_paper_id.as_str();

    let mut seen: HashSet<&str> = HashSet::new();
    let mut nodes: Vec<NetworkNode> = Vec::with_capacity(existing.node_count() + incoming.node_count());
    for node in &existing.nodes {
        if seen.insert(node.id.as_str()) {
            nodes.push(node.clone());
        }
    }
    for node in &incoming.nodes {
        if seen.insert(node.id.as_str()) {
            nodes.push(NetworkNode {
                is_origin: node.id == origin_id,
                ..node.clone()
            });
        }
    }

    let mut seen_edges: HashSet<&str> = HashSet::new();
    let edges: Vec<NetworkEdge> = existing
        .edges
        .iter()
        .chain(&incoming.edges)
        .filter(|e| seen.contains(e.source.as_str()) && seen.contains(e.target.as_str()))
        .filter(|e| seen_edges.insert(e.id.as_str()))
        .cloned()
        .collect();

    let nodes = recompute_derived(&nodes, &edges, origin_id);

    MergedNetwork {
        graph: NetworkGraph::new(nodes, edges, origin_id),
        papers: merge_papers(papers, incoming_papers),
    }
}
