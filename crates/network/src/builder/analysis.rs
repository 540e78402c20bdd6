//! Operations over an already built network

use super::NetworkBuilder;
use crate::error::Result;
use crate::state::{merge_graph, recompute_derived};
use crate::PaperMap;
use citemap_common::models::{NetworkGraph, NetworkNode, NetworkStats, Paper};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// Weight of a local in-citation in the influence score
const IN_DEGREE_WEIGHT: u64 = 100;
/// Weight of a local out-citation in the influence score
const OUT_DEGREE_WEIGHT: u64 = 10;

/// Summary numbers for a graph
pub fn compute_stats(graph: &NetworkGraph, total_papers: usize) -> NetworkStats {
    let included = graph.node_count();
    let citations: u64 = graph.nodes.iter().map(|n| n.paper.citation_count as u64).sum();
    let avg_citations = if included == 0 {
        0
    } else {
        (citations as f64 / included as f64).round() as u64
    };

    let years = graph.nodes.iter().map(|n| n.paper.year);
    let year_range = match (years.clone().min(), years.max()) {
        (Some(min), Some(max)) => [min, max],
        _ => [0, 0],
    };

    NetworkStats {
        total_papers,
        included_papers: included,
        total_edges: graph.edge_count(),
        avg_citations,
        year_range,
    }
}

/// Current record for a node: the paper map wins over the embedded copy
fn paper_of<'a>(node: &'a NetworkNode, papers: &'a PaperMap) -> &'a Paper {
    papers.get(&node.id).unwrap_or(&node.paper)
}

/// Keep nodes published within `[min, max]` (inclusive) and the edges
/// between them.
///
/// The origin is held to the same window as every other node. Levels and
/// local counts are recomputed.
pub fn filter_network_by_year_range(graph: &NetworkGraph, papers: &PaperMap, year_range: [i32; 2]) -> NetworkGraph {
    let [min, max] = year_range;

    let nodes: Vec<NetworkNode> = graph
        .nodes
        .iter()
        .filter(|n| {
            let year = paper_of(n, papers).year;
            (min..=max).contains(&year)
        })
        .cloned()
        .collect();

    let kept: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
    let edges: Vec<_> = graph
        .edges
        .iter()
        .filter(|e| kept.contains(e.source.as_str()) && kept.contains(e.target.as_str()))
        .cloned()
        .collect();

    let nodes = recompute_derived(&nodes, &edges, &graph.origin_paper_id);
    debug!(min, max, kept = nodes.len(), "Filtered network by year range");

    NetworkGraph::new(nodes, edges, graph.origin_paper_id.clone())
}

/// A paper with its influence score within a graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedPaper {
    pub paper: Paper,
    pub score: u64,
    pub in_degree: u32,
    pub out_degree: u32,
}

/// Top `limit` papers by `citationCount + inDegree*100 + outDegree*10`
pub fn find_influential_papers(graph: &NetworkGraph, papers: &PaperMap, limit: usize) -> Vec<RankedPaper> {
    let mut in_degree: HashMap<&str, u32> = HashMap::new();
    let mut out_degree: HashMap<&str, u32> = HashMap::new();
    for edge in &graph.edges {
        *in_degree.entry(edge.target.as_str()).or_default() += 1;
        *out_degree.entry(edge.source.as_str()).or_default() += 1;
    }

    let mut ranked: Vec<RankedPaper> = graph
        .nodes
        .iter()
        .map(|node| {
            let paper = paper_of(node, papers);
            let in_deg = in_degree.get(node.id.as_str()).copied().unwrap_or(0);
            let out_deg = out_degree.get(node.id.as_str()).copied().unwrap_or(0);
            RankedPaper {
                score: paper.citation_count as u64
                    + in_deg as u64 * IN_DEGREE_WEIGHT
                    + out_deg as u64 * OUT_DEGREE_WEIGHT,
                paper: paper.clone(),
                in_degree: in_deg,
                out_degree: out_deg,
            }
        })
        .collect();

    ranked.sort_by(|a, b| b.score.cmp(&a.score));
    ranked.truncate(limit);
    ranked
}

/// Outcome of an expansion
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpandedNetwork {
    pub graph: NetworkGraph,
    pub papers: PaperMap,
    pub stats: NetworkStats,
    /// Nodes present after the expansion that were not there before
    pub added_nodes: usize,
}

/// Grow a network with newly retrieved related papers.
///
/// The paper sets are unioned (a related record replaces an existing one
/// with the same id), the network is rebuilt around the existing origin and
/// the rebuild is merged into the existing graph.
pub fn expand_network(
    graph: &NetworkGraph,
    papers: &PaperMap,
    related: &[Paper],
    builder: &NetworkBuilder,
) -> Result<ExpandedNetwork> {
    let mut ordered: Vec<Paper> = graph
        .nodes
        .iter()
        .map(|n| paper_of(n, papers).clone())
        .collect();
    let mut position: HashMap<String, usize> = ordered
        .iter()
        .enumerate()
        .map(|(i, p)| (p.id.clone(), i))
        .collect();

    let mut extras: Vec<&Paper> = papers.values().filter(|p| !position.contains_key(&p.id)).collect();
    extras.sort_by(|a, b| a.id.cmp(&b.id));

    for paper in extras.into_iter().chain(related) {
        match position.get(&paper.id) {
            Some(&i) => ordered[i] = paper.clone(),
            None => {
                position.insert(paper.id.clone(), ordered.len());
                ordered.push(paper.clone());
            }
        }
    }

    let rebuilt = builder.build(&ordered, &graph.origin_paper_id)?;

    let incoming_papers: PaperMap = ordered.iter().map(|p| (p.id.clone(), p.clone())).collect();
    let merged = merge_graph(graph, &rebuilt.graph, papers, &incoming_papers);

    let added_nodes = merged.graph.node_count().saturating_sub(graph.node_count());
    let stats = compute_stats(&merged.graph, merged.papers.len());
    info!(
        origin = %graph.origin_paper_id,
        related = related.len(),
        added_nodes,
        nodes = merged.graph.node_count(),
        "Network expanded"
    );

    Ok(ExpandedNetwork {
        graph: merged.graph,
        papers: merged.papers,
        stats,
        added_nodes,
    })
}
