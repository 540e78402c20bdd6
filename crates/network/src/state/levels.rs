//! Derived per-node attributes: hop level and local citation count

use citemap_common::models::{NetworkEdge, NetworkNode};
use std::collections::{HashMap, VecDeque};

/// Undirected BFS hop distance from the origin.
///
/// The origin gets level 0 and every reachable node `1 + min(level of its
/// neighbours)`. Nodes the origin cannot reach keep the level they had.
pub fn calculate_node_levels(
    nodes: &[NetworkNode],
    edges: &[NetworkEdge],
    origin_id: &str,
) -> Vec<NetworkNode> {
    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
    for edge in edges {
        adjacency.entry(edge.source.as_str()).or_default().push(edge.target.as_str());
        adjacency.entry(edge.target.as_str()).or_default().push(edge.source.as_str());
    }

    let mut levels: HashMap<&str, u32> = HashMap::new();
    if nodes.iter().any(|n| n.id == origin_id) {
        levels.insert(origin_id, 0);
        let mut queue = VecDeque::from([origin_id]);

        while let Some(current) = queue.pop_front() {
            let next_level = levels[current] + 1;
            for &neighbour in adjacency.get(current).into_iter().flatten() {
                if !levels.contains_key(neighbour) {
                    levels.insert(neighbour, next_level);
                    queue.push_back(neighbour);
                }
            }
        }
    }

    nodes
        .iter()
        .map(|node| NetworkNode {
            level: levels.get(node.id.as_str()).copied().unwrap_or(node.level),
            ..node.clone()
        })
        .collect()
}

/// In-degree of every node within `edges`
pub fn calculate_local_citation_counts(nodes: &[NetworkNode], edges: &[NetworkEdge]) -> Vec<NetworkNode> {
    let mut in_degree: HashMap<&str, u32> = HashMap::new();
    for edge in edges {
        *in_degree.entry(edge.target.as_str()).or_default() += 1;
    }

    nodes
        .iter()
        .map(|node| NetworkNode {
            local_citation_count: in_degree.get(node.id.as_str()).copied().unwrap_or(0),
            ..node.clone()
        })
        .collect()
}

/// Levels and counts in one pass over the nodes
pub(crate) fn recompute_derived(
    nodes: &[NetworkNode],
    edges: &[NetworkEdge],
    origin_id: &str,
) -> Vec<NetworkNode> {
    let leveled = calculate_node_levels(nodes, edges, origin_id);
    calculate_local_citation_counts(&leveled, edges)
}
