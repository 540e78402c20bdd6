//! Citation network snapshot types

use super::{Citation, Paper};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Node in the citation network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkNode {
    /// Same as `paper.id`
    pub id: String,

    pub paper: Paper,

    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub vx: f64,
    #[serde(default)]
    pub vy: f64,

    #[serde(default)]
    pub is_origin: bool,

    #[serde(default)]
    pub is_selected: bool,

    /// BFS hop distance from the origin
    #[serde(default)]
    pub level: u32,

    /// In-degree within the current graph
    #[serde(default)]
    pub local_citation_count: u32,
}

impl NetworkNode {
    /// Unpositioned node for a paper
    pub fn new(paper: Paper) -> Self {
        Self {
            id: paper.id.clone(),
            paper,
            x: 0.0,
            y: 0.0,
            vx: 0.0,
            vy: 0.0,
            is_origin: false,
            is_selected: false,
            level: 0,
            local_citation_count: 0,
        }
    }

    pub fn is_unpositioned(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

/// How an edge was inferred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeType {
    Citation,
    Semantic,
    CoCitation,
    BibliographicCoupling,
}

/// Edge between two nodes of the network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub citation: Citation,

    /// Non-negative edge weight
    pub weight: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_type: Option<EdgeType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic_similarity: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_fields_of_study: Option<Vec<String>>,
}

/// Escape `:` and `\\` so ids joined with `:` stay unambiguous
fn escape_id(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    for c in id.chars() {
        if c == ':' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

impl NetworkEdge {
    /// Directed `cites` edge of the given type.
    ///
    /// The id is `{kind}:{source}:{target}` with both paper ids escaped.
    pub fn cites(source: &str, target: &str, edge_type: EdgeType, weight: f64) -> Self {
        let tag = match edge_type {
            EdgeType::Citation => "cites",
            EdgeType::Semantic => "semantic",
            EdgeType::CoCitation => "cocited",
            EdgeType::BibliographicCoupling => "coupled",
        };

        Self {
            id: format!("{}:{}:{}", tag, escape_id(source), escape_id(target)),
            source: source.to_string(),
            target: target.to_string(),
            citation: Citation::cites(source, target),
            weight: weight.max(0.0),
            edge_type: Some(edge_type),
            semantic_similarity: None,
            shared_fields_of_study: None,
        }
    }
}

/// Immutable snapshot of a citation network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkGraph {
    pub nodes: Vec<NetworkNode>,
    pub edges: Vec<NetworkEdge>,
    pub origin_paper_id: String,
    pub last_updated: DateTime<Utc>,
}

impl NetworkGraph {
    pub fn new(
        nodes: Vec<NetworkNode>,
        edges: Vec<NetworkEdge>,
        origin_paper_id: impl Into<String>,
    ) -> Self {
        Self {
            nodes,
            edges,
            origin_paper_id: origin_paper_id.into(),
            last_updated: Utc::now(),
        }
    }

    /// Get a node by id
    pub fn node(&self, id: &str) -> Option<&NetworkNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn origin(&self) -> Option<&NetworkNode> {
        self.node(&self.origin_paper_id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Map of node id to its position in `nodes`
    pub fn node_index(&self) -> HashMap<&str, usize> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.as_str(), i))
            .collect()
    }

    /// Copy of this graph with different nodes, same edges and origin
    pub fn with_nodes(&self, nodes: Vec<NetworkNode>) -> Self {
        Self {
            nodes,
            edges: self.edges.clone(),
            origin_paper_id: self.origin_paper_id.clone(),
            last_updated: self.last_updated,
        }
    }
}

/// Summary statistics of a built network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkStats {
    /// Papers handed to the builder
    pub total_papers: usize,
    /// Papers that survived filtering and truncation
    pub included_papers: usize,
    pub total_edges: usize,
    pub avg_citations: u64,
    /// `[min, max]` publication year of included papers
    pub year_range: [i32; 2],
}
