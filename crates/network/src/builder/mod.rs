//! Citation network construction
//!
//! Turns a flat list of papers into a [`NetworkGraph`]: filter and rank the
//! papers, pick an origin, score similarity, infer edges and derive levels.

mod analysis;
mod edges;

pub use analysis::{
    compute_stats, expand_network, filter_network_by_year_range, find_influential_papers,
    ExpandedNetwork, RankedPaper,
};
pub use edges::{bibliographic_coupling_edges, co_citation_edges, infer_citation_edges, semantic_edges};

use crate::error::{NetworkError, Result};
use crate::similarity::{CitationAdjacency, SimilarityEngine};
use crate::state::recompute_derived;
use citemap_common::config::NetworkConfig;
use citemap_common::metrics;
use citemap_common::models::{NetworkGraph, NetworkNode, NetworkStats, Paper, SimilarityResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, info};

/// Options controlling which papers and edges make it into a network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NetworkOptions {
    pub max_nodes: usize,
    pub min_citations: u32,
    pub include_semantic_edges: bool,
    pub min_semantic_similarity: f64,
    pub include_co_citations: bool,
    pub include_bibliographic_coupling: bool,
}

impl Default for NetworkOptions {
    fn default() -> Self {
        Self {
            max_nodes: 100,
            min_citations: 0,
            include_semantic_edges: false,
            min_semantic_similarity: 0.5,
            include_co_citations: false,
            include_bibliographic_coupling: false,
        }
    }
}

impl From<&NetworkConfig> for NetworkOptions {
    fn from(config: &NetworkConfig) -> Self {
        Self {
            max_nodes: config.max_nodes,
            min_citations: config.min_citations,
            include_semantic_edges: config.include_semantic_edges,
            min_semantic_similarity: config.min_semantic_similarity,
            include_co_citations: config.include_co_citations,
            include_bibliographic_coupling: config.include_bibliographic_coupling,
        }
    }
}

impl NetworkOptions {
    pub fn validate(&self) -> Result<()> {
        if self.max_nodes == 0 {
            return Err(NetworkError::InvalidOption {
                field: "maxNodes",
                message: "must be at least 1".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.min_semantic_similarity) {
            return Err(NetworkError::InvalidOption {
                field: "minSemanticSimilarity",
                message: format!("{} is outside [0, 1]", self.min_semantic_similarity),
            });
        }
        Ok(())
    }
}

/// Result of a build
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkBuild {
    pub graph: NetworkGraph,
    pub stats: NetworkStats,
    pub similarities: HashMap<String, SimilarityResult>,
}

/// Builds citation networks with a fixed set of options
#[derive(Debug, Clone)]
pub struct NetworkBuilder {
    options: NetworkOptions,
    engine: SimilarityEngine,
    adjacency: Option<CitationAdjacency>,
}

impl NetworkBuilder {
    pub fn new(options: NetworkOptions, engine: SimilarityEngine) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            options,
            engine,
            adjacency: None,
        })
    }

    /// Attach authoritative citation data (paper id -> cited ids).
    ///
    /// Enables exact citation similarity, and co-citation and coupling
    /// edges when those options are on.
    pub fn with_citation_adjacency(mut self, adjacency: CitationAdjacency) -> Self {
        self.adjacency = Some(adjacency);
        self
    }

    pub fn options(&self) -> &NetworkOptions {
        &self.options
    }

    pub fn engine(&self) -> &SimilarityEngine {
        &self.engine
    }

    /// Build a network around `origin_id`.
    ///
    /// Falls back to the most cited retained paper when the origin does not
    /// survive filtering.
    pub fn build(&self, papers: &[Paper], origin_id: &str) -> Result<NetworkBuild> {
        let start = Instant::now();
        let opts = &self.options;

        let mut retained: Vec<&Paper> = papers
            .iter()
            .filter(|p| p.citation_count >= opts.min_citations)
            .collect();
        retained.sort_by(|a, b| b.citation_count.cmp(&a.citation_count));
        retained.truncate(opts.max_nodes);

        let origin = match retained.iter().find(|p| p.id == origin_id) {
            Some(origin) => *origin,
            None => {
                let fallback = retained.first().ok_or(NetworkError::EmptyNetwork { total: papers.len() })?;
                debug!(requested = origin_id, fallback = %fallback.id, "Origin not retained, using most cited paper");
                *fallback
            }
        };
        let origin_id = origin.id.clone();

        let retained: Vec<Paper> = retained.into_iter().cloned().collect();
        let similarities = self
            .engine
            .batch_similarity(&retained, origin, self.adjacency.as_ref());

        let annotated: Vec<Paper> = retained
            .iter()
            .map(|p| match similarities.get(&p.id) {
                Some(result) => p.with_similarity(result),
                None => p.clone(),
            })
            .collect();

        let mut edges = infer_citation_edges(&annotated);
        if opts.include_semantic_edges {
            edges.extend(semantic_edges(&annotated, opts.min_semantic_similarity));
        }
        if let Some(adjacency) = &self.adjacency {
            if opts.include_co_citations {
                edges.extend(co_citation_edges(&annotated, adjacency));
            }
            if opts.include_bibliographic_coupling {
                edges.extend(bibliographic_coupling_edges(&annotated, adjacency));
            }
        }

        let nodes: Vec<NetworkNode> = annotated
            .into_iter()
            .map(|paper| {
                let is_origin = paper.id == origin_id;
                NetworkNode {
                    is_origin,
                    level: if is_origin { 0 } else { 1 },
                    ..NetworkNode::new(paper)
                }
            })
            .collect();
        let nodes = recompute_derived(&nodes, &edges, &origin_id);

        let graph = NetworkGraph::new(nodes, edges, origin_id);
        let stats = compute_stats(&graph, papers.len());

        let elapsed = start.elapsed().as_secs_f64();
        metrics::record_network_build(elapsed, graph.node_count(), graph.edge_count());
        info!(
            origin = %graph.origin_paper_id,
            total = papers.len(),
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            duration_ms = elapsed * 1000.0,
            "Citation network built"
        );

        Ok(NetworkBuild {
            graph,
            stats,
            similarities,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use citemap_common::models::EdgeType;

    pub(super) fn paper(id: &str, year: i32, citations: u32) -> Paper {
        Paper {
            year,
            citation_count: citations,
            ..Paper::new(id, id)
        }
    }

    pub(super) fn sample() -> Vec<Paper> {
        vec![paper("a", 2020, 500), paper("b", 2015, 800), paper("c", 2010, 40)]
    }

    fn builder(options: NetworkOptions) -> NetworkBuilder {
        NetworkBuilder::new(options, SimilarityEngine::default()).unwrap()
    }

    #[test]
    fn test_build_infers_expected_edges() {
        let build = builder(NetworkOptions::default()).build(&sample(), "a").unwrap();
        let graph = &build.graph;

        assert!(graph.edges.iter().any(|e| e.source == "a" && e.target == "b"));
        assert!(!graph.edges.iter().any(|e| e.source == "a" && e.target == "c"));
        assert_eq!(graph.origin_paper_id, "a");
    }

    #[test]
    fn test_build_with_extreme_year() {
        let papers = vec![paper("a", 2020, 500), paper("z", i32::MIN, 10)];
        let build = builder(NetworkOptions::default()).build(&papers, "a").unwrap();

        assert_eq!(build.graph.node_count(), 2);
        assert_eq!(build.similarities["z"].breakdown.temporal, 0.0);
        assert_eq!(build.stats.year_range, [i32::MIN, 2020]);
    }

    #[test]
    fn test_origin_node_invariants() {
        let build = builder(NetworkOptions::default()).build(&sample(), "a").unwrap();
        let origins: Vec<&NetworkNode> = build.graph.nodes.iter().filter(|n| n.is_origin).collect();

        assert_eq!(origins.len(), 1);
        assert_eq!(origins[0].id, "a");
        assert_eq!(origins[0].level, 0);
        assert_eq!(build.graph.node("b").unwrap().level, 1);
        assert_eq!(build.graph.node("b").unwrap().local_citation_count, 1);
        // c is isolated and keeps the initial level
        assert_eq!(build.graph.node("c").unwrap().level, 1);
    }

    #[test]
    fn test_nodes_annotated_and_unpositioned() {
        let build = builder(NetworkOptions::default()).build(&sample(), "a").unwrap();

        assert_eq!(build.similarities.len(), 3);
        for node in &build.graph.nodes {
            assert!(node.is_unpositioned());
            assert!(node.paper.similarity_to_origin.is_some());
        }
    }

    #[test]
    fn test_stats() {
        let build = builder(NetworkOptions::default()).build(&sample(), "a").unwrap();

        assert_eq!(build.stats.total_papers, 3);
        assert_eq!(build.stats.included_papers, 3);
        assert_eq!(build.stats.total_edges, 1);
        assert_eq!(build.stats.avg_citations, 447);
        assert_eq!(build.stats.year_range, [2010, 2020]);
    }

    #[test]
    fn test_min_citations_and_max_nodes() {
        let options = NetworkOptions {
            min_citations: 100,
            max_nodes: 1,
            ..Default::default()
        };
        let build = builder(options).build(&sample(), "a").unwrap();

        // b (800) outranks a (500) and the origin falls back to it
        assert_eq!(build.graph.node_count(), 1);
        assert_eq!(build.graph.origin_paper_id, "b");
        assert_eq!(build.stats.total_papers, 3);
    }

    #[test]
    fn test_missing_origin_falls_back_to_most_cited() {
        let build = builder(NetworkOptions::default()).build(&sample(), "zzz").unwrap();
        assert_eq!(build.graph.origin_paper_id, "b");
        assert!(build.graph.origin().unwrap().is_origin);
    }

    #[test]
    fn test_empty_network_is_error() {
        let options = NetworkOptions {
            min_citations: 10_000,
            ..Default::default()
        };
        let err = builder(options).build(&sample(), "a").unwrap_err();
        assert_eq!(err, NetworkError::EmptyNetwork { total: 3 });
    }

    #[test]
    fn test_semantic_edges_optional() {
        let mut papers = sample();
        papers[0].fields_of_study = Some(vec!["Oncology".into(), "Genomics".into()]);
        papers[2].fields_of_study = Some(vec!["Genomics".into(), "Immunology".into()]);

        let without = builder(NetworkOptions::default()).build(&papers, "a").unwrap();
        assert!(without.graph.edges.iter().all(|e| e.edge_type == Some(EdgeType::Citation)));

        let options = NetworkOptions {
            include_semantic_edges: true,
            min_semantic_similarity: 0.3,
            ..Default::default()
        };
        let with = builder(options).build(&papers, "a").unwrap();
        let semantic: Vec<_> = with
            .graph
            .edges
            .iter()
            .filter(|e| e.edge_type == Some(EdgeType::Semantic))
            .collect();
        assert_eq!(semantic.len(), 1);
        assert!((semantic[0].weight - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_structural_edges_need_adjacency() {
        let options = NetworkOptions {
            include_co_citations: true,
            include_bibliographic_coupling: true,
            ..Default::default()
        };
        let plain = builder(options.clone()).build(&sample(), "a").unwrap();
        assert_eq!(plain.graph.edge_count(), 1);

        let mut adjacency = CitationAdjacency::new();
        for (from, to) in [("x", "a"), ("x", "c")] {
            adjacency.entry(from.to_string()).or_default().insert(to.to_string());
        }
        let with = builder(options)
            .with_citation_adjacency(adjacency)
            .build(&sample(), "a")
            .unwrap();
        assert!(with
            .graph
            .edges
            .iter()
            .any(|e| e.edge_type == Some(EdgeType::CoCitation)));
    }

    #[test]
    fn test_invalid_options_rejected() {
        let options = NetworkOptions {
            max_nodes: 0,
            ..Default::default()
        };
        assert!(NetworkBuilder::new(options, SimilarityEngine::default()).is_err());
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let options: NetworkOptions = serde_json::from_str(r#"{"maxNodes": 20}"#).unwrap();
        assert_eq!(options.max_nodes, 20);
        assert_eq!(options.min_semantic_similarity, 0.5);
    }
}
