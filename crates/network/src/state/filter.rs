//! User-facing graph filters

use chrono::{Datelike, Utc};
use citemap_common::models::{NetworkGraph, NetworkNode};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Filters applied to the displayed graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterState {
    /// Inclusive publication-year bounds
    pub year_range: [i32; 2],
    pub min_citations: u32,
    pub search_query: String,
    /// Show papers published before the origin
    pub show_prior_works: bool,
    /// Show papers published in or after the origin's year
    pub show_derivative_works: bool,
    pub max_depth: u32,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            year_range: [1900, Utc::now().year()],
            min_citations: 0,
            search_query: String::new(),
            show_prior_works: true,
            show_derivative_works: true,
            max_depth: 3,
        }
    }
}

/// Partial update of a [`FilterState`]; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterUpdate {
    pub year_range: Option<[i32; 2]>,
    pub min_citations: Option<u32>,
    pub search_query: Option<String>,
    pub show_prior_works: Option<bool>,
    pub show_derivative_works: Option<bool>,
    pub max_depth: Option<u32>,
}

impl FilterState {
    /// Copy with the set fields of `update` applied
    pub fn apply(&self, update: FilterUpdate) -> Self {
        Self {
            year_range: update.year_range.unwrap_or(self.year_range),
            min_citations: update.min_citations.unwrap_or(self.min_citations),
            search_query: update.search_query.unwrap_or_else(|| self.search_query.clone()),
            show_prior_works: update.show_prior_works.unwrap_or(self.show_prior_works),
            show_derivative_works: update.show_derivative_works.unwrap_or(self.show_derivative_works),
            max_depth: update.max_depth.unwrap_or(self.max_depth),
        }
    }

    fn matches_query(&self, node: &NetworkNode) -> bool {
        let query = self.search_query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        let paper = &node.paper;
        paper.title.to_lowercase().contains(&query)
            || paper.authors.iter().any(|a| a.to_lowercase().contains(&query))
            || paper.abstract_text.to_lowercase().contains(&query)
    }

    fn admits(&self, node: &NetworkNode, origin_year: Option<i32>) -> bool {
        let year = node.paper.year;
        let [min, max] = self.year_range;
        if !(min..=max).contains(&year) || node.paper.citation_count < self.min_citations {
            return false;
        }
        if node.level > self.max_depth || !self.matches_query(node) {
            return false;
        }
        match origin_year {
            Some(origin_year) if year < origin_year => self.show_prior_works,
            Some(_) => self.show_derivative_works,
            None => true,
        }
    }
}

/// Nodes passing `filters` (the origin always passes) and the edges whose
/// endpoints both survive.
pub fn filter_graph(graph: &NetworkGraph, filters: &FilterState) -> NetworkGraph {
    let origin_year = graph.origin().map(|n| n.paper.year);

    let nodes: Vec<NetworkNode> = graph
        .nodes
        .iter()
        .filter(|n| n.id == graph.origin_paper_id || filters.admits(n, origin_year))
        .cloned()
        .collect();

    let kept: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
    let edges = graph
        .edges
        .iter()
        .filter(|e| kept.contains(e.source.as_str()) && kept.contains(e.target.as_str()))
        .cloned()
        .collect();

    NetworkGraph {
        nodes,
        edges,
        origin_paper_id: graph.origin_paper_id.clone(),
        last_updated: graph.last_updated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use citemap_common::models::{EdgeType, NetworkEdge, Paper};

    fn node(id: &str, year: i32, citations: u32, level: u32) -> NetworkNode {
        NetworkNode {
            level,
            is_origin: id == "o",
            ..NetworkNode::new(Paper {
                year,
                citation_count: citations,
                ..Paper::new(id, format!("Paper {}", id))
            })
        }
    }

    fn graph() -> NetworkGraph {
        NetworkGraph::new(
            vec![
                node("o", 2015, 10, 0),
                node("old", 2005, 300, 1),
                node("new", 2020, 50, 1),
                node("deep", 2018, 80, 4),
            ],
            vec![
                NetworkEdge::cites("o", "old", EdgeType::Citation, 1.0),
                NetworkEdge::cites("new", "o", EdgeType::Citation, 1.0),
                NetworkEdge::cites("deep", "new", EdgeType::Citation, 1.0),
            ],
            "o",
        )
    }

    fn ids(graph: &NetworkGraph) -> Vec<&str> {
        graph.nodes.iter().map(|n| n.id.as_str()).collect()
    }

    fn assert_no_dangling(graph: &NetworkGraph) {
        let kept: HashSet<&str> = ids(graph).into_iter().collect();
        for e in &graph.edges {
            assert!(kept.contains(e.source.as_str()) && kept.contains(e.target.as_str()));
        }
    }

    #[test]
    fn test_defaults_keep_shallow_nodes() {
        let filtered = filter_graph(&graph(), &FilterState::default());
        assert_eq!(ids(&filtered), vec!["o", "old", "new"]);
        assert_eq!(filtered.edge_count(), 2);
        assert_no_dangling(&filtered);
    }

    #[test]
    fn test_origin_survives_every_filter() {
        let filters = FilterState {
            year_range: [2030, 2040],
            min_citations: 10_000,
            search_query: "nothing matches".into(),
            ..Default::default()
        };
        let filtered = filter_graph(&graph(), &filters);

        assert_eq!(ids(&filtered), vec!["o"]);
        assert!(filtered.edges.is_empty());
    }

    #[test]
    fn test_prior_and_derivative_toggles() {
        let prior_only = FilterState {
            show_derivative_works: false,
            max_depth: 10,
            ..Default::default()
        };
        assert_eq!(ids(&filter_graph(&graph(), &prior_only)), vec!["o", "old"]);

        let derivative_only = FilterState {
            show_prior_works: false,
            max_depth: 10,
            ..Default::default()
        };
        let filtered = filter_graph(&graph(), &derivative_only);
        assert_eq!(ids(&filtered), vec!["o", "new", "deep"]);
        assert_no_dangling(&filtered);
    }

    #[test]
    fn test_query_matches_title_case_insensitively() {
        let filters = FilterState {
            search_query: "PAPER NEW".into(),
            ..Default::default()
        };
        assert_eq!(ids(&filter_graph(&graph(), &filters)), vec!["o", "new"]);
    }

    #[test]
    fn test_apply_partial_update() {
        let base = FilterState::default();
        let updated = base.apply(FilterUpdate {
            min_citations: Some(5),
            ..Default::default()
        });

        assert_eq!(updated.min_citations, 5);
        assert_eq!(updated.year_range, base.year_range);
        assert_eq!(updated.max_depth, 3);
    }
}
