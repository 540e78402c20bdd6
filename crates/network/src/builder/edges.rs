//! Edge inference over a retained paper set

use crate::similarity::{jaccard, normalized_set, CitationAdjacency};
use citemap_common::models::{EdgeType, NetworkEdge, Paper};
use std::collections::{HashMap, HashSet};

/// Papers older than this never get inferred outgoing citations
pub const INFERENCE_MIN_YEAR: i32 = 1990;
/// Minimum citation count of an inferred citation target
pub const INFERENCE_MIN_TARGET_CITATIONS: u32 = 50;
/// Maximum year gap between an inferred source and its target
pub const INFERENCE_MAX_YEAR_GAP: u32 = 10;
/// Inferred citations per source paper
pub const INFERENCE_MAX_TARGETS: usize = 5;

/// Heuristic `cites` edges: each paper is assumed to cite the most cited
/// recent work published before it.
pub fn infer_citation_edges(papers: &[Paper]) -> Vec<NetworkEdge> {
    let mut by_year: Vec<&Paper> = papers.iter().collect();
    by_year.sort_by_key(|p| p.year);

    let mut edges = Vec::new();
    for source in by_year.iter().filter(|p| p.year >= INFERENCE_MIN_YEAR) {
        let mut candidates: Vec<&Paper> = by_year
            .iter()
            .copied()
            .filter(|target| {
                target.year < source.year
                    && target.citation_count >= INFERENCE_MIN_TARGET_CITATIONS
                    && source.year.abs_diff(target.year) <= INFERENCE_MAX_YEAR_GAP
            })
            .collect();
        candidates.sort_by(|a, b| b.citation_count.cmp(&a.citation_count));

        edges.extend(
            candidates
                .into_iter()
                .take(INFERENCE_MAX_TARGETS)
                .map(|target| NetworkEdge::cites(&source.id, &target.id, EdgeType::Citation, 1.0)),
        );
    }
    edges
}

/// Field-of-study overlap edges between every unordered pair
pub fn semantic_edges(papers: &[Paper], min_similarity: f64) -> Vec<NetworkEdge> {
    let fields: Vec<HashSet<String>> = papers.iter().map(|p| normalized_set(p.fields())).collect();

    let mut edges = Vec::new();
    for i in 0..papers.len() {
        if fields[i].is_empty() {
            continue;
        }
        for j in (i + 1)..papers.len() {
            if fields[j].is_empty() {
                continue;
            }
            let similarity = jaccard(&fields[i], &fields[j]);
            if similarity < min_similarity {
                continue;
            }

            let mut shared: Vec<String> = fields[i].intersection(&fields[j]).cloned().collect();
            shared.sort();

            let mut edge = NetworkEdge::cites(&papers[i].id, &papers[j].id, EdgeType::Semantic, similarity * 2.0);
            edge.semantic_similarity = Some(similarity);
            edge.shared_fields_of_study = Some(shared);
            edges.push(edge);
        }
    }
    edges
}

/// Pairs of retained papers cited together by at least one paper.
///
/// Weight is the number of co-citing papers.
pub fn co_citation_edges(papers: &[Paper], adjacency: &CitationAdjacency) -> Vec<NetworkEdge> {
    let retained: HashSet<&str> = papers.iter().map(|p| p.id.as_str()).collect();
    let mut counts: HashMap<(usize, usize), u32> = HashMap::new();
    let position: HashMap<&str, usize> = papers.iter().enumerate().map(|(i, p)| (p.id.as_str(), i)).collect();

    for references in adjacency.values() {
        let mut cited: Vec<usize> = references
            .iter()
            .filter(|id| retained.contains(id.as_str()))
            .map(|id| position[id.as_str()])
            .collect();
        cited.sort_unstable();
        for (k, &a) in cited.iter().enumerate() {
            for &b in &cited[k + 1..] {
                *counts.entry((a, b)).or_default() += 1;
            }
        }
    }

    pair_edges(papers, counts, EdgeType::CoCitation)
}

/// Pairs of retained papers that share at least one reference.
///
/// Weight is the number of shared references.
pub fn bibliographic_coupling_edges(papers: &[Paper], adjacency: &CitationAdjacency) -> Vec<NetworkEdge> {
    let mut counts: HashMap<(usize, usize), u32> = HashMap::new();

    for i in 0..papers.len() {
        let Some(refs_i) = adjacency.get(&papers[i].id) else {
            continue;
        };
        for j in (i + 1)..papers.len() {
            let Some(refs_j) = adjacency.get(&papers[j].id) else {
                continue;
            };
            let shared = refs_i.intersection(refs_j).count() as u32;
            if shared > 0 {
                counts.insert((i, j), shared);
            }
        }
    }

    pair_edges(papers, counts, EdgeType::BibliographicCoupling)
}

fn pair_edges(papers: &[Paper], counts: HashMap<(usize, usize), u32>, edge_type: EdgeType) -> Vec<NetworkEdge> {
    let mut pairs: Vec<((usize, usize), u32)> = counts.into_iter().collect();
    pairs.sort_unstable_by_key(|(pair, _)| *pair);

    pairs
        .into_iter()
        .map(|((a, b), count)| NetworkEdge::cites(&papers[a].id, &papers[b].id, edge_type, count as f64))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paper(id: &str, year: i32, citations: u32) -> Paper {
        Paper {
            year,
            citation_count: citations,
            ..Paper::new(id, id)
        }
    }

    fn with_fields(id: &str, fields: &[&str]) -> Paper {
        Paper {
            fields_of_study: Some(fields.iter().map(|f| f.to_string()).collect()),
            ..Paper::new(id, id)
        }
    }

    fn pairs(edges: &[NetworkEdge]) -> Vec<(&str, &str)> {
        edges.iter().map(|e| (e.source.as_str(), e.target.as_str())).collect()
    }

    #[test]
    fn test_inference_respects_thresholds() {
        let papers = vec![paper("a", 2020, 500), paper("b", 2015, 800), paper("c", 2010, 40)];
        let edges = infer_citation_edges(&papers);

        assert_eq!(pairs(&edges), vec![("a", "b")]);
        assert_eq!(edges[0].weight, 1.0);
        assert_eq!(edges[0].edge_type, Some(EdgeType::Citation));
    }

    #[test]
    fn test_inference_skips_old_sources_and_long_gaps() {
        let papers = vec![paper("old", 1985, 10), paper("older", 1980, 900), paper("new", 2020, 0), paper("mid", 2005, 900)];
        let edges = infer_citation_edges(&papers);

        // 1985 source is below the cutoff; 2020 -> 2005 is a 15 year gap
        assert!(edges.is_empty());
    }

    #[test]
    fn test_inference_with_extreme_years() {
        let papers = vec![paper("a", i32::MAX, 0), paper("z", i32::MIN, 900), paper("b", 2015, 800)];
        let edges = infer_citation_edges(&papers);
        assert!(edges.is_empty());
    }

    #[test]
    fn test_inference_takes_top_five_by_citations() {
        let mut papers: Vec<Paper> = (0..8).map(|i| paper(&format!("t{}", i), 2010, 100 + i)).collect();
        papers.push(paper("src", 2015, 0));

        let edges = infer_citation_edges(&papers);
        let targets: Vec<&str> = edges.iter().map(|e| e.target.as_str()).collect();

        assert_eq!(targets, vec!["t7", "t6", "t5", "t4", "t3"]);
    }

    #[test]
    fn test_semantic_edge_weight_and_shared_fields() {
        let papers = vec![
            with_fields("p", &["Oncology", "Genomics"]),
            with_fields("q", &["Genomics", "Immunology"]),
        ];
        let edges = semantic_edges(&papers, 0.3);

        assert_eq!(edges.len(), 1);
        let edge = &edges[0];
        assert!((edge.semantic_similarity.unwrap() - 1.0 / 3.0).abs() < 1e-9);
        assert!((edge.weight - 0.667).abs() < 1e-3);
        assert_eq!(edge.shared_fields_of_study, Some(vec!["genomics".to_string()]));
    }

    #[test]
    fn test_semantic_threshold_and_missing_fields() {
        let papers = vec![
            with_fields("p", &["Oncology", "Genomics"]),
            with_fields("q", &["Genomics", "Immunology"]),
            Paper::new("bare", "bare"),
        ];
        assert!(semantic_edges(&papers, 0.5).is_empty());
    }

    #[test]
    fn test_co_citation_and_coupling() {
        let papers = vec![paper("a", 2000, 0), paper("b", 2000, 0), paper("c", 2000, 0)];
        let mut adjacency = CitationAdjacency::new();
        for (from, to) in [("x", "a"), ("x", "b"), ("y", "a"), ("y", "b"), ("a", "r"), ("c", "r")] {
            adjacency.entry(from.to_string()).or_default().insert(to.to_string());
        }

        let co = co_citation_edges(&papers, &adjacency);
        assert_eq!(pairs(&co), vec![("a", "b")]);
        assert_eq!(co[0].weight, 2.0);

        let coupled = bibliographic_coupling_edges(&papers, &adjacency);
        assert_eq!(pairs(&coupled), vec![("a", "c")]);
        assert_eq!(coupled[0].edge_type, Some(EdgeType::BibliographicCoupling));
    }
}
