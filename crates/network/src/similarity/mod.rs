//! Multi-dimensional paper similarity
//!
//! Scores how close a paper is to the origin along five independent
//! dimensions (citation, topic, temporal, author, venue) and combines them
//! with configurable weights.

mod text;
mod venue;

pub use text::{jaccard, last_name, normalized_set, title_keywords};
pub use venue::JournalFamilies;

use crate::error::{NetworkError, Result};
use citemap_common::config::SimilarityConfig;
use citemap_common::models::{Paper, SimilarityBreakdown, SimilarityResult};
use std::collections::{HashMap, HashSet};

/// Paper id -> ids of the papers it cites
pub type CitationAdjacency = HashMap<String, HashSet<String>>;

/// Weight of a direct citation between the two papers
const DIRECT_CITATION_SCORE: f64 = 0.8;
/// Scale applied to the shared-reference ratio
const SHARED_REFERENCE_SCALE: f64 = 0.6;
/// Scale applied to the title-keyword fallback for topic
const KEYWORD_TOPIC_SCALE: f64 = 0.5;
/// Score for two venues of the same journal family
const VENUE_FAMILY_SCORE: f64 = 0.7;
/// Allowed deviation of the weight sum from 1
const WEIGHT_TOLERANCE: f64 = 0.01;

/// Relative importance of each dimension
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityWeights {
    pub citation: f64,
    pub topic: f64,
    pub temporal: f64,
    pub author: f64,
    pub venue: f64,
}

impl Default for SimilarityWeights {
    fn default() -> Self {
        Self {
            citation: 0.35,
            topic: 0.25,
            temporal: 0.15,
            author: 0.15,
            venue: 0.10,
        }
    }
}

impl SimilarityWeights {
    pub fn sum(&self) -> f64 {
        self.citation + self.topic + self.temporal + self.author + self.venue
    }

    /// Weights must be non-negative and sum to ~1
    pub fn validate(&self) -> Result<()> {
        let all = [self.citation, self.topic, self.temporal, self.author, self.venue];
        let sum = self.sum();
        if all.iter().any(|w| *w < 0.0 || !w.is_finite()) || (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(NetworkError::InvalidWeights { sum });
        }
        Ok(())
    }

    fn combine(&self, b: &SimilarityBreakdown) -> f64 {
        let overall = b.citation * self.citation
            + b.topic * self.topic
            + b.temporal * self.temporal
            + b.author * self.author
            + b.venue * self.venue;
        overall.clamp(0.0, 1.0)
    }
}

impl From<&SimilarityConfig> for SimilarityWeights {
    fn from(config: &SimilarityConfig) -> Self {
        Self {
            citation: config.citation_weight,
            topic: config.topic_weight,
            temporal: config.temporal_weight,
            author: config.author_weight,
            venue: config.venue_weight,
        }
    }
}

/// Similarity scorer
#[derive(Debug, Clone)]
pub struct SimilarityEngine {
    weights: SimilarityWeights,
    families: JournalFamilies,
}

impl SimilarityEngine {
    /// Create an engine; fails when the weights do not sum to ~1
    pub fn new(weights: SimilarityWeights) -> Result<Self> {
        weights.validate()?;
        Ok(Self {
            weights,
            families: JournalFamilies::builtin(),
        })
    }

    /// Build from configuration, including any extra journal families
    pub fn from_config(config: &SimilarityConfig) -> Result<Self> {
        let mut engine = Self::new(SimilarityWeights::from(config))?;
        for (i, venues) in config.journal_families.iter().enumerate() {
            engine.families = engine
                .families
                .with_family(&format!("custom-{}", i), venues.iter().map(String::as_str));
        }
        Ok(engine)
    }

    pub fn with_families(mut self, families: JournalFamilies) -> Self {
        self.families = families;
        self
    }

    pub fn weights(&self) -> &SimilarityWeights {
        &self.weights
    }

    /// Score `paper` against `origin`
    pub fn similarity(
        &self,
        paper: &Paper,
        origin: &Paper,
        adjacency: Option<&CitationAdjacency>,
    ) -> SimilarityResult {
        let breakdown = SimilarityBreakdown {
            citation: citation_similarity(paper, origin, adjacency),
            topic: topic_similarity(paper, origin),
            temporal: temporal_similarity(paper.year, origin.year),
            author: author_similarity(paper, origin),
            venue: self.venue_similarity(paper, origin),
        };

        SimilarityResult {
            overall: self.weights.combine(&breakdown),
            breakdown,
        }
    }

    /// Score every paper against the origin
    pub fn batch_similarity(
        &self,
        papers: &[Paper],
        origin: &Paper,
        adjacency: Option<&CitationAdjacency>,
    ) -> HashMap<String, SimilarityResult> {
        papers
            .iter()
            .map(|p| (p.id.clone(), self.similarity(p, origin, adjacency)))
            .collect()
    }

    /// Papers ordered by overall similarity, most similar first.
    ///
    /// The sort is stable: ties keep their input order. Returned papers carry
    /// their similarity annotation.
    pub fn sort_by_similarity(
        &self,
        papers: &[Paper],
        origin: &Paper,
        adjacency: Option<&CitationAdjacency>,
    ) -> Vec<Paper> {
        let mut scored: Vec<Paper> = papers
            .iter()
            .map(|p| p.with_similarity(&self.similarity(p, origin, adjacency)))
            .collect();

        scored.sort_by(|a, b| {
            let sa = a.similarity_to_origin.unwrap_or(0.0);
            let sb = b.similarity_to_origin.unwrap_or(0.0);
            sb.partial_cmp(&sa).unwrap_or(std::cmp::Ordering::Equal)
        });
        scored
    }

    fn venue_similarity(&self, a: &Paper, b: &Paper) -> f64 {
        let (Some(va), Some(vb)) = (a.venue_name(), b.venue_name()) else {
            return 0.0;
        };
        if va.to_lowercase() == vb.to_lowercase() {
            1.0
        } else if self.families.same_family(va, vb) {
            VENUE_FAMILY_SCORE
        } else {
            0.0
        }
    }
}

impl Default for SimilarityEngine {
    fn default() -> Self {
        Self {
            weights: SimilarityWeights::default(),
            families: JournalFamilies::builtin(),
        }
    }
}

/// Citation proximity; needs adjacency data except for the identity case
pub fn citation_similarity(a: &Paper, b: &Paper, adjacency: Option<&CitationAdjacency>) -> f64 {
    if a.id == b.id {
        return 1.0;
    }
    let Some(adjacency) = adjacency else {
        return 0.0;
    };

    let empty = HashSet::new();
    let refs_a = adjacency.get(&a.id).unwrap_or(&empty);
    let refs_b = adjacency.get(&b.id).unwrap_or(&empty);

    if refs_a.contains(&b.id) || refs_b.contains(&a.id) {
        return DIRECT_CITATION_SCORE;
    }

    let shared = refs_a.intersection(refs_b).count();
    if shared == 0 {
        return 0.0;
    }
    let union = refs_a.union(refs_b).count();
    shared as f64 / union as f64 * SHARED_REFERENCE_SCALE
}

/// Field-of-study overlap, falling back to title keywords
pub fn topic_similarity(a: &Paper, b: &Paper) -> f64 {
    if !a.fields().is_empty() && !b.fields().is_empty() {
        return jaccard(&normalized_set(a.fields()), &normalized_set(b.fields()));
    }

    let ka: HashSet<String> = title_keywords(&a.title).into_iter().collect();
    let kb: HashSet<String> = title_keywords(&b.title).into_iter().collect();
    jaccard(&ka, &kb) * KEYWORD_TOPIC_SCALE
}

/// Stepped decay on the publication-year gap.
///
/// Past ten years the exponential tail is capped at the previous step so
/// the score never rises with a larger gap.
pub fn temporal_similarity(year_a: i32, year_b: i32) -> f64 {
    let delta = year_a.abs_diff(year_b);
    match delta {
        0 => 1.0,
        1..=2 => 0.8,
        3..=5 => 0.5,
        6..=10 => 0.2,
        _ => (-(delta as f64) / 10.0).exp().min(0.2),
    }
}

/// Overlap of author last names
pub fn author_similarity(a: &Paper, b: &Paper) -> f64 {
    let names = |p: &Paper| -> HashSet<String> { p.authors.iter().filter_map(|n| last_name(n)).collect() };
    jaccard(&names(a), &names(b))
}
