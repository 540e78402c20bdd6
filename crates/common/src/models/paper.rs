//! Paper and citation records

use serde::{Deserialize, Serialize};

/// A scholarly paper as supplied by a search or import collaborator.
///
/// Only `id` is mandatory on the wire; every other field falls back to an
/// empty value so partial records from remote APIs never fail to decode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paper {
    /// Globally unique paper ID
    pub id: String,

    #[serde(default)]
    pub title: String,

    /// Author full names in byline order
    #[serde(default)]
    pub authors: Vec<String>,

    /// Publication year (0 when unknown)
    #[serde(default)]
    pub year: i32,

    #[serde(default)]
    pub citation_count: u32,

    #[serde(default, rename = "abstract")]
    pub abstract_text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields_of_study: Option<Vec<String>>,

    #[serde(default)]
    pub url: String,

    /// Overall similarity to the current origin, attached by the engine
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity_to_origin: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity_breakdown: Option<SimilarityBreakdown>,
}

impl Paper {
    /// Create a paper with just an id and title
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    /// Fields of study, or an empty slice when the record has none
    pub fn fields(&self) -> &[String] {
        self.fields_of_study.as_deref().unwrap_or(&[])
    }

    /// Venue name when present and non-blank
    pub fn venue_name(&self) -> Option<&str> {
        self.venue
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    /// Return a copy carrying the given similarity annotation
    pub fn with_similarity(&self, result: &SimilarityResult) -> Self {
        Self {
            similarity_to_origin: Some(result.overall),
            similarity_breakdown: Some(result.breakdown),
            ..self.clone()
        }
    }
}

/// Per-dimension similarity scores, each in [0, 1]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SimilarityBreakdown {
    pub citation: f64,
    pub topic: f64,
    pub temporal: f64,
    pub author: f64,
    pub venue: f64,
}

/// Weighted similarity of a paper to the origin
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SimilarityResult {
    /// Weighted sum of the breakdown, clamped to [0, 1]
    pub overall: f64,
    pub breakdown: SimilarityBreakdown,
}

/// Direction tag of a citation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CitationKind {
    Cites,
    CitedBy,
}

/// Directed citation between two papers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Citation {
    pub source_id: String,
    pub target_id: String,
    #[serde(rename = "type")]
    pub kind: CitationKind,
}

impl Citation {
    pub fn cites(source_id: impl Into<String>, target_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            kind: CitationKind::Cites,
        }
    }
}
