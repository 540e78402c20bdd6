//! Paper retrieval abstraction
//!
//! The network engine itself never performs I/O. Anything that fetches
//! papers from a remote bibliographic service implements [`PaperSource`]
//! and funnels its requests through an owned [`RequestScheduler`].

mod scheduler;
mod scholar;

pub use scheduler::{status_error, RequestScheduler, SchedulerConfig};
pub use scholar::ScholarClient;

use crate::errors::Result;
use crate::models::Paper;
use async_trait::async_trait;
use std::collections::HashMap;

/// Source of paper records
#[async_trait]
pub trait PaperSource: Send + Sync {
    /// Free-text search
    async fn search_papers(&self, query: &str, limit: usize) -> Result<Vec<Paper>>;

    /// Fetch a single paper; `None` when the source does not know it
    async fn get_paper(&self, paper_id: &str) -> Result<Option<Paper>>;

    /// Papers citing `paper_id`
    async fn get_citations(&self, paper_id: &str, limit: usize) -> Result<Vec<Paper>>;

    /// Papers cited by `paper_id`
    async fn get_references(&self, paper_id: &str, limit: usize) -> Result<Vec<Paper>>;

    /// Name used in logs
    fn name(&self) -> &str;
}

/// In-memory source for tests and offline use
#[derive(Debug, Default, Clone)]
pub struct StaticPaperSource {
    papers: HashMap<String, Paper>,
    /// paper id -> ids of papers it cites
    references: HashMap<String, Vec<String>>,
}

impl StaticPaperSource {
    pub fn new(papers: Vec<Paper>) -> Self {
        Self {
            papers: papers.into_iter().map(|p| (p.id.clone(), p)).collect(),
            references: HashMap::new(),
        }
    }

    /// Record that `citing` cites `cited`
    pub fn with_reference(mut self, citing: &str, cited: &str) -> Self {
        self.references
            .entry(citing.to_string())
            .or_default()
            .push(cited.to_string());
        self
    }

    fn resolve(&self, ids: impl Iterator<Item = String>, limit: usize) -> Vec<Paper> {
        ids.filter_map(|id| self.papers.get(&id).cloned())
            .take(limit)
            .collect()
    }
}

#[async_trait]
impl PaperSource for StaticPaperSource {
    async fn search_papers(&self, query: &str, limit: usize) -> Result<Vec<Paper>> {
        let needle = query.trim().to_lowercase();
        let mut hits: Vec<Paper> = self
            .papers
            .values()
            .filter(|p| needle.is_empty() || p.title.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        hits.sort_by(|a, b| b.citation_count.cmp(&a.citation_count).then_with(|| a.id.cmp(&b.id)));
        hits.truncate(limit);
        Ok(hits)
    }

    async fn get_paper(&self, paper_id: &str) -> Result<Option<Paper>> {
        Ok(self.papers.get(paper_id).cloned())
    }

    async fn get_citations(&self, paper_id: &str, limit: usize) -> Result<Vec<Paper>> {
        let mut citing: Vec<String> = self
            .references
            .iter()
            .filter(|(_, cited)| cited.iter().any(|c| c == paper_id))
            .map(|(citing, _)| citing.clone())
            .collect();
        citing.sort();
        Ok(self.resolve(citing.into_iter(), limit))
    }

    async fn get_references(&self, paper_id: &str, limit: usize) -> Result<Vec<Paper>> {
        let cited = self.references.get(paper_id).cloned().unwrap_or_default();
        Ok(self.resolve(cited.into_iter(), limit))
    }

    fn name(&self) -> &str {
        "static"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> StaticPaperSource {
        let mut a = Paper::new("a", "Deep residual learning");
        a.citation_count = 100;
        let mut b = Paper::new("b", "Batch normalization");
        b.citation_count = 50;
        let c = Paper::new("c", "Residual attention");

        StaticPaperSource::new(vec![a, b, c])
            .with_reference("a", "b")
            .with_reference("c", "a")
            .with_reference("a", "missing")
    }

    #[tokio::test]
    async fn test_search_ranks_by_citations() {
        let hits = source().search_papers("residual", 10).await.unwrap();
        let ids: Vec<&str> = hits.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn test_citation_directions() {
        let source = source();

        let citing = source.get_citations("a", 10).await.unwrap();
        assert_eq!(citing.len(), 1);
        assert_eq!(citing[0].id, "c");

        // Unknown references are dropped rather than failing
        let refs = source.get_references("a", 10).await.unwrap();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].id, "b");
    }

    #[tokio::test]
    async fn test_unknown_paper() {
        assert!(source().get_paper("zzz").await.unwrap().is_none());
        assert!(source().get_references("zzz", 5).await.unwrap().is_empty());
    }
}
