//! Semantic Scholar Graph API client

use super::{status_error, PaperSource, RequestScheduler};
use crate::config::RetrievalConfig;
use crate::errors::{AppError, Result};
use crate::models::Paper;
use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};

const PAPER_FIELDS: &str = "paperId,title,authors,year,citationCount,abstract,venue,fieldsOfStudy,url";

/// Paper as returned by the API; every field may be missing or null
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiPaper {
    paper_id: Option<String>,
    title: Option<String>,
    #[serde(default)]
    authors: Option<Vec<ApiAuthor>>,
    year: Option<i32>,
    citation_count: Option<u32>,
    #[serde(rename = "abstract")]
    abstract_text: Option<String>,
    venue: Option<String>,
    fields_of_study: Option<Vec<String>>,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiAuthor {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiPage<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CitingEntry {
    citing_paper: Option<ApiPaper>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CitedEntry {
    cited_paper: Option<ApiPaper>,
}

impl ApiPaper {
    /// Convert into the core shape; records without an id are dropped
    fn into_paper(self) -> Option<Paper> {
        let id = self.paper_id.filter(|id| !id.is_empty())?;
        Some(Paper {
            url: self
                .url
                .unwrap_or_else(|| format!("https://www.semanticscholar.org/paper/{}", id)),
            id,
            title: self.title.unwrap_or_default(),
            authors: self
                .authors
                .unwrap_or_default()
                .into_iter()
                .filter_map(|a| a.name)
                .collect(),
            year: self.year.unwrap_or(0),
            citation_count: self.citation_count.unwrap_or(0),
            abstract_text: self.abstract_text.unwrap_or_default(),
            venue: self.venue.filter(|v| !v.trim().is_empty()),
            fields_of_study: self.fields_of_study,
            similarity_to_origin: None,
            similarity_breakdown: None,
        })
    }
}

/// Rate-limited client for the Semantic Scholar Graph API
pub struct ScholarClient {
    client: reqwest::Client,
    base_url: Url,
    api_key: Option<String>,
    timeout_ms: u64,
    scheduler: Arc<RequestScheduler>,
}

impl ScholarClient {
    /// Create a client that dispatches through `scheduler`
    pub fn new(config: &RetrievalConfig, scheduler: Arc<RequestScheduler>) -> Result<Self> {
        let base_url = Url::parse(config.base_url.trim_end_matches('/')).map_err(|e| AppError::Configuration {
            message: format!("invalid retrieval base_url {}: {}", config.base_url, e),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::Configuration {
                message: format!("retrieval base_url {} cannot carry a path", config.base_url),
            });
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("citemap/", env!("CARGO_PKG_VERSION")))
            .build()?;

        info!(
            base_url = %config.base_url,
            authenticated = config.api_key.is_some(),
            "Scholar client initialized"
        );

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key.clone(),
            timeout_ms: config.timeout().as_millis() as u64,
            scheduler,
        })
    }

    /// Base URL extended by `segments`, each percent-encoded as one path segment
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// GET `segments` with query parameters, through the scheduler
    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str], query: &[(&str, String)]) -> Result<T> {
        let url = &self.endpoint(segments);
        let client = &self.client;
        let api_key = self.api_key.as_deref();
        let timeout_ms = self.timeout_ms;

        self.scheduler
            .execute(|| async move {
                let mut request = client.get(url.clone()).query(query);
                if let Some(key) = api_key {
                    request = request.header("x-api-key", key);
                }

                let response = request.send().await.map_err(|e| {
                    if e.is_timeout() {
                        AppError::RetrievalTimeout { timeout_ms }
                    } else {
                        AppError::HttpClient(e)
                    }
                })?;

                let status = response.status();
                if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
                    return Err(AppError::MissingCredentials {
                        service: "semantic-scholar".to_string(),
                    });
                }
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(status_error(status.as_u16(), body));
                }

                Ok(response.json::<T>().await?)
            })
            .await
    }

    fn list_query(limit: usize) -> Vec<(&'static str, String)> {
        vec![
            ("fields", PAPER_FIELDS.to_string()),
            ("limit", limit.clamp(1, 1000).to_string()),
        ]
    }
}

#[async_trait]
impl PaperSource for ScholarClient {
    async fn search_papers(&self, query: &str, limit: usize) -> Result<Vec<Paper>> {
        let mut params = Self::list_query(limit.min(100));
        params.push(("query", query.to_string()));

        let page: ApiPage<ApiPaper> = self.get_json(&["paper", "search"], &params).await?;
        let papers: Vec<Paper> = page.data.into_iter().filter_map(ApiPaper::into_paper).collect();

        debug!(query, count = papers.len(), "Search completed");
        Ok(papers)
    }

    async fn get_paper(&self, paper_id: &str) -> Result<Option<Paper>> {
        let params = [("fields", PAPER_FIELDS.to_string())];
        match self
            .get_json::<ApiPaper>(&["paper", paper_id], &params)
            .await
        {
            Ok(paper) => Ok(paper.into_paper()),
            Err(AppError::Upstream { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn get_citations(&self, paper_id: &str, limit: usize) -> Result<Vec<Paper>> {
        let page: ApiPage<CitingEntry> = self
            .get_json(&["paper", paper_id, "citations"], &Self::list_query(limit))
            .await?;

        Ok(page
            .data
            .into_iter()
            .filter_map(|entry| entry.citing_paper.and_then(ApiPaper::into_paper))
            .collect())
    }

    async fn get_references(&self, paper_id: &str, limit: usize) -> Result<Vec<Paper>> {
        let page: ApiPage<CitedEntry> = self
            .get_json(&["paper", paper_id, "references"], &Self::list_query(limit))
            .await?;

        Ok(page
            .data
            .into_iter()
            .filter_map(|entry| entry.cited_paper.and_then(ApiPaper::into_paper))
            .collect())
    }

    fn name(&self) -> &str {
        "semantic-scholar"
    }
}
