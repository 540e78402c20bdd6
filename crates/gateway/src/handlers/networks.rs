//! Citation network handlers
//!
//! Every endpoint is stateless: the client sends the graph (and papers) it
//! holds and receives the transformed value back.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use citemap_common::{
    errors::{AppError, Result},
    models::{Citation, NetworkGraph, NetworkStats, Paper, SimilarityResult},
};
use citemap_network::{
    builder::{expand_network, filter_network_by_year_range, find_influential_papers, ExpandedNetwork, RankedPaper},
    layout::{apply_layout, strategy_for, LayoutMode},
    state::{filter_graph, merge_graph, FilterState, MergedNetwork},
    CitationAdjacency, NetworkBuilder, NetworkOptions, PaperMap,
};
use std::collections::HashMap;

fn validate(request: &impl Validate) -> Result<()> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })
}

fn paper_map(papers: Vec<Paper>) -> PaperMap {
    papers.into_iter().map(|p| (p.id.clone(), p)).collect()
}

impl AppState {
    fn builder(&self, options: Option<NetworkOptions>) -> Result<NetworkBuilder> {
        let options = options.unwrap_or_else(|| self.network_options.clone());
        Ok(NetworkBuilder::new(options, self.engine.clone())?)
    }

    fn check_paper_count(&self, count: usize) -> Result<()> {
        let limit = self.config.server.max_papers_per_request;
        if count > limit {
            return Err(AppError::PayloadTooLarge { size: count, limit });
        }
        Ok(())
    }
}

/// Request to build a network
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BuildNetworkRequest {
    #[validate(length(min = 1))]
    pub papers: Vec<Paper>,

    #[validate(length(min = 1, max = 256))]
    pub origin_paper_id: String,

    #[serde(default)]
    pub options: Option<NetworkOptions>,

    /// Known citations; enables exact citation similarity and structural edges
    #[serde(default)]
    pub citations: Vec<Citation>,

    /// Lay the graph out before returning it
    #[serde(default)]
    pub layout: Option<LayoutMode>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildNetworkResponse {
    pub graph: NetworkGraph,
    pub stats: NetworkStats,
    pub similarities: HashMap<String, SimilarityResult>,
}

fn adjacency(citations: &[Citation]) -> CitationAdjacency {
    let mut adjacency = CitationAdjacency::new();
    for c in citations {
        adjacency
            .entry(c.source_id.clone())
            .or_default()
            .insert(c.target_id.clone());
    }
    adjacency
}

/// Build a citation network from a paper list
pub async fn build_network(
    State(state): State<AppState>,
    Json(request): Json<BuildNetworkRequest>,
) -> Result<Json<BuildNetworkResponse>> {
    validate(&request)?;
    state.check_paper_count(request.papers.len())?;

    let mut builder = state.builder(request.options)?;
    if !request.citations.is_empty() {
        builder = builder.with_citation_adjacency(adjacency(&request.citations));
    }

    let build = builder.build(&request.papers, &request.origin_paper_id)?;
    let graph = match request.layout {
        Some(mode) => apply_layout(strategy_for(mode, &state.config.layout).as_ref(), &build.graph),
        None => build.graph,
    };

    Ok(Json(BuildNetworkResponse {
        graph,
        stats: build.stats,
        similarities: build.similarities,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterRequest {
    pub graph: NetworkGraph,
    #[serde(default)]
    pub filters: FilterState,
}

/// Apply user filters to a graph
pub async fn filter_network(Json(request): Json<FilterRequest>) -> Result<Json<NetworkGraph>> {
    let [min, max] = request.filters.year_range;
    if min > max {
        return Err(AppError::Validation {
            message: format!("yearRange start {} is after end {}", min, max),
            field: Some("filters.yearRange".to_string()),
        });
    }
    Ok(Json(filter_graph(&request.graph, &request.filters)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearRangeRequest {
    pub graph: NetworkGraph,
    #[serde(default)]
    pub papers: Vec<Paper>,
    pub year_range: [i32; 2],
}

/// Restrict a graph to a publication-year window
pub async fn filter_by_year_range(Json(request): Json<YearRangeRequest>) -> Result<Json<NetworkGraph>> {
    let [min, max] = request.year_range;
    if min > max {
        return Err(AppError::Validation {
            message: format!("yearRange start {} is after end {}", min, max),
            field: Some("yearRange".to_string()),
        });
    }
    let papers = paper_map(request.papers);
    Ok(Json(filter_network_by_year_range(&request.graph, &papers, request.year_range)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeRequest {
    pub existing: NetworkGraph,
    pub incoming: NetworkGraph,
    #[serde(default)]
    pub papers: PaperMap,
    #[serde(default)]
    pub incoming_papers: PaperMap,
}

/// Union two graphs around the existing origin
pub async fn merge_networks(Json(request): Json<MergeRequest>) -> Result<Json<MergedNetwork>> {
    let merged = merge_graph(
        &request.existing,
        &request.incoming,
        &request.papers,
        &request.incoming_papers,
    );
    tracing::debug!(nodes = merged.graph.node_count(), edges = merged.graph.edge_count(), "Graphs merged");
    Ok(Json(merged))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InfluentialRequest {
    pub graph: NetworkGraph,
    #[serde(default)]
    pub papers: Vec<Paper>,
    #[serde(default = "default_influential_limit")]
    #[validate(range(min = 1, max = 1000))]
    pub limit: usize,
}

fn default_influential_limit() -> usize { 10 }

/// Rank the papers of a graph by influence
pub async fn influential_papers(Json(request): Json<InfluentialRequest>) -> Result<Json<Vec<RankedPaper>>> {
    validate(&request)?;
    let papers = paper_map(request.papers);
    Ok(Json(find_influential_papers(&request.graph, &papers, request.limit)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutRequest {
    pub graph: NetworkGraph,
    #[serde(default)]
    pub mode: LayoutMode,
}

/// Position the nodes of a graph
pub async fn layout_network(
    State(state): State<AppState>,
    Json(request): Json<LayoutRequest>,
) -> Result<Json<NetworkGraph>> {
    state.check_paper_count(request.graph.node_count())?;
    let strategy = strategy_for(request.mode, &state.config.layout);
    Ok(Json(apply_layout(strategy.as_ref(), &request.graph)))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ExpandRequest {
    pub graph: NetworkGraph,
    #[serde(default)]
    pub papers: PaperMap,

    /// Paper whose citations and references are fetched
    #[validate(length(min = 1, max = 256))]
    pub paper_id: String,

    #[serde(default)]
    #[validate(range(min = 1, max = 1000))]
    pub limit: Option<usize>,

    #[serde(default)]
    pub options: Option<NetworkOptions>,
}

/// Grow a graph with the citations and references of one paper
pub async fn expand(
    State(state): State<AppState>,
    Json(request): Json<ExpandRequest>,
) -> Result<Json<ExpandedNetwork>> {
    validate(&request)?;
    if request.graph.node(&request.paper_id).is_none() && !request.papers.contains_key(&request.paper_id) {
        return Err(AppError::PaperNotFound { id: request.paper_id });
    }

    let limit = request.limit.unwrap_or(state.config.retrieval.expand_limit);
    let (citations, references) = futures::try_join!(
        state.source.get_citations(&request.paper_id, limit),
        state.source.get_references(&request.paper_id, limit),
    )?;

    let mut related = citations;
    related.extend(references);
    state.check_paper_count(request.graph.node_count() + related.len())?;

    let builder = state.builder(request.options)?;
    let expanded = expand_network(&request.graph, &request.papers, &related, &builder)?;

    tracing::info!(
        paper_id = %request.paper_id,
        fetched = related.len(),
        added = expanded.added_nodes,
        "Network expanded from paper source"
    );
    Ok(Json(expanded))
}
