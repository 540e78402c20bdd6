//! Paper lookup handlers, proxied to the configured paper source

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use validator::Validate;

use crate::AppState;
use citemap_common::{
    errors::{AppError, Result},
    models::Paper,
};

#[derive(Debug, Deserialize, Validate)]
pub struct SearchQuery {
    #[validate(length(min = 1, max = 500))]
    pub query: String,

    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100))]
    pub limit: usize,
}

fn default_limit() -> usize { 20 }

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub query: String,
    pub total_results: usize,
    pub papers: Vec<Paper>,
    pub processing_time_ms: u64,
}

/// Free-text paper search
pub async fn search_papers(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<SearchResponse>> {
    params.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let start = Instant::now();
    let papers = state.source.search_papers(&params.query, params.limit).await?;

    tracing::info!(
        query = %params.query,
        results = papers.len(),
        source = state.source.name(),
        "Paper search completed"
    );

    Ok(Json(SearchResponse {
        query: params.query,
        total_results: papers.len(),
        papers,
        processing_time_ms: start.elapsed().as_millis() as u64,
    }))
}

/// Fetch one paper by id
pub async fn get_paper(
    State(state): State<AppState>,
    Path(paper_id): Path<String>,
) -> Result<Json<Paper>> {
    let paper = state.source.get_paper(&paper_id).await?;
    paper.map(Json).ok_or(AppError::PaperNotFound { id: paper_id })
}
