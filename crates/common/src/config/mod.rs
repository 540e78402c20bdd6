//! Configuration management for CiteMap services
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config.toml, config.yaml)
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Remote paper retrieval (search, citations, references)
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Similarity dimension weights
    #[serde(default)]
    pub similarity: SimilarityConfig,

    /// Network builder defaults
    #[serde(default)]
    pub network: NetworkConfig,

    /// Layout defaults
    #[serde(default)]
    pub layout: LayoutConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Maximum papers accepted in a single request body
    #[serde(default = "default_max_papers")]
    pub max_papers_per_request: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetrievalConfig {
    /// Base URL of the bibliographic graph API
    #[serde(default = "default_retrieval_base_url")]
    pub base_url: String,

    /// API key sent as `x-api-key` (optional)
    pub api_key: Option<String>,

    /// Minimum spacing between dispatched requests in milliseconds
    #[serde(default = "default_min_interval")]
    pub min_interval_ms: u64,

    /// Retries after the first failed attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// First backoff delay in milliseconds, doubled on every retry
    #[serde(default = "default_backoff_base")]
    pub backoff_base_ms: u64,

    /// Per-request timeout in seconds
    #[serde(default = "default_retrieval_timeout")]
    pub timeout_secs: u64,

    /// Related papers fetched per direction when expanding a network
    #[serde(default = "default_expand_limit")]
    pub expand_limit: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimilarityConfig {
    #[serde(default = "default_citation_weight")]
    pub citation_weight: f64,
    #[serde(default = "default_topic_weight")]
    pub topic_weight: f64,
    #[serde(default = "default_temporal_weight")]
    pub temporal_weight: f64,
    #[serde(default = "default_author_weight")]
    pub author_weight: f64,
    #[serde(default = "default_venue_weight")]
    pub venue_weight: f64,

    /// Extra journal families, each a list of venue names
    #[serde(default)]
    pub journal_families: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkConfig {
    #[serde(default = "default_max_nodes")]
    pub max_nodes: usize,
    #[serde(default)]
    pub min_citations: u32,
    #[serde(default)]
    pub include_semantic_edges: bool,
    #[serde(default = "default_min_semantic_similarity")]
    pub min_semantic_similarity: f64,
    #[serde(default)]
    pub include_co_citations: bool,
    #[serde(default)]
    pub include_bibliographic_coupling: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LayoutConfig {
    /// Default strategy: "force" or "hierarchical"
    #[serde(default = "default_layout_mode")]
    pub mode: String,

    #[serde(default = "default_iterations")]
    pub iterations: usize,
    #[serde(default = "default_alpha_decay")]
    pub alpha_decay: f64,
    #[serde(default = "default_link_strength")]
    pub link_strength: f64,
    #[serde(default = "default_link_distance")]
    pub link_distance: f64,
    #[serde(default = "default_charge_strength")]
    pub charge_strength: f64,

    #[serde(default = "default_node_separation")]
    pub node_separation: f64,
    #[serde(default = "default_rank_separation")]
    pub rank_separation: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level / EnvFilter directive (debug, info, citemap_network=debug, ...)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Metrics port (0 to disable)
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,

    /// Service name for logs
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Requests per second (global)
    #[serde(default = "default_rate_limit")]
    pub requests_per_second: u32,

    /// Burst capacity
    #[serde(default = "default_burst")]
    pub burst: u32,

    /// Enable rate limiting
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_request_timeout() -> u64 { 30 }
fn default_max_papers() -> usize { 2000 }
fn default_retrieval_base_url() -> String { "https://api.semanticscholar.org/graph/v1".to_string() }
fn default_min_interval() -> u64 { 1100 }
fn default_max_retries() -> u32 { 3 }
fn default_backoff_base() -> u64 { 1000 }
fn default_retrieval_timeout() -> u64 { 30 }
fn default_expand_limit() -> usize { 50 }
fn default_citation_weight() -> f64 { 0.35 }
fn default_topic_weight() -> f64 { 0.25 }
fn default_temporal_weight() -> f64 { 0.15 }
fn default_author_weight() -> f64 { 0.15 }
fn default_venue_weight() -> f64 { 0.10 }
fn default_max_nodes() -> usize { 100 }
fn default_min_semantic_similarity() -> f64 { 0.5 }
fn default_layout_mode() -> String { "force".to_string() }
fn default_iterations() -> usize { 300 }
fn default_alpha_decay() -> f64 { 0.02 }
fn default_link_strength() -> f64 { 0.5 }
fn default_link_distance() -> f64 { 100.0 }
fn default_charge_strength() -> f64 { -300.0 }
fn default_node_separation() -> f64 { 50.0 }
fn default_rank_separation() -> f64 { 100.0 }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { true }
fn default_metrics_port() -> u16 { 9090 }
fn default_service_name() -> String { "citemap".to_string() }
fn default_rate_limit() -> u32 { 50 }
fn default_burst() -> u32 { 100 }
fn default_enabled() -> bool { true }

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))

            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))

            // Load local overrides
            .add_source(File::with_name("config/local").required(false))

            // Load from environment variables with APP__ prefix
            // e.g., APP__SERVER__PORT=8081
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )

            .build()?;

        config.try_deserialize()
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }
}

impl RetrievalConfig {
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            retrieval: RetrievalConfig::default(),
            similarity: SimilarityConfig::default(),
            network: NetworkConfig::default(),
            layout: LayoutConfig::default(),
            observability: ObservabilityConfig::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
            max_papers_per_request: default_max_papers(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            base_url: default_retrieval_base_url(),
            api_key: None,
            min_interval_ms: default_min_interval(),
            max_retries: default_max_retries(),
            backoff_base_ms: default_backoff_base(),
            timeout_secs: default_retrieval_timeout(),
            expand_limit: default_expand_limit(),
        }
    }
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            citation_weight: default_citation_weight(),
            topic_weight: default_topic_weight(),
            temporal_weight: default_temporal_weight(),
            author_weight: default_author_weight(),
            venue_weight: default_venue_weight(),
            journal_families: Vec::new(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            max_nodes: default_max_nodes(),
            min_citations: 0,
            include_semantic_edges: false,
            min_semantic_similarity: default_min_semantic_similarity(),
            include_co_citations: false,
            include_bibliographic_coupling: false,
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            mode: default_layout_mode(),
            iterations: default_iterations(),
            alpha_decay: default_alpha_decay(),
            link_strength: default_link_strength(),
            link_distance: default_link_distance(),
            charge_strength: default_charge_strength(),
            node_separation: default_node_separation(),
            rank_separation: default_rank_separation(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
            metrics_port: default_metrics_port(),
            service_name: default_service_name(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: default_rate_limit(),
            burst: default_burst(),
            enabled: default_enabled(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.retrieval.min_interval(), Duration::from_millis(1100));
        assert_eq!(config.retrieval.max_retries, 3);
        assert_eq!(config.network.max_nodes, 100);
        assert_eq!(config.layout.iterations, 300);
    }

    #[test]
    fn test_default_weights_sum_to_one() {
        let s = SimilarityConfig::default();
        let sum = s.citation_weight + s.topic_weight + s.temporal_weight + s.author_weight + s.venue_weight;
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_partial_sections_fill_defaults() {
        let config = Config::builder()
            .set_override("network.max_nodes", 25)
            .unwrap()
            .set_override("layout.mode", "hierarchical")
            .unwrap()
            .build()
            .unwrap();
        let parsed: AppConfig = config.try_deserialize().unwrap();

        assert_eq!(parsed.network.max_nodes, 25);
        assert_eq!(parsed.network.min_semantic_similarity, 0.5);
        assert_eq!(parsed.layout.mode, "hierarchical");
        assert_eq!(parsed.retrieval.backoff_base_ms, 1000);
    }
}
