//! CiteMap Common Library
//!
//! Shared code for the CiteMap network engine and services including:
//! - Paper and citation-network data model
//! - Error types and handling
//! - Configuration management
//! - Metrics and observability
//! - Rate-limited paper retrieval

pub mod config;
pub mod errors;
pub mod metrics;
pub mod models;
pub mod retrieval;

// Re-export commonly used types
pub use config::AppConfig;
pub use errors::{AppError, Result};
pub use models::{NetworkEdge, NetworkGraph, NetworkNode, NetworkStats, Paper};
pub use retrieval::{PaperSource, RequestScheduler};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
