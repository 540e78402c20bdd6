//! Core data model shared by the network engine, the retrieval client and the gateway
//!
//! Everything here is serialized in camelCase so snapshots can be handed to
//! rendering collaborators unchanged.

mod network;
mod paper;

pub use network::{EdgeType, NetworkEdge, NetworkGraph, NetworkNode, NetworkStats};
pub use paper::{Citation, CitationKind, Paper, SimilarityBreakdown, SimilarityResult};
