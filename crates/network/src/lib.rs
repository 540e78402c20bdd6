//! CiteMap network engine
//!
//! Synchronous, side-effect-free synthesis of citation networks:
//! - [`similarity`]: multi-dimensional paper similarity
//! - [`builder`]: paper filtering, origin selection and edge inference
//! - [`layout`]: layered and force-directed positioning
//! - [`state`]: reducer-driven graph and UI state

pub mod builder;
pub mod error;
pub mod layout;
pub mod similarity;
pub mod state;

use citemap_common::models::Paper;
use std::collections::HashMap;

pub use builder::{NetworkBuild, NetworkBuilder, NetworkOptions};
pub use error::{NetworkError, Result};
pub use layout::{LayoutMode, LayoutStrategy};
pub use similarity::{CitationAdjacency, SimilarityEngine, SimilarityWeights};
pub use state::{GraphAction, GraphState, GraphStateManager};

/// Paper records keyed by id
pub type PaperMap = HashMap<String, Paper>;
