//! Graph layout
//!
//! Two interchangeable strategies assign node coordinates: a layered
//! top-to-bottom layout and a force-directed simulation. Both take a graph
//! and return a positioned copy.

mod force;
mod hierarchical;

pub use force::{ForceConfig, ForceLayout, ForceSimulation};
pub use hierarchical::{HierarchicalConfig, HierarchicalLayout};

use crate::error::{NetworkError, Result};
use crate::state::ViewMode;
use citemap_common::config::LayoutConfig;
use citemap_common::metrics;
use citemap_common::models::NetworkGraph;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Instant;
use tracing::debug;

/// A way of positioning the nodes of a graph
pub trait LayoutStrategy: Send + Sync {
    /// Positioned copy of `graph`
    fn layout(&self, graph: &NetworkGraph) -> NetworkGraph;

    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    #[default]
    Force,
    Hierarchical,
}

impl FromStr for LayoutMode {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "force" | "force-directed" => Ok(LayoutMode::Force),
            "hierarchical" | "layered" => Ok(LayoutMode::Hierarchical),
            other => Err(NetworkError::InvalidOption {
                field: "layout.mode",
                message: format!("unknown layout mode '{}'", other),
            }),
        }
    }
}

impl From<ViewMode> for LayoutMode {
    fn from(mode: ViewMode) -> Self {
        match mode {
            ViewMode::Force => LayoutMode::Force,
            ViewMode::Hierarchical => LayoutMode::Hierarchical,
        }
    }
}

/// Strategy for `mode` configured from `config`
pub fn strategy_for(mode: LayoutMode, config: &LayoutConfig) -> Box<dyn LayoutStrategy> {
    match mode {
        LayoutMode::Force => Box::new(ForceLayout::new(ForceConfig::from(config))),
        LayoutMode::Hierarchical => Box::new(HierarchicalLayout::new(HierarchicalConfig::from(config))),
    }
}

/// Strategy named by `config.mode`
pub fn configured_strategy(config: &LayoutConfig) -> Result<Box<dyn LayoutStrategy>> {
    Ok(strategy_for(config.mode.parse()?, config))
}

/// Run `strategy` over `graph`, recording its duration
pub fn apply_layout(strategy: &dyn LayoutStrategy, graph: &NetworkGraph) -> NetworkGraph {
    let start = Instant::now();
    let positioned = strategy.layout(graph);
    let elapsed = start.elapsed().as_secs_f64();

    metrics::record_layout(elapsed, strategy.name());
    debug!(
        strategy = strategy.name(),
        nodes = positioned.node_count(),
        duration_ms = elapsed * 1000.0,
        "Layout applied"
    );
    positioned
}
