//! Graph state management
//!
//! Holds the current network, the paper records and UI state, and moves
//! between states only through [`GraphAction`]s applied by the pure
//! [`reduce`] function.

mod filter;
mod levels;
mod merge;
mod reducer;

pub use filter::{filter_graph, FilterState, FilterUpdate};
pub use levels::{calculate_local_citation_counts, calculate_node_levels};
pub(crate) use levels::recompute_derived;
pub use merge::{merge_graph, merge_papers, MergedNetwork};
pub use reducer::{reduce, GraphAction, MAX_ZOOM, MIN_ZOOM};

use crate::PaperMap;
use citemap_common::models::NetworkGraph;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Lifecycle phase of the state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatePhase {
    #[default]
    Idle,
    Loading,
    Loaded,
    Errored,
}

/// How the graph is being presented
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Force,
    Hierarchical,
}

/// Viewport center in layout coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiState {
    pub is_loading: bool,
    pub error: Option<String>,
    pub selected_paper_id: Option<String>,
    pub hovered_paper_id: Option<String>,
    pub filters: FilterState,
    pub view_mode: ViewMode,
    /// Always within [`MIN_ZOOM`, `MAX_ZOOM`]
    pub zoom: f64,
    pub viewport: Viewport,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            is_loading: false,
            error: None,
            selected_paper_id: None,
            hovered_paper_id: None,
            filters: FilterState::default(),
            view_mode: ViewMode::default(),
            zoom: 1.0,
            viewport: Viewport::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphState {
    pub phase: StatePhase,
    pub graph: Option<NetworkGraph>,
    pub papers: PaperMap,
    pub ui: UiState,
}

/// Owner of a [`GraphState`] that applies actions in order
#[derive(Debug, Default)]
pub struct GraphStateManager {
    state: GraphState,
}

impl GraphStateManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: GraphState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &GraphState {
        &self.state
    }

    /// Apply `action` and return the new state
    pub fn dispatch(&mut self, action: GraphAction) -> &GraphState {
        let name = action.name();
        if let GraphAction::LoadError(message) = &action {
            warn!(error = %message, "Network load failed");
        }

        self.state = reduce(&self.state, action);
        debug!(
            action = name,
            phase = ?self.state.phase,
            nodes = self.state.graph.as_ref().map_or(0, |g| g.node_count()),
            "State updated"
        );
        &self.state
    }

    /// The current graph with the current filters applied
    pub fn filtered_graph(&self) -> Option<NetworkGraph> {
        self.state
            .graph
            .as_ref()
            .map(|g| filter_graph(g, &self.state.ui.filters))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use citemap_common::models::{NetworkNode, Paper};

    fn graph() -> NetworkGraph {
        let node = |id: &str, year: i32, level: u32| NetworkNode {
            level,
            is_origin: id == "o",
            ..NetworkNode::new(Paper {
                year,
                ..Paper::new(id, id)
            })
        };
        NetworkGraph::new(vec![node("o", 2015, 0), node("a", 2010, 1), node("b", 2019, 1)], vec![], "o")
    }

    #[test]
    fn test_manager_dispatch_sequence() {
        let mut manager = GraphStateManager::new();
        assert_eq!(manager.state().phase, StatePhase::Idle);

        manager.dispatch(GraphAction::LoadStart);
        let state = manager.dispatch(GraphAction::LoadSuccess {
            graph: graph(),
            papers: PaperMap::new(),
        });
        assert_eq!(state.phase, StatePhase::Loaded);

        manager.dispatch(GraphAction::SetFilters(FilterUpdate {
            show_prior_works: Some(false),
            ..Default::default()
        }));
        let filtered = manager.filtered_graph().unwrap();
        let ids: Vec<&str> = filtered.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["o", "b"]);
    }

    #[test]
    fn test_filtered_graph_without_graph() {
        assert!(GraphStateManager::new().filtered_graph().is_none());
    }

    #[test]
    fn test_default_ui_state() {
        let ui = UiState::default();
        assert_eq!(ui.zoom, 1.0);
        assert_eq!(ui.filters.max_depth, 3);
        assert!(ui.filters.show_prior_works && ui.filters.show_derivative_works);
    }
}
