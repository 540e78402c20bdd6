//! Pure state transitions

use super::{merge_graph, merge_papers, FilterUpdate, GraphState, StatePhase, ViewMode, Viewport};
use crate::PaperMap;
use citemap_common::models::{NetworkGraph, NetworkNode, Paper};
use serde::{Deserialize, Serialize};

/// Zoom bounds
pub const MIN_ZOOM: f64 = 0.1;
pub const MAX_ZOOM: f64 = 10.0;

/// Every state transition the manager accepts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GraphAction {
    LoadStart,
    LoadSuccess { graph: NetworkGraph, papers: PaperMap },
    LoadError(String),
    SetGraph(NetworkGraph),
    AddPapers(Vec<Paper>),
    MergeGraph { graph: NetworkGraph, papers: PaperMap },
    SelectPaper(Option<String>),
    HoverPaper(Option<String>),
    SetFilters(FilterUpdate),
    SetViewMode(ViewMode),
    SetZoom(f64),
    SetViewport(Viewport),
    ClearError,
    Reset,
}

impl GraphAction {
    pub fn name(&self) -> &'static str {
        match self {
            GraphAction::LoadStart => "load_start",
            GraphAction::LoadSuccess { .. } => "load_success",
            GraphAction::LoadError(_) => "load_error",
            GraphAction::SetGraph(_) => "set_graph",
            GraphAction::AddPapers(_) => "add_papers",
            GraphAction::MergeGraph { .. } => "merge_graph",
            GraphAction::SelectPaper(_) => "select_paper",
            GraphAction::HoverPaper(_) => "hover_paper",
            GraphAction::SetFilters(_) => "set_filters",
            GraphAction::SetViewMode(_) => "set_view_mode",
            GraphAction::SetZoom(_) => "set_zoom",
            GraphAction::SetViewport(_) => "set_viewport",
            GraphAction::ClearError => "clear_error",
            GraphAction::Reset => "reset",
        }
    }
}

/// Selection flags set on exactly the node with `selected` id
fn mark_selected(graph: &NetworkGraph, selected: Option<&str>) -> NetworkGraph {
    let nodes = graph
        .nodes
        .iter()
        .map(|n| NetworkNode {
            is_selected: Some(n.id.as_str()) == selected,
            ..n.clone()
        })
        .collect();
    graph.with_nodes(nodes)
}

/// Next state after `action`; never fails and never mutates `state`
pub fn reduce(state: &GraphState, action: GraphAction) -> GraphState {
    let mut next = state.clone();
    let ui = &mut next.ui;

    match action {
        GraphAction::LoadStart => {
            next.phase = StatePhase::Loading;
            ui.is_loading = true;
            ui.error = None;
        }
        GraphAction::LoadSuccess { graph, papers } => {
            next.phase = StatePhase::Loaded;
            ui.is_loading = false;
            ui.error = None;
            ui.selected_paper_id = None;
            ui.hovered_paper_id = None;
            next.graph = Some(mark_selected(&graph, None));
            next.papers = merge_papers(&state.papers, &papers);
        }
        GraphAction::LoadError(message) => {
            next.phase = StatePhase::Errored;
            ui.is_loading = false;
            ui.error = Some(message);
        }
        GraphAction::SetGraph(graph) => {
            let selected = ui.selected_paper_id.as_deref();
            next.graph = Some(mark_selected(&graph, selected));
            if next.phase != StatePhase::Loading {
                next.phase = StatePhase::Loaded;
            }
        }
        GraphAction::AddPapers(papers) => {
            let incoming: PaperMap = papers.into_iter().map(|p| (p.id.clone(), p)).collect();
            next.papers = merge_papers(&state.papers, &incoming);
        }
        GraphAction::MergeGraph { graph, papers } => match &state.graph {
            Some(existing) => {
                let merged = merge_graph(existing, &graph, &state.papers, &papers);
                next.graph = Some(mark_selected(&merged.graph, ui.selected_paper_id.as_deref()));
                next.papers = merged.papers;
            }
            None => {
                next.graph = Some(mark_selected(&graph, ui.selected_paper_id.as_deref()));
                next.papers = merge_papers(&state.papers, &papers);
                next.phase = StatePhase::Loaded;
            }
        },
        GraphAction::SelectPaper(id) => {
            if let Some(graph) = &state.graph {
                next.graph = Some(mark_selected(graph, id.as_deref()));
            }
            ui.selected_paper_id = id;
        }
        GraphAction::HoverPaper(id) => {
            ui.hovered_paper_id = id;
        }
        GraphAction::SetFilters(update) => {
            ui.filters = ui.filters.apply(update);
        }
        GraphAction::SetViewMode(mode) => {
            ui.view_mode = mode;
        }
        GraphAction::SetZoom(zoom) => {
            if zoom.is_finite() {
                ui.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
            }
        }
        GraphAction::SetViewport(viewport) => {
            ui.viewport = viewport;
        }
        GraphAction::ClearError => {
            ui.error = None;
            if next.phase == StatePhase::Errored {
                next.phase = if next.graph.is_some() {
                    StatePhase::Loaded
                } else {
                    StatePhase::Idle
                };
            }
        }
        GraphAction::Reset => return GraphState::default(),
    }

    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use citemap_common::models::{EdgeType, NetworkEdge};

    fn graph(ids: &[&str]) -> NetworkGraph {
        let nodes = ids
            .iter()
            .enumerate()
            .map(|(i, id)| NetworkNode {
                is_origin: i == 0,
                ..NetworkNode::new(Paper::new(*id, *id))
            })
            .collect();
        NetworkGraph::new(nodes, vec![], ids[0])
    }

    fn loaded() -> GraphState {
        let state = reduce(&GraphState::default(), GraphAction::LoadStart);
        reduce(
            &state,
            GraphAction::LoadSuccess {
                graph: graph(&["o", "a"]),
                papers: PaperMap::new(),
            },
        )
    }

    #[test]
    fn test_load_lifecycle() {
        let loading = reduce(&GraphState::default(), GraphAction::LoadStart);
        assert_eq!(loading.phase, StatePhase::Loading);
        assert!(loading.ui.is_loading);

        let ok = reduce(
            &loading,
            GraphAction::LoadSuccess {
                graph: graph(&["o"]),
                papers: PaperMap::new(),
            },
        );
        assert_eq!(ok.phase, StatePhase::Loaded);
        assert!(!ok.ui.is_loading);
        assert!(ok.graph.is_some());

        let failed = reduce(&loading, GraphAction::LoadError("upstream down".into()));
        assert_eq!(failed.phase, StatePhase::Errored);
        assert!(!failed.ui.is_loading);
        assert_eq!(failed.ui.error.as_deref(), Some("upstream down"));

        let cleared = reduce(&failed, GraphAction::ClearError);
        assert_eq!(cleared.phase, StatePhase::Idle);
        assert!(cleared.ui.error.is_none());
    }

    #[test]
    fn test_load_success_keeps_earlier_papers() {
        let state = reduce(&GraphState::default(), GraphAction::AddPapers(vec![Paper::new("p", "P")]));
        let state = reduce(&state, GraphAction::LoadStart);
        let state = reduce(
            &state,
            GraphAction::LoadSuccess {
                graph: graph(&["q"]),
                papers: PaperMap::from([("q".to_string(), Paper::new("q", "Q"))]),
            },
        );

        assert!(state.papers.contains_key("p"));
        assert!(state.papers.contains_key("q"));
        assert_eq!(state.papers.len(), 2);
    }

    #[test]
    fn test_reducer_does_not_mutate_input() {
        let before = loaded();
        let snapshot = before.clone();
        let _ = reduce(&before, GraphAction::SelectPaper(Some("a".into())));
        assert_eq!(before, snapshot);
    }

    #[test]
    fn test_select_marks_exactly_one_node() {
        let selected = reduce(&loaded(), GraphAction::SelectPaper(Some("a".into())));
        let graph = selected.graph.as_ref().unwrap();

        assert_eq!(selected.ui.selected_paper_id.as_deref(), Some("a"));
        assert!(graph.node("a").unwrap().is_selected);
        assert!(!graph.node("o").unwrap().is_selected);

        let switched = reduce(&selected, GraphAction::SelectPaper(Some("o".into())));
        let graph = switched.graph.as_ref().unwrap();
        assert_eq!(graph.nodes.iter().filter(|n| n.is_selected).count(), 1);

        let cleared = reduce(&switched, GraphAction::SelectPaper(None));
        assert!(cleared.graph.unwrap().nodes.iter().all(|n| !n.is_selected));
    }

    #[test]
    fn test_zoom_is_clamped() {
        let state = loaded();
        assert_eq!(reduce(&state, GraphAction::SetZoom(50.0)).ui.zoom, MAX_ZOOM);
        assert_eq!(reduce(&state, GraphAction::SetZoom(0.0)).ui.zoom, MIN_ZOOM);
        assert_eq!(reduce(&state, GraphAction::SetZoom(2.5)).ui.zoom, 2.5);
        assert_eq!(reduce(&state, GraphAction::SetZoom(f64::NAN)).ui.zoom, state.ui.zoom);
    }

    #[test]
    fn test_merge_graph_action() {
        let mut incoming = graph(&["x", "a"]);
        incoming.edges.push(NetworkEdge::cites("x", "a", EdgeType::Citation, 1.0));

        let merged = reduce(
            &loaded(),
            GraphAction::MergeGraph {
                graph: incoming,
                papers: PaperMap::from([("x".to_string(), Paper::new("x", "X"))]),
            },
        );
        let graph = merged.graph.unwrap();

        assert_eq!(graph.origin_paper_id, "o");
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.nodes.iter().filter(|n| n.is_origin).count(), 1);
        assert!(merged.papers.contains_key("x"));
    }

    #[test]
    fn test_add_papers_and_filters() {
        let state = reduce(&loaded(), GraphAction::AddPapers(vec![Paper::new("p", "P")]));
        assert!(state.papers.contains_key("p"));

        let state = reduce(
            &state,
            GraphAction::SetFilters(FilterUpdate {
                max_depth: Some(1),
                ..Default::default()
            }),
        );
        assert_eq!(state.ui.filters.max_depth, 1);
        assert!(state.ui.filters.show_prior_works);
    }

    #[test]
    fn test_view_state_actions() {
        let state = reduce(&loaded(), GraphAction::SetViewMode(ViewMode::Hierarchical));
        let state = reduce(&state, GraphAction::HoverPaper(Some("o".into())));
        let state = reduce(&state, GraphAction::SetViewport(Viewport { x: 10.0, y: -4.0 }));

        assert_eq!(state.ui.view_mode, ViewMode::Hierarchical);
        assert_eq!(state.ui.hovered_paper_id.as_deref(), Some("o"));
        assert_eq!(state.ui.viewport, Viewport { x: 10.0, y: -4.0 });
    }

    #[test]
    fn test_reset_returns_to_idle() {
        let state = reduce(&loaded(), GraphAction::Reset);
        assert_eq!(state, GraphState::default());
        assert_eq!(state.phase, StatePhase::Idle);
    }

    #[test]
    fn test_action_wire_format() {
        let json = serde_json::to_value(GraphAction::SetZoom(2.0)).unwrap();
        assert_eq!(json["type"], "SET_ZOOM");
        assert_eq!(json["payload"], 2.0);
    }
}
