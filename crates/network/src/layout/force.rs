//! Force-directed layout
//!
//! Node state is kept as parallel arrays indexed by node position so a step
//! touches contiguous memory. [`ForceSimulation::step`] is public for callers
//! that want to drive the run in chunks.

use super::LayoutStrategy;
use citemap_common::config::LayoutConfig;
use citemap_common::models::{NetworkGraph, NetworkNode};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::f64::consts::TAU;

/// Smallest squared distance used by the charge force
const MIN_DISTANCE_SQ: f64 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ForceConfig {
    pub iterations: usize,
    pub alpha_decay: f64,
    pub link_strength: f64,
    pub link_distance: f64,
    /// Negative values repel
    pub charge_strength: f64,
    /// Fraction of velocity kept each step
    pub velocity_decay: f64,
    /// Fraction of the free-node centroid removed each step
    pub center_strength: f64,
    /// Radius of the circle unpositioned nodes start on
    pub seed_radius: f64,
    /// Seed for the coincident-node jitter
    pub seed: u64,
}

impl Default for ForceConfig {
    fn default() -> Self {
        Self {
            iterations: 300,
            alpha_decay: 0.02,
            link_strength: 0.5,
            link_distance: 100.0,
            charge_strength: -300.0,
            velocity_decay: 0.8,
            center_strength: 0.1,
            seed_radius: 200.0,
            seed: 0x5eed,
        }
    }
}

impl From<&LayoutConfig> for ForceConfig {
    fn from(config: &LayoutConfig) -> Self {
        Self {
            iterations: config.iterations,
            alpha_decay: config.alpha_decay.clamp(0.0, 1.0),
            link_strength: config.link_strength,
            link_distance: config.link_distance,
            charge_strength: config.charge_strength,
            ..Default::default()
        }
    }
}

/// Running simulation over one graph
#[derive(Debug, Clone)]
pub struct ForceSimulation {
    config: ForceConfig,
    x: Vec<f64>,
    y: Vec<f64>,
    vx: Vec<f64>,
    vy: Vec<f64>,
    pinned: Vec<bool>,
    links: Vec<(usize, usize)>,
    alpha: f64,
    steps: usize,
}

impl ForceSimulation {
    /// Seed the simulation from `graph`.
    ///
    /// The origin is pinned at (0, 0). Other nodes at (0, 0) are placed on a
    /// circle in index order; nodes left sharing a position are jittered
    /// apart.
    pub fn new(graph: &NetworkGraph, config: ForceConfig) -> Self {
        let n = graph.node_count();
        let mut sim = Self {
            x: Vec::with_capacity(n),
            y: Vec::with_capacity(n),
            vx: Vec::with_capacity(n),
            vy: Vec::with_capacity(n),
            pinned: Vec::with_capacity(n),
            links: Vec::new(),
            alpha: 1.0,
            steps: 0,
            config,
        };

        for (i, node) in graph.nodes.iter().enumerate() {
            let is_origin = node.id == graph.origin_paper_id;
            let (x, y) = if is_origin {
                (0.0, 0.0)
            } else if node.is_unpositioned() {
                let angle = TAU * i as f64 / n as f64;
                (sim.config.seed_radius * angle.cos(), sim.config.seed_radius * angle.sin())
            } else {
                (node.x, node.y)
            };
            sim.x.push(x);
            sim.y.push(y);
            sim.vx.push(if is_origin { 0.0 } else { node.vx });
            sim.vy.push(if is_origin { 0.0 } else { node.vy });
            sim.pinned.push(is_origin);
        }

        let index = graph.node_index();
        sim.links = graph
            .edges
            .iter()
            .filter_map(|e| Some((*index.get(e.source.as_str())?, *index.get(e.target.as_str())?)))
            .filter(|(s, t)| s != t)
            .collect();

        sim.separate_coincident();
        sim
    }

    fn separate_coincident(&mut self) {
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut occupied: HashSet<(u64, u64)> = HashSet::new();

        for i in 0..self.x.len() {
            if self.pinned[i] {
                occupied.insert((self.x[i].to_bits(), self.y[i].to_bits()));
            }
        }
        for i in 0..self.x.len() {
            if self.pinned[i] {
                continue;
            }
            while !occupied.insert((self.x[i].to_bits(), self.y[i].to_bits())) {
                self.x[i] += rng.gen_range(-1.0..1.0);
                self.y[i] += rng.gen_range(-1.0..1.0);
            }
        }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn is_finished(&self) -> bool {
        self.steps >= self.config.iterations
    }

    pub fn position(&self, index: usize) -> Option<(f64, f64)> {
        Some((*self.x.get(index)?, *self.y.get(index)?))
    }

    /// Advance the simulation by one step
    pub fn step(&mut self) {
        let alpha = self.alpha;
        let n = self.x.len();

        for &(s, t) in &self.links {
            let dx = self.x[t] - self.x[s];
            let dy = self.y[t] - self.y[s];
            let dist = (dx * dx + dy * dy).sqrt().max(f64::EPSILON);
            let f = (dist - self.config.link_distance) * self.config.link_strength * alpha / dist;
            let (fx, fy) = (dx * f, dy * f);
            if !self.pinned[s] {
                self.vx[s] += fx;
                self.vy[s] += fy;
            }
            if !self.pinned[t] {
                self.vx[t] -= fx;
                self.vy[t] -= fy;
            }
        }

        for i in 0..n {
            for j in (i + 1)..n {
                let dx = self.x[j] - self.x[i];
                let dy = self.y[j] - self.y[i];
                let dist_sq = (dx * dx + dy * dy).max(MIN_DISTANCE_SQ);
                let dist = dist_sq.sqrt();
                let f = self.config.charge_strength * alpha / dist_sq;
                let (fx, fy) = (f * dx / dist, f * dy / dist);
                if !self.pinned[i] {
                    self.vx[i] += fx;
                    self.vy[i] += fy;
                }
                if !self.pinned[j] {
                    self.vx[j] -= fx;
                    self.vy[j] -= fy;
                }
            }
        }

        for i in 0..n {
            if self.pinned[i] {
                self.vx[i] = 0.0;
                self.vy[i] = 0.0;
                continue;
            }
            self.vx[i] *= self.config.velocity_decay;
            self.vy[i] *= self.config.velocity_decay;
            self.x[i] += self.vx[i];
            self.y[i] += self.vy[i];
        }

        self.center();
        self.alpha *= 1.0 - self.config.alpha_decay;
        self.steps += 1;
    }

    /// Pull the free nodes' centroid toward zero.
    ///
    /// Only a translation of the free cloud, so a lone free node is left
    /// alone.
    fn center(&mut self) {
        let free: Vec<usize> = (0..self.x.len()).filter(|&i| !self.pinned[i]).collect();
        if free.len() < 2 {
            return;
        }
        let count = free.len() as f64;
        let cx = free.iter().map(|&i| self.x[i]).sum::<f64>() / count;
        let cy = free.iter().map(|&i| self.y[i]).sum::<f64>() / count;
        for &i in &free {
            self.x[i] -= cx * self.config.center_strength;
            self.y[i] -= cy * self.config.center_strength;
        }
    }

    /// Run `steps` more steps
    pub fn tick(&mut self, steps: usize) {
        for _ in 0..steps {
            self.step();
        }
    }

    /// Copy of `graph` carrying the current positions and velocities
    pub fn apply_to(&self, graph: &NetworkGraph) -> NetworkGraph {
        let nodes = graph
            .nodes
            .iter()
            .enumerate()
            .map(|(i, node)| NetworkNode {
                x: self.x.get(i).copied().unwrap_or(node.x),
                y: self.y.get(i).copied().unwrap_or(node.y),
                vx: self.vx.get(i).copied().unwrap_or(0.0),
                vy: self.vy.get(i).copied().unwrap_or(0.0),
                ..node.clone()
            })
            .collect();
        graph.with_nodes(nodes)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ForceLayout {
    config: ForceConfig,
}

impl ForceLayout {
    pub fn new(config: ForceConfig) -> Self {
        Self { config }
    }
}

impl LayoutStrategy for ForceLayout {
    fn layout(&self, graph: &NetworkGraph) -> NetworkGraph {
        let mut sim = ForceSimulation::new(graph, self.config.clone());
        sim.tick(self.config.iterations);
        sim.apply_to(graph)
    }

    fn name(&self) -> &'static str {
        "force"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use citemap_common::models::{EdgeType, NetworkEdge, Paper};

    fn star(leaves: usize) -> NetworkGraph {
        let mut nodes = vec![NetworkNode {
            is_origin: true,
            ..NetworkNode::new(Paper::new("o", "o"))
        }];
        let mut edges = Vec::new();
        for i in 0..leaves {
            let id = format!("n{}", i);
            edges.push(NetworkEdge::cites(&id, "o", EdgeType::Citation, 1.0));
            nodes.push(NetworkNode::new(Paper::new(id.clone(), id)));
        }
        NetworkGraph::new(nodes, edges, "o")
    }

    #[test]
    fn test_seeds_unpositioned_nodes_on_circle() {
        let graph = star(4);
        let sim = ForceSimulation::new(&graph, ForceConfig::default());

        assert_eq!(sim.position(0), Some((0.0, 0.0)));
        for i in 1..5 {
            let (x, y) = sim.position(i).unwrap();
            assert!(((x * x + y * y).sqrt() - 200.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_origin_stays_pinned() {
        let out = ForceLayout::default().layout(&star(6));
        let origin = out.origin().unwrap();

        assert_eq!((origin.x, origin.y), (0.0, 0.0));
        assert!(out.nodes.iter().all(|n| n.x.is_finite() && n.y.is_finite()));
    }

    #[test]
    fn test_layout_is_deterministic() {
        let graph = star(5);
        assert_eq!(ForceLayout::default().layout(&graph), ForceLayout::default().layout(&graph));
    }

    #[test]
    fn test_coincident_nodes_are_separated() {
        let mut graph = star(3);
        for node in graph.nodes.iter_mut().skip(1) {
            node.x = 10.0;
            node.y = 10.0;
        }
        let sim = ForceSimulation::new(&graph, ForceConfig::default());
        let positions: HashSet<(u64, u64)> = (0..4)
            .map(|i| {
                let (x, y) = sim.position(i).unwrap();
                (x.to_bits(), y.to_bits())
            })
            .collect();

        assert_eq!(positions.len(), 4);
    }

    #[test]
    fn test_link_pulls_distant_node_in() {
        let mut graph = star(1);
        graph.nodes[1].x = 400.0;
        let mut sim = ForceSimulation::new(&graph, ForceConfig::default());
        sim.step();

        let (x, _) = sim.position(1).unwrap();
        assert!(x < 400.0);
    }

    #[test]
    fn test_alpha_decays_per_step() {
        let mut sim = ForceSimulation::new(&star(2), ForceConfig::default());
        sim.tick(2);

        assert_eq!(sim.steps(), 2);
        assert!((sim.alpha() - 0.98 * 0.98).abs() < 1e-12);
        assert!(!sim.is_finished());
    }

    #[test]
    fn test_chunked_run_matches_full_run() {
        let graph = star(4);
        let mut chunked = ForceSimulation::new(&graph, ForceConfig::default());
        chunked.tick(100);
        chunked.tick(200);

        assert!(chunked.is_finished());
        assert_eq!(chunked.apply_to(&graph), ForceLayout::default().layout(&graph));
    }
}
