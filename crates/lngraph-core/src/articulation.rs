//! Articulation points and biconnected components.
//!
//! # Overview
//!
//! An articulation point (cut vertex) is a node whose removal disconnects
//! its connected component. In a channel network these are the nodes that
//! single-handedly hold parts of the network together.
//!
//! # Algorithm
//!
//! Depth-first search tracking, for every vertex `u`:
//!
//! - `depth[u]`: depth of `u` in the DFS tree.
//! - `low[u]`: minimum depth reachable from the subtree of `u` using at most
//!   one back edge.
//!
//! Tree edges are pushed onto an edge stack. After returning from a child
//! `v` of `u`, `u` is a cut vertex if
//!
//! 1. `u` is a DFS root and `v` is its second or later child, or
//! 2. `u` is not a root and `low[v] >= depth[u]`.
//!
//! In both cases the edges down to and including `(u, v)` are popped and
//! their endpoints form one biconnected component. Back edges lower
//! `low[u]` using the ancestor's *depth*, not its low-link. Whatever is left
//! on the edge stack when a root finishes is one more component (only if
//! non-empty).
//!
//! The traversal uses an explicit frame stack, so deep graphs cannot
//! overflow the call stack. Complexity: O(V + E).

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, instrument};

use crate::graph::UndirectedGraph;

// ---------------------------------------------------------------------------
// ArticulationResult
// ---------------------------------------------------------------------------

/// Cut vertices and biconnected components of an undirected graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArticulationResult {
    /// Vertices whose removal disconnects their component.
    pub articulation_points: BTreeSet<usize>,
    /// Vertex sets of the biconnected components, in discovery order.
    pub biconnected_components: Vec<BTreeSet<usize>>,
}

impl ArticulationResult {
    /// Number of biconnected components containing `vertex`.
    ///
    /// 1 for a non-articulation vertex with at least one edge, >= 2 for an
    /// articulation point, 0 for an isolated vertex.
    #[must_use]
    pub fn count_components_for_vertex(&self, vertex: usize) -> usize {
        self.biconnected_components
            .iter()
            .filter(|component| component.contains(&vertex))
            .count()
    }

    #[must_use]
    pub fn is_articulation_point(&self, vertex: usize) -> bool {
        self.articulation_points.contains(&vertex)
    }
}

// ---------------------------------------------------------------------------
// ArticulationEngine
// ---------------------------------------------------------------------------

/// Collects undirected edges, then computes an [`ArticulationResult`].
#[derive(Debug, Clone)]
pub struct ArticulationEngine {
    graph: UndirectedGraph,
}

/// One suspended DFS call.
#[derive(Debug, Clone, Copy)]
struct Frame {
    vertex: usize,
    /// Next position in the adjacency row to examine.
    cursor: usize,
    children: usize,
    is_articulation: bool,
}

impl Frame {
    const fn new(vertex: usize) -> Self {
        Self {
            vertex,
            cursor: 0,
            children: 0,
            is_articulation: false,
        }
    }
}

/// Per-run traversal state.
struct Traversal<'g> {
    graph: &'g UndirectedGraph,
    visited: Vec<bool>,
    depth: Vec<usize>,
    low: Vec<usize>,
    parent: Vec<Option<usize>>,
    edges: Vec<(usize, usize)>,
    frames: Vec<Frame>,
    result: ArticulationResult,
}

impl ArticulationEngine {
    #[must_use]
    pub fn new(vertex_count: usize) -> Self {
        Self {
            graph: UndirectedGraph::new(vertex_count),
        }
    }

    /// Wrap an already populated graph.
    #[must_use]
    pub const fn from_graph(graph: UndirectedGraph) -> Self {
        Self { graph }
    }

    pub fn add_edge(&mut self, u: usize, v: usize) {
        self.graph.add_edge(u, v);
    }

    #[must_use]
    pub const fn graph(&self) -> &UndirectedGraph {
        &self.graph
    }

    /// Run the decomposition over every connected component.
    #[must_use]
    #[instrument(skip(self), fields(vertices = self.graph.vertex_count(), edges = self.graph.edge_count()))]
    pub fn run(&self) -> ArticulationResult {
        let mut traversal = Traversal::new(&self.graph);

        for root in 0..self.graph.vertex_count() {
            if !traversal.visited[root] {
                traversal.search_from(root);
                traversal.flush_remaining();
            }
        }

        let result = traversal.result;
        debug!(
            articulation_points = result.articulation_points.len(),
            components = result.biconnected_components.len(),
            "articulation analysis complete"
        );
        result
    }
}

impl<'g> Traversal<'g> {
    fn new(graph: &'g UndirectedGraph) -> Self {
        let n = graph.vertex_count();
        Self {
            graph,
            visited: vec![false; n],
            depth: vec![0; n],
            low: vec![0; n],
            parent: vec![None; n],
            edges: Vec::new(),
            frames: Vec::new(),
            result: ArticulationResult::default(),
        }
    }

    fn enter(&mut self, vertex: usize, depth: usize) {
        self.visited[vertex] = true;
        self.depth[vertex] = depth;
        self.low[vertex] = depth;
        self.frames.push(Frame::new(vertex));
    }

    fn search_from(&mut self, root: usize) {
        let graph = self.graph;
        self.enter(root, 0);

        while let Some(frame) = self.frames.last_mut() {
            let u = frame.vertex;
            let neighbors = graph.neighbors(u);

            if frame.cursor < neighbors.len() {
                let v = neighbors[frame.cursor];
                frame.cursor += 1;

                if !self.visited[v] {
                    // Tree edge: descend into v.
                    frame.children += 1;
                    self.parent[v] = Some(u);
                    self.edges.push((u, v));
                    let child_depth = self.depth[u] + 1;
                    self.enter(v, child_depth);
                } else if self.parent[u] != Some(v) {
                    // Back edge.
                    self.low[u] = self.low[u].min(self.depth[v]);
                }
                continue;
            }

            // All neighbours of u examined: return to the parent.
            let finished = *frame;
            self.frames.pop();
            if finished.is_articulation {
                self.result.articulation_points.insert(u);
            }

            if let Some(p) = self.parent[u] {
                self.return_to_parent(p, u);
            }
        }
    }

    /// Post-processing in `p` after its tree child `v` has finished.
    fn return_to_parent(&mut self, p: usize, v: usize) {
        self.low[p] = self.low[p].min(self.low[v]);

        let is_root = self.parent[p].is_none();
        let Some(frame) = self.frames.last_mut() else {
            return;
        };

        let cut = if is_root {
            frame.children > 1
        } else {
            self.low[v] >= self.depth[p]
        };

        if cut {
            frame.is_articulation = true;
            let component = self.pop_component(p, v);
            self.result.biconnected_components.push(component);
        }
    }

    /// Pop edges down to and including `(u, v)`.
    fn pop_component(&mut self, u: usize, v: usize) -> BTreeSet<usize> {
        let mut vertices = BTreeSet::new();
        while let Some((a, b)) = self.edges.pop() {
            vertices.insert(a);
            vertices.insert(b);
            if (a == u && b == v) || (a == v && b == u) {
                break;
            }
        }
        vertices
    }

    /// Edges left after a root finishes form its last component.
    fn flush_remaining(&mut self) {
        if self.edges.is_empty() {
            return;
        }
        let vertices: BTreeSet<usize> = self.edges.drain(..).flat_map(|(a, b)| [a, b]).collect();
        self.result.biconnected_components.push(vertices);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
