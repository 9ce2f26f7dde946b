//! Hop eccentricity via breadth-first search.
//!
//! The eccentricity of a vertex is the largest shortest-hop distance from it
//! to any vertex it can reach. Unreachable vertices are ignored rather than
//! counted as infinitely far, so an isolated vertex has eccentricity 0.
//!
//! One FIFO BFS per vertex; every vertex is enqueued at most once per
//! source. Complexity: O(V * (V + E)) for the whole batch.

use std::collections::VecDeque;

use tracing::instrument;

use crate::graph::UndirectedGraph;

/// Per-vertex eccentricity over an undirected graph.
#[derive(Debug, Clone, Copy)]
pub struct EccentricityEngine<'g> {
    graph: &'g UndirectedGraph,
}

impl<'g> EccentricityEngine<'g> {
    #[must_use]
    pub const fn new(graph: &'g UndirectedGraph) -> Self {
        Self { graph }
    }

    /// Maximum hop distance from `vertex` to any vertex it reaches.
    #[must_use]
    pub fn eccentricity(&self, vertex: usize) -> usize {
        let n = self.graph.vertex_count();
        let mut dist: Vec<Option<usize>> = vec![None; n];
        let mut queue: VecDeque<usize> = VecDeque::new();

        dist[vertex] = Some(0);
        queue.push_back(vertex);
        let mut farthest = 0;

        while let Some(u) = queue.pop_front() {
            let du = dist[u].unwrap_or_default();
            farthest = farthest.max(du);

            for &v in self.graph.neighbors(u) {
                if dist[v].is_none() {
                    dist[v] = Some(du + 1);
                    queue.push_back(v);
                }
            }
        }

        farthest
    }

    /// Eccentricity of every vertex, in index order.
    #[must_use]
    #[instrument(skip(self), fields(vertices = self.graph.vertex_count()))]
    pub fn all_eccentricities(&self) -> Vec<usize> {
        (0..self.graph.vertex_count())
            .map(|v| self.eccentricity(v))
            .collect()
    }

    /// Largest eccentricity in the graph (0 for an edgeless graph).
    #[must_use]
    pub fn diameter(eccentricities: &[usize]) -> usize {
        eccentricities.iter().copied().max().unwrap_or(0)
    }

    /// Smallest eccentricity among vertices that have at least one edge.
    #[must_use]
    pub fn radius(&self, eccentricities: &[usize]) -> Option<usize> {
        eccentricities
            .iter()
            .enumerate()
            .filter(|&(v, _)| self.graph.degree(v) > 0)
            .map(|(_, &e)| e)
            .min()
    }
}
