//! Route-count betweenness centrality.
//!
//! # Overview
//!
//! Replays the reconstructed cheapest route of every ordered pair `(i, j)`,
//! `i != j`, from a computed [`ConstrainedPathEngine`] and counts how often
//! each node appears as an *interior* hop (endpoints excluded). Unlike
//! Brandes-style betweenness, exactly one route per pair is counted: the
//! one the next-hop matrix reconstructs.
//!
//! Complexity: O(V² · L) where `L` is the longest route.

use serde::Serialize;
use tracing::instrument;

use crate::paths::ConstrainedPathEngine;

/// Interior-hop counts per node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Centrality {
    /// Ordered pairs `(i, j)`, `i != j`, that have a route.
    pub pair_count: usize,
    /// `per_vertex[v]`: routes passing through `v` as an interior hop.
    pub per_vertex: Vec<usize>,
}

impl Centrality {
    /// Tally interior hops over every reconstructed route of `engine`.
    #[must_use]
    #[instrument(skip(engine), fields(vertices = engine.vertex_count(), amount = engine.amount()))]
    pub fn from_routes(engine: &ConstrainedPathEngine) -> Self {
        let n = engine.vertex_count();
        let mut per_vertex = vec![0usize; n];
        let mut pair_count = 0usize;

        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                let route = engine.path(i, j);
                if route.is_empty() {
                    continue;
                }
                pair_count += 1;
                if route.len() > 2 {
                    for &hop in &route[1..route.len() - 1] {
                        per_vertex[hop] += 1;
                    }
                }
            }
        }

        Self {
            pair_count,
            per_vertex,
        }
    }

    /// Share of routed pairs passing through `vertex`, in percent.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn normalized(&self, vertex: usize) -> f64 {
        if self.pair_count == 0 {
            return 0.0;
        }
        self.per_vertex[vertex] as f64 * 100.0 / self.pair_count as f64
    }

    /// Up to `limit` vertices with the highest counts, ties by lower index.
    #[must_use]
    pub fn top(&self, limit: usize) -> Vec<(usize, usize)> {
        let mut ranked: Vec<(usize, usize)> = self.per_vertex.iter().copied().enumerate().collect();
        ranked.sort_unstable_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(limit);
        ranked
    }

    /// Sum of all interior counts.
    #[must_use]
    pub fn total(&self) -> usize {
        self.per_vertex.iter().sum()
    }
}

impl ConstrainedPathEngine {
    /// Centrality over the routes of the last computation.
    #[must_use]
    pub fn centrality(&self) -> Centrality {
        Centrality::from_routes(self)
    }
}
