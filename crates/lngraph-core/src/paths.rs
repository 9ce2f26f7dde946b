//! Capacity-constrained all-pairs cheapest routes.
//!
//! # Overview
//!
//! [`ConstrainedPathEngine`] answers "what is the cheapest way to send
//! `amount` from `i` to `j` when every hop must be able to carry `amount`
//! on its own?" for every ordered pair at once.
//!
//! # Algorithm
//!
//! Floyd–Warshall with path reconstruction and a capacity gate:
//!
//! 1. Initialise from the direct edges whose capacity is at least `amount`.
//!    The diagonal is `dist = 0`, `next = i`.
//! 2. For each intermediate `k` (outer loop, completed before the next `k`),
//!    relax `(i, j)` through `k` when `i`, `j`, `k` are distinct, both legs
//!    are finite and both legs have bottleneck capacity `>= amount`:
//!    `dist[i][j] = dist[i][k] + dist[k][j]`, `next[i][j] = next[i][k]`,
//!    `cap[i][j] = min(cap[i][k], cap[k][j])`.
//!
//! `amount` is a fixed gate for the whole run; it is not consumed along the
//! path. Complexity: O(V³) time, O(V²) space.
//!
//! # Sentinels
//!
//! Unreachable pairs have `dist == INFINITE_COST` and `next == NO_HOP`;
//! `cap` is only meaningful where `dist` is finite.
//!
//! # Caching
//!
//! With a [`MatrixCache`] attached, the distance and next-hop matrices are
//! looked up by a key derived from `amount` and the initial distance matrix
//! before computing, and stored afterwards. Any cache problem degrades to a
//! recompute.

use tracing::{debug, instrument, warn};

use crate::cache::{self, CachedMatrices, MatrixCache};
use crate::graph::ChannelGraph;

/// Distance of an unreachable pair.
pub const INFINITE_COST: i64 = i64::MAX;

/// Next hop of an unreachable pair.
pub const NO_HOP: usize = usize::MAX;

// ---------------------------------------------------------------------------
// Matrix
// ---------------------------------------------------------------------------

/// Square row-major matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matrix<T> {
    size: usize,
    cells: Vec<T>,
}

impl<T: Copy> Matrix<T> {
    /// `size × size` matrix filled with `fill`.
    #[must_use]
    pub fn filled(size: usize, fill: T) -> Self {
        Self {
            size,
            cells: vec![fill; size * size],
        }
    }

    fn from_cells(size: usize, cells: Vec<T>) -> Self {
        debug_assert_eq!(cells.len(), size * size);
        Self { size, cells }
    }

    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> T {
        self.cells[row * self.size + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: T) {
        self.cells[row * self.size + col] = value;
    }

    /// Row-major view of all cells.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.cells
    }
}

// ---------------------------------------------------------------------------
// ConstrainedPathEngine
// ---------------------------------------------------------------------------

/// Where the matrices of the last [`ConstrainedPathEngine::compute_all_pairs`]
/// call came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PathSource {
    Computed,
    Cache,
}

/// All-pairs cheapest routes over a [`ChannelGraph`] under a capacity gate.
#[derive(Debug, Clone)]
pub struct ConstrainedPathEngine {
    graph: ChannelGraph,
    cache: Option<MatrixCache>,
    amount: u64,
    dist: Matrix<i64>,
    next: Matrix<usize>,
    cap: Matrix<u64>,
    source: Option<PathSource>,
}

impl ConstrainedPathEngine {
    /// Engine over `vertex_count` vertices with no edges and no cache.
    #[must_use]
    pub fn new(vertex_count: usize) -> Self {
        Self::from_graph(ChannelGraph::new(vertex_count))
    }

    /// Wrap an already populated graph.
    #[must_use]
    pub fn from_graph(graph: ChannelGraph) -> Self {
        let n = graph.vertex_count();
        let mut engine = Self {
            graph,
            cache: None,
            amount: 0,
            dist: Matrix::filled(n, INFINITE_COST),
            next: Matrix::filled(n, NO_HOP),
            cap: Matrix::filled(n, 0),
            source: None,
        };
        engine.reset_diagonal();
        engine
    }

    /// Attach a blob store used to memoise the matrices.
    #[must_use]
    pub fn with_cache(mut self, cache: MatrixCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Register `u → v`. A later call for the same pair replaces this one.
    pub fn add_edge(&mut self, u: usize, v: usize, fee: i64, capacity: u64) {
        self.graph.add_edge(u, v, fee, capacity);
    }

    #[must_use]
    pub const fn graph(&self) -> &ChannelGraph {
        &self.graph
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.graph.vertex_count()
    }

    /// Threshold used by the last computation.
    #[must_use]
    pub const fn amount(&self) -> u64 {
        self.amount
    }

    /// Provenance of the current matrices, `None` before any computation.
    #[must_use]
    pub const fn source(&self) -> Option<PathSource> {
        self.source
    }

    #[must_use]
    pub const fn distances(&self) -> &Matrix<i64> {
        &self.dist
    }

    #[must_use]
    pub const fn next_hops(&self) -> &Matrix<usize> {
        &self.next
    }

    #[must_use]
    pub const fn capacities(&self) -> &Matrix<u64> {
        &self.cap
    }

    /// Compute all-pairs routes for a fixed `amount`, consulting the cache
    /// when one is attached.
    #[instrument(skip(self), fields(vertices = self.graph.vertex_count(), edges = self.graph.edge_count()))]
    pub fn compute_all_pairs(&mut self, amount: u64) {
        self.amount = amount;
        self.initialise(amount);

        let key = self
            .cache
            .as_ref()
            .map(|_| cache::cache_key(amount, self.dist.as_slice()));

        if let (Some(store), Some(key)) = (self.cache.as_ref(), key) {
            let n = self.vertex_count();
            match store.load(key, n) {
                Ok(Some(matrices)) if next_hops_in_range(&matrices, n) => {
                    self.dist = Matrix::from_cells(n, matrices.dist);
                    self.next = Matrix::from_cells(n, matrices.next);
                    if let Some(cap) = self.replay_capacities(amount) {
                        debug!(key = %format!("{key:016x}"), "all-pairs cache hit");
                        self.cap = cap;
                        self.source = Some(PathSource::Cache);
                        return;
                    }
                    debug!(key = %format!("{key:016x}"), "cache entry routes over missing channels, recomputing");
                    self.initialise(amount);
                }
                Ok(Some(_)) => {
                    debug!(key = %format!("{key:016x}"), "cache entry has invalid hops, recomputing");
                }
                Ok(None) => debug!(key = %format!("{key:016x}"), "all-pairs cache miss"),
                Err(e) => debug!(error = %e, "cache entry unusable, recomputing"),
            }
        }

        self.floyd_warshall(amount);
        self.source = Some(PathSource::Computed);

        if let (Some(store), Some(key)) = (self.cache.as_ref(), key) {
            if let Err(e) = store.store(key, self.dist.as_slice(), self.next.as_slice()) {
                warn!(error = %e, "failed to write all-pairs cache");
            }
        }
    }

    /// Vertex sequence of the cheapest route `u → … → v`.
    ///
    /// `[u]` for `u == v`; empty if no route exists.
    #[must_use]
    pub fn path(&self, u: usize, v: usize) -> Vec<usize> {
        if self.next.get(u, v) == NO_HOP {
            return Vec::new();
        }

        let mut route = vec![u];
        let mut current = u;
        while current != v {
            current = self.next.get(current, v);
            if current == NO_HOP || route.len() > self.vertex_count() {
                return Vec::new();
            }
            route.push(current);
        }
        route
    }

    #[must_use]
    pub fn is_path(&self, u: usize, v: usize) -> bool {
        !self.path(u, v).is_empty()
    }

    /// Whether `x` lies on the route `u → v`, endpoints included.
    #[must_use]
    pub fn is_on_path(&self, u: usize, v: usize, x: usize) -> bool {
        self.path(u, v).contains(&x)
    }

    /// Route cost, or [`INFINITE_COST`] if unreachable.
    #[must_use]
    pub fn cost(&self, u: usize, v: usize) -> i64 {
        self.dist.get(u, v)
    }

    /// Smallest edge capacity on the route `u → v`, if one exists.
    #[must_use]
    pub fn bottleneck(&self, u: usize, v: usize) -> Option<u64> {
        (u != v && self.dist.get(u, v) != INFINITE_COST).then(|| self.cap.get(u, v))
    }

    /// Largest finite entry of the distance matrix (0 if none).
    #[must_use]
    pub fn max_finite_cost(&self) -> i64 {
        self.dist
            .as_slice()
            .iter()
            .copied()
            .filter(|&c| c != INFINITE_COST)
            .max()
            .unwrap_or(0)
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    fn reset_diagonal(&mut self) {
        for i in 0..self.vertex_count() {
            self.dist.set(i, i, 0);
            self.next.set(i, i, i);
            self.cap.set(i, i, u64::MAX);
        }
    }

    /// Load direct edges that pass the gate.
    fn initialise(&mut self, amount: u64) {
        let n = self.vertex_count();
        self.dist = Matrix::filled(n, INFINITE_COST);
        self.next = Matrix::filled(n, NO_HOP);
        self.cap = Matrix::filled(n, 0);
        self.reset_diagonal();

        for from in 0..n {
            for edge in self.graph.outgoing(from) {
                if from == edge.to || edge.capacity < amount {
                    continue;
                }
                self.dist.set(from, edge.to, edge.fee);
                self.next.set(from, edge.to, edge.to);
                self.cap.set(from, edge.to, edge.capacity);
            }
        }
    }

    fn floyd_warshall(&mut self, amount: u64) {
        let n = self.vertex_count();
        let dist = &mut self.dist.cells;
        let next = &mut self.next.cells;
        let cap = &mut self.cap.cells;

        for k in 0..n {
            for i in 0..n {
                if i == k {
                    continue;
                }
                let ik = i * n + k;
                let d_ik = dist[ik];
                if d_ik == INFINITE_COST || cap[ik] < amount {
                    continue;
                }
                let hop_ik = next[ik];
                let cap_ik = cap[ik];

                for j in 0..n {
                    if j == i || j == k {
                        continue;
                    }
                    let kj = k * n + j;
                    let d_kj = dist[kj];
                    if d_kj == INFINITE_COST || cap[kj] < amount {
                        continue;
                    }

                    let ij = i * n + j;
                    let candidate = d_ik.saturating_add(d_kj);
                    if candidate < dist[ij] {
                        dist[ij] = candidate;
                        next[ij] = hop_ik;
                        cap[ij] = cap_ik.min(cap[kj]);
                    }
                }
            }
        }
    }

    /// Recover bottleneck capacities by replaying every route.
    /// Bottleneck matrix for the loaded routes, found by replaying each
    /// route against the edge table.
    ///
    /// `None` if a finite entry has no route, or a hop has no channel able
    /// to carry `amount`.
    fn replay_capacities(&self, amount: u64) -> Option<Matrix<u64>> {
        let n = self.vertex_count();
        let mut cap = Matrix::filled(n, 0u64);
        for u in 0..n {
            cap.set(u, u, u64::MAX);
            for v in 0..n {
                if u == v || self.dist.get(u, v) == INFINITE_COST {
                    continue;
                }
                let route = self.path(u, v);
                if route.len() < 2 {
                    return None;
                }
                let mut bottleneck = u64::MAX;
                for hop in route.windows(2) {
                    let edge = self.graph.edge(hop[0], hop[1])?;
                    if edge.capacity < amount {
                        return None;
                    }
                    bottleneck = bottleneck.min(edge.capacity);
                }
                cap.set(u, v, bottleneck);
            }
        }
        Some(cap)
    }
}

fn next_hops_in_range(matrices: &CachedMatrices, n: usize) -> bool {
    matrices.next.iter().all(|&hop| hop == NO_HOP || hop < n)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// 0 → 1 → 2 cheap but thin; 0 → 2 direct expensive but wide.
    fn thin_cheap_vs_wide_expensive() -> ConstrainedPathEngine {
        let mut engine = ConstrainedPathEngine::new(3);
        engine.add_edge(0, 1, 1, 100);
        engine.add_edge(1, 2, 1, 100);
        engine.add_edge(0, 2, 10, 1_000);
        engine
    }

    #[test]
    fn self_path_is_single_vertex() {
        let mut engine = ConstrainedPathEngine::new(2);
        engine.compute_all_pairs(0);
        assert_eq!(engine.path(1, 1), vec![1]);
        assert_eq!(engine.cost(1, 1), 0);
        assert!(engine.is_path(1, 1));
    }

    #[test]
    fn unreachable_pair_is_empty_and_infinite() {
        let mut engine = ConstrainedPathEngine::new(3);
        engine.add_edge(0, 1, 4, 10);
        engine.compute_all_pairs(1);
        assert!(engine.path(1, 0).is_empty(), "edges are directed");
        assert_eq!(engine.cost(1, 0), INFINITE_COST);
        assert!(engine.path(0, 2).is_empty());
        assert!(!engine.is_path(0, 2));
        assert_eq!(engine.bottleneck(0, 2), None);
    }

    #[test]
    fn cheapest_route_below_gate() {
        let mut engine = thin_cheap_vs_wide_expensive();
        engine.compute_all_pairs(50);
        assert_eq!(engine.path(0, 2), vec![0, 1, 2]);
        assert_eq!(engine.cost(0, 2), 2);
        assert_eq!(engine.bottleneck(0, 2), Some(100));
        assert!(engine.is_on_path(0, 2, 1));
        assert!(engine.is_on_path(0, 2, 0), "endpoints count as on-path");
    }

    #[test]
    fn gate_excludes_thin_edges() {
        let mut engine = thin_cheap_vs_wide_expensive();
        engine.compute_all_pairs(500);
        assert_eq!(engine.path(0, 2), vec![0, 2]);
        assert_eq!(engine.cost(0, 2), 10);
        assert_eq!(engine.cost(0, 1), INFINITE_COST, "direct thin edge gated out");
        assert!(!engine.is_on_path(0, 2, 1));
    }

    #[test]
    fn bottleneck_is_min_along_route() {
        let mut engine = ConstrainedPathEngine::new(4);
        engine.add_edge(0, 1, 1, 900);
        engine.add_edge(1, 2, 1, 300);
        engine.add_edge(2, 3, 1, 700);
        engine.compute_all_pairs(100);
        assert_eq!(engine.path(0, 3), vec![0, 1, 2, 3]);
        assert_eq!(engine.bottleneck(0, 3), Some(300));
    }

    #[test]
    fn max_finite_cost_ignores_infinity() {
        let mut engine = ConstrainedPathEngine::new(3);
        engine.add_edge(0, 1, 3, 10);
        engine.add_edge(1, 2, 4, 10);
        engine.compute_all_pairs(1);
        assert_eq!(engine.max_finite_cost(), 7);
    }

    #[test]
    fn last_edge_write_wins() {
        let mut engine = ConstrainedPathEngine::new(2);
        engine.add_edge(0, 1, 9, 10);
        engine.add_edge(0, 1, 2, 10);
        engine.compute_all_pairs(1);
        assert_eq!(engine.cost(0, 1), 2);
    }

    #[test]
    fn queries_before_compute_see_no_routes() {
        let mut engine = ConstrainedPathEngine::new(2);
        engine.add_edge(0, 1, 1, 1);
        assert!(engine.path(0, 1).is_empty());
        assert_eq!(engine.path(0, 0), vec![0]);
        assert_eq!(engine.source(), None);
    }

    #[test]
    fn cache_roundtrip_reproduces_matrices() {
        let dir = TempDir::new().expect("tempdir");

        let mut first = thin_cheap_vs_wide_expensive().with_cache(MatrixCache::new(dir.path()));
        first.compute_all_pairs(50);
        assert_eq!(first.source(), Some(PathSource::Computed));

        let mut second = thin_cheap_vs_wide_expensive().with_cache(MatrixCache::new(dir.path()));
        second.compute_all_pairs(50);
        assert_eq!(second.source(), Some(PathSource::Cache));

        assert_eq!(first.distances(), second.distances());
        assert_eq!(first.next_hops(), second.next_hops());
        assert_eq!(first.capacities(), second.capacities());
    }

    #[test]
    fn different_amount_misses_cache() {
        let dir = TempDir::new().expect("tempdir");

        let mut first = thin_cheap_vs_wide_expensive().with_cache(MatrixCache::new(dir.path()));
        first.compute_all_pairs(50);

        let mut second = thin_cheap_vs_wide_expensive().with_cache(MatrixCache::new(dir.path()));
        second.compute_all_pairs(500);
        assert_eq!(second.source(), Some(PathSource::Computed));
        assert_eq!(second.cost(0, 2), 10);
    }

    #[test]
    fn corrupt_cache_entry_forces_recompute() {
        let dir = TempDir::new().expect("tempdir");
        let store = MatrixCache::new(dir.path());

        let mut engine = thin_cheap_vs_wide_expensive().with_cache(store.clone());
        engine.initialise(50);
        let key = cache::cache_key(50, engine.distances().as_slice());
        std::fs::write(store.entry_path(key), b"garbage").expect("write junk");

        engine.compute_all_pairs(50);
        assert_eq!(engine.source(), Some(PathSource::Computed));
        assert_eq!(engine.cost(0, 2), 2);
    }

    #[test]
    fn out_of_range_hops_in_cache_are_ignored() {
        let dir = TempDir::new().expect("tempdir");
        let store = MatrixCache::new(dir.path());

        let mut engine = thin_cheap_vs_wide_expensive().with_cache(store.clone());
        engine.initialise(50);
        let key = cache::cache_key(50, engine.distances().as_slice());
        store
            .store(key, &[0; 9], &[99; 9])
            .expect("store bogus hops");

        engine.compute_all_pairs(50);
        assert_eq!(engine.source(), Some(PathSource::Computed));
        assert_eq!(engine.path(0, 2), vec![0, 1, 2]);
    }
    #[test]
    fn cache_routes_over_missing_channels_are_ignored() {
        let dir = TempDir::new().expect("tempdir");
        let store = MatrixCache::new(dir.path());

        let mut engine = thin_cheap_vs_wide_expensive().with_cache(store.clone());
        engine.initialise(50);
        let key = cache::cache_key(50, engine.distances().as_slice());
        // Every pair "reachable" by a direct hop; 1 → 0 has no channel.
        let next: Vec<usize> = (0..9).map(|cell| cell % 3).collect();
        store.store(key, &[0; 9], &next).expect("store stale routes");

        engine.compute_all_pairs(50);
        assert_eq!(engine.source(), Some(PathSource::Computed));
        assert_eq!(engine.path(0, 2), vec![0, 1, 2]);
        assert_eq!(engine.bottleneck(0, 2), Some(100));
        assert!(engine.path(1, 0).is_empty());
    }
}
