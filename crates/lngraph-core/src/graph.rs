//! Fixed-size adjacency structures shared by the engines.
//!
//! Two flavours are provided on top of a common [`AdjacencyList`]:
//!
//! - [`UndirectedGraph`] is unweighted, symmetric. One `add_edge` call
//!   updates both endpoints. Parallel edges are kept.
//! - [`ChannelGraph`] is directed, each edge carries a fee and a capacity.
//!   Re-adding `(u, v)` overwrites the previous entry (last write wins).
//!
//! Vertices are plain indices in `[0, V)`; `V` is fixed at construction.
//! Indices out of range are a caller bug and panic on access.

// ---------------------------------------------------------------------------
// AdjacencyList
// ---------------------------------------------------------------------------

/// `V` adjacency rows, one per vertex, holding an edge payload `E`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdjacencyList<E> {
    rows: Vec<Vec<E>>,
}

impl<E> AdjacencyList<E> {
    /// Create `vertex_count` empty rows.
    #[must_use]
    pub fn new(vertex_count: usize) -> Self {
        let mut rows = Vec::with_capacity(vertex_count);
        rows.resize_with(vertex_count, Vec::new);
        Self { rows }
    }

    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.rows.len()
    }

    /// Entries stored for `vertex`.
    #[must_use]
    pub fn row(&self, vertex: usize) -> &[E] {
        &self.rows[vertex]
    }

    fn row_mut(&mut self, vertex: usize) -> &mut Vec<E> {
        &mut self.rows[vertex]
    }

    /// Total number of stored entries across all rows.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }
}

// ---------------------------------------------------------------------------
// UndirectedGraph
// ---------------------------------------------------------------------------

/// Unweighted undirected graph over `V` vertices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndirectedGraph {
    adj: AdjacencyList<usize>,
    edge_count: usize,
}

impl UndirectedGraph {
    #[must_use]
    pub fn new(vertex_count: usize) -> Self {
        Self {
            adj: AdjacencyList::new(vertex_count),
            edge_count: 0,
        }
    }

    /// Build a graph from an edge list.
    #[must_use]
    pub fn from_edges(vertex_count: usize, edges: &[(usize, usize)]) -> Self {
        let mut graph = Self::new(vertex_count);
        for &(u, v) in edges {
            graph.add_edge(u, v);
        }
        graph
    }

    /// Add the undirected edge `{u, v}` to both adjacency rows.
    pub fn add_edge(&mut self, u: usize, v: usize) {
        self.adj.row_mut(u).push(v);
        self.adj.row_mut(v).push(u);
        self.edge_count += 1;
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.adj.vertex_count()
    }

    /// Number of `add_edge` calls (parallel edges counted separately).
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    #[must_use]
    pub fn neighbors(&self, vertex: usize) -> &[usize] {
        self.adj.row(vertex)
    }

    #[must_use]
    pub fn degree(&self, vertex: usize) -> usize {
        self.adj.row(vertex).len()
    }
}

// ---------------------------------------------------------------------------
// ChannelGraph
// ---------------------------------------------------------------------------

/// Outgoing directed edge `from → to` with a routing fee and a capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelEdge {
    pub to: usize,
    /// Non-negative cost of traversing the edge.
    pub fee: i64,
    /// Non-negative upper bound on the amount the edge can carry.
    pub capacity: u64,
}

/// Directed graph with fee and capacity on every edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelGraph {
    adj: AdjacencyList<ChannelEdge>,
}

impl ChannelGraph {
    #[must_use]
    pub fn new(vertex_count: usize) -> Self {
        Self {
            adj: AdjacencyList::new(vertex_count),
        }
    }

    /// Register `from → to`. An existing `(from, to)` entry is replaced.
    pub fn add_edge(&mut self, from: usize, to: usize, fee: i64, capacity: u64) {
        let edge = ChannelEdge { to, fee, capacity };
        let row = self.adj.row_mut(from);
        if let Some(existing) = row.iter_mut().find(|e| e.to == to) {
            *existing = edge;
        } else {
            row.push(edge);
        }
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.adj.vertex_count()
    }

    /// Number of distinct `(from, to)` pairs.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.adj.entry_count()
    }

    #[must_use]
    pub fn outgoing(&self, vertex: usize) -> &[ChannelEdge] {
        self.adj.row(vertex)
    }

    /// Look up the edge `from → to`, if registered.
    #[must_use]
    pub fn edge(&self, from: usize, to: usize) -> Option<&ChannelEdge> {
        self.adj.row(from).iter().find(|e| e.to == to)
    }

    /// Iterate all edges as `(from, edge)`.
    pub fn edges(&self) -> impl Iterator<Item = (usize, &ChannelEdge)> + '_ {
        (0..self.vertex_count()).flat_map(move |from| self.outgoing(from).iter().map(move |e| (from, e)))
    }
}
