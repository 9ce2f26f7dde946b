#![forbid(unsafe_code)]
//! lngraph-core library.
//!
//! Static analysis of a payment-channel network snapshot:
//!
//! - [`articulation`]: cut vertices and biconnected components of the
//!   undirected channel graph.
//! - [`eccentricity`]: per-node hop eccentricity (BFS from every node).
//! - [`paths`]: capacity-gated all-pairs cheapest routes (Floyd–Warshall)
//!   with an optional content-addressed [`cache`].
//! - [`centrality`]: how often a node is an intermediate hop on those routes.
//! - [`topology`]: loader for `describegraph` JSON snapshots.
//!
//! # Conventions
//!
//! - **Errors**: `thiserror` enums at I/O boundaries; the engines themselves
//!   never fail and report missing routes through sentinel values.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `debug!`, `trace!`).

pub mod articulation;
pub mod cache;
pub mod centrality;
pub mod eccentricity;
pub mod graph;
pub mod paths;
pub mod topology;

pub use articulation::{ArticulationEngine, ArticulationResult};
pub use cache::{CacheError, MatrixCache};
pub use centrality::Centrality;
pub use eccentricity::EccentricityEngine;
pub use graph::{ChannelEdge, ChannelGraph, UndirectedGraph};
pub use paths::{ConstrainedPathEngine, INFINITE_COST, NO_HOP, PathSource};
pub use topology::{Topology, TopologyError};
