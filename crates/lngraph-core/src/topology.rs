//! Channel-network snapshot loader.
//!
//! # Overview
//!
//! Parses a `describegraph`-style JSON snapshot into an index-based arena
//! (a [`petgraph`] undirected graph): nodes keep their public key and alias,
//! channels keep their id, capacity and the two directional routing
//! policies. Node `i` of the arena is vertex `i` of every engine.
//!
//! ```json
//! {
//!   "nodes": [{ "pub_key": "02aa…", "alias": "alice" }],
//!   "edges": [{
//!     "channel_id": "712…", "node1_pub": "02aa…", "node2_pub": "03bb…",
//!     "capacity": "500000",
//!     "node1_policy": { "fee_base_msat": "1000", "fee_rate_milli_msat": "1", "disabled": false },
//!     "node2_policy": null
//!   }]
//! }
//! ```
//!
//! Numeric fields may be JSON numbers or decimal strings.
//!
//! ## Projections
//!
//! - [`Topology::undirected_graph`]: one undirected edge per channel
//!   (parallel channels kept) for articulation and eccentricity analysis.
//! - [`Topology::channel_graph`]: one directed edge per enabled policy side,
//!   weighted by the fee for a given amount, for route analysis.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use petgraph::algo::connected_components;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Deserializer};
use tracing::{debug, instrument};

use crate::graph::{ChannelGraph, UndirectedGraph};

/// Largest fee handed to the route engine; keeps fees below the
/// "unreachable" sentinel.
const MAX_FEE_MSAT: i64 = i64::MAX / 4;

/// Errors returned while loading a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum TopologyError {
    #[error("failed to read snapshot {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed snapshot: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("channel {channel_id} references unknown node {pub_key}")]
    UnknownNode { channel_id: String, pub_key: String },
}

// ---------------------------------------------------------------------------
// Arena payloads
// ---------------------------------------------------------------------------

/// A network node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeInfo {
    pub pub_key: String,
    pub alias: String,
}

/// Fees a node charges to forward through one side of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct RoutingPolicy {
    #[serde(default, deserialize_with = "lenient_u64")]
    pub fee_base_msat: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub fee_rate_milli_msat: u64,
    #[serde(default)]
    pub disabled: bool,
}

impl RoutingPolicy {
    /// Fee in millisatoshi for forwarding `amount_sat`.
    #[must_use]
    pub fn fee_msat(&self, amount_sat: u64) -> i64 {
        let proportional =
            u128::from(amount_sat) * 1_000 * u128::from(self.fee_rate_milli_msat) / 1_000_000;
        let total = u128::from(self.fee_base_msat) + proportional;
        i64::try_from(total).map_or(MAX_FEE_MSAT, |fee| fee.min(MAX_FEE_MSAT))
    }
}

/// A channel between `node1` (arena source) and `node2` (arena target).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInfo {
    pub channel_id: String,
    pub capacity_sat: u64,
    /// `[node1 → node2 policy, node2 → node1 policy]`.
    pub policies: [Option<RoutingPolicy>; 2],
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawSnapshot {
    #[serde(default)]
    nodes: Vec<RawNode>,
    #[serde(default)]
    edges: Vec<RawChannel>,
}

#[derive(Debug, Deserialize)]
struct RawNode {
    pub_key: String,
    #[serde(default)]
    alias: String,
}

#[derive(Debug, Deserialize)]
struct RawChannel {
    #[serde(deserialize_with = "lenient_string")]
    channel_id: String,
    node1_pub: String,
    node2_pub: String,
    #[serde(default, deserialize_with = "lenient_u64")]
    capacity: u64,
    #[serde(default)]
    node1_policy: Option<RoutingPolicy>,
    #[serde(default)]
    node2_policy: Option<RoutingPolicy>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(u64),
    Text(String),
}

fn lenient_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(n) => Ok(n),
        NumberOrText::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(n) => n.to_string(),
        NumberOrText::Text(s) => s,
    })
}

// ---------------------------------------------------------------------------
// Topology
// ---------------------------------------------------------------------------

/// A loaded network snapshot.
#[derive(Debug, Clone)]
pub struct Topology {
    graph: UnGraph<NodeInfo, ChannelInfo>,
    node_map: HashMap<String, NodeIndex>,
}

impl Topology {
    /// Parse a snapshot from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::Parse`] on malformed JSON and
    /// [`TopologyError::UnknownNode`] if a channel names a node missing from
    /// the `nodes` array.
    #[instrument(skip(json), fields(bytes = json.len()))]
    pub fn from_json_str(json: &str) -> Result<Self, TopologyError> {
        let raw: RawSnapshot = serde_json::from_str(json)?;

        let mut graph = UnGraph::with_capacity(raw.nodes.len(), raw.edges.len());
        let mut node_map = HashMap::with_capacity(raw.nodes.len());

        for node in raw.nodes {
            if node_map.contains_key(&node.pub_key) {
                debug!(pub_key = %node.pub_key, "duplicate node entry ignored");
                continue;
            }
            let idx = graph.add_node(NodeInfo {
                pub_key: node.pub_key.clone(),
                alias: node.alias,
            });
            node_map.insert(node.pub_key, idx);
        }

        for channel in raw.edges {
            let lookup = |pub_key: &str| {
                node_map
                    .get(pub_key)
                    .copied()
                    .ok_or_else(|| TopologyError::UnknownNode {
                        channel_id: channel.channel_id.clone(),
                        pub_key: pub_key.to_string(),
                    })
            };
            let a = lookup(&channel.node1_pub)?;
            let b = lookup(&channel.node2_pub)?;

            graph.add_edge(
                a,
                b,
                ChannelInfo {
                    channel_id: channel.channel_id,
                    capacity_sat: channel.capacity,
                    policies: [channel.node1_policy, channel.node2_policy],
                },
            );
        }

        debug!(
            nodes = graph.node_count(),
            channels = graph.edge_count(),
            "snapshot loaded"
        );
        Ok(Self { graph, node_map })
    }

    /// Read and parse a snapshot file.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::Io`] if the file cannot be read, otherwise
    /// as [`Topology::from_json_str`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, TopologyError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| TopologyError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_json_str(&json)
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Sum of all channel capacities.
    #[must_use]
    pub fn total_capacity_sat(&self) -> u64 {
        self.graph
            .edge_weights()
            .map(|c| c.capacity_sat)
            .fold(0u64, u64::saturating_add)
    }

    /// Number of channels the node participates in.
    #[must_use]
    pub fn channel_count_for(&self, vertex: usize) -> usize {
        self.graph.edges(NodeIndex::new(vertex)).count()
    }

    #[must_use]
    pub fn node(&self, vertex: usize) -> Option<&NodeInfo> {
        self.graph.node_weight(NodeIndex::new(vertex))
    }

    /// Alias of the node, falling back to its public key when empty.
    #[must_use]
    pub fn label(&self, vertex: usize) -> &str {
        self.node(vertex).map_or("", |n| {
            if n.alias.is_empty() {
                n.pub_key.as_str()
            } else {
                n.alias.as_str()
            }
        })
    }

    /// Vertex index of a node given its public key or alias.
    ///
    /// Public keys win over aliases; aliases need not be unique, the first
    /// node carrying it is returned.
    #[must_use]
    pub fn resolve(&self, key_or_alias: &str) -> Option<usize> {
        if let Some(idx) = self.node_map.get(key_or_alias) {
            return Some(idx.index());
        }
        self.graph
            .node_indices()
            .find(|&idx| self.graph[idx].alias == key_or_alias)
            .map(NodeIndex::index)
    }

    /// Number of connected components, isolated nodes included.
    #[must_use]
    pub fn connected_components(&self) -> usize {
        connected_components(&self.graph)
    }

    /// Undirected projection: one edge per channel, self-loops excluded.
    #[must_use]
    pub fn undirected_graph(&self) -> UndirectedGraph {
        let mut graph = UndirectedGraph::new(self.node_count());
        for edge in self.graph.edge_references() {
            let (a, b) = (edge.source().index(), edge.target().index());
            if a != b {
                graph.add_edge(a, b);
            }
        }
        graph
    }

    /// Directed projection for routing `amount_sat`.
    ///
    /// Each enabled policy side becomes an edge weighted by its fee in
    /// millisatoshi, with the channel capacity as its capacity. Between
    /// parallel channels the later one in the snapshot wins.
    #[must_use]
    pub fn channel_graph(&self, amount_sat: u64) -> ChannelGraph {
        let mut graph = ChannelGraph::new(self.node_count());
        for edge in self.graph.edge_references() {
            let channel = edge.weight();
            let (a, b) = (edge.source().index(), edge.target().index());
            if a == b {
                continue;
            }
            for (policy, (from, to)) in channel.policies.iter().zip([(a, b), (b, a)]) {
                let Some(policy) = policy else { continue };
                if policy.disabled {
                    continue;
                }
                graph.add_edge(from, to, policy.fee_msat(amount_sat), channel.capacity_sat);
            }
        }
        graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = r#"{
        "nodes": [
            {"pub_key": "02aa", "alias": "alice"},
            {"pub_key": "02bb", "alias": "bob"},
            {"pub_key": "02cc", "alias": ""}
        ],
        "edges": [
            {
                "channel_id": "1", "node1_pub": "02aa", "node2_pub": "02bb",
                "capacity": "500000",
                "node1_policy": {"fee_base_msat": "1000", "fee_rate_milli_msat": "100", "disabled": false},
                "node2_policy": {"fee_base_msat": 0, "fee_rate_milli_msat": 1, "disabled": true}
            },
            {
                "channel_id": 2, "node1_pub": "02bb", "node2_pub": "02cc",
                "capacity": 20000,
                "node1_policy": null
            }
        ]
    }"#;

    #[test]
    fn parses_nodes_and_channels() {
        let topo = Topology::from_json_str(SNAPSHOT).expect("parse");
        assert_eq!(topo.node_count(), 3);
        assert_eq!(topo.channel_count(), 2);
        assert_eq!(topo.total_capacity_sat(), 520_000);
        assert_eq!(topo.channel_count_for(1), 2);
        assert_eq!(topo.connected_components(), 1);
    }

    #[test]
    fn label_falls_back_to_pub_key() {
        let topo = Topology::from_json_str(SNAPSHOT).expect("parse");
        assert_eq!(topo.label(0), "alice");
        assert_eq!(topo.label(2), "02cc");
    }

    #[test]
    fn resolve_by_key_or_alias() {
        let topo = Topology::from_json_str(SNAPSHOT).expect("parse");
        assert_eq!(topo.resolve("02bb"), Some(1));
        assert_eq!(topo.resolve("alice"), Some(0));
        assert_eq!(topo.resolve("nobody"), None);
    }

    #[test]
    fn undirected_projection_has_one_edge_per_channel() {
        let topo = Topology::from_json_str(SNAPSHOT).expect("parse");
        let g = topo.undirected_graph();
        assert_eq!(g.vertex_count(), 3);
        assert_eq!(g.edge_count(), 2);
        assert_eq!(g.degree(1), 2);
    }

    #[test]
    fn channel_projection_skips_disabled_and_missing_policies() {
        let topo = Topology::from_json_str(SNAPSHOT).expect("parse");
        let g = topo.channel_graph(10_000);
        assert_eq!(g.edge_count(), 1);
        let e = g.edge(0, 1).expect("alice → bob");
        // 1000 base + 10_000 sat * 1000 * 100 / 1e6 = 1000 + 1000
        assert_eq!(e.fee, 2_000);
        assert_eq!(e.capacity, 500_000);
        assert!(g.edge(1, 0).is_none(), "disabled side");
        assert!(g.edge(1, 2).is_none(), "null policy");
    }

    #[test]
    fn unknown_node_is_an_error() {
        let json = r#"{"nodes": [{"pub_key": "a"}], "edges": [
            {"channel_id": "9", "node1_pub": "a", "node2_pub": "zz", "capacity": "1"}
        ]}"#;
        match Topology::from_json_str(json) {
            Err(TopologyError::UnknownNode { channel_id, pub_key }) => {
                assert_eq!(channel_id, "9");
                assert_eq!(pub_key, "zz");
            }
            other => panic!("expected UnknownNode, got {other:?}"),
        }
    }

    #[test]
    fn malformed_json_is_parse_error() {
        assert!(matches!(
            Topology::from_json_str("{ not json"),
            Err(TopologyError::Parse(_))
        ));
    }

    #[test]
    fn self_loops_count_in_totals_but_not_projections() {
        let policy = r#"{"fee_base_msat": "1", "fee_rate_milli_msat": "0"}"#;
        let json = format!(
            r#"{{"nodes": [{{"pub_key": "a"}}, {{"pub_key": "b"}}], "edges": [
                {{"channel_id": "1", "node1_pub": "a", "node2_pub": "a", "capacity": "5",
                  "node1_policy": {policy}, "node2_policy": {policy}}},
                {{"channel_id": "2", "node1_pub": "a", "node2_pub": "b", "capacity": "7"}}
            ]}}"#
        );
        let topo = Topology::from_json_str(&json).expect("parse");
        assert_eq!(topo.channel_count(), 2);
        assert_eq!(topo.total_capacity_sat(), 12);
        assert_eq!(topo.connected_components(), 1);

        let undirected = topo.undirected_graph();
        assert_eq!(undirected.edge_count(), 1);
        assert_eq!(undirected.degree(0), 1);

        let channels = topo.channel_graph(1);
        assert!(channels.edge(0, 0).is_none());
        assert_eq!(channels.edges().count(), 0, "a-b has no policies");
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            Topology::from_path("/nonexistent/lngraph/snapshot.json"),
            Err(TopologyError::Io { .. })
        ));
    }

    #[test]
    fn fee_is_saturated_below_sentinel() {
        let policy = RoutingPolicy {
            fee_base_msat: u64::MAX,
            fee_rate_milli_msat: u64::MAX,
            disabled: false,
        };
        assert_eq!(policy.fee_msat(u64::MAX), MAX_FEE_MSAT);
    }
}
