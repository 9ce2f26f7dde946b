pub mod articulation;
pub mod centrality;
pub mod completions;
pub mod eccentricity;
pub mod route;
pub mod summary;

use std::path::{Path, PathBuf};

use anyhow::Context;
use lngraph_core::{ConstrainedPathEngine, MatrixCache, Topology};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::Config;
use crate::output::OutputMode;

/// State shared by every report command.
#[derive(Debug, Clone)]
pub struct Session {
    pub output: OutputMode,
    pub config: Config,
    /// `None` when the matrix cache is disabled.
    pub cache_dir: Option<PathBuf>,
}

impl Session {
    /// Row limit for ranked listings: `--top` if given, else the config value.
    pub fn top(&self, flag: Option<usize>) -> usize {
        flag.unwrap_or(self.config.report.top)
    }

    /// Payment size: `--amount` if given, else the config value.
    pub fn amount(&self, flag: Option<u64>) -> u64 {
        flag.unwrap_or(self.config.report.amount_sat)
    }

    /// Build and run the constrained all-pairs engine for `amount_sat`.
    pub fn route_engine(&self, topology: &Topology, amount_sat: u64) -> ConstrainedPathEngine {
        let mut engine = ConstrainedPathEngine::from_graph(topology.channel_graph(amount_sat));
        if let Some(dir) = &self.cache_dir {
            engine = engine.with_cache(MatrixCache::new(dir));
        }
        engine.compute_all_pairs(amount_sat);
        debug!(source = ?engine.source(), "all-pairs matrices ready");
        engine
    }
}

/// Read a `describegraph` snapshot.
pub fn load_topology(path: &Path) -> anyhow::Result<Topology> {
    let topology = Topology::from_path(path)
        .with_context(|| format!("failed to load snapshot {}", path.display()))?;
    info!(
        nodes = topology.node_count(),
        channels = topology.channel_count(),
        "loaded {}",
        path.display()
    );
    Ok(topology)
}

/// A node as shown in reports.
#[derive(Debug, Clone, Serialize)]
pub struct NodeRef {
    pub index: usize,
    pub pub_key: String,
    pub alias: String,
}

impl NodeRef {
    pub fn new(topology: &Topology, index: usize) -> Self {
        let (pub_key, alias) = topology
            .node(index)
            .map(|n| (n.pub_key.clone(), n.alias.clone()))
            .unwrap_or_default();
        Self {
            index,
            pub_key,
            alias,
        }
    }

    /// Alias if set, else the public key.
    pub fn label(&self) -> &str {
        if self.alias.is_empty() {
            &self.pub_key
        } else {
            &self.alias
        }
    }
}

/// Satoshis as a BTC amount with eight decimals.
pub fn format_btc(sat: u64) -> String {
    format!("{}.{:08}", sat / 100_000_000, sat % 100_000_000)
}
