//! `lngraph summary`: size of the network snapshot.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use lngraph_core::Topology;
use serde::Serialize;

use super::{Session, format_btc, load_topology};
use crate::output::{pretty_kv, pretty_section, render_mode};

/// Arguments for `lngraph summary`.
#[derive(Args, Debug)]
pub struct SummaryArgs {
    /// Path to a `describegraph` JSON snapshot.
    pub snapshot: PathBuf,
}

/// Report payload for `lngraph summary`.
#[derive(Debug, Serialize)]
pub struct SummaryReport {
    pub nodes: usize,
    pub channels: usize,
    pub components: usize,
    pub isolated_nodes: usize,
    pub total_capacity_sat: u64,
    pub total_capacity_btc: String,
}

impl SummaryReport {
    pub fn from_topology(topology: &Topology) -> Self {
        let total_capacity_sat = topology.total_capacity_sat();
        Self {
            nodes: topology.node_count(),
            channels: topology.channel_count(),
            components: topology.connected_components(),
            isolated_nodes: (0..topology.node_count())
                .filter(|&v| topology.channel_count_for(v) == 0)
                .count(),
            total_capacity_sat,
            total_capacity_btc: format_btc(total_capacity_sat),
        }
    }
}

/// Execute `lngraph summary`.
pub fn run_summary(args: &SummaryArgs, session: &Session) -> anyhow::Result<()> {
    let topology = load_topology(&args.snapshot)?;
    let report = SummaryReport::from_topology(&topology);
    render_mode(session.output, &report, render_summary_text, render_summary_pretty)
}

fn render_summary_text(report: &SummaryReport, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(w, "nodes {}", report.nodes)?;
    writeln!(w, "channels {}", report.channels)?;
    writeln!(w, "components {}", report.components)?;
    writeln!(w, "isolated {}", report.isolated_nodes)?;
    writeln!(w, "capacity_btc {}", report.total_capacity_btc)
}

fn render_summary_pretty(report: &SummaryReport, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, "Network summary")?;
    pretty_kv(w, "Nodes", report.nodes.to_string())?;
    pretty_kv(w, "Channels", report.channels.to_string())?;
    pretty_kv(w, "Components", report.components.to_string())?;
    pretty_kv(w, "Isolated", report.isolated_nodes.to_string())?;
    pretty_kv(w, "Capacity", format!("{} BTC", report.total_capacity_btc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_counts() {
        let topology = Topology::from_json_str(
            r#"{"nodes": [{"pub_key": "a"}, {"pub_key": "b"}, {"pub_key": "c"}],
                "edges": [{"channel_id": "1", "node1_pub": "a", "node2_pub": "b", "capacity": "250000000"}]}"#,
        )
        .expect("parse");
        let report = SummaryReport::from_topology(&topology);
        assert_eq!(report.nodes, 3);
        assert_eq!(report.channels, 1);
        assert_eq!(report.components, 2);
        assert_eq!(report.isolated_nodes, 1);
        assert_eq!(report.total_capacity_btc, "2.50000000");
    }
}
