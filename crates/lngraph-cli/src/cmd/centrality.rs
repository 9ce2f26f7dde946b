//! `lngraph centrality`: which nodes sit on the most cheapest routes.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use lngraph_core::{ConstrainedPathEngine, PathSource, Topology};
use serde::Serialize;

use super::{NodeRef, Session, load_topology};
use crate::output::{pretty_kv, pretty_section, render_mode};

/// Arguments for `lngraph centrality`.
#[derive(Args, Debug)]
pub struct CentralityArgs {
    /// Path to a `describegraph` JSON snapshot.
    pub snapshot: PathBuf,

    /// Payment size in satoshis; channels smaller than this are ignored.
    #[arg(long)]
    pub amount: Option<u64>,

    /// Number of nodes to list.
    #[arg(long)]
    pub top: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct CentralNode {
    #[serde(flatten)]
    pub node: NodeRef,
    pub routes: usize,
    pub percent: f64,
}

/// Report payload for `lngraph centrality`.
#[derive(Debug, Serialize)]
pub struct CentralityReport {
    pub amount_sat: u64,
    pub routed_pairs: usize,
    pub max_cost_msat: i64,
    pub source: Option<PathSource>,
    pub top: Vec<CentralNode>,
}

impl CentralityReport {
    pub fn from_engine(topology: &Topology, engine: &ConstrainedPathEngine, top: usize) -> Self {
        let centrality = engine.centrality();
        let ranked = centrality
            .top(top)
            .into_iter()
            .filter(|&(_, routes)| routes > 0)
            .map(|(v, routes)| CentralNode {
                node: NodeRef::new(topology, v),
                routes,
                percent: centrality.normalized(v),
            })
            .collect();

        Self {
            amount_sat: engine.amount(),
            routed_pairs: centrality.pair_count,
            max_cost_msat: engine.max_finite_cost(),
            source: engine.source(),
            top: ranked,
        }
    }
}

/// Execute `lngraph centrality`.
pub fn run_centrality(args: &CentralityArgs, session: &Session) -> anyhow::Result<()> {
    let topology = load_topology(&args.snapshot)?;
    let amount = session.amount(args.amount);
    let engine = session.route_engine(&topology, amount);
    let report = CentralityReport::from_engine(&topology, &engine, session.top(args.top));
    render_mode(session.output, &report, render_text, render_pretty)
}

const fn source_label(source: Option<PathSource>) -> &'static str {
    match source {
        Some(PathSource::Cache) => "cache",
        Some(PathSource::Computed) => "computed",
        None => "none",
    }
}

fn render_text(report: &CentralityReport, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(w, "amount_sat {}", report.amount_sat)?;
    writeln!(w, "routed_pairs {}", report.routed_pairs)?;
    writeln!(w, "max_cost_msat {}", report.max_cost_msat)?;
    writeln!(w, "source {}", source_label(report.source))?;
    for node in &report.top {
        writeln!(
            w,
            "{:.4} {} {} {}",
            node.percent,
            node.routes,
            node.node.pub_key,
            node.node.label()
        )?;
    }
    Ok(())
}

fn render_pretty(report: &CentralityReport, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, &format!("Route centrality at {} sat", report.amount_sat))?;
    pretty_kv(w, "Routed pairs", report.routed_pairs.to_string())?;
    pretty_kv(w, "Max route cost", format!("{} msat", report.max_cost_msat))?;
    pretty_kv(w, "Matrices", source_label(report.source))?;
    writeln!(w)?;
    if report.top.is_empty() {
        writeln!(w, "no node is an intermediate hop on any route")?;
    }
    for node in &report.top {
        writeln!(
            w,
            "{:>8.3}%  {:>8} routes  {:<32} {}",
            node.percent,
            node.routes,
            node.node.label(),
            node.node.pub_key
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_middle_carries_routes() {
        let policy = r#"{"fee_base_msat": "1", "fee_rate_milli_msat": "0"}"#;
        let json = format!(
            r#"{{"nodes": [{{"pub_key": "a"}}, {{"pub_key": "b"}}, {{"pub_key": "c"}}],
                "edges": [
                  {{"channel_id": "1", "node1_pub": "a", "node2_pub": "b", "capacity": 1000,
                    "node1_policy": {policy}, "node2_policy": {policy}}},
                  {{"channel_id": "2", "node1_pub": "b", "node2_pub": "c", "capacity": 1000,
                    "node1_policy": {policy}, "node2_policy": {policy}}}
                ]}}"#
        );
        let topology = Topology::from_json_str(&json).expect("parse");
        let mut engine = ConstrainedPathEngine::from_graph(topology.channel_graph(10));
        engine.compute_all_pairs(10);

        let report = CentralityReport::from_engine(&topology, &engine, 5);
        assert_eq!(report.routed_pairs, 6);
        assert_eq!(report.max_cost_msat, 2);
        assert_eq!(report.source, Some(PathSource::Computed));
        assert_eq!(report.top.len(), 1, "zero-count nodes are omitted");
        assert_eq!(report.top[0].node.pub_key, "b");
        assert_eq!(report.top[0].routes, 2);
    }
}
