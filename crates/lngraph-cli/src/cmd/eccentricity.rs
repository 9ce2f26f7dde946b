//! `lngraph eccentricity`: hop distances across the network.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use lngraph_core::{EccentricityEngine, Topology};
use serde::Serialize;

use super::{NodeRef, Session, load_topology};
use crate::output::{pretty_kv, pretty_section, render_mode};

/// Arguments for `lngraph eccentricity`.
#[derive(Args, Debug)]
pub struct EccentricityArgs {
    /// Path to a `describegraph` JSON snapshot.
    pub snapshot: PathBuf,

    /// Number of most central nodes to list.
    #[arg(long)]
    pub top: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct RankedNode {
    #[serde(flatten)]
    pub node: NodeRef,
    pub eccentricity: usize,
}

/// Report payload for `lngraph eccentricity`.
#[derive(Debug, Serialize)]
pub struct EccentricityReport {
    pub diameter: usize,
    /// `None` when no node has a channel.
    pub radius: Option<usize>,
    /// Eccentricity → number of connected nodes with it.
    pub distribution: BTreeMap<usize, usize>,
    /// Connected nodes with the lowest eccentricity, ties by index.
    pub most_central: Vec<RankedNode>,
}

impl EccentricityReport {
    pub fn build(topology: &Topology, top: usize) -> Self {
        let graph = topology.undirected_graph();
        let engine = EccentricityEngine::new(&graph);
        let eccentricities = engine.all_eccentricities();

        let connected: Vec<(usize, usize)> = eccentricities
            .iter()
            .copied()
            .enumerate()
            .filter(|&(v, _)| graph.degree(v) > 0)
            .collect();

        let mut distribution = BTreeMap::new();
        for &(_, e) in &connected {
            *distribution.entry(e).or_insert(0) += 1;
        }

        let mut ranked = connected;
        ranked.sort_unstable_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));
        ranked.truncate(top);

        Self {
            diameter: EccentricityEngine::diameter(&eccentricities),
            radius: engine.radius(&eccentricities),
            distribution,
            most_central: ranked
                .into_iter()
                .map(|(v, eccentricity)| RankedNode {
                    node: NodeRef::new(topology, v),
                    eccentricity,
                })
                .collect(),
        }
    }
}

/// Execute `lngraph eccentricity`.
pub fn run_eccentricity(args: &EccentricityArgs, session: &Session) -> anyhow::Result<()> {
    let topology = load_topology(&args.snapshot)?;
    let report = EccentricityReport::build(&topology, session.top(args.top));
    render_mode(session.output, &report, render_text, render_pretty)
}

fn radius_text(radius: Option<usize>) -> String {
    radius.map_or_else(|| "-".to_string(), |r| r.to_string())
}

fn render_text(report: &EccentricityReport, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(w, "diameter {}", report.diameter)?;
    writeln!(w, "radius {}", radius_text(report.radius))?;
    for ranked in &report.most_central {
        writeln!(w, "{} {} {}", ranked.eccentricity, ranked.node.pub_key, ranked.node.label())?;
    }
    Ok(())
}

fn render_pretty(report: &EccentricityReport, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, "Eccentricity")?;
    pretty_kv(w, "Diameter", report.diameter.to_string())?;
    pretty_kv(w, "Radius", radius_text(report.radius))?;
    for (ecc, count) in &report.distribution {
        pretty_kv(w, &format!("  {ecc} hops"), format!("{count} nodes"))?;
    }

    writeln!(w)?;
    pretty_section(w, "Most central nodes")?;
    for ranked in &report.most_central {
        writeln!(
            w,
            "{:>3}  {:<32} {}",
            ranked.eccentricity,
            ranked.node.label(),
            ranked.node.pub_key
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn star_center_ranks_first() {
        let topology = Topology::from_json_str(
            r#"{"nodes": [{"pub_key": "hub"}, {"pub_key": "x"}, {"pub_key": "y"}, {"pub_key": "lonely"}],
                "edges": [
                  {"channel_id": "1", "node1_pub": "hub", "node2_pub": "x", "capacity": 1},
                  {"channel_id": "2", "node1_pub": "hub", "node2_pub": "y", "capacity": 1}
                ]}"#,
        )
        .expect("parse");
        let report = EccentricityReport::build(&topology, 2);

        assert_eq!(report.diameter, 2);
        assert_eq!(report.radius, Some(1));
        assert_eq!(report.distribution.get(&1), Some(&1));
        assert_eq!(report.distribution.get(&2), Some(&2));
        assert_eq!(report.distribution.values().sum::<usize>(), 3, "isolated node excluded");
        assert_eq!(report.most_central.len(), 2);
        assert_eq!(report.most_central[0].node.pub_key, "hub");
        assert_eq!(report.most_central[1].node.pub_key, "x");
    }
}
