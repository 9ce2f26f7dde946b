//! `lngraph route`: cheapest route between two nodes for a payment size.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use lngraph_core::{ConstrainedPathEngine, Topology};
use serde::Serialize;

use super::{NodeRef, Session, load_topology};
use crate::output::{CliError, pretty_kv, pretty_section, render_mode};

/// Arguments for `lngraph route`.
#[derive(Args, Debug)]
pub struct RouteArgs {
    /// Path to a `describegraph` JSON snapshot.
    pub snapshot: PathBuf,

    /// Source node (public key or alias).
    pub from: String,

    /// Destination node (public key or alias).
    pub to: String,

    /// Payment size in satoshis; every hop must be able to carry it.
    #[arg(long)]
    pub amount: Option<u64>,
}

/// Report payload for `lngraph route`.
#[derive(Debug, Serialize)]
pub struct RouteReport {
    pub from: NodeRef,
    pub to: NodeRef,
    pub amount_sat: u64,
    pub found: bool,
    pub hops: Vec<NodeRef>,
    pub cost_msat: Option<i64>,
    pub bottleneck_sat: Option<u64>,
}

impl RouteReport {
    pub fn from_engine(topology: &Topology, engine: &ConstrainedPathEngine, from: usize, to: usize) -> Self {
        let path = engine.path(from, to);
        let found = !path.is_empty();
        Self {
            from: NodeRef::new(topology, from),
            to: NodeRef::new(topology, to),
            amount_sat: engine.amount(),
            found,
            hops: path.into_iter().map(|v| NodeRef::new(topology, v)).collect(),
            cost_msat: found.then(|| engine.cost(from, to)),
            bottleneck_sat: engine.bottleneck(from, to),
        }
    }
}

fn resolve_node(topology: &Topology, key: &str) -> Result<usize, CliError> {
    topology.resolve(key).ok_or_else(|| {
        CliError::with_details(
            format!("node '{key}' is not in the snapshot"),
            "pass a public key or an exact alias",
            "unknown_node",
        )
    })
}

/// Execute `lngraph route`.
pub fn run_route(args: &RouteArgs, session: &Session) -> anyhow::Result<()> {
    let topology = load_topology(&args.snapshot)?;
    let from = resolve_node(&topology, &args.from)?;
    let to = resolve_node(&topology, &args.to)?;

    let amount = session.amount(args.amount);
    let engine = session.route_engine(&topology, amount);
    let report = RouteReport::from_engine(&topology, &engine, from, to);
    render_mode(session.output, &report, render_text, render_pretty)
}

fn render_text(report: &RouteReport, w: &mut dyn Write) -> std::io::Result<()> {
    if !report.found {
        return writeln!(w, "no route");
    }
    for hop in &report.hops {
        writeln!(w, "{}", hop.pub_key)?;
    }
    if let Some(cost) = report.cost_msat {
        writeln!(w, "cost_msat {cost}")?;
    }
    if let Some(bottleneck) = report.bottleneck_sat {
        writeln!(w, "bottleneck_sat {bottleneck}")?;
    }
    Ok(())
}

fn render_pretty(report: &RouteReport, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(
        w,
        &format!(
            "Route {} → {} ({} sat)",
            report.from.label(),
            report.to.label(),
            report.amount_sat
        ),
    )?;
    if !report.found {
        return writeln!(w, "no route can carry this amount");
    }
    for (i, hop) in report.hops.iter().enumerate() {
        writeln!(w, "{i:>3}  {:<32} {}", hop.label(), hop.pub_key)?;
    }
    writeln!(w)?;
    pretty_kv(w, "Hops", report.hops.len().saturating_sub(1).to_string())?;
    if let Some(cost) = report.cost_msat {
        pretty_kv(w, "Cost", format!("{cost} msat"))?;
    }
    if let Some(bottleneck) = report.bottleneck_sat {
        pretty_kv(w, "Bottleneck", format!("{bottleneck} sat"))?;
    }
    Ok(())
}
