//! `lngraph articulation`: cut nodes and biconnected components.
//!
//! By default a component is hidden when any of its members has exactly one
//! channel: such components are leaf attachments (a single node hanging off
//! the network) rather than structure worth reporting.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use lngraph_core::{ArticulationEngine, ArticulationResult, Topology};
use serde::Serialize;
use tracing::instrument;

use super::{NodeRef, Session, load_topology};
use crate::output::{pretty_rule, pretty_section, render_mode};

/// Arguments for `lngraph articulation`.
#[derive(Args, Debug)]
pub struct ArticulationArgs {
    /// Path to a `describegraph` JSON snapshot.
    pub snapshot: PathBuf,

    /// Also list components that contain a single-channel node.
    #[arg(long)]
    pub include_leaves: bool,
}

#[derive(Debug, Serialize)]
pub struct CutNode {
    #[serde(flatten)]
    pub node: NodeRef,
    pub channels: usize,
    pub components: usize,
}

#[derive(Debug, Serialize)]
pub struct ComponentEntry {
    pub size: usize,
    pub members: Vec<NodeRef>,
}

/// Report payload for `lngraph articulation`.
#[derive(Debug, Serialize)]
pub struct ArticulationReport {
    pub articulation_points: Vec<CutNode>,
    pub components: Vec<ComponentEntry>,
    pub total_components: usize,
    pub hidden_components: usize,
}

impl ArticulationReport {
    #[instrument(skip(topology))]
    pub fn build(topology: &Topology, include_leaves: bool) -> Self {
        let result = ArticulationEngine::from_graph(topology.undirected_graph()).run();
        Self::from_result(topology, &result, include_leaves)
    }

    fn from_result(topology: &Topology, result: &ArticulationResult, include_leaves: bool) -> Self {
        let articulation_points = result
            .articulation_points
            .iter()
            .map(|&v| CutNode {
                node: NodeRef::new(topology, v),
                channels: topology.channel_count_for(v),
                components: result.count_components_for_vertex(v),
            })
            .collect();

        let mut hidden_components = 0;
        let mut components = Vec::new();
        for component in &result.biconnected_components {
            let has_leaf = component.iter().any(|&v| topology.channel_count_for(v) == 1);
            if has_leaf && !include_leaves {
                hidden_components += 1;
                continue;
            }
            components.push(ComponentEntry {
                size: component.len(),
                members: component.iter().map(|&v| NodeRef::new(topology, v)).collect(),
            });
        }

        Self {
            articulation_points,
            components,
            total_components: result.biconnected_components.len(),
            hidden_components,
        }
    }
}

/// Execute `lngraph articulation`.
pub fn run_articulation(args: &ArticulationArgs, session: &Session) -> anyhow::Result<()> {
    let topology = load_topology(&args.snapshot)?;
    let report = ArticulationReport::build(&topology, args.include_leaves);
    render_mode(session.output, &report, render_text, render_pretty)
}

fn render_text(report: &ArticulationReport, w: &mut dyn Write) -> std::io::Result<()> {
    for cut in &report.articulation_points {
        writeln!(
            w,
            "ap {} {} {} {}",
            cut.node.pub_key,
            cut.channels,
            cut.components,
            cut.node.label()
        )?;
    }
    for (i, component) in report.components.iter().enumerate() {
        let keys: Vec<&str> = component.members.iter().map(|m| m.pub_key.as_str()).collect();
        writeln!(w, "bcc {i} {} {}", component.size, keys.join(","))?;
    }
    Ok(())
}

fn render_pretty(report: &ArticulationReport, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(
        w,
        &format!("Articulation points ({})", report.articulation_points.len()),
    )?;
    if report.articulation_points.is_empty() {
        writeln!(w, "none")?;
    }
    for cut in &report.articulation_points {
        writeln!(
            w,
            "{:<32} {:>5} channels  {:>3} components  {}",
            truncate(cut.node.label(), 32),
            cut.channels,
            cut.components,
            cut.node.pub_key
        )?;
    }

    writeln!(w)?;
    pretty_section(
        w,
        &format!(
            "Biconnected components ({} shown, {} with leaves hidden)",
            report.components.len(),
            report.hidden_components
        ),
    )?;
    for (i, component) in report.components.iter().enumerate() {
        writeln!(w, "#{i} ({} nodes)", component.size)?;
        for member in &component.members {
            writeln!(w, "  {:<32} {}", truncate(member.label(), 32), member.pub_key)?;
        }
    }
    pretty_rule(w)
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}
