#![forbid(unsafe_code)]

mod cmd;
mod config;
mod output;

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, Parser, Subcommand};
use output::{CliError, OutputMode, render_error, resolve_output_mode};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "lngraph: structural analysis of payment-channel network snapshots",
    long_about = None
)]
struct Cli {
    /// Enable debug logging (overridden by LNGRAPH_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (default: pretty on a TTY, text when piped).
    #[arg(long, value_enum, global = true)]
    format: Option<OutputMode>,

    /// Shorthand for `--format json`.
    #[arg(long, global = true, hide = true)]
    json: bool,

    /// Directory for cached all-pairs matrices.
    #[arg(long, global = true, value_name = "DIR")]
    cache_dir: Option<PathBuf>,

    /// Always recompute all-pairs matrices.
    #[arg(long, global = true, conflicts_with = "cache_dir")]
    no_cache: bool,

    /// Configuration file (default: <config dir>/lngraph/config.toml).
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Reports",
        about = "Count nodes, channels and capacity",
        after_help = "EXAMPLES:\n    # Summarize a snapshot\n    lngraph summary graph.json\n\n    # Emit machine-readable output\n    lngraph summary graph.json --format json"
    )]
    Summary(cmd::summary::SummaryArgs),

    #[command(
        next_help_heading = "Reports",
        about = "List cut nodes and biconnected components",
        long_about = "List nodes whose removal splits the network, and the biconnected components they separate.",
        after_help = "EXAMPLES:\n    # Cut nodes and non-leaf components\n    lngraph articulation graph.json\n\n    # Keep components with single-channel nodes\n    lngraph articulation graph.json --include-leaves"
    )]
    Articulation(cmd::articulation::ArticulationArgs),

    #[command(
        next_help_heading = "Reports",
        about = "Report hop diameter, radius and central nodes",
        after_help = "EXAMPLES:\n    # Ten most central nodes\n    lngraph eccentricity graph.json --top 10"
    )]
    Eccentricity(cmd::eccentricity::EccentricityArgs),

    #[command(
        next_help_heading = "Routing",
        about = "Rank nodes by how many cheapest routes pass through them",
        long_about = "Compute cheapest routes between every pair of nodes for a payment size and rank nodes by how often they are an intermediate hop. Results are cached on disk.",
        after_help = "EXAMPLES:\n    # Routes able to carry 250k sat\n    lngraph centrality graph.json --amount 250000\n\n    # Skip the matrix cache\n    lngraph centrality graph.json --no-cache"
    )]
    Centrality(cmd::centrality::CentralityArgs),

    #[command(
        next_help_heading = "Routing",
        about = "Show the cheapest route between two nodes",
        after_help = "EXAMPLES:\n    # By alias or public key\n    lngraph route graph.json alice 02f1...9c --amount 50000"
    )]
    Route(cmd::route::RouteArgs),

    #[command(
        next_help_heading = "Shell",
        about = "Generate shell completion scripts",
        after_help = "EXAMPLES:\n    # Generate bash completions\n    lngraph completions bash"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("LNGRAPH_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            "lngraph=debug,info"
        } else {
            "lngraph=info,warn"
        })
    });

    let format = env::var("LNGRAPH_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn run(cli: &Cli, output: OutputMode) -> anyhow::Result<()> {
    if let Commands::Completions(args) = &cli.command {
        let mut command = Cli::command();
        return cmd::completions::run_completions(args, &mut command);
    }

    let config = config::load_config(cli.config.as_deref())?;
    let cache_dir = config::resolve_cache_dir(cli.no_cache, cli.cache_dir.as_deref(), &config.cache);
    debug!(cache_dir = ?cache_dir, "resolved matrix cache");

    let session = cmd::Session {
        output,
        config,
        cache_dir,
    };

    match &cli.command {
        Commands::Summary(args) => cmd::summary::run_summary(args, &session),
        Commands::Articulation(args) => cmd::articulation::run_articulation(args, &session),
        Commands::Eccentricity(args) => cmd::eccentricity::run_eccentricity(args, &session),
        Commands::Centrality(args) => cmd::centrality::run_centrality(args, &session),
        Commands::Route(args) => cmd::route::run_route(args, &session),
        Commands::Completions(_) => Ok(()),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let output = resolve_output_mode(cli.format, cli.json);

    match run(&cli, output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if render_error(output, &CliError::from_anyhow(&err)).is_err() {
                eprintln!("error: {err:#}");
            }
            ExitCode::FAILURE
        }
    }
}
