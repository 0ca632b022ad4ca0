use crate::config::ResolverConfig;
use crate::gfa_writer::write_gfa_file;
use crate::graph_pack::GraphPack;
use crate::repeat_resolver::{RepeatResolver, Resolution, ResolveStats, VertexSummary};
use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use tracing::info;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "repeatrush",
    version,
    about = "Paired-read repeat resolution for conjugate de Bruijn graphs"
)]
pub struct Args {
    /// Input graph pack (JSON with vertices, edges and paired info)
    #[arg(short, long)]
    pub input: String,

    /// Output graph pack for the resolved graph
    #[arg(short, long, default_value = "resolved.json")]
    pub output: String,

    /// Also write the resolved graph as GFA
    #[arg(long)]
    pub gfa: Option<String>,

    /// Write counters and per-vertex outcomes as JSON
    #[arg(long)]
    pub report: Option<String>,

    /// Resolver settings (JSON); the flags below override it
    #[arg(short, long)]
    pub config: Option<String>,

    /// Extra neighbour hops when joining far-side edges (0-99)
    #[arg(short, long)]
    pub leap: Option<usize>,

    /// Maximum number of resolution rounds
    #[arg(short, long)]
    pub rounds: Option<usize>,

    /// Number of threads
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Do not match one-sided edges through shared far-side edges
    #[arg(long = "no-bridge")]
    pub no_bridge: bool,

    /// Reject paired info that is not strand symmetric
    #[arg(long)]
    pub strict_symmetry: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Settings from `--config` (or defaults) with the flags applied on top.
    pub fn resolver_config(&self) -> Result<ResolverConfig> {
        let mut config = match &self.config {
            Some(path) => ResolverConfig::from_json_file(path)
                .with_context(|| format!("reading config {}", path))?,
            None => ResolverConfig::default(),
        };
        if let Some(leap) = self.leap {
            config.leap = leap;
        }
        if let Some(rounds) = self.rounds {
            config.max_rounds = rounds;
        }
        if let Some(threads) = self.threads {
            config.threads = threads;
        }
        if self.no_bridge {
            config.bridge_one_sided = false;
        }
        if self.strict_symmetry {
            config.strict_symmetry = true;
        }
        config.validate()?;
        Ok(config)
    }
}

#[derive(Serialize)]
struct RunReport<'a> {
    input: &'a str,
    config: &'a ResolverConfig,
    stats: &'a ResolveStats,
    vertices: &'a [VertexSummary],
}

pub fn run_repeatrush(args: Args) -> Result<Resolution> {
    let config = args.resolver_config()?;
    let pack = GraphPack::load(&args.input)
        .with_context(|| format!("loading graph pack {}", args.input))?;
    let (graph, index) = pack
        .to_parts()
        .with_context(|| format!("validating graph pack {}", args.input))?;
    info!(
        "Loaded {} vertices, {} edges, {} paired observations",
        graph.vertex_count(),
        graph.edge_count(),
        index.len()
    );

    let resolver = RepeatResolver::new(config);
    let resolution = resolver.resolve_repeats(&graph, &index)?;

    GraphPack::from_parts(pack.k, &resolution.graph, &resolution.index)
        .save(&args.output)
        .with_context(|| format!("writing {}", args.output))?;
    info!(
        "Resolved graph: {} vertices, {} edges -> {}",
        resolution.graph.vertex_count(),
        resolution.graph.edge_count(),
        args.output
    );

    if let Some(gfa) = &args.gfa {
        write_gfa_file(&resolution.graph, pack.k, gfa).with_context(|| format!("writing {}", gfa))?;
    }

    if let Some(path) = &args.report {
        let report = RunReport {
            input: &args.input,
            config: resolver.config(),
            stats: &resolution.stats,
            vertices: &resolution.vertices,
        };
        let mut writer = BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path))?,
        );
        serde_json::to_writer_pretty(&mut writer, &report)?;
        writeln!(writer)?;
        writer.flush()?;
    }

    Ok(resolution)
}
