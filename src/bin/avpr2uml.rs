//! AVPR to UML
//!
//! Renders Avro protocol files as a GraphViz UML diagram. In cluster mode
//! each protocol becomes a labelled cluster, optionally linked to its
//! source on GitHub.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgGroup, Parser};
use schema_uml::loader;
use schema_uml::{DotRenderer, Resolver, TypeAnnotations, UmlConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "avpr2uml")]
#[command(about = "Render Avro protocol (AVPR) files as a UML diagram")]
#[command(group(ArgGroup::new("input").required(true).args(["avprs", "avpr_dir", "clusters"])))]
struct Cli {
    /// AVPR files to read, in order
    #[arg(long, num_args = 1..)]
    avprs: Vec<PathBuf>,

    /// Read every *.avpr file below this directory
    #[arg(long)]
    avpr_dir: Option<PathBuf>,

    /// Whitespace separated cluster names, e.g. "common metadata reads"
    #[arg(long)]
    clusters: Option<String>,

    /// Directory holding <cluster>.avpr files
    #[arg(long)]
    cluster_dir: Option<PathBuf>,

    /// Output DOT file (stdout when omitted)
    #[arg(long)]
    dot: Option<PathBuf>,

    /// Also write the resolved graph as JSON
    #[arg(long)]
    json: Option<PathBuf>,

    /// File of schema URLs to link clusters to
    #[arg(long)]
    urls: Option<PathBuf>,

    /// Tab-delimited type comments
    #[arg(long)]
    type_comments: Option<PathBuf>,

    /// Display user types by local name only
    #[arg(long)]
    strip_namespace: bool,

    /// Extra config file
    #[arg(long)]
    config: Option<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = UmlConfig::load_from(cli.config.as_deref()).context("loading configuration")?;
    if cli.strip_namespace {
        config.resolve.strip_namespace = true;
    }
    if let Some(dir) = cli.cluster_dir {
        config.input.cluster_dir = dir;
    }

    let sources = if let Some(order) = &cli.clusters {
        config.resolve.group_by_source = true;
        loader::load_clusters(order, &config.input)?
    } else if let Some(dir) = &cli.avpr_dir {
        loader::load_avpr_dir(dir).with_context(|| format!("reading {}", dir.display()))?
    } else {
        loader::load_avpr_files(&cli.avprs)?
    };

    let graph = Resolver::new(config.resolve.clone()).resolve(&sources)?;

    let mut renderer = DotRenderer::new(config.render.clone());
    if let Some(path) = &cli.type_comments {
        let annotations = TypeAnnotations::load(path)
            .with_context(|| format!("reading type comments from {}", path.display()))?;
        renderer = renderer.with_annotations(annotations);
    }
    if let Some(path) = &cli.urls {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading URLs from {}", path.display()))?;
        renderer = renderer.with_cluster_urls(schema_uml::urls::cluster_urls(&content)?);
    }

    let dot = renderer.render(&graph);
    match &cli.dot {
        Some(path) => {
            fs::write(path, &dot).with_context(|| format!("writing {}", path.display()))?;
            info!(path = %path.display(), types = graph.type_count(), edges = graph.edge_count(), "wrote diagram");
        }
        None => print!("{}", dot),
    }

    if let Some(path) = &cli.json {
        fs::write(path, serde_json::to_string_pretty(&graph)?)
            .with_context(|| format!("writing {}", path.display()))?;
    }

    Ok(())
}
